//! Request body acquisition.
//!
//! The server hands the connection's buffered reader to this module once the
//! header block has been parsed. Three framings are recognised, checked in
//! this order:
//!
//! 1. `content-length` present and non-empty: read exactly that many bytes.
//!    A value that does not parse, or is negative, counts as zero.
//! 2. `transfer-encoding` mentioning `chunked`: decode hex-sized chunks until
//!    the zero-size chunk, then skip the trailer section.
//! 3. Neither: the body is empty.
//!
//! Every path enforces the configured maximum before the bytes reach a
//! handler. Malformed framing fails fast instead of truncating.

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::request::find_header;

/// Upper bound on a chunk-size or trailer line, CRLF included.
pub(crate) const MAX_LINE_BYTES: u64 = 8 * 1024;

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Failure while reading a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body too large (> {} MB)", .limit / BYTES_PER_MIB)]
    TooLarge { limit: u64 },

    /// Missing or unparsable chunk-size line.
    #[error("malformed chunked body")]
    MalformedChunk,

    #[error("truncated chunk")]
    TruncatedChunk,

    #[error("invalid chunk delimiter")]
    MalformedChunkDelimiter,

    /// The peer closed the stream before the declared length arrived.
    #[error("connection closed after {received} of {expected} body bytes")]
    Incomplete { expected: u64, received: u64 },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl BodyError {
    /// Framing and size problems are the client's fault; stream failures are not.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Incomplete { .. } | Self::Io(_))
    }
}

/// Reads a body framed by `content-length` or chunked transfer encoding.
pub async fn read_body<R>(
    headers: &[(String, String)],
    reader: &mut R,
    limit: u64,
) -> Result<Vec<u8>, BodyError>
where
    R: AsyncBufRead + Unpin,
{
    if let Some(value) = find_header(headers, "content-length").filter(|v| !v.is_empty()) {
        return read_exact_len(reader, parse_content_length(value), limit).await;
    }

    let chunked = find_header(headers, "transfer-encoding")
        .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"));
    if chunked {
        return read_chunked(reader, limit).await;
    }

    Ok(Vec::new())
}

/// Reads a body using `content-length` only; `transfer-encoding` is ignored.
///
/// Update routes accept only fixed-length bodies. A chunked upload to one of
/// them therefore arrives as an empty body.
pub async fn read_declared_length<R>(
    headers: &[(String, String)],
    reader: &mut R,
    limit: u64,
) -> Result<Vec<u8>, BodyError>
where
    R: AsyncBufRead + Unpin,
{
    let len = find_header(headers, "content-length").map_or(0, parse_content_length);
    read_exact_len(reader, len, limit).await
}

/// Lenient `content-length` parsing: garbage and negatives both mean zero.
fn parse_content_length(value: &str) -> u64 {
    match value.trim().parse::<i128>() {
        Ok(n) if n > 0 => u64::try_from(n).unwrap_or(u64::MAX),
        _ => 0,
    }
}

async fn read_exact_len<R>(reader: &mut R, len: u64, limit: u64) -> Result<Vec<u8>, BodyError>
where
    R: AsyncBufRead + Unpin,
{
    if len > limit {
        return Err(BodyError::TooLarge { limit });
    }
    if len == 0 {
        return Ok(Vec::new());
    }

    let mut body = Vec::with_capacity(usize::try_from(len).unwrap_or(0).min(64 * 1024));
    let received = (&mut *reader).take(len).read_to_end(&mut body).await? as u64;
    if received != len {
        return Err(BodyError::Incomplete { expected: len, received });
    }
    Ok(body)
}

async fn read_chunked<R>(reader: &mut R, limit: u64) -> Result<Vec<u8>, BodyError>
where
    R: AsyncBufRead + Unpin,
{
    let mut out = BytesMut::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if read_line_limited(reader, &mut line, MAX_LINE_BYTES).await? == 0 {
            return Err(BodyError::MalformedChunk);
        }
        let size = parse_chunk_size(&line)?;

        if size == 0 {
            skip_trailers(reader).await?;
            break;
        }

        if (out.len() as u64).saturating_add(size) > limit {
            return Err(BodyError::TooLarge { limit });
        }

        let start = out.len();
        // `size` fits in usize here: it is bounded by `limit` minus what we hold.
        out.resize(start + size as usize, 0);
        let mut filled = start;
        while filled < out.len() {
            let n = reader.read(&mut out[filled..]).await?;
            if n == 0 {
                return Err(BodyError::TruncatedChunk);
            }
            filled += n;
        }

        let mut crlf = [0u8; 2];
        let mut got = 0;
        while got < crlf.len() {
            let n = reader.read(&mut crlf[got..]).await?;
            if n == 0 {
                break;
            }
            got += n;
        }
        if got != 2 || crlf != *b"\r\n" {
            return Err(BodyError::MalformedChunkDelimiter);
        }
    }

    Ok(out.to_vec())
}

/// Parses `1a;name=value\r\n` into `0x1a`. Extensions are discarded.
fn parse_chunk_size(line: &[u8]) -> Result<u64, BodyError> {
    let size = line.split(|&b| b == b';').next().unwrap_or_default();
    let size = std::str::from_utf8(size).map_err(|_| BodyError::MalformedChunk)?;
    u64::from_str_radix(size.trim(), 16).map_err(|_| BodyError::MalformedChunk)
}

/// Consumes the line after the last chunk and any trailer fields, up to and
/// including the blank line that ends the message.
async fn skip_trailers<R>(reader: &mut R) -> Result<(), BodyError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = read_line_limited(reader, &mut line, MAX_LINE_BYTES).await?;
        if n == 0 || line.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(());
        }
    }
}

/// `read_until(b'\n')` that gives up after `max` bytes.
///
/// Returns the number of bytes appended. A line that hits the cap without a
/// newline is reported as `InvalidData`.
pub(crate) async fn read_line_limited<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: u64,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let n = (&mut *reader).take(max).read_until(b'\n', buf).await?;
    if n as u64 == max && buf.last() != Some(&b'\n') {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "line exceeds maximum length",
        ));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const LIMIT: u64 = 1024;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    async fn read(pairs: &[(&str, &str)], wire: &[u8]) -> Result<Vec<u8>, BodyError> {
        let mut reader = wire;
        read_body(&headers(pairs), &mut reader, LIMIT).await
    }

    fn chunk_encode(payload: &[u8], chunk: usize) -> Vec<u8> {
        let mut wire = Vec::new();
        for part in payload.chunks(chunk) {
            wire.extend_from_slice(format!("{:x}\r\n", part.len()).as_bytes());
            wire.extend_from_slice(part);
            wire.extend_from_slice(b"\r\n");
        }
        wire.extend_from_slice(b"0\r\n\r\n");
        wire
    }

    #[tokio::test]
    async fn fixed_length_reads_exactly_the_declared_bytes() {
        let body = read(&[("Content-Length", "5")], b"helloEXTRA").await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[rstest]
    #[case("abc")]
    #[case("-7")]
    #[case("  ")]
    #[tokio::test]
    async fn unparsable_or_negative_length_means_empty(#[case] value: &str) {
        let body = read(&[("Content-Length", value)], b"ignored").await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn declared_length_over_limit_is_rejected_before_reading() {
        let err = read(&[("Content-Length", "1025")], b"").await.unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { limit: LIMIT }));
    }

    #[tokio::test]
    async fn short_fixed_length_body_is_incomplete() {
        let err = read(&[("Content-Length", "10")], b"abc").await.unwrap_err();
        assert!(matches!(err, BodyError::Incomplete { expected: 10, received: 3 }));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn no_framing_headers_means_empty_body() {
        let body = read(&[("Host", "x")], b"stray bytes").await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn content_length_wins_over_chunked() {
        let wire = b"3\r\nabc\r\n0\r\n\r\n";
        let body = read(&[("Transfer-Encoding", "chunked"), ("Content-Length", "3")], wire)
            .await
            .unwrap();
        assert_eq!(body, b"3\r\n");
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(64)]
    #[tokio::test]
    async fn chunked_body_matches_fixed_length_body(#[case] chunk: usize) {
        let payload = br#"{"name":"Ann","text":"hello from a chunked client"}"#;

        let chunked = read(&[("Transfer-Encoding", "chunked")], &chunk_encode(payload, chunk))
            .await
            .unwrap();
        let fixed = read(&[("Content-Length", &payload.len().to_string())], payload)
            .await
            .unwrap();

        assert_eq!(chunked, fixed);
        assert_eq!(chunked, payload);
    }

    #[tokio::test]
    async fn chunk_extensions_and_trailers_are_ignored() {
        let wire = b"4;name=value\r\nWiki\r\n5 ; x\r\npedia\r\n0;last\r\nExpires: never\r\n\r\nNEXT";
        let mut reader = &wire[..];
        let body = read_body(&headers(&[("transfer-encoding", "gzip, Chunked")]), &mut reader, LIMIT)
            .await
            .unwrap();
        assert_eq!(body, b"Wikipedia");
        assert_eq!(reader, b"NEXT");
    }

    #[tokio::test]
    async fn uppercase_hex_sizes_parse() {
        let mut wire = b"1A\r\n".to_vec();
        wire.extend_from_slice(&[b'z'; 26]);
        wire.extend_from_slice(b"\r\n0\r\n\r\n");
        let body = read(&[("Transfer-Encoding", "chunked")], &wire).await.unwrap();
        assert_eq!(body.len(), 26);
    }

    #[rstest]
    #[case::missing_size_line(&b""[..])]
    #[case::not_hex(&b"zz\r\nabc\r\n0\r\n\r\n"[..])]
    #[case::empty_size(&b"\r\nabc\r\n0\r\n\r\n"[..])]
    #[case::negative(&b"-1\r\n"[..])]
    #[tokio::test]
    async fn bad_size_lines_are_malformed_chunks(#[case] wire: &[u8]) {
        let err = read(&[("Transfer-Encoding", "chunked")], wire).await.unwrap_err();
        assert!(matches!(err, BodyError::MalformedChunk));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn short_chunk_data_is_truncated() {
        let err = read(&[("Transfer-Encoding", "chunked")], b"a\r\nabc").await.unwrap_err();
        assert!(matches!(err, BodyError::TruncatedChunk));
    }

    #[rstest]
    #[case::wrong_bytes(&b"3\r\nabcXY0\r\n\r\n"[..])]
    #[case::eof_after_data(&b"3\r\nabc"[..])]
    #[case::half_delimiter(&b"3\r\nabc\r"[..])]
    #[tokio::test]
    async fn bad_chunk_delimiter_is_rejected(#[case] wire: &[u8]) {
        let err = read(&[("Transfer-Encoding", "chunked")], wire).await.unwrap_err();
        assert!(matches!(err, BodyError::MalformedChunkDelimiter));
    }

    #[tokio::test]
    async fn accumulated_chunks_over_limit_are_rejected() {
        let payload = vec![b'a'; LIMIT as usize + 1];
        let err = read(&[("Transfer-Encoding", "chunked")], &chunk_encode(&payload, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn huge_single_chunk_is_rejected_without_allocation() {
        let err = read(&[("Transfer-Encoding", "chunked")], b"ffffffffffffffff\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn declared_length_ignores_chunked_framing() {
        let mut reader = &b"3\r\nabc\r\n0\r\n\r\n"[..];
        let body = read_declared_length(
            &headers(&[("Transfer-Encoding", "chunked")]),
            &mut reader,
            LIMIT,
        )
        .await
        .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn declared_length_enforces_the_limit() {
        let mut reader = &b""[..];
        let err = read_declared_length(&headers(&[("Content-Length", "4096")]), &mut reader, LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { .. }));
    }

    #[test]
    fn too_large_message_reports_megabytes() {
        let err = BodyError::TooLarge { limit: 25 * BYTES_PER_MIB };
        assert_eq!(err.to_string(), "request body too large (> 25 MB)");
    }
}
