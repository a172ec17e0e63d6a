//! Incoming HTTP request types.
//!
//! [`RequestHead`] is what the server parses off the socket: request line and
//! header block, nothing else. The dispatcher then reads the body according to
//! the matched route and hands the handler a complete [`Request`].

use thiserror::Error;
use tokio::io::AsyncBufRead;

use crate::body::{MAX_LINE_BYTES, read_line_limited};

const MAX_HEADERS: usize = 100;
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Case-insensitive lookup over raw header pairs. First match wins.
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Failure while reading the request line and headers.
#[derive(Debug, Error)]
pub enum HeadError {
    #[error("malformed request line")]
    RequestLine,
    #[error("malformed header line")]
    HeaderLine,
    #[error("too many header lines")]
    TooManyHeaders,
    #[error("request head larger than {MAX_HEAD_BYTES} bytes")]
    TooLarge,
    #[error("connection closed inside the request head")]
    UnexpectedEof,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl From<httparse::Error> for HeadError {
    fn from(e: httparse::Error) -> Self {
        match e {
            httparse::Error::TooManyHeaders => Self::TooManyHeaders,
            httparse::Error::HeaderName | httparse::Error::HeaderValue => Self::HeaderLine,
            _ => Self::RequestLine,
        }
    }
}

/// Request line plus headers, as received.
#[derive(Debug)]
pub struct RequestHead {
    pub(crate) method: String,
    pub(crate) target: String,
    /// Minor version: `1` for HTTP/1.1, `0` for HTTP/1.0.
    pub(crate) version: u8,
    pub(crate) headers: Vec<(String, String)>,
}

impl RequestHead {
    /// Reads one request head.
    ///
    /// Lines are buffered up to the blank line and parsed with `httparse`;
    /// whatever follows stays in `reader` for the body reader.
    ///
    /// Returns `Ok(None)` when the peer closes the connection before sending
    /// a single byte.
    pub async fn read<R>(reader: &mut R) -> Result<Option<Self>, HeadError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            if read_head_line(reader, &mut line).await? == 0 {
                return if buf.is_empty() { Ok(None) } else { Err(HeadError::UnexpectedEof) };
            }
            buf.extend_from_slice(&line);
            if buf.len() > MAX_HEAD_BYTES {
                return Err(HeadError::TooLarge);
            }
            if line == b"\r\n" || line == b"\n" {
                break;
            }
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);
        if req.parse(&buf)?.is_partial() {
            return Err(HeadError::UnexpectedEof);
        }
        let (Some(method), Some(target), Some(version)) = (req.method, req.path, req.version) else {
            return Err(HeadError::RequestLine);
        };

        Ok(Some(Self {
            method: method.to_owned(),
            target: target.to_owned(),
            version,
            headers: req
                .headers
                .iter()
                .map(|h| (h.name.to_owned(), String::from_utf8_lossy(h.value).trim().to_owned()))
                .collect(),
        }))
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn target(&self) -> &str { &self.target }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True when an HTTP/1.1 client is waiting for `100 Continue`.
    pub fn expects_continue(&self) -> bool {
        self.version == 1
            && self.header("expect").is_some_and(|v| v.eq_ignore_ascii_case("100-continue"))
    }
}

async fn read_head_line<R>(reader: &mut R, line: &mut Vec<u8>) -> Result<usize, HeadError>
where
    R: AsyncBufRead + Unpin,
{
    match read_line_limited(reader, line, MAX_LINE_BYTES).await {
        Ok(n) => Ok(n),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(HeadError::HeaderLine),
        Err(e) => Err(HeadError::Io(e)),
    }
}

/// A routed API request with its body fully read.
pub struct Request {
    pub(crate) path: String,
    pub(crate) body: Vec<u8>,
}

impl Request {
    pub(crate) fn new(path: String, body: Vec<u8>) -> Self {
        Self { path, body }
    }

    pub fn body(&self) -> &[u8] { &self.body }

    /// The last `/`-separated segment of the path, exactly as received.
    ///
    /// `/api/messages/42` gives `"42"`; `/api/messages/` gives `""`.
    pub fn last_segment(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}
