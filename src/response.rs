//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Handlers build a [`Response`] (or anything that converts into one) and
//! return it. The server writes it to the socket as HTTP/1.1 and closes the
//! connection.

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::error;

use crate::status::Status;

/// Content type of every API body.
pub const JSON_UTF8: &str = "application/json; charset=utf-8";

const TEXT_UTF8: &str = "text/plain; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use guestboard::{Response, Status};
///
/// Response::json(br#"{"status":"ok"}"#.to_vec());
/// Response::text("hello");
/// Response::status(Status::NoContent);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use guestboard::{Response, Status};
///
/// Response::builder()
///     .status(Status::Created)
///     .header("location", "/api/messages")
///     .json(br#"{"ok":true}"#.to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: Status,
    /// Length announced for a body that is not sent (HEAD).
    pub(crate) omitted_len: Option<usize>,
}

impl Response {
    /// `200 OK` with `application/json; charset=utf-8`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code, omitted_len: None }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok }
    }

    pub fn status_code(&self) -> Status { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        crate::request::find_header(&self.headers, name)
    }

    /// Appends a header, keeping any existing value of the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Drops the body and announces `content-length: 0`.
    pub fn strip_body(mut self) -> Self {
        self.body.clear();
        self.omitted_len = None;
        self
    }

    /// Drops the body but keeps announcing its length, as HEAD on a file does.
    pub fn into_head(mut self) -> Self {
        self.omitted_len = Some(self.body.len());
        self.body.clear();
        self
    }

    pub(crate) async fn write_to<W: AsyncWrite + Unpin>(
        &self,
        writer: &mut W,
    ) -> std::io::Result<()> {
        let len = self.omitted_len.unwrap_or(self.body.len());
        let mut head = format!(
            "HTTP/1.1 {} {}\r\ncontent-length: {len}\r\nconnection: close\r\n",
            self.status.code(),
            self.status.reason(),
        );
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        writer.write_all(head.as_bytes()).await?;
        writer.write_all(&self.body).await?;
        writer.flush().await
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: Status,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body.
    pub fn json(self, body: Vec<u8>) -> Response {
        self.bytes(JSON_UTF8, body)
    }

    /// Terminate with a plain-text body.
    pub fn text(self, body: impl Into<String>) -> Response {
        self.bytes(TEXT_UTF8, body.into().into_bytes())
    }

    /// Terminate with a body of the given content type.
    pub fn bytes(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status, omitted_len: None }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implemented for [`Response`], [`Status`], strings, [`Json`], a
/// `(Status, Json<T>)` pair, and `Result`s whose both sides convert.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`Status`] directly from a handler: `return Status::NoContent`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// A serde-serialisable value sent as `application/json; charset=utf-8`.
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        (Status::Ok, self).into_response()
    }
}

impl<T: Serialize> IntoResponse for (Status, Json<T>) {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.1.0) {
            Ok(bytes) => Response::builder().status(self.0).json(bytes),
            Err(e) => {
                error!("response serialisation failed: {e}");
                Response::status(Status::InternalServerError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn wire(resp: &Response) -> String {
        let mut out = Vec::new();
        resp.write_to(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn writes_status_line_length_and_headers() {
        let resp = Response::builder()
            .status(Status::Created)
            .header("x-extra", "1")
            .json(b"{}".to_vec());
        assert_eq!(
            wire(&resp).await,
            "HTTP/1.1 201 Created\r\ncontent-length: 2\r\nconnection: close\r\n\
             content-type: application/json; charset=utf-8\r\nx-extra: 1\r\n\r\n{}",
        );
    }

    #[tokio::test]
    async fn stripped_body_announces_zero_length() {
        let out = wire(&Response::json(b"[1,2]".to_vec()).strip_body()).await;
        assert!(out.contains("content-length: 0\r\n"));
        assert!(out.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn head_keeps_the_original_length() {
        let out = wire(&Response::text("hello").into_head()).await;
        assert!(out.contains("content-length: 5\r\n"));
        assert!(out.ends_with("\r\n\r\n"));
    }

    #[test]
    fn json_pair_sets_status_and_content_type() {
        #[derive(Serialize)]
        struct Ack { ok: bool }

        let resp = (Status::Created, Json(Ack { ok: true })).into_response();
        assert_eq!(resp.status_code(), Status::Created);
        assert_eq!(resp.header("Content-Type"), Some(JSON_UTF8));
        assert_eq!(resp.body(), br#"{"ok":true}"#);
    }
}
