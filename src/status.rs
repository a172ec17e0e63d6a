//! HTTP status codes as a typed enum.
//!
//! Only the codes this server emits are listed. Use [`Status`] anywhere a
//! status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or paired with a JSON body in a handler.
//!
//! ```rust
//! use guestboard::{Response, Status};
//!
//! Response::status(Status::NoContent);
//!
//! Response::builder()
//!     .status(Status::Created)
//!     .json(br#"{"ok":true}"#.to_vec());
//! ```

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 1xx Informational ─────────────────────────────────────────────────────
    Continue,                      // 100

    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                            // 200
    Created,                       // 201
    NoContent,                     // 204

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,                    // 400
    Unauthorized,                  // 401
    NotFound,                      // 404

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,           // 500
    NotImplemented,                // 501
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Continue            => 100,
            Status::Ok                  => 200,
            Status::Created             => 201,
            Status::NoContent           => 204,
            Status::BadRequest          => 400,
            Status::Unauthorized        => 401,
            Status::NotFound            => 404,
            Status::InternalServerError => 500,
            Status::NotImplemented      => 501,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Continue            => "Continue",
            Status::Ok                  => "OK",
            Status::Created             => "Created",
            Status::NoContent           => "No Content",
            Status::BadRequest          => "Bad Request",
            Status::Unauthorized        => "Unauthorized",
            Status::NotFound            => "Not Found",
            Status::InternalServerError => "Internal Server Error",
            Status::NotImplemented      => "Not Implemented",
        }
    }
}

