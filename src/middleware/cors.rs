//! Permissive CORS for the API.

use crate::response::Response;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "*, Content-Type";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Adds the CORS headers to `resp`.
pub fn apply(resp: Response) -> Response {
    resp.with_header("access-control-allow-origin", ALLOW_ORIGIN)
        .with_header("access-control-allow-headers", ALLOW_HEADERS)
        .with_header("access-control-allow-methods", ALLOW_METHODS)
}
