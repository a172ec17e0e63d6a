//! Cross-cutting request/response concerns.
//!
//! - [`cors`]: permissive CORS headers on every API response
//! - [`trace`]: per-request span with method, path, status, latency

pub mod cors;
pub mod trace;
