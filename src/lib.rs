//! # guestboard
//!
//! A small self-hosted HTTP service for a personal website: a guestbook
//! (`/api/messages`), a project-submission board (`/api/projects`), and
//! static hosting for everything else.
//!
//! ## What lives where
//!
//! - [`body`]: request body framing, `content-length` and chunked, with a
//!   size cap
//! - [`static_files`]: URL path → file inside the public root, traversal-safe
//! - [`store`]: SQLite behind a single lock
//! - [`dispatch`]: method/path classification, admin gate, CORS, JSON
//! - [`server`]: raw HTTP/1.1 over tokio, one task per connection
//!
//! ## Running it
//!
//! ```rust,no_run
//! use guestboard::{App, Server, SharedSecret, Store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), guestboard::Error> {
//!     let store = Store::open("site.db")?;
//!     let app = App::new(store, "public", SharedSecret::new("change-me"));
//!     Server::bind("0.0.0.0:8080").serve(app).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod body;
pub mod config;
pub mod dispatch;
mod error;
mod handler;
mod health;
mod method;
pub mod middleware;
pub mod model;
mod request;
mod response;
mod router;
pub mod server;
pub mod static_files;
mod status;
pub mod store;

pub use auth::{AdminGate, SharedSecret};
pub use config::Config;
pub use dispatch::App;
pub use error::{ApiError, Error};
pub use handler::Handler;
pub use method::Method;
pub use request::{Request, RequestHead};
pub use response::{IntoResponse, Json, Response};
pub use router::{Access, BodyPolicy, RouteOptions, Router};
pub use server::Server;
pub use static_files::{PathResolver, StaticFiles};
pub use status::Status;
pub use store::Store;
