//! The JSON API under `/api/`.
//!
//! | Method | Path | Access | Body |
//! |---|---|---|---|
//! | GET | `/api/health` | public | none |
//! | GET | `/api/messages` | public | none |
//! | POST | `/api/messages` | public | framed |
//! | PUT | `/api/messages/<id>` | admin | content-length only |
//! | DELETE | `/api/messages/<id>` | admin | none |
//! | GET | `/api/projects…` | public | none |
//! | POST | `/api/projects…` | public | framed |
//! | PUT | `/api/projects/<id>` | admin | content-length only |
//! | DELETE | `/api/projects/<id>` | admin | none |
//!
//! `<id>` is the last path segment, whatever precedes it: `/api/messages/x/7`
//! addresses message 7, and `/api/messages/` is an invalid id.
//!
//! `HEAD` reuses the `GET` routes; the dispatcher strips the body.

mod messages;
mod projects;

use std::sync::Arc;

use serde::Serialize;

use crate::error::ApiError;
use crate::health;
use crate::method::Method;
use crate::request::Request;
use crate::router::{BodyPolicy, RouteOptions, Router};
use crate::store::{Store, StoreError};

/// State shared by every handler.
pub struct AppState {
    store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Runs one store operation on the blocking pool.
    pub(crate) async fn with_store<T, F>(self: &Arc<Self>, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || op(&state.store))
            .await
            .map_err(|e| ApiError::Fatal(format!("store task: {e}")))?
            .map_err(ApiError::from)
    }
}

/// `{"ok": true}`
#[derive(Debug, Serialize)]
pub(crate) struct Ack {
    ok: bool,
}

pub(crate) const ACK: Ack = Ack { ok: true };

/// The last path segment as a row id.
pub(crate) fn path_id(req: &Request) -> Result<i64, ApiError> {
    req.last_segment()
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid id".to_owned()))
}

/// Builds the API route table.
pub fn routes() -> Router<AppState> {
    let public = RouteOptions::default();
    let create = RouteOptions::default().body(BodyPolicy::Framed);
    let update = RouteOptions::default().admin().body(BodyPolicy::DeclaredLength);
    let delete = RouteOptions::default().admin();

    Router::new()
        .on(Method::Get, "/api/health", health::status)
        .on(Method::Get, "/api/messages", messages::list)
        .on_with(Method::Post, "/api/messages", create, messages::create)
        .prefix_with(Method::Put, "/api/messages/", update, messages::update)
        .prefix_with(Method::Delete, "/api/messages/", delete, messages::delete)
        .prefix_with(Method::Get, "/api/projects", public, projects::list)
        .prefix_with(Method::Post, "/api/projects", create, projects::create)
        .prefix_with(Method::Put, "/api/projects/", update, projects::update)
        .prefix_with(Method::Delete, "/api/projects/", delete, projects::delete)
}
