//! Liveness endpoint.
//!
//! `GET /api/health` answers `{"status":"ok"}` whenever the process can
//! answer HTTP at all. The store is not consulted.

use std::sync::Arc;

use serde::Serialize;

use crate::api::AppState;
use crate::request::Request;
use crate::response::Json;

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

pub async fn status(_state: Arc<AppState>, _req: Request) -> Json<Health> {
    Json(Health { status: "ok" })
}
