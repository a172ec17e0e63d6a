//! Project board handlers.

use std::sync::Arc;

use serde::Serialize;

use crate::api::{ACK, Ack, AppState, path_id};
use crate::error::ApiError;
use crate::model::{Project, ProjectDraft, ProjectEdit, parse_object};
use crate::request::Request;
use crate::response::Json;
use crate::status::Status;

/// Creation reply: the acknowledgement plus the stored record.
#[derive(Serialize)]
pub(crate) struct Created {
    ok: bool,
    project: Project,
}

pub(crate) async fn list(state: Arc<AppState>, _req: Request) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.with_store(|store| store.list_projects()).await?;
    Ok(Json(projects))
}

pub(crate) async fn create(state: Arc<AppState>, req: Request) -> Result<(Status, Json<Created>), ApiError> {
    let draft = ProjectDraft::from_payload(&parse_object(req.body()))?;
    let project = state.with_store(move |store| store.create_project(&draft)).await?;
    Ok((Status::Created, Json(Created { ok: true, project })))
}

pub(crate) async fn update(state: Arc<AppState>, req: Request) -> Result<Json<Ack>, ApiError> {
    let id = path_id(&req)?;
    let edit = ProjectEdit::from_payload(&parse_object(req.body()))?;
    state.with_store(move |store| store.update_project(id, &edit)).await?;
    Ok(Json(ACK))
}

pub(crate) async fn delete(state: Arc<AppState>, req: Request) -> Result<Json<Ack>, ApiError> {
    let id = path_id(&req)?;
    state.with_store(move |store| store.delete_project(id)).await?;
    Ok(Json(ACK))
}
