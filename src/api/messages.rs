//! Guestbook handlers.

use std::sync::Arc;

use crate::api::{ACK, Ack, AppState, path_id};
use crate::error::ApiError;
use crate::model::{Message, MessageDraft, parse_object};
use crate::request::Request;
use crate::response::Json;
use crate::status::Status;

pub(crate) async fn list(state: Arc<AppState>, _req: Request) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.with_store(|store| store.list_messages()).await?;
    Ok(Json(messages))
}

pub(crate) async fn create(state: Arc<AppState>, req: Request) -> Result<(Status, Json<Ack>), ApiError> {
    let draft = MessageDraft::from_payload(&parse_object(req.body()))?;
    state.with_store(move |store| store.create_message(&draft)).await?;
    Ok((Status::Created, Json(ACK)))
}

pub(crate) async fn update(state: Arc<AppState>, req: Request) -> Result<Json<Ack>, ApiError> {
    let id = path_id(&req)?;
    let draft = MessageDraft::from_payload(&parse_object(req.body()))?;
    state.with_store(move |store| store.update_message(id, &draft)).await?;
    Ok(Json(ACK))
}

pub(crate) async fn delete(state: Arc<AppState>, req: Request) -> Result<Json<Ack>, ApiError> {
    let id = path_id(&req)?;
    state.with_store(move |store| store.delete_message(id)).await?;
    Ok(Json(ACK))
}
