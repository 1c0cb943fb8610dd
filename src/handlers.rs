use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::{Form, Json};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use log::{error, info, warn};
use uuid::Uuid;

use crate::cleanup::{trash_label, CLEANUP_LABELS};
use crate::error::AppError;
use crate::provider::{Connector, Mailbox, Message};
use crate::sanitize::strip_tags;
use crate::types::{Payload, SendForm, SendResponse};

pub struct AppState {
    pub connector: Arc<dyn Connector>,
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub async fn send_email(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SendForm>, QueryRejection>,
    form: Result<Form<SendForm>, FormRejection>,
) -> Result<Json<SendResponse>, AppError> {
    let request_id = Uuid::new_v4();

    match relay(&state, query, form, request_id).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            if err.status().is_server_error() {
                error!("[{}] {}", request_id, err.message());
            } else {
                info!("[{}] Rejected: {}", request_id, err.message());
            }
            Err(err)
        }
    }
}

/// The `payload` field from the urlencoded body, falling back to the query
/// string. A body that is not urlencoded is ignored rather than rejected.
fn payload_field(
    query: Result<Query<SendForm>, QueryRejection>,
    form: Result<Form<SendForm>, FormRejection>,
) -> Result<Option<String>, AppError> {
    let parse_failed = || AppError::BadRequest("Failed to parse form.".to_string());

    let body = match form {
        Ok(Form(form)) => form.payload,
        Err(FormRejection::InvalidFormContentType(_)) => None,
        Err(_) => return Err(parse_failed()),
    };
    let Query(query) = query.map_err(|_| parse_failed())?;

    Ok(body.or(query.payload))
}

async fn relay(
    state: &AppState,
    query: Result<Query<SendForm>, QueryRejection>,
    form: Result<Form<SendForm>, FormRejection>,
    request_id: Uuid,
) -> Result<SendResponse, AppError> {
    let encoded = payload_field(query, form)?
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Payload not provided.".to_string()))?;

    let payload = Payload::decode(&encoded).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let credentials = strip_tags(payload.credentials.get());
    let token = strip_tags(payload.token.get());
    let mailbox = state.connector.connect(&credentials, &token)?;

    let message = Message {
        raw: Some(URL_SAFE.encode(payload.message_body.as_bytes())),
        ..Default::default()
    };
    let output = mailbox
        .send(&message)
        .await
        .context("failed to send message")?;
    info!("[{}] Sent message {}", request_id, output.id);

    for label in CLEANUP_LABELS {
        trash_label(mailbox.as_ref(), label).await?;
    }

    // The email is already out at this point; a missing token is reported
    // as null.
    let token = match current_token(mailbox.as_ref()).await {
        Ok(token) => Some(token),
        Err(err) => {
            warn!("[{}] Could not read back token: {:#}", request_id, err);
            None
        }
    };

    Ok(SendResponse { token, output })
}

async fn current_token(mailbox: &dyn Mailbox) -> anyhow::Result<String> {
    let token = mailbox.token().await?;
    serde_json::to_string(&token).context("failed to marshal token")
}
