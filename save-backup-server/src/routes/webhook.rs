use crate::error::AppError;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/webhook", get(get_webhook).post(set_webhook))
}

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub url: String,
}

async fn get_webhook(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let store = state.store.clone();
    let config = tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(|e| anyhow::anyhow!(e))?
        .map_err(anyhow::Error::from)?;
    Ok(Json(json!({ "webhook_url": config.webhook_url })))
}

async fn set_webhook(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WebhookRequest>,
) -> Result<Json<Value>, AppError> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || {
        let mut config = store.load()?;
        config.webhook_url = body.url;
        store.save(&config)?;
        Ok::<_, anyhow::Error>(())
    })
    .await
    .map_err(|e| anyhow::anyhow!(e))??;

    tracing::info!("Webhook URL updated");
    Ok(Json(json!({ "status": "success", "message": "Webhook saved" })))
}
