use crate::error::AppError;
use crate::models::game::{self, AddGameRequest};
use crate::services::backup::{self, BackupOutcome};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/games", get(list_games))
        .route("/backup/{game_name}", post(backup_game))
        .route("/add_game", post(add_game))
        .route("/remove_game/{game_name}", delete(remove_game))
}

#[derive(Serialize)]
struct BackupResponse {
    status: &'static str,
    #[serde(flatten)]
    outcome: BackupOutcome,
}

async fn list_games(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let store = state.store.clone();
    let options = state.config.checksum_options();
    let games = tokio::task::spawn_blocking(move || backup::list_games(&store, &options))
        .await
        .map_err(|e| anyhow::anyhow!(e))??;
    Ok(Json(json!({ "games": games })))
}

async fn backup_game(
    State(state): State<Arc<AppState>>,
    Path(game_name): Path<String>,
) -> Result<Json<BackupResponse>, AppError> {
    let lock = state.get_game_lock(&game_name).await;
    let result = {
        let _guard = lock.lock().await;

        tracing::info!(game = %game_name, "Starting backup");

        let store = state.store.clone();
        let name = game_name.clone();
        let archive_options = state.config.archive_options();
        let checksum_options = state.config.checksum_options();
        tokio::task::spawn_blocking(move || {
            backup::run_backup(&store, &name, &archive_options, &checksum_options)
        })
        .await
    };
    drop(lock);
    state.release_game_lock(&game_name).await;

    let outcome = result.map_err(|e| anyhow::anyhow!(e))??;

    Ok(Json(BackupResponse {
        status: "success",
        outcome,
    }))
}

async fn add_game(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddGameRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if body.name.trim().is_empty() || body.save_dir.trim().is_empty() {
        return Err(AppError::BadRequest("name and save_dir are required".into()));
    }

    let store = state.store.clone();
    let name = body.name.clone();
    let added = tokio::task::spawn_blocking(move || {
        let mut config = store.load()?;
        let added = game::add(&mut config, &body);
        if added {
            store.save(&config)?;
        }
        Ok::<_, anyhow::Error>(added)
    })
    .await
    .map_err(|e| anyhow::anyhow!(e))??;

    if !added {
        return Err(AppError::Conflict("Game already exists".into()));
    }

    tracing::info!(game = %name, "Game added");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "message": format!("Game {} added", name) })),
    ))
}

async fn remove_game(
    State(state): State<Arc<AppState>>,
    Path(game_name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let store = state.store.clone();
    let name = game_name.clone();
    let removed = tokio::task::spawn_blocking(move || {
        let mut config = store.load()?;
        let removed = game::remove(&mut config, &name);
        if removed {
            store.save(&config)?;
        }
        Ok::<_, anyhow::Error>(removed)
    })
    .await
    .map_err(|e| anyhow::anyhow!(e))??;

    if !removed {
        return Err(AppError::NotFound("Game not found".into()));
    }
    state.release_game_lock(&game_name).await;

    tracing::info!(game = %game_name, "Game removed");
    Ok(Json(json!({ "status": "success", "message": format!("Game {} removed", game_name) })))
}
