use crate::collection::SharedCollection;
use crate::errors::{AppError, TrackerError};
use crate::models::{Completable, DashboardResponse, Entry, Record};
use crate::state::AppState;
use crate::stats::{DashboardSources, Summarize, build_dashboard, today};
use crate::storage::StorageBackend;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;

pub async fn list_records<T: Entry, B: StorageBackend>(
    State(collection): State<SharedCollection<T, B>>,
) -> Json<Vec<Record<T>>> {
    let collection = collection.lock().await;
    Json(collection.items().to_vec())
}

pub async fn create_record<T: Entry, B: StorageBackend>(
    State(collection): State<SharedCollection<T, B>>,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<(StatusCode, Json<Record<T>>), AppError> {
    let Json(fields) = payload?;
    let mut collection = collection.lock().await;
    let record = collection.create(fields).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record<T: Entry, B: StorageBackend>(
    State(collection): State<SharedCollection<T, B>>,
    Path(id): Path<String>,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<Json<Record<T>>, AppError> {
    let Json(fields) = payload?;
    let mut collection = collection.lock().await;
    Ok(Json(collection.update(&id, fields).await?))
}

pub async fn patch_record<T: Entry, B: StorageBackend>(
    State(collection): State<SharedCollection<T, B>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record<T>>, AppError> {
    let Json(partial) = payload?;
    let mut collection = collection.lock().await;
    Ok(Json(collection.patch(&id, partial).await?))
}

pub async fn delete_record<T: Entry, B: StorageBackend>(
    State(collection): State<SharedCollection<T, B>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut collection = collection.lock().await;
    collection.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_record<T: Entry + Completable, B: StorageBackend>(
    State(collection): State<SharedCollection<T, B>>,
    Path(id): Path<String>,
) -> Result<Json<Record<T>>, AppError> {
    let mut collection = collection.lock().await;
    match collection.toggle(&id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(TrackerError::NotFound(id).into()),
    }
}

pub async fn collection_stats<T: Summarize, B: StorageBackend>(
    State(collection): State<SharedCollection<T, B>>,
) -> Json<T::Summary> {
    let collection = collection.lock().await;
    Json(T::summarize_at(collection.items(), today()))
}

pub async fn get_dashboard<B: StorageBackend>(
    State(state): State<AppState<B>>,
) -> Json<DashboardResponse> {
    let todos = state.todos.lock().await;
    let plans = state.plans.lock().await;
    let houseworks = state.houseworks.lock().await;
    let finances = state.finances.lock().await;
    let moods = state.health_moods.lock().await;
    let developments = state.developments.lock().await;

    Json(build_dashboard(DashboardSources {
        todos: todos.items(),
        plans: plans.items(),
        houseworks: houseworks.items(),
        finances: finances.items(),
        moods: moods.items(),
        developments: developments.items(),
    }))
}
