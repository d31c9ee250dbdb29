use crate::document;
use crate::errors::{AppError, JourneyError};
use crate::journey::JourneyStore;
use crate::models::{
    ChartSeries, JourneyDocument, JourneyView, NewPoint, Point, PointGroup, PointId, PointPatch,
    RadarSnapshot, RegisterMetricRequest, RegisterMetricResponse, Statistics, StatusResponse,
};
use crate::projector::{ViewProjector, derive_statistics};
use crate::selection::{Selection, SelectionPatch, SelectionUpdate};
use crate::state::AppState;
use crate::storage::{load_journey, persist_journey};
use crate::ui::render_index;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use tracing::{info, warn};

pub const EXPORT_FILE_NAME: &str = "emotion_journey.json";

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub metric: Option<String>,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let journey = state.journey.lock().await;
    Html(render_index(journey.journey()))
}

pub async fn get_journey(State(state): State<AppState>) -> Json<JourneyDocument> {
    let journey = state.journey.lock().await;
    Json(journey.serialize())
}

pub async fn add_point(
    State(state): State<AppState>,
    payload: Result<Json<NewPoint>, JsonRejection>,
) -> Result<(StatusCode, Json<Point>), AppError> {
    let Json(payload) = payload?;
    let mut journey = state.journey.lock().await;
    let point = journey.add_point(payload)?;
    Ok((StatusCode::CREATED, Json(point)))
}

pub async fn edit_point(
    State(state): State<AppState>,
    Path(id): Path<PointId>,
) -> Result<Json<Point>, AppError> {
    let journey = state.journey.lock().await;
    Ok(Json(journey.edit_point(id)?))
}

pub async fn update_point(
    State(state): State<AppState>,
    Path(id): Path<PointId>,
    patch: Result<Json<PointPatch>, JsonRejection>,
) -> Result<Json<Point>, AppError> {
    let Json(patch) = patch?;
    let mut journey = state.journey.lock().await;
    Ok(Json(journey.update_point(id, patch)?))
}

pub async fn delete_point(
    State(state): State<AppState>,
    Path(id): Path<PointId>,
) -> Result<Json<Point>, AppError> {
    let mut journey = state.journey.lock().await;
    Ok(Json(journey.delete_point(id)?))
}

pub async fn register_metric(
    State(state): State<AppState>,
    payload: Result<Json<RegisterMetricRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterMetricResponse>), AppError> {
    let Json(payload) = payload?;
    let mut journey = state.journey.lock().await;
    let metric = journey.register_metric(&payload.name)?;
    let response = RegisterMetricResponse {
        metric,
        metrics: journey.journey().metrics.clone(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_selection(State(state): State<AppState>) -> Json<Selection> {
    let selection = state.selection.lock().await;
    Json(selection.clone())
}

pub async fn put_selection(
    State(state): State<AppState>,
    update: Result<Json<SelectionUpdate>, JsonRejection>,
) -> Result<Json<Selection>, AppError> {
    let Json(update) = update?;
    let journey = state.journey.lock().await;
    let mut selection = state.selection.lock().await;
    selection.replace(journey.journey(), update)?;
    Ok(Json(selection.clone()))
}

pub async fn patch_selection(
    State(state): State<AppState>,
    patch: Result<Json<SelectionPatch>, JsonRejection>,
) -> Result<Json<Selection>, AppError> {
    let Json(patch) = patch?;
    let journey = state.journey.lock().await;
    let mut selection = state.selection.lock().await;
    selection.apply(journey.journey(), patch)?;
    Ok(Json(selection.clone()))
}

pub async fn select_metric(
    State(state): State<AppState>,
    Path(metric): Path<String>,
) -> Result<Json<Selection>, AppError> {
    let journey = state.journey.lock().await;
    let mut selection = state.selection.lock().await;
    selection.select(journey.journey(), &metric)?;
    Ok(Json(selection.clone()))
}

pub async fn deselect_metric(
    State(state): State<AppState>,
    Path(metric): Path<String>,
) -> Result<Json<Selection>, AppError> {
    let mut selection = state.selection.lock().await;
    selection.deselect(&metric)?;
    Ok(Json(selection.clone()))
}

pub async fn get_view(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Json<JourneyView> {
    let journey = state.journey.lock().await;
    let selection = state.selection.lock().await;
    let projector = ViewProjector::new(journey.journey(), &selection);
    Json(projector.derive_view(query.metric.as_deref()))
}

pub async fn get_chart(State(state): State<AppState>) -> Json<ChartSeries> {
    let journey = state.journey.lock().await;
    let selection = state.selection.lock().await;
    Json(ViewProjector::new(journey.journey(), &selection).derive_chart_series())
}

pub async fn get_radar(State(state): State<AppState>) -> Json<RadarSnapshot> {
    let journey = state.journey.lock().await;
    let selection = state.selection.lock().await;
    Json(ViewProjector::new(journey.journey(), &selection).derive_radar_snapshot())
}

pub async fn get_list(State(state): State<AppState>) -> Json<Vec<PointGroup>> {
    let journey = state.journey.lock().await;
    let selection = state.selection.lock().await;
    Json(ViewProjector::new(journey.journey(), &selection).derive_grouped_list())
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(metric): Path<String>,
) -> Result<Json<Statistics>, AppError> {
    let journey = state.journey.lock().await;
    if !journey.journey().has_metric(metric.trim()) {
        return Err(JourneyError::not_found(format!("unknown metric '{metric}'")).into());
    }
    Ok(Json(derive_statistics(journey.journey(), &metric)))
}

pub async fn save(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let journey = state.journey.lock().await;
    persist_journey(&state.data_path, &journey.serialize()).await?;
    info!(points = journey.len(), path = %state.data_path.display(), "journey saved");
    Ok(Json(StatusResponse {
        message: "Journey saved successfully!".into(),
        points: journey.len(),
    }))
}

pub async fn load(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let _gate = state.begin_replace()?;
    let store = load_journey(&state.data_path).await?;
    let points = state.replace_journey(store).await;
    info!(points, "journey loaded");
    Ok(Json(StatusResponse {
        message: "Journey loaded successfully!".into(),
        points,
    }))
}

pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let journey = state.journey.lock().await;
    let payload = serde_json::to_vec_pretty(&journey.serialize()).map_err(AppError::internal)?;
    info!(points = journey.len(), "journey exported");
    let disposition = format!("attachment; filename=\"{EXPORT_FILE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        payload,
    ))
}

pub async fn import(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, AppError> {
    if body.is_empty() {
        return Err(AppError::bad_request("import file is empty"));
    }
    let _gate = state.begin_replace()?;
    let journey = document::parse_bytes(&body).map_err(|err| {
        warn!("rejected import: {err}");
        err
    })?;
    let points = state.replace_journey(JourneyStore::from_journey(journey)).await;
    info!(points, "journey imported");
    Ok(Json(StatusResponse {
        message: "Journey imported successfully!".into(),
        points,
    }))
}
