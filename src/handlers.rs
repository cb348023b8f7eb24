use crate::assistant::{ChatReply, ChatRequest};
use crate::coordinator::{self, ViewSnapshot};
use crate::errors::AppError;
use crate::layout::ViewKind;
use crate::models::Endpoint;
use crate::selection::SelectionChange;
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub name: Option<String>,
    pub view: Option<String>,
}

fn parse_view(raw: &str) -> Result<ViewKind, AppError> {
    raw.parse().map_err(AppError::not_found)
}

fn attachment(content_type: &str, file_name: &str, body: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        body,
    )
        .into_response()
}

/// Serving the page mounts the view, which retries anything that failed.
async fn mount(state: &AppState, kind: ViewKind) -> Html<String> {
    coordinator::initialize(state.view(kind), &state.source).await;
    Html(render_index(kind))
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    mount(&state, ViewKind::Main).await
}

pub async fn main_dashboard(State(state): State<AppState>) -> Html<String> {
    mount(&state, ViewKind::Main).await
}

pub async fn comparison_dashboard(State(state): State<AppState>) -> Html<String> {
    mount(&state, ViewKind::Comparison).await
}

pub async fn get_view(
    State(state): State<AppState>,
    Path(view): Path<String>,
) -> Result<Json<ViewSnapshot>, AppError> {
    let kind = parse_view(&view)?;
    let snapshot = state.view(kind).lock().await.snapshot();
    Ok(Json(snapshot))
}

pub async fn update_selection(
    State(state): State<AppState>,
    Path(view): Path<String>,
    payload: Result<Json<SelectionChange>, JsonRejection>,
) -> Result<Json<ViewSnapshot>, AppError> {
    let kind = parse_view(&view)?;
    let Json(change) = payload?;
    let (snapshot, _fetches) = coordinator::change_selection(state.view(kind), &state.source, change).await;
    Ok(Json(snapshot))
}

pub async fn dismiss_notice(
    State(state): State<AppState>,
    Path((view, id)): Path<(String, u64)>,
) -> Result<StatusCode, AppError> {
    let kind = parse_view(&view)?;
    if state.view(kind).lock().await.notices_mut().dismiss(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("no notice {id}")))
    }
}

pub async fn chart_image(
    State(state): State<AppState>,
    Path((view, container)): Path<(String, String)>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let kind = parse_view(&view)?;
    let export = state
        .view(kind)
        .lock()
        .await
        .export_image(&container, query.name.as_deref())?;
    Ok(attachment("image/png", &export.file_name, export.bytes))
}

pub async fn export_csv(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let endpoint: Endpoint = endpoint.parse().map_err(AppError::not_found)?;
    let kind = match query.view.as_deref() {
        Some(view) => parse_view(view)?,
        None => ViewKind::Main,
    };
    let name = query.name.unwrap_or_else(|| endpoint.name().to_string());

    let export = coordinator::export_csv(state.view(kind), state.source.as_ref(), endpoint, &name).await?;
    Ok(attachment("text/csv; charset=utf-8", &export.file_name, export.body))
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.assistant.answer(request).await))
}
