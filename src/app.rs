use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/dashboards/main", get(handlers::main_dashboard))
        .route("/dashboards/comparison", get(handlers::comparison_dashboard))
        .route("/api/views/:view", get(handlers::get_view))
        .route("/api/views/:view/selection", post(handlers::update_selection))
        .route("/api/views/:view/notices/:id", delete(handlers::dismiss_notice))
        .route("/api/views/:view/charts/:container/image", get(handlers::chart_image))
        .route("/api/export/:endpoint/csv", get(handlers::export_csv))
        .route("/api/chat", post(handlers::chat))
        .with_state(state)
}
