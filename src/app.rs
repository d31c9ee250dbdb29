use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/journey", get(handlers::get_journey))
        .route("/api/points", post(handlers::add_point))
        .route(
            "/api/points/:id",
            get(handlers::edit_point)
                .put(handlers::update_point)
                .delete(handlers::delete_point),
        )
        .route("/api/metrics", post(handlers::register_metric))
        .route(
            "/api/selection",
            get(handlers::get_selection)
                .put(handlers::put_selection)
                .patch(handlers::patch_selection),
        )
        .route(
            "/api/selection/metrics/:name",
            post(handlers::select_metric).delete(handlers::deselect_metric),
        )
        .route("/api/view", get(handlers::get_view))
        .route("/api/view/chart", get(handlers::get_chart))
        .route("/api/view/radar", get(handlers::get_radar))
        .route("/api/view/list", get(handlers::get_list))
        .route("/api/stats/:metric", get(handlers::get_stats))
        .route("/api/save", post(handlers::save))
        .route("/api/load", post(handlers::load))
        .route("/api/export", get(handlers::export))
        .route("/api/import", post(handlers::import))
        .with_state(state)
}
