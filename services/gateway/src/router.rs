use crate::handlers::{health, order, report};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/orders", post(order::submit_orders))
        .route("/upload", post(order::upload_orders))
        .route("/execution-report", get(report::get_execution_report))
        .route("/order-book", get(report::get_order_book));

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
