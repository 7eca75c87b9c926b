use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    handlers, middleware_layer::request_time::{TEST_NOW_HEADER, stamp_request_time},
    state::AppState,
};

/// Builds the CORS policy. Pastes are public, so any origin may call the API.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            HeaderName::from_static(TEST_NOW_HEADER),
        ])
        .max_age(Duration::from_secs(86400))
}

/// Builds the HTTP router.
///
/// # Arguments
///
/// * `state` - The application state.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/pastes", post(handlers::pastes::create_paste))
        .route("/api/pastes/{id}", get(handlers::pastes::get_paste))
        .route_layer(from_fn_with_state(state.clone(), stamp_request_time))
        .with_state(state);

    Router::new().merge(api_routes).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::default().include_headers(false))
                    .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                    .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                    .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
            )
            .layer(cors_layer()),
    )
}
