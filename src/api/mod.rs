pub mod chat;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod health;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::{any::Any, time::Duration};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{api::error::ApiError, config::ServerConfig, state::AppState};

pub fn router(state: AppState, cfg: &ServerConfig) -> Router {
    let timed = Router::new()
        .route("/", get(dashboard::index))
        .route("/dashboard/:date", get(dashboard::dashboard))
        .route("/api/forecast/:date", get(forecast::get_forecast))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_secs)));

    // Chat answers are bounded by the responder's own deadline, which
    // replies with an apology instead of an empty 408.
    let mut router = Router::new()
        .route("/ask-chatbot", post(chat::ask_chatbot))
        .merge(timed)
        .with_state(state);

    if cfg.enable_cors {
        use tower_http::cors::Any;
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)),
        )
        .layer(TraceLayer::new_for_http())
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::InternalError("request handler panicked".to_string()).into_response()
}
