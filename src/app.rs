use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{auth, handlers, AppState};

const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/guest-login", post(handlers::auth::guest_login))
        .route("/api/refresh-token", post(handlers::auth::refresh_token))
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route(
            "/api/me",
            get(handlers::users::me)
                .patch(handlers::users::update_me)
                .delete(handlers::users::withdraw),
        )
        // Diaries
        .route(
            "/api/me/diaries",
            get(handlers::diaries::list_diaries).post(handlers::diaries::create_diary),
        )
        .route(
            "/api/me/diaries/range",
            get(handlers::diaries::list_diaries_in_range),
        )
        .route(
            "/api/me/diaries/:date",
            get(handlers::diaries::get_diary)
                .put(handlers::diaries::update_diary)
                .delete(handlers::diaries::delete_diary),
        )
        // Analysis
        .route(
            "/api/me/analyze-diaries",
            get(handlers::analysis::analyze_diaries),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Periodically prune the auth rate limiter.
pub fn spawn_rate_limit_cleanup(state: &AppState) -> tokio::task::JoinHandle<()> {
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    })
}
