use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use fyyur_db::AppState;

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod timeline;

use config::ServerConfig;

#[derive(Serialize)]
struct ApiStatus {
    status: &'static str,
    version: &'static str,
}

/// Build the application router with its middleware stack.
pub fn app(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let venues = Router::new()
        .route("/", get(api::venues::list_venues))
        .route("/search", post(api::search::search_venues))
        .route(
            "/create",
            get(api::venues::create_venue_form).post(api::venues::create_venue),
        )
        .route(
            "/{id}",
            get(api::venues::get_venue).delete(api::venues::delete_venue),
        )
        .route(
            "/{id}/edit",
            get(api::venues::edit_venue_form).post(api::venues::edit_venue),
        );

    let artists = Router::new()
        .route("/", get(api::artists::list_artists))
        .route("/search", post(api::search::search_artists))
        .route(
            "/create",
            get(api::artists::create_artist_form).post(api::artists::create_artist),
        )
        .route("/{id}", get(api::artists::get_artist))
        .route(
            "/{id}/edit",
            get(api::artists::edit_artist_form).post(api::artists::edit_artist),
        );

    let shows = Router::new()
        .route("/", get(api::shows::list_shows))
        .route(
            "/create",
            get(api::shows::create_show_form).post(api::shows::create_show),
        );

    let mut router = Router::new()
        .route("/", get(api::home::home))
        .route("/healthz", get(healthz))
        .nest("/venues", venues)
        .nest("/artists", artists)
        .nest("/shows", shows)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    if !config.cors_origins.is_empty() {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        tracing::info!("CORS allowed origins: {:?}", origins);
        router = router.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers(tower_http::cors::Any),
        );
    }

    router.with_state(state)
}

async fn healthz() -> Json<ApiStatus> {
    Json(ApiStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
