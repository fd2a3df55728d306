//! HTTP surface standing in for the dashboard frontend.
//!
//! Renders cards on request and translates posts into button presses, so a
//! running instance can be driven with curl. Command delivery stays on the
//! service bus; this layer never talks to devices.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::cards::CardError;
use crate::cards::Propagation;
use crate::host::EntityAttributes;
use crate::host::Host;
use crate::host::StateSnapshot;

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
    cards: usize,
}

/// Shared application state
struct AppState {
    version: &'static str,
    host: Arc<Host>,
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
            cards: state.host.cards().len(),
        }),
    )
}

/// Handler for GET /v1/cards
///
/// Renders every card against the current snapshot.
#[tracing::instrument(skip(state))]
async fn cards(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.host.render_all()))
}

/// Handler for POST /v1/cards/{index}/press/{button}
///
/// The UI dispatch path: exactly one service call per accepted press.
#[tracing::instrument(skip(state))]
async fn press(
    State(state): State<Arc<AppState>>,
    Path((index, button)): Path<(usize, String)>,
) -> impl IntoResponse {
    match state.host.press(index, &button) {
        Ok(Propagation::Stop) => StatusCode::ACCEPTED.into_response(),
        Ok(Propagation::Continue) => (
            StatusCode::NOT_FOUND,
            format!("button not handled: {}", button),
        )
            .into_response(),
        Err(e @ CardError::NoSuchCard(_)) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
        Err(e @ CardError::EntityUnavailable(_)) => {
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Handler for GET /v1/entities
#[tracing::instrument(skip(state))]
async fn entities(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(StateSnapshot::clone(&state.host.snapshot())),
    )
}

/// Handler for PUT /v1/entities/{entity_id}
///
/// State ingestion: replaces one entity's attributes, which publishes a new
/// snapshot for the next render. Attributes are validated so an
/// out-of-range position never enters a snapshot.
#[tracing::instrument(skip(state, attributes))]
async fn put_entity(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
    Json(attributes): Json<EntityAttributes>,
) -> impl IntoResponse {
    if let Err(e) = attributes.validate() {
        return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response();
    }

    state.host.set_entity(entity_id, attributes);
    StatusCode::NO_CONTENT.into_response()
}

/// Handler for DELETE /v1/entities/{entity_id}
#[tracing::instrument(skip(state))]
async fn delete_entity(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
) -> impl IntoResponse {
    state.host.remove_entity(&entity_id);
    StatusCode::NO_CONTENT
}

/// Create the API router with all endpoints
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/cards", get(cards))
        .route("/v1/cards/:index/press/:button", post(press))
        .route("/v1/entities", get(entities))
        .route(
            "/v1/entities/:entity_id",
            put(put_entity).delete(delete_entity),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Binds to the given address and serves until the shutdown signal fires.
pub async fn serve(
    host: Arc<Host>,
    listen: String,
    port: u16,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    let state = Arc::new(AppState { version, host });
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", listen, port).parse()?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await?;

    Ok(())
}
