//! Documentation of the Pinpoint feedback service.
//!
//! REST backend behind the click-to-pin feedback widget.
//!
//!
//!
//! # General Infrastructure
//! - The widget is embedded in a host page and calls `/api/feedback*` on this server
//! - The server is a thin layer: parse the query or body, check presence of required fields,
//!   hand off to a [`storage::FeedbackStore`], map the result to JSON
//! - Storage is picked at boot through `FEEDBACK_STORAGE`
//!
//!
//!
//! # Routes
//!
//! | Route | Methods |
//! |---|---|
//! | `/api/feedback` | GET, POST, PUT, DELETE |
//! | `/api/feedback/rounds` | GET |
//! | `/api/feedback/general` | GET, POST, DELETE |
//!
//! - `?page=` filters lists, an empty value means no filter
//! - `?id=` is required for PUT and DELETE
//!
//!
//!
//! # Status Codes
//! - 400 missing `page`/`comment`, missing `id`, or a body that is not JSON
//! - 404 unknown id on PUT/DELETE
//! - 500 any storage failure, logged, with a generic message per operation
//! - 501 general feedback on a backend that does not store it
//!
//!
//!
//! # Notes
//!
//! ## Consistency
//! There is no locking across requests. Each write reads the current list, changes it and
//! writes it back, so two writers racing on the same backend can lose one update. This is
//! acceptable for review feedback on a handful of pages.
//!
//! ## Rounds
//! Rounds are read only over HTTP. They are seeded into the memory backend, dropped as JSON
//! files into the rounds directory, or uploaded as blobs under the rounds prefix.
//! `pinpoint-cli archive` writes the file form.
//!
//!
//!
//! # Setup
//!
//! Run with file storage.
//! ```sh
//! FEEDBACK_STORAGE=file RUST_LOG=info cargo run
//! `````
//!
//! Run with blob storage, the token is read from `/run/secrets/BLOB_READ_WRITE_TOKEN`
//! or the environment.
//! ```sh
//! FEEDBACK_STORAGE=blob BLOB_READ_WRITE_TOKEN=... cargo run
//! `````
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod storage;
pub mod utils;

use config::Config;
use routes::{
    create_feedback_handler, create_general_handler, delete_feedback_handler,
    delete_general_handler, list_feedback_handler, list_general_handler, list_rounds_handler,
    update_feedback_handler,
};
use state::AppState;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config)?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route(
            "/api/feedback",
            get(list_feedback_handler)
                .post(create_feedback_handler)
                .put(update_feedback_handler)
                .delete(delete_feedback_handler),
        )
        .route("/api/feedback/rounds", get(list_rounds_handler))
        .route(
            "/api/feedback/general",
            get(list_general_handler)
                .post(create_general_handler)
                .delete(delete_general_handler),
        )
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
