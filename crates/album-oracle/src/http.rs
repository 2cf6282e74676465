use crate::folder::DownloadFolder;
use album_proto::protocol::{Severity, LOG_ACK};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
struct HttpState {
    folder: Arc<DownloadFolder>,
    echo_level: Severity,
}

pub fn router(folder: DownloadFolder, echo_level: Severity) -> Router {
    let app_state = HttpState {
        folder: Arc::new(folder),
        echo_level,
    };

    Router::new()
        .route("/", get(file_count).head(|| async { StatusCode::OK }))
        .route("/:severity", post(remote_log))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn serve(bind_address: &str, port: u16, app: Router) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind_address, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn file_count(State(state): State<HttpState>) -> (StatusCode, String) {
    match state.folder.reading().await {
        Ok(reading) => {
            debug!("status query: {}", reading);
            (StatusCode::OK, reading.to_string())
        }
        Err(e) => {
            error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn remote_log(
    State(state): State<HttpState>,
    Path(severity): Path<String>,
    message: String,
) -> (StatusCode, String) {
    let Some(severity) = Severity::from_path(&severity) else {
        return (StatusCode::NOT_FOUND, String::new());
    };

    match severity {
        Severity::Debug => debug!("{}", message),
        Severity::Info => info!("{}", message),
        Severity::Warning => warn!("{}", message),
        Severity::Error => error!("{}", message),
    }

    (StatusCode::OK, echo_reply(severity, state.echo_level, &message))
}

/// The sink echoes messages at or above `echo_level` back to the caller so
/// they show up on its console as well; everything else is acknowledged.
fn echo_reply(severity: Severity, echo_level: Severity, message: &str) -> String {
    if severity >= echo_level {
        format!("{}{}", severity.echo_prefix(), message)
    } else {
        LOG_ACK.to_string()
    }
}
