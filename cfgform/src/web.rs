//! HTTP API over one [`EditSession`].
//!
//! | method | path          | response                                  |
//! |--------|---------------|-------------------------------------------|
//! | GET    | `/api/config` | loaded document                           |
//! | GET    | `/api/fields` | projection and flat bindings              |
//! | POST   | `/api/config` | `{"status": "success" \| "error", ...}`   |
//!
//! Everything else is served from the optional static directory.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use log::{error, info};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::{
    data::{field::FieldBinding, project::SectionView},
    session::{EditSession, SessionError},
    transport::ConfigStore,
};

type Shared<S> = Arc<Mutex<EditSession<S>>>;

/// Body of `GET /api/fields`.
#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub sections: Vec<SectionView>,
    pub bindings: Vec<FieldBinding>,
}

/// Body of `POST /api/config`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SaveStatus {
    Success,
    Error { message: String },
}

struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = SaveStatus::Error { message: self.1 };
        (self.0, Json(body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match e {
            SessionError::Codec(_) => StatusCode::BAD_REQUEST,
            SessionError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, e.to_string())
    }
}

/// Build the API router around `session`.
pub fn router<S: ConfigStore + 'static>(
    session: EditSession<S>,
    static_dir: Option<PathBuf>,
) -> Router {
    let state: Shared<S> = Arc::new(Mutex::new(session));
    let api = Router::new()
        .route("/api/config", get(get_config::<S>).post(post_config::<S>))
        .route("/api/fields", get(get_fields::<S>))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => api,
    };
    app.layer(CorsLayer::permissive())
}

/// Serve `app` on `addr` until the process is stopped.
pub async fn serve(addr: SocketAddr, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn get_config<S: ConfigStore>(State(session): State<Shared<S>>) -> Json<Value> {
    Json(session.lock().await.document().clone())
}

async fn get_fields<S: ConfigStore>(
    State(session): State<Shared<S>>,
) -> Result<Json<FieldsResponse>, ApiError> {
    let session = session.lock().await;
    let bindings = session.bindings().map_err(SessionError::from)?;
    Ok(Json(FieldsResponse {
        sections: session.projection().sections.clone(),
        bindings,
    }))
}

async fn post_config<S: ConfigStore>(
    State(session): State<Shared<S>>,
    Json(edits): Json<Vec<FieldBinding>>,
) -> Result<Json<SaveStatus>, ApiError> {
    let mut session = session.lock().await;
    if let Err(e) = session.submit(&edits).await {
        error!("failed to save config: {e}");
        return Err(e.into());
    }
    Ok(Json(SaveStatus::Success))
}
