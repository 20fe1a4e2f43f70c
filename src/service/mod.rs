//! HTTP RAG services for the paper-management web client.
//!
//! One binary, three backends, each a thin axum layer over [`crate::rag`]:
//!
//! | Backend      | Port | Index                                   | Answer              |
//! |--------------|------|-----------------------------------------|---------------------|
//! | `citation`   | 8000 | in memory, metadata in `indexes/`       | evidence + citations|
//! | `vector`     | 5005 | `<paper folder>/{id}_llamaindex/`       | top-k + sources     |
//! | `multimodal` | 5005 | `rag_storage/{id}/index.json` + figures | top-k               |
//!
//! Errors are returned as `{"detail": "..."}` (see [`error::ApiError`]).

pub mod citation;
pub mod error;
pub mod multimodal;
pub mod state;
pub mod vector;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, ServicePaths};

use crate::config::ServiceSettings;
use crate::error::PaperError;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Backend {
    Citation,
    Vector,
    Multimodal,
}

impl Backend {
    pub fn default_port(self) -> u16 {
        match self {
            Backend::Citation => 8000,
            Backend::Vector | Backend::Multimodal => 5005,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Citation => "citation",
            Backend::Vector => "vector",
            Backend::Multimodal => "multimodal",
        }
    }

    fn cors(self) -> CorsLayer {
        match self {
            Backend::Citation => {
                let origins: Vec<HeaderValue> = citation::ALLOWED_ORIGINS
                    .iter()
                    .map(|o| HeaderValue::from_static(o))
                    .collect();
                CorsLayer::new()
                    .allow_origin(origins)
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
            Backend::Vector | Backend::Multimodal => CorsLayer::permissive(),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "citation" | "paperqa" => Ok(Backend::Citation),
            "vector" | "llamaindex" => Ok(Backend::Vector),
            "multimodal" | "raganything" => Ok(Backend::Multimodal),
            other => Err(PaperError::InvalidConfig(format!(
                "unknown backend '{other}' (expected citation, vector or multimodal)"
            ))),
        }
    }
}

/// `POST /config`: merge credentials and endpoints into the live settings.
pub(crate) async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<ServiceSettings>,
) -> Json<Value> {
    let mut settings = state.settings.write().await;
    let changed = settings.merge(update);
    info!("Configuration updated: {:?}", changed);
    Json(json!({"success": true, "message": "Configuration updated"}))
}

/// Routes for `backend` with CORS and request tracing.
pub fn router(backend: Backend, state: AppState) -> Router {
    let routes = match backend {
        Backend::Citation => citation::routes(),
        Backend::Vector => vector::routes(),
        Backend::Multimodal => multimodal::routes(),
    };
    routes
        .layer(backend.cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve `backend` until the process is stopped.
pub async fn serve(backend: Backend, addr: SocketAddr, state: AppState) -> Result<(), PaperError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PaperError::Internal(format!("Failed to bind {addr}: {e}")))?;
    info!("{} backend listening on http://{}", backend, addr);
    axum::serve(listener, router(backend, state))
        .await
        .map_err(|e| PaperError::Internal(format!("Server error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_and_ports() {
        assert_eq!("citation".parse::<Backend>().unwrap(), Backend::Citation);
        assert_eq!("LlamaIndex".parse::<Backend>().unwrap(), Backend::Vector);
        assert_eq!(Backend::Multimodal.to_string(), "multimodal");
        assert_eq!(Backend::Citation.default_port(), 8000);
        assert_eq!(Backend::Vector.default_port(), 5005);
        assert!("graph".parse::<Backend>().is_err());
    }
}
