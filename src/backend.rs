use axum::{routing::get, Json, Router};
use serde_json::json;
use std::path::{Path, PathBuf};
use tower_http::services::{ServeDir, ServeFile};

use crate::log::{LogLevel, Logger};

const DEFAULT_PORT: u16 = 8080;
const PORT_BOUNDS: (u16, u16) = (1, u16::MAX);
const DEFAULT_STATIC_DIR: &str = "dist";
const INDEX_FILE: &str = "index.html";

/// Dev server settings, read once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
    pub log_level: LogLevel,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_u16_with_bounds(lookup("PORT"), DEFAULT_PORT, PORT_BOUNDS);
        let static_dir = parse_non_empty_string(lookup("STATIC_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
        let log_level = LogLevel::parse_or_default(lookup("LOG_LEVEL").as_deref());

        Self {
            port,
            static_dir,
            log_level,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();
    let logger = Logger::new(config.log_level);

    let app = router(&config.static_dir);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    logger.event(
        LogLevel::Info,
        "server_listening",
        json!({
            "url": format!("http://127.0.0.1:{}", config.port),
            "static_dir": config.static_dir.display().to_string(),
        }),
    );
    axum::serve(listener, app).await?;
    Ok(())
}

/// Built page from `static_dir`, with unknown paths falling back to its index.
pub fn router(static_dir: &Path) -> Router {
    let static_service =
        ServeDir::new(static_dir).not_found_service(ServeFile::new(static_dir.join(INDEX_FILE)));

    Router::new()
        .route("/healthz", get(health))
        .fallback_service(static_service)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn parse_u16_with_bounds(value: Option<String>, default: u16, bounds: (u16, u16)) -> u16 {
    value
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn parse_non_empty_string(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
