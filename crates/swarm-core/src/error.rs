//! Error type shared across the core crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid coordinate for {agent_id} waypoint {index}: lat {lat}, lon {lon}")]
    InvalidCoordinate {
        agent_id: String,
        index: usize,
        lat: f64,
        lon: f64,
    },

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
