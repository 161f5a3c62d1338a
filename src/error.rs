use std::path::PathBuf;

use thiserror::Error;

use crate::config::Scenario;
use crate::TrackId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown scenario: {0:?}")]
    UnknownScenario(String),

    #[error("Scenario {scenario} requires `{field}` to be configured")]
    MissingZoneSetting {
        scenario: Scenario,
        field: &'static str,
    },

    #[error("Invalid config value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Invalid observation for track {track_id}: {reason}")]
    InvalidObservation { track_id: TrackId, reason: String },

    #[error("Unknown stream: {0:?}")]
    UnknownStream(String),
}
