use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced at the transport boundary. The store itself never fails;
/// these only tell the transport why a frame had no effect.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("malformed telemetry frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unrecognized telemetry kind")]
    UnknownKind,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
