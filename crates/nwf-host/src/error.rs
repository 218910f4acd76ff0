use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scenario: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("player {0} appears twice in the scenario")]
    DuplicatePlayer(String),
    #[error("step at tick {tick} refers to unknown player {name}")]
    UnknownPlayer { tick: u64, name: String },
    #[error("tick_millis must be at least 1")]
    ZeroTickLength,
}
