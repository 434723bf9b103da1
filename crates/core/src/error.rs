use thiserror::Error;

use crate::config::ConfigError;
use crate::model::ModelError;

/// Everything that can fail while loading a panel's inputs. Rendering and
/// interaction never fail; bad geometry is skipped instead.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("flamegraph: {0}")]
    Model(#[from] ModelError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
