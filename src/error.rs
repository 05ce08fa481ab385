use std::path::PathBuf;

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("model directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors surfaced by the controller loop.
///
/// Only `Checkpoint(DirNotFound)` can occur at construction time; the rest
/// are collaborator failures propagated out of a running session.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("environment failure: {0}")]
    Env(#[source] anyhow::Error),

    #[error("policy failure: {0}")]
    Policy(#[source] anyhow::Error),

    #[error("perception failure: {0}")]
    Perception(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_error_display() {
        let err = CheckpointError::DirNotFound(PathBuf::from("/data/models"));
        assert_eq!(err.to_string(), "model directory not found: /data/models");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("ddpg.batch_size must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: ddpg.batch_size must be > 0"
        );
    }

    #[test]
    fn test_controller_error_wraps_checkpoint() {
        let err = ControllerError::from(CheckpointError::ModelLoad("bad file".to_string()));
        assert_eq!(
            err.to_string(),
            "checkpoint error: failed to load model: bad file"
        );
    }
}
