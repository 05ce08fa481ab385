use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Top-level controller configuration, loadable from TOML.
///
/// Defaults mirror the on-vehicle parameter store; the file is read once at
/// startup and never mutated afterwards.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Directory holding the policy and perception checkpoints. Must exist
    /// before the controller starts.
    pub model_dir: PathBuf,
    /// Polling and stepping cadence of the control loop.
    pub control_hz: f64,
    pub vae: VaeConfig,
    pub image: ImageConfig,
    pub ddpg: DdpgConfig,
}

/// Perception (VAE) hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VaeConfig {
    pub batch_size: usize,
    /// Capacity of the raw-frame buffer the encoder fits on.
    pub buffer_size: usize,
    pub epochs: usize,
}

/// Camera frame dimensions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

/// Policy (DDPG) hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DdpgConfig {
    pub batch_size: usize,
    pub memory_size: usize,
    pub training_steps: usize,
    /// Number of warm-up episodes that only collect data before parameter
    /// updates begin. Zeroed when precompiled models are loaded.
    pub skip_episodes: usize,
    pub gamma: f64,
    pub clip_norm: f64,
    /// Ornstein-Uhlenbeck exploration noise parameters.
    pub noise_theta: f64,
    pub noise_sigma: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            model_dir: PathBuf::from("/data/models"),
            control_hz: 20.0,
            vae: VaeConfig::default(),
            image: ImageConfig::default(),
            ddpg: DdpgConfig::default(),
        }
    }
}

impl Default for VaeConfig {
    fn default() -> Self {
        VaeConfig {
            batch_size: 64,
            buffer_size: 500,
            epochs: 10,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        ImageConfig {
            height: 80,
            width: 160,
            channels: 3,
        }
    }
}

impl Default for DdpgConfig {
    fn default() -> Self {
        DdpgConfig {
            batch_size: 64,
            memory_size: 1000,
            training_steps: 300,
            skip_episodes: 5,
            gamma: 0.9,
            clip_norm: 5e-3,
            noise_theta: 0.6,
            noise_sigma: 0.2,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: ControllerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            eprintln!(
                "Warning: config file '{}' not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_hz <= 0.0 {
            return Err(ConfigError::Validation("control_hz must be > 0".into()));
        }
        if self.vae.batch_size == 0 {
            return Err(ConfigError::Validation("vae.batch_size must be > 0".into()));
        }
        if self.vae.buffer_size < self.vae.batch_size {
            return Err(ConfigError::Validation(
                "vae.buffer_size must be >= vae.batch_size".into(),
            ));
        }
        if self.vae.epochs == 0 {
            return Err(ConfigError::Validation("vae.epochs must be > 0".into()));
        }
        if self.image.height == 0 || self.image.width == 0 || self.image.channels == 0 {
            return Err(ConfigError::Validation(
                "image dimensions must all be > 0".into(),
            ));
        }
        if self.ddpg.batch_size == 0 {
            return Err(ConfigError::Validation(
                "ddpg.batch_size must be > 0".into(),
            ));
        }
        if self.ddpg.memory_size < self.ddpg.batch_size {
            return Err(ConfigError::Validation(
                "ddpg.memory_size must be >= ddpg.batch_size".into(),
            ));
        }
        if self.ddpg.training_steps == 0 {
            return Err(ConfigError::Validation(
                "ddpg.training_steps must be > 0".into(),
            ));
        }
        if self.ddpg.gamma < 0.0 || self.ddpg.gamma > 1.0 {
            return Err(ConfigError::Validation(
                "ddpg.gamma must be in [0, 1]".into(),
            ));
        }
        if self.ddpg.clip_norm <= 0.0 {
            return Err(ConfigError::Validation("ddpg.clip_norm must be > 0".into()));
        }
        if self.ddpg.noise_theta < 0.0 {
            return Err(ConfigError::Validation(
                "ddpg.noise_theta must be >= 0".into(),
            ));
        }
        if self.ddpg.noise_sigma < 0.0 {
            return Err(ConfigError::Validation(
                "ddpg.noise_sigma must be >= 0".into(),
            ));
        }
        Ok(())
    }

    /// Fixed sleep interval between control-loop polls and steps.
    pub fn control_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.control_hz)
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&ControllerConfig::default()).expect("default config serializes")
    }
}
