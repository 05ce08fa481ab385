use std::collections::HashMap;

use anyhow::Result;

/// Latent observation produced by the perception encoder.
pub type Observation = Vec<f32>;

/// Vehicle command, typically `[steering, throttle]`.
pub type Action = Vec<f32>;

/// Raw camera frame handed to the perception encoder.
#[derive(Debug, Clone)]
pub struct ImageFrame {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl ImageFrame {
    pub fn new(height: usize, width: usize, channels: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), height * width * channels);
        ImageFrame {
            height,
            width,
            channels,
            data,
        }
    }
}

/// Result of a single environment step.
#[derive(Debug)]
pub struct Step {
    pub obs: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: Option<HashMap<String, String>>,
}

/// Interface to the vehicle (or a simulation of it).
///
/// The mode flags are owned by the environment: they reflect operator button
/// presses, and the controller only ever reads them. The flag state machine
/// lives entirely behind this trait.
pub trait DrivingEnv {
    /// The operator has selected the training task.
    fn is_training(&self) -> bool;

    /// The operator has selected the testing task.
    fn is_testing(&self) -> bool;

    /// The operator has armed autopilot and the vehicle is safe to drive.
    fn is_autopilot(&self) -> bool;

    /// Begin a new episode. Blocks until the operator arms autopilot.
    fn reset(&mut self) -> Result<Observation>;

    /// Apply one action and advance the episode.
    fn step(&mut self, action: &Action) -> Result<Step>;
}
