use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;

use crate::env::{Action, DrivingEnv, ImageFrame, Observation};

/// Shared handle to the perception module.
///
/// The environment encodes camera frames through the same perception
/// instance the controller persists and reloads, so the module is shared
/// behind a single-threaded `Rc<RefCell<_>>`. Borrows are taken only at the
/// point of use; holding one across an environment call would alias.
pub type SharedPerception = Rc<RefCell<dyn Perception>>;

/// A DDPG-style actor-critic learner.
///
/// The training mathematics live behind this trait; the controller only
/// sequences episodes and persistence.
pub trait Policy {
    /// Run one on-vehicle training episode against `env`.
    ///
    /// When `optimize` is false the learner collects transitions without
    /// updating parameters (warm-up, so the perception buffer fills with
    /// diverse data first).
    fn learn(
        &mut self,
        env: &mut dyn DrivingEnv,
        perception: &SharedPerception,
        optimize: bool,
    ) -> Result<()>;

    /// Select an action for the given observation.
    fn predict(&mut self, obs: &Observation) -> Action;

    /// Save the policy checkpoint to `path`.
    fn save(&self, path: &Path) -> Result<()>;

    /// Load the policy checkpoint from `path`, replacing current parameters.
    fn load(&mut self, path: &Path) -> Result<()>;
}

/// A VAE-style image encoder.
///
/// Compresses camera frames into the latent observations the policy consumes,
/// buffering raw frames for later fitting.
pub trait Perception {
    /// Encode one frame into a latent vector, buffering the raw frame.
    fn encode(&mut self, frame: &ImageFrame) -> Observation;

    /// Fit the encoder on the buffered frames.
    fn optimize(&mut self) -> Result<()>;

    /// Save the encoder checkpoint to `path`.
    fn save(&self, path: &Path) -> Result<()>;

    /// Load the encoder checkpoint from `path`, replacing current parameters.
    fn load(&mut self, path: &Path) -> Result<()>;
}
