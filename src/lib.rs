//! # EagleMK4 Controller
//!
//! On-vehicle control loop for the EagleMK4 autonomous vehicle. Wires a
//! DDPG-style policy learner and a VAE-style perception encoder to a driving
//! environment, dispatches between training and testing based on operator
//! button presses relayed through the environment, and persists model
//! checkpoints under a configured model directory.
//!
//! The learning algorithms themselves stay behind the collaborator traits;
//! this crate is the orchestration layer plus simulation stand-ins so the
//! loop runs end to end without a vehicle.
//!
//! ## Modules
//!
//! - [`controller`] — mode dispatch loop, training/testing sessions
//! - [`agent`] — `Policy` and `Perception` collaborator traits
//! - [`env`] — driving environment interface and step types
//! - [`checkpoint`] — checkpoint paths and atomic persistence
//! - [`noise`] — Ornstein-Uhlenbeck exploration noise
//! - [`sim`] — simulated environment and stand-in collaborators
//! - [`mock`] — recording collaborators for tests
//! - [`config`] — TOML configuration loading and validation
//! - [`error`] — structured error types

pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod controller;
pub mod env;
pub mod error;
pub mod mock;
pub mod noise;
pub mod sim;

pub use agent::{Perception, Policy, SharedPerception};
pub use config::ControllerConfig;
pub use controller::Controller;
pub use env::DrivingEnv;
pub use error::{CheckpointError, ConfigError, ControllerError};
