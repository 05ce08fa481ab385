use std::thread;
use std::time::Duration;

use crate::agent::{Policy, SharedPerception};
use crate::checkpoint::{self, CheckpointPair};
use crate::config::ControllerConfig;
use crate::env::DrivingEnv;
use crate::error::ControllerError;

const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Operator-facing status line, highlighted on the vehicle console.
fn status(msg: &str) {
    println!("{GREEN}{msg}{RESET}");
}

/// The control loop.
///
/// Owns the environment and the policy, shares the perception module with
/// the environment, and dispatches between training and testing sessions
/// based on the environment's mode flags. Collaborators are injected at
/// construction and never rebound; model refresh goes through their
/// in-place `load`.
pub struct Controller<E, P> {
    env: E,
    policy: P,
    perception: SharedPerception,
    checkpoints: CheckpointPair,
    skip_episodes: usize,
    interval: Duration,
}

impl<E, P> Controller<E, P>
where
    E: DrivingEnv,
    P: Policy,
{
    /// Build the controller, validating the model directory and loading
    /// precompiled models when both checkpoint files are present.
    ///
    /// A missing model directory is the single fatal startup error and is
    /// raised before any collaborator is touched. When precompiled models
    /// load, the warm-up skip count drops to zero; the buffers they were
    /// trained with are already diverse.
    pub fn new(
        config: &ControllerConfig,
        env: E,
        mut policy: P,
        perception: SharedPerception,
    ) -> Result<Self, ControllerError> {
        let checkpoints = CheckpointPair::new(&config.model_dir)?;

        let mut skip_episodes = config.ddpg.skip_episodes;
        if checkpoints.both_exist() {
            policy
                .load(checkpoints.policy_path())
                .map_err(ControllerError::Policy)?;
            perception
                .borrow_mut()
                .load(checkpoints.perception_path())
                .map_err(ControllerError::Perception)?;
            skip_episodes = 0;
            println!(
                "Loaded precompiled models from {}",
                config.model_dir.display()
            );
        } else {
            println!("Initialized empty models.");
        }

        Ok(Controller {
            env,
            policy,
            perception,
            checkpoints,
            skip_episodes,
            interval: config.control_interval(),
        })
    }

    /// Remaining warm-up episodes before policy optimization starts.
    pub fn skip_episodes(&self) -> usize {
        self.skip_episodes
    }

    /// Run forever, dispatching on the current mode flag.
    ///
    /// The controller is a long-lived on-vehicle process: there is no exit
    /// condition, only process termination.
    pub fn run(&mut self) -> Result<(), ControllerError> {
        println!("EagleMK4 neural network controller is loaded!");
        println!("1. Press triangle to select a task.");
        println!("2. Press the right bumper to start the task.");
        self.wait_autopilot();

        loop {
            if self.env.is_training() {
                self.run_training()?;
            } else if self.env.is_testing() {
                self.run_testing()?;
            } else {
                thread::sleep(self.interval);
            }
        }
    }

    /// One training session: episodes until the operator leaves training
    /// mode, then checkpoint persistence.
    ///
    /// Episodes up to the skip count only collect data; the perception
    /// buffer needs diverse frames before parameter updates are worthwhile.
    /// Between episodes the loop blocks until the operator re-arms
    /// autopilot. Both collaborators are persisted exactly once on exit, no
    /// matter how many episodes ran.
    pub fn run_training(&mut self) -> Result<(), ControllerError> {
        let mut episode: usize = 1;

        status("Training started");
        while self.env.is_training() {
            let optimize = episode > self.skip_episodes;
            self.policy
                .learn(&mut self.env, &self.perception, optimize)
                .map_err(ControllerError::Policy)?;
            episode += 1;
            status("Ready for new episode");
            self.wait_autopilot();
        }

        checkpoint::write_atomic(self.checkpoints.policy_path(), |tmp| self.policy.save(tmp))?;
        checkpoint::write_atomic(self.checkpoints.perception_path(), |tmp| {
            self.perception.borrow().save(tmp)
        })?;
        status("Training finished");
        Ok(())
    }

    /// One testing session: reload the persisted models and evaluate them
    /// episode by episode until the operator leaves testing mode.
    ///
    /// Without both checkpoint files there is nothing to evaluate; the loop
    /// idles at the control cadence until the mode changes.
    pub fn run_testing(&mut self) -> Result<(), ControllerError> {
        status("Testing started");
        if self.checkpoints.both_exist() {
            self.policy
                .load(self.checkpoints.policy_path())
                .map_err(ControllerError::Policy)?;
            self.perception
                .borrow_mut()
                .load(self.checkpoints.perception_path())
                .map_err(ControllerError::Perception)?;

            while self.env.is_testing() {
                // Reset blocks until the operator arms autopilot.
                let mut obs = self.env.reset().map_err(ControllerError::Env)?;
                loop {
                    thread::sleep(self.interval);
                    let action = self.policy.predict(&obs);
                    let step = self.env.step(&action).map_err(ControllerError::Env)?;
                    println!("{action:?}");
                    obs = step.obs;
                    if step.done {
                        println!("Testing episode finished.");
                        break;
                    }
                }
            }
        } else {
            println!(
                "No precompiled models found. Run training first: press \
                 triangle to select the training task, then press and hold \
                 the right bumper. Releasing the right bumper ends the episode."
            );
            while self.env.is_testing() {
                thread::sleep(self.interval);
            }
        }
        status("Testing finished");
        Ok(())
    }

    /// Block until the operator arms autopilot, polling at the control
    /// cadence. The only synchronization primitive in the system.
    fn wait_autopilot(&self) {
        loop {
            thread::sleep(self.interval);
            if self.env.is_autopilot() {
                return;
            }
        }
    }
}
