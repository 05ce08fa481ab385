//! Simulated environment and stand-in collaborators, so the binary and the
//! integration tests can drive the full control loop without a vehicle.

use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::agent::{Perception, Policy, SharedPerception};
use crate::config::ImageConfig;
use crate::env::{Action, DrivingEnv, ImageFrame, Observation, Step};
use crate::noise::OuNoise;

/// Width of the latent vector the stand-in encoder produces.
pub const LATENT_DIM: usize = 32;

const ACTION_DIMS: usize = 2; // steering, throttle

/// Perception stand-in: bounded ring buffer of raw frames plus a
/// deterministic band-averaging encoder.
pub struct FrameBufferPerception {
    latent_dim: usize,
    buffer: VecDeque<ImageFrame>,
    buffer_size: usize,
    frames_seen: u64,
    fits: u64,
}

#[derive(Serialize, Deserialize)]
struct PerceptionState {
    latent_dim: usize,
    frames_seen: u64,
    fits: u64,
}

impl FrameBufferPerception {
    pub fn new(latent_dim: usize, buffer_size: usize) -> Self {
        FrameBufferPerception {
            latent_dim,
            buffer: VecDeque::with_capacity(buffer_size),
            buffer_size,
            frames_seen: 0,
            fits: 0,
        }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn fits(&self) -> u64 {
        self.fits
    }
}

impl Perception for FrameBufferPerception {
    fn encode(&mut self, frame: &ImageFrame) -> Observation {
        if self.buffer.len() == self.buffer_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(frame.clone());
        self.frames_seen += 1;

        // Average pixel bands into a fixed-width latent.
        let mut latent = vec![0.0f32; self.latent_dim];
        if frame.data.is_empty() {
            return latent;
        }
        let band = frame.data.len().div_ceil(self.latent_dim);
        for (slot, chunk) in latent.iter_mut().zip(frame.data.chunks(band)) {
            let sum: u64 = chunk.iter().map(|&b| b as u64).sum();
            *slot = sum as f32 / (chunk.len() as f32 * 255.0);
        }
        latent
    }

    fn optimize(&mut self) -> Result<()> {
        self.fits += 1;
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer(
            file,
            &PerceptionState {
                latent_dim: self.latent_dim,
                frames_seen: self.frames_seen,
                fits: self.fits,
            },
        )?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let file =
            File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let state: PerceptionState = serde_json::from_reader(file)?;
        self.latent_dim = state.latent_dim;
        self.frames_seen = state.frames_seen;
        self.fits = state.fits;
        self.buffer.clear();
        Ok(())
    }
}

/// Policy stand-in: Ornstein-Uhlenbeck exploration with no learning.
pub struct RandomPolicy {
    noise: OuNoise,
    episodes: u64,
    optimized_episodes: u64,
}

#[derive(Serialize, Deserialize)]
struct PolicyState {
    episodes: u64,
    optimized_episodes: u64,
}

impl RandomPolicy {
    pub fn new(noise_theta: f64, noise_sigma: f64) -> Self {
        RandomPolicy {
            noise: OuNoise::new(ACTION_DIMS, noise_theta, noise_sigma),
            episodes: 0,
            optimized_episodes: 0,
        }
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    fn sample_action(&mut self) -> Action {
        self.noise
            .sample()
            .iter()
            .map(|&x| (x as f32).clamp(-1.0, 1.0))
            .collect()
    }
}

impl Policy for RandomPolicy {
    fn learn(
        &mut self,
        env: &mut dyn DrivingEnv,
        perception: &SharedPerception,
        optimize: bool,
    ) -> Result<()> {
        self.noise.reset();
        env.reset()?;
        loop {
            let action = self.sample_action();
            let step = env.step(&action)?;
            if step.done {
                break;
            }
        }
        self.episodes += 1;
        if optimize {
            perception.borrow_mut().optimize()?;
            self.optimized_episodes += 1;
        }
        Ok(())
    }

    fn predict(&mut self, _obs: &Observation) -> Action {
        self.sample_action()
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer(
            file,
            &PolicyState {
                episodes: self.episodes,
                optimized_episodes: self.optimized_episodes,
            },
        )?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let file =
            File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let state: PolicyState = serde_json::from_reader(file)?;
        self.episodes = state.episodes;
        self.optimized_episodes = state.optimized_episodes;
        self.noise.reset();
        Ok(())
    }
}

/// Simulated vehicle with a scripted operator.
///
/// The operator keeps autopilot armed, runs a budgeted number of training
/// episodes, then the same for testing, then releases both task selections
/// and the controller idles. Camera frames are procedural; they flow through
/// the shared perception module exactly as on the vehicle.
pub struct SimEnv {
    perception: SharedPerception,
    image: ImageConfig,
    episode_steps: usize,
    step_in_episode: usize,
    tick: u64,
    remaining_training: usize,
    remaining_testing: usize,
}

impl SimEnv {
    pub fn new(
        perception: SharedPerception,
        image: ImageConfig,
        episode_steps: usize,
        train_episodes: usize,
        test_episodes: usize,
    ) -> Self {
        SimEnv {
            perception,
            image,
            episode_steps,
            step_in_episode: 0,
            tick: 0,
            remaining_training: train_episodes,
            remaining_testing: test_episodes,
        }
    }

    fn frame(&self) -> ImageFrame {
        let len = self.image.height * self.image.width * self.image.channels;
        let data = (0..len)
            .map(|i| ((i as u64).wrapping_mul(31).wrapping_add(self.tick * 7) % 256) as u8)
            .collect();
        ImageFrame::new(self.image.height, self.image.width, self.image.channels, data)
    }

    fn encode_current(&mut self) -> Observation {
        let frame = self.frame();
        self.perception.borrow_mut().encode(&frame)
    }
}

impl DrivingEnv for SimEnv {
    fn is_training(&self) -> bool {
        self.remaining_training > 0
    }

    fn is_testing(&self) -> bool {
        self.remaining_training == 0 && self.remaining_testing > 0
    }

    fn is_autopilot(&self) -> bool {
        // The scripted operator keeps the bumper held.
        true
    }

    fn reset(&mut self) -> Result<Observation> {
        self.step_in_episode = 0;
        self.tick += 1;
        Ok(self.encode_current())
    }

    fn step(&mut self, action: &Action) -> Result<Step> {
        self.tick += 1;
        self.step_in_episode += 1;

        let steer = action.first().copied().unwrap_or(0.0) as f64;
        let throttle = action.get(1).copied().unwrap_or(0.0) as f64;
        let done = self.step_in_episode >= self.episode_steps;
        if done {
            if self.remaining_training > 0 {
                self.remaining_training -= 1;
            } else if self.remaining_testing > 0 {
                self.remaining_testing -= 1;
            }
        }

        Ok(Step {
            obs: self.encode_current(),
            reward: throttle - 0.1 * steer.abs(),
            done,
            info: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_frame(fill: u8) -> ImageFrame {
        ImageFrame::new(4, 8, 3, vec![fill; 4 * 8 * 3])
    }

    #[test]
    fn test_encode_latent_width_and_buffering() {
        let mut p = FrameBufferPerception::new(LATENT_DIM, 3);
        for i in 0..5 {
            let latent = p.encode(&test_frame(i));
            assert_eq!(latent.len(), LATENT_DIM);
        }
        // Ring buffer caps at capacity, lifetime count does not.
        assert_eq!(p.buffered(), 3);
        assert_eq!(p.frames_seen(), 5);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let mut p = FrameBufferPerception::new(LATENT_DIM, 10);
        let a = p.encode(&test_frame(128));
        let b = p.encode(&test_frame(128));
        assert_eq!(a, b);
    }

    #[test]
    fn test_perception_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vae.ckpt");

        let mut p = FrameBufferPerception::new(LATENT_DIM, 10);
        p.encode(&test_frame(1));
        p.encode(&test_frame(2));
        p.optimize().unwrap();
        p.save(&path).unwrap();

        let mut restored = FrameBufferPerception::new(LATENT_DIM, 10);
        restored.load(&path).unwrap();
        assert_eq!(restored.frames_seen(), 2);
        assert_eq!(restored.fits(), 1);
        assert_eq!(restored.buffered(), 0);
    }

    #[test]
    fn test_policy_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ddpg.pkl");

        let perception: SharedPerception = Rc::new(RefCell::new(
            FrameBufferPerception::new(LATENT_DIM, 10),
        ));
        let mut env = SimEnv::new(
            perception.clone(),
            ImageConfig::default(),
            4,
            2,
            0,
        );

        let mut policy = RandomPolicy::new(0.6, 0.2);
        policy.learn(&mut env, &perception, false).unwrap();
        policy.learn(&mut env, &perception, true).unwrap();
        policy.save(&path).unwrap();

        let mut restored = RandomPolicy::new(0.6, 0.2);
        restored.load(&path).unwrap();
        assert_eq!(restored.episodes(), 2);
    }

    #[test]
    fn test_sim_mode_progression() {
        let perception: SharedPerception = Rc::new(RefCell::new(
            FrameBufferPerception::new(LATENT_DIM, 10),
        ));
        let mut env = SimEnv::new(perception.clone(), ImageConfig::default(), 3, 1, 1);
        assert!(env.is_training());
        assert!(!env.is_testing());

        let mut policy = RandomPolicy::new(0.6, 0.2);
        policy.learn(&mut env, &perception, false).unwrap();
        assert!(!env.is_training());
        assert!(env.is_testing());

        // Drive the single testing episode to completion.
        env.reset().unwrap();
        loop {
            let step = env.step(&vec![0.0, 0.5]).unwrap();
            if step.done {
                break;
            }
        }
        assert!(!env.is_testing());
    }

    #[test]
    fn test_predict_actions_are_clamped() {
        let mut policy = RandomPolicy::new(0.6, 5.0);
        for _ in 0..100 {
            let action = policy.predict(&vec![0.0; LATENT_DIM]);
            assert_eq!(action.len(), ACTION_DIMS);
            assert!(action.iter().all(|a| (-1.0..=1.0).contains(a)));
        }
    }
}
