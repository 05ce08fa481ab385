//! Recording collaborators for orchestration tests.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;

use crate::agent::{Perception, Policy, SharedPerception};
use crate::env::{Action, DrivingEnv, ImageFrame, Observation, Step};

/// Interaction counts kept outside the environment so tests can inspect
/// them after the instance moves into the controller.
#[derive(Default)]
pub struct EnvCounters {
    pub resets: Cell<usize>,
    pub steps: Cell<usize>,
    pub autopilot_polls: Cell<usize>,
}

/// Environment with a scripted operator: answers "training" for a budgeted
/// number of polls, then "testing" for another, then neither.
pub struct ScriptedEnv {
    training_budget: Cell<usize>,
    testing_budget: Cell<usize>,
    /// Autopilot polls answered false before the operator "arms".
    pub autopilot_delay: Cell<usize>,
    episode_steps: usize,
    step_in_episode: usize,
    counters: Rc<EnvCounters>,
}

impl ScriptedEnv {
    pub fn new(
        training_polls: usize,
        testing_polls: usize,
        episode_steps: usize,
    ) -> (Self, Rc<EnvCounters>) {
        let counters = Rc::new(EnvCounters::default());
        let env = ScriptedEnv {
            training_budget: Cell::new(training_polls),
            testing_budget: Cell::new(testing_polls),
            autopilot_delay: Cell::new(0),
            episode_steps,
            step_in_episode: 0,
            counters: counters.clone(),
        };
        (env, counters)
    }
}

impl DrivingEnv for ScriptedEnv {
    fn is_training(&self) -> bool {
        let n = self.training_budget.get();
        if n > 0 {
            self.training_budget.set(n - 1);
            true
        } else {
            false
        }
    }

    fn is_testing(&self) -> bool {
        let n = self.testing_budget.get();
        if n > 0 {
            self.testing_budget.set(n - 1);
            true
        } else {
            false
        }
    }

    fn is_autopilot(&self) -> bool {
        self.counters
            .autopilot_polls
            .set(self.counters.autopilot_polls.get() + 1);
        let delay = self.autopilot_delay.get();
        if delay > 0 {
            self.autopilot_delay.set(delay - 1);
            false
        } else {
            true
        }
    }

    fn reset(&mut self) -> Result<Observation> {
        self.counters.resets.set(self.counters.resets.get() + 1);
        self.step_in_episode = 0;
        Ok(vec![0.0; 4])
    }

    fn step(&mut self, _action: &Action) -> Result<Step> {
        self.counters.steps.set(self.counters.steps.get() + 1);
        self.step_in_episode += 1;
        Ok(Step {
            obs: vec![self.step_in_episode as f32; 4],
            reward: 0.0,
            done: self.step_in_episode >= self.episode_steps,
            info: None,
        })
    }
}

#[derive(Default)]
pub struct PolicyCounters {
    /// `optimize` flag of each `learn` invocation, in order.
    pub learns: RefCell<Vec<bool>>,
    pub predicts: Cell<usize>,
    pub saves: Cell<usize>,
    pub loads: Cell<usize>,
}

/// Policy that records every interaction and writes real checkpoint bytes.
pub struct RecordingPolicy {
    counters: Rc<PolicyCounters>,
}

impl RecordingPolicy {
    pub fn new() -> (Self, Rc<PolicyCounters>) {
        let counters = Rc::new(PolicyCounters::default());
        (
            RecordingPolicy {
                counters: counters.clone(),
            },
            counters,
        )
    }
}

impl Policy for RecordingPolicy {
    fn learn(
        &mut self,
        _env: &mut dyn DrivingEnv,
        _perception: &SharedPerception,
        optimize: bool,
    ) -> Result<()> {
        self.counters.learns.borrow_mut().push(optimize);
        Ok(())
    }

    fn predict(&mut self, _obs: &Observation) -> Action {
        self.counters.predicts.set(self.counters.predicts.get() + 1);
        vec![0.0, 0.0]
    }

    fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, b"policy-checkpoint")?;
        self.counters.saves.set(self.counters.saves.get() + 1);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        fs::read(path)?;
        self.counters.loads.set(self.counters.loads.get() + 1);
        Ok(())
    }
}

#[derive(Default)]
pub struct PerceptionCounters {
    pub encodes: Cell<usize>,
    pub optimizes: Cell<usize>,
    pub saves: Cell<usize>,
    pub loads: Cell<usize>,
}

/// Perception stand-in that records every interaction.
pub struct RecordingPerception {
    counters: Rc<PerceptionCounters>,
}

impl RecordingPerception {
    pub fn new() -> (Self, Rc<PerceptionCounters>) {
        let counters = Rc::new(PerceptionCounters::default());
        (
            RecordingPerception {
                counters: counters.clone(),
            },
            counters,
        )
    }

    /// Wrap into the shared handle the controller and environment expect.
    pub fn shared(self) -> SharedPerception {
        Rc::new(RefCell::new(self))
    }
}

impl Perception for RecordingPerception {
    fn encode(&mut self, _frame: &ImageFrame) -> Observation {
        self.counters.encodes.set(self.counters.encodes.get() + 1);
        vec![0.0; 4]
    }

    fn optimize(&mut self) -> Result<()> {
        self.counters
            .optimizes
            .set(self.counters.optimizes.get() + 1);
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, b"perception-checkpoint")?;
        self.counters.saves.set(self.counters.saves.get() + 1);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        fs::read(path)?;
        self.counters.loads.set(self.counters.loads.get() + 1);
        Ok(())
    }
}
