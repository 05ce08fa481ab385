use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;

use eaglemk4_controller::sim::{FrameBufferPerception, RandomPolicy, SimEnv, LATENT_DIM};
use eaglemk4_controller::{Controller, ControllerConfig, SharedPerception};

/// EagleMK4 neural network controller, driving a simulated vehicle.
#[derive(Parser)]
#[command(name = "eaglemk4-controller", about = "EagleMK4 neural network controller")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the model directory (must exist)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Override the number of warm-up episodes without policy optimization
    #[arg(long)]
    skip_episodes: Option<usize>,

    /// Training episodes the simulated operator schedules
    #[arg(long, default_value_t = 3)]
    train_episodes: usize,

    /// Testing episodes the simulated operator schedules
    #[arg(long, default_value_t = 2)]
    test_episodes: usize,

    /// Steps per simulated episode
    #[arg(long, default_value_t = 100)]
    episode_steps: usize,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.dump_config {
        print!("{}", ControllerConfig::default_toml());
        return Ok(());
    }

    // Load configuration
    let mut config = ControllerConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(model_dir) = cli.model_dir {
        config.model_dir = model_dir;
    }
    if let Some(skip) = cli.skip_episodes {
        config.ddpg.skip_episodes = skip;
    }

    let perception: SharedPerception = Rc::new(RefCell::new(FrameBufferPerception::new(
        LATENT_DIM,
        config.vae.buffer_size,
    )));
    let env = SimEnv::new(
        perception.clone(),
        config.image.clone(),
        cli.episode_steps,
        cli.train_episodes,
        cli.test_episodes,
    );
    let policy = RandomPolicy::new(config.ddpg.noise_theta, config.ddpg.noise_sigma);

    let mut controller = Controller::new(&config, env, policy, perception)?;

    // Runs until the process is terminated.
    controller.run()?;
    Ok(())
}
