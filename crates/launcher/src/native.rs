use bevy::log::warn;
use clap::{Parser, ValueEnum};
use walljump::{DecisionSource, WallJumpSettings};

use crate::app::{LaunchOptions, create_training_app};

#[derive(Parser, Debug)]
#[command(name = "walljump")]
#[command(version = "0.1")]
#[command(about = "Wall-jump agent training launcher")]
#[command(long_about = "
Wall-jump agent training launcher

EXAMPLES:
    cargo run --bin launcher -- --policy heuristic                      # Drive the agent with W/A/S/D + Space
    cargo run --bin launcher -- --headless --policy random --episodes 500 --seed 7
    cargo run --bin launcher -- --headless --areas 8 --timeout 20      # Several areas for an external trainer
")]
struct Cli {
    #[arg(long, default_value_t = false)]
    headless: bool,

    #[arg(long, value_enum, default_value_t = Policy::External)]
    policy: Policy,

    #[arg(long, default_value_t = 1)]
    #[arg(help = "Number of training areas, each with its own agent")]
    areas: usize,

    #[arg(long)]
    #[arg(help = "Exit after this many episodes")]
    episodes: Option<u32>,

    #[arg(long)]
    #[arg(help = "Seed for the random policy")]
    seed: Option<u64>,

    #[arg(long)]
    run_speed: Option<f32>,

    #[arg(long)]
    jump_height: Option<f32>,

    #[arg(long)]
    #[arg(help = "Episode timeout in seconds")]
    timeout: Option<f32>,

    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Policy {
    Heuristic,
    Random,
    External,
}

impl From<Policy> for DecisionSource {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Heuristic => DecisionSource::Heuristic,
            Policy::Random => DecisionSource::Random,
            Policy::External => DecisionSource::External,
        }
    }
}

impl Cli {
    fn settings(&self) -> WallJumpSettings {
        let mut settings = WallJumpSettings::default();
        if let Some(run_speed) = self.run_speed {
            settings = settings.with_run_speed(run_speed);
        }
        if let Some(jump_height) = self.jump_height {
            settings = settings.with_jump_height(jump_height);
        }
        if let Some(timeout) = self.timeout {
            settings = settings.with_timeout(timeout);
        }
        settings
    }

    fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            headless: self.headless,
            decision_source: self.policy.into(),
            areas: self.areas,
            episodes: self.episodes,
            seed: self.seed,
            settings: self.settings(),
            log_filter: Some(self.log_filter.clone()),
        }
    }
}

pub fn run() {
    let cli = Cli::parse();
    let mut app = create_training_app(cli.launch_options());
    if cli.headless && cli.policy == Policy::Heuristic {
        warn!("Heuristic policy without a window: agents will stand still");
    }
    app.run();
}
