//! Episode clock, terminal outcomes and the end-of-episode signal.

use bevy::prelude::{Entity, Message, Resource, info};
use serde::{Deserialize, Serialize};

/// Wall-clock budget of one episode, measured on the fixed simulation clock.
/// Timestamps are `f64` so the deadline stays exact on long runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeClock {
    start: f64,
    timeout: f32,
}

impl EpisodeClock {
    pub fn new(timeout: f32, now: f64) -> Self {
        Self {
            start: now,
            timeout,
        }
    }

    pub fn restart(&mut self, now: f64) {
        self.start = now;
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn timeout(&self) -> f32 {
        self.timeout
    }

    pub fn elapsed(&self, now: f64) -> f32 {
        (now - self.start) as f32
    }

    /// Strictly past the deadline.
    pub fn is_expired(&self, now: f64) -> bool {
        now > self.start + f64::from(self.timeout)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeOutcome {
    ReachedGoal,
    FellOff,
    TimedOut,
}

/// Sent once for every finished episode, before the agent is reset.
#[derive(Message, Clone, Debug)]
pub struct EpisodeEnded {
    pub agent: Entity,
    pub outcome: EpisodeOutcome,
    /// Reward of the final tick, terminal reward included.
    pub final_reward: f32,
    pub cumulative_reward: f32,
    pub steps: u32,
}

/// Running totals over every agent in the app.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct EpisodeStats {
    pub episodes: u32,
    pub goals: u32,
    pub falls: u32,
    pub timeouts: u32,
    pub total_reward: f32,
}

impl EpisodeStats {
    pub fn record(&mut self, ended: &EpisodeEnded) {
        self.episodes += 1;
        self.total_reward += ended.cumulative_reward;
        match ended.outcome {
            EpisodeOutcome::ReachedGoal => self.goals += 1,
            EpisodeOutcome::FellOff => self.falls += 1,
            EpisodeOutcome::TimedOut => self.timeouts += 1,
        }
    }

    pub fn mean_reward(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.total_reward / self.episodes as f32
        }
    }

    pub fn success_rate(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.goals as f32 / self.episodes as f32
        }
    }

    pub fn log_summary(&self) {
        info!(
            "Episodes {}: goals {} falls {} timeouts {} | success {:.1}% mean reward {:.3}",
            self.episodes,
            self.goals,
            self.falls,
            self.timeouts,
            self.success_rate() * 100.0,
            self.mean_reward()
        );
    }
}
