//! Engine-agnostic control loop of one wall-jump agent.
//!
//! The host calls, once per fixed tick and in this order:
//! [`AgentController::observe`], [`AgentController::act`],
//! [`AgentController::resolve`], then [`AgentController::on_reset`] if
//! `resolve` reported a terminal outcome. Reward for the tick is collected
//! with [`AgentController::take_reward`].

use bevy::prelude::{Dir3, Entity, Quat, Vec3, debug, warn};

use crate::action::AgentAction;
use crate::episode::{EpisodeClock, EpisodeOutcome};
use crate::ground::{GroundContacts, GroundProbe, detect_ground_contacts, fine_ground_check};
use crate::movement::{desired_direction, rotate_body, steer_towards, yaw_delta};
use crate::observation::Observation;
use crate::reward::{
    EXPLORATION_BONUS, FELL_REWARD, GOAL_REWARD, REVISIT_PENALTY, RewardAccumulator,
    TIME_PENALTY, TIMEOUT_PENALTY, climb_reward, goal_distance_reward,
};
use crate::settings::WallJumpSettings;
use crate::visitation::{Visit, VisitationGrid};

/// The body is considered off the level when nothing lies this far below it.
pub const FALL_PROBE_DISTANCE: f32 = 20.0;

/// Rigid-body state read from the engine before a tick and written back after.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyState {
    pub entity: Entity,
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub center_of_mass: Vec3,
}

impl BodyState {
    pub fn at_rest(entity: Entity, position: Vec3) -> Self {
        Self {
            entity,
            position,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            center_of_mass: position,
        }
    }

    /// Instantaneous change of velocity, independent of mass and tick length.
    pub fn apply_velocity_change(&mut self, delta: Vec3) {
        self.linear_velocity += delta;
    }

    pub fn apply_acceleration(&mut self, acceleration: Vec3, dt: f32) {
        self.linear_velocity += acceleration * dt;
    }
}

/// Fixed reference points of the training area, in world space except for
/// the goal which is expressed in the area's local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelAnchors {
    pub area_origin: Vec3,
    pub ground_reference: Vec3,
    pub goal_local: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct JumpState {
    /// Counts down every tick, never clamped. A jump is active while positive.
    pub remaining: f32,
    pub start: Vec3,
    pub target: Vec3,
}

impl JumpState {
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentController {
    settings: WallJumpSettings,
    anchors: LevelAnchors,
    jump: JumpState,
    grid: VisitationGrid,
    clock: EpisodeClock,
    rewards: RewardAccumulator,
    contacts: GroundContacts,
    steps: u32,
    out_of_bounds: bool,
}

impl AgentController {
    pub fn new(settings: WallJumpSettings, anchors: LevelAnchors, now: f64) -> Self {
        let clock = EpisodeClock::new(settings.environment_timeout, now);
        Self {
            settings,
            anchors,
            jump: JumpState::default(),
            grid: VisitationGrid::default(),
            clock,
            rewards: RewardAccumulator::default(),
            contacts: GroundContacts::default(),
            steps: 0,
            out_of_bounds: false,
        }
    }

    pub fn settings(&self) -> &WallJumpSettings {
        &self.settings
    }

    pub fn anchors(&self) -> &LevelAnchors {
        &self.anchors
    }

    pub fn jump(&self) -> &JumpState {
        &self.jump
    }

    pub fn grid(&self) -> &VisitationGrid {
        &self.grid
    }

    pub fn clock(&self) -> &EpisodeClock {
        &self.clock
    }

    pub fn rewards(&self) -> &RewardAccumulator {
        &self.rewards
    }

    /// Ground contacts computed by the last [`Self::act`].
    pub fn contacts(&self) -> GroundContacts {
        self.contacts
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn local_position(&self, body: &BodyState) -> Vec3 {
        body.position - self.anchors.area_origin
    }

    pub fn observe(&self, body: &BodyState, probe: &impl GroundProbe) -> Observation {
        Observation::build(
            body.position,
            self.anchors.ground_reference,
            fine_ground_check(probe, body.position),
        )
    }

    /// Apply one decision: shape the reward, then drive the body.
    pub fn act(
        &mut self,
        action: &AgentAction,
        body: &mut BodyState,
        probe: &impl GroundProbe,
        dt: f32,
    ) {
        self.steps += 1;
        self.rewards.add(TIME_PENALTY);

        self.contacts = detect_ground_contacts(probe, body.entity, body.position, body.rotation);
        let GroundContacts {
            coarse: large_grounded,
            fine: small_grounded,
        } = self.contacts;

        let height = body.position.y - self.anchors.ground_reference.y;
        self.rewards.add(climb_reward(height));

        let local_position = self.local_position(body);
        self.rewards
            .add(goal_distance_reward(local_position, self.anchors.goal_local));
        self.reward_visitation(local_position);

        let direction = desired_direction(action, body.rotation, large_grounded);

        if action.wants_jump() && !self.jump.is_active() && small_grounded {
            self.begin_jump(body.position);
        }

        let yaw = yaw_delta(action.rotate, self.settings.rotation_speed_degrees, dt);
        body.rotation = rotate_body(body.rotation, yaw);

        // Steering sees the velocity before this tick's run impulse.
        if self.jump.is_active() {
            self.jump.target = Vec3::new(
                body.position.x,
                self.jump.start.y + self.settings.agent_jump_height,
                body.position.z,
            ) + direction;
            if let Some(velocity) = steer_towards(
                self.jump.target,
                body.center_of_mass,
                body.linear_velocity,
                self.settings.agent_jump_velocity,
                self.settings.agent_jump_velocity_max_change,
                dt,
            ) {
                body.linear_velocity = velocity;
            }
        } else if !large_grounded {
            body.apply_acceleration(Vec3::NEG_Y * self.settings.falling_force, dt);
        }
        body.apply_velocity_change(direction * self.settings.agent_run_speed);

        self.jump.remaining -= dt;
    }

    fn begin_jump(&mut self, position: Vec3) {
        self.jump.remaining = self.settings.jump_duration;
        self.jump.start = position;
        debug!("Jump started at {:?}", position);
    }

    fn reward_visitation(&mut self, local_position: Vec3) {
        match self.grid.visit_position(local_position) {
            Ok(Visit::First) => {
                self.out_of_bounds = false;
                self.rewards.add(EXPLORATION_BONUS);
            }
            Ok(Visit::Repeat) => {
                self.out_of_bounds = false;
                self.rewards.add(REVISIT_PENALTY);
            }
            Err(err) => {
                if !self.out_of_bounds {
                    warn!("Skipping exploration reward: {err}");
                }
                self.out_of_bounds = true;
            }
        }
    }

    /// Goal contact ends the episode with its reward replacing the tick's.
    pub fn on_goal_contact(&mut self) -> EpisodeOutcome {
        self.rewards.set(GOAL_REWARD);
        EpisodeOutcome::ReachedGoal
    }

    pub fn has_fallen(&self, body: &BodyState, probe: &impl GroundProbe) -> bool {
        probe
            .cast_ray(body.position, Dir3::NEG_Y, FALL_PROBE_DISTANCE)
            .is_none()
    }

    /// Fires the timeout penalty and restarts the clock at `now`.
    pub fn check_timeout(&mut self, now: f64) -> Option<EpisodeOutcome> {
        if !self.clock.is_expired(now) {
            return None;
        }
        self.rewards.add(TIMEOUT_PENALTY);
        self.clock.restart(now);
        Some(EpisodeOutcome::TimedOut)
    }

    /// Decide whether the episode ends this tick. At most one outcome is
    /// reported: goal, then falling, then timeout.
    pub fn resolve(
        &mut self,
        body: &BodyState,
        probe: &impl GroundProbe,
        goal_contact: bool,
        now: f64,
    ) -> Option<EpisodeOutcome> {
        if goal_contact {
            return Some(self.on_goal_contact());
        }
        if self.has_fallen(body, probe) {
            self.rewards.set(FELL_REWARD);
            return Some(EpisodeOutcome::FellOff);
        }
        self.check_timeout(now)
    }

    pub fn take_reward(&mut self) -> f32 {
        self.rewards.take()
    }

    /// Put the body back on the spawn point and forget the episode.
    pub fn on_reset(&mut self, body: &mut BodyState, now: f64) {
        body.position = self.anchors.area_origin + self.settings.spawn_point;
        body.center_of_mass = body.position;
        body.linear_velocity = Vec3::ZERO;
        body.angular_velocity = Vec3::ZERO;

        self.grid.clear();
        self.clock.restart(now);
        self.jump = JumpState::default();
        self.rewards = RewardAccumulator::default();
        self.contacts = GroundContacts::default();
        self.steps = 0;
        self.out_of_bounds = false;
    }
}
