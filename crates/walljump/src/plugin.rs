//! Bevy adapter: runs every [`AgentController`] once per fixed tick against
//! Avian's spatial queries and rigid-body components.

use avian3d::prelude::{
    AngularVelocity, CollidingEntities, LinearVelocity, Position, Rotation, SpatialQueryPipeline,
};
use bevy::prelude::{
    App, Commands, Component, Entity, Fixed, FixedUpdate, IntoScheduleConfigs, MessageReader,
    MessageWriter, Plugin, Query, Res, ResMut, Resource, Startup, SystemSet, Time, Update, debug,
    info,
};
use leafwing_input_manager::prelude::ActionState;

use crate::action::AgentAction;
use crate::controller::{AgentController, BodyState};
use crate::episode::{EpisodeEnded, EpisodeOutcome, EpisodeStats};
use crate::ground::{AvianGroundProbe, SurfaceTag};
use crate::level::{attach_level_meshes, spawn_training_area};
use crate::observation::Observation;
use crate::policy::{
    AgentInput, DecisionSource, HeuristicKeys, PolicyRng, heuristic_action, random_action,
};
use crate::settings::WallJumpSettings;

/// Log the running statistics every this many episodes.
pub const STATS_LOG_INTERVAL: u32 = 100;

/// Ordered stages of one agent tick. Hosts driving agents externally write
/// [`AgentAction`] in [`WallJumpSystems::Decide`].
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallJumpSystems {
    Observe,
    Decide,
    Act,
    Resolve,
}

pub struct WallJumpPlugin {
    pub settings: WallJumpSettings,
    /// Training areas spawned at startup. Zero leaves spawning to the host.
    pub areas: usize,
    pub decision_source: DecisionSource,
}

impl Default for WallJumpPlugin {
    fn default() -> Self {
        Self {
            settings: WallJumpSettings::default(),
            areas: 1,
            decision_source: DecisionSource::default(),
        }
    }
}

#[derive(Resource, Clone, Copy, Debug)]
struct TrainingLayout {
    areas: usize,
    decision_source: DecisionSource,
}

impl Plugin for WallJumpPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .insert_resource(TrainingLayout {
                areas: self.areas,
                decision_source: self.decision_source,
            })
            .init_resource::<EpisodeStats>()
            .init_resource::<PolicyRng>()
            .add_message::<EpisodeEnded>()
            .configure_sets(
                FixedUpdate,
                (
                    WallJumpSystems::Observe,
                    WallJumpSystems::Decide,
                    WallJumpSystems::Act,
                    WallJumpSystems::Resolve,
                )
                    .chain(),
            )
            .add_systems(Startup, setup_training_areas)
            .add_systems(
                FixedUpdate,
                (
                    collect_observations.in_set(WallJumpSystems::Observe),
                    (heuristic_decisions, random_decisions).in_set(WallJumpSystems::Decide),
                    apply_agent_actions.in_set(WallJumpSystems::Act),
                    (resolve_episodes, record_episode_stats)
                        .chain()
                        .in_set(WallJumpSystems::Resolve),
                ),
            )
            .add_systems(Update, attach_level_meshes);
    }
}

#[derive(Component, Clone, Debug)]
pub struct WallJumpAgent {
    pub controller: AgentController,
}

/// What the host reads back after each tick.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct AgentTransition {
    pub observation: Observation,
    pub reward: f32,
    pub cumulative_reward: f32,
    pub outcome: Option<EpisodeOutcome>,
}

impl AgentTransition {
    pub fn done(&self) -> bool {
        self.outcome.is_some()
    }
}

fn read_body(
    entity: Entity,
    position: &Position,
    rotation: &Rotation,
    linear_velocity: &LinearVelocity,
    angular_velocity: &AngularVelocity,
) -> BodyState {
    BodyState {
        entity,
        position: position.0,
        rotation: rotation.0,
        linear_velocity: linear_velocity.0,
        angular_velocity: angular_velocity.0,
        // The agent is a uniform cube.
        center_of_mass: position.0,
    }
}

fn setup_training_areas(
    mut commands: Commands,
    settings: Res<WallJumpSettings>,
    layout: Res<TrainingLayout>,
    time: Res<Time<Fixed>>,
) {
    for index in 0..layout.areas {
        spawn_training_area(
            &mut commands,
            &settings,
            index,
            layout.decision_source,
            time.elapsed_secs_f64(),
        );
    }
}

pub fn collect_observations(
    spatial_query: Res<SpatialQueryPipeline>,
    tags: Query<&'static SurfaceTag>,
    mut agents: Query<(
        Entity,
        &WallJumpAgent,
        &Position,
        &Rotation,
        &LinearVelocity,
        &AngularVelocity,
        &mut AgentTransition,
    )>,
) {
    for (entity, agent, position, rotation, linear, angular, mut transition) in agents.iter_mut() {
        let body = read_body(entity, position, rotation, linear, angular);
        let probe = AvianGroundProbe::new(&spatial_query, &tags, entity);
        transition.observation = agent.controller.observe(&body, &probe);
    }
}

pub fn heuristic_decisions(
    mut agents: Query<(&DecisionSource, &ActionState<AgentInput>, &mut AgentAction)>,
) {
    for (source, action_state, mut action) in agents.iter_mut() {
        if *source == DecisionSource::Heuristic {
            *action = heuristic_action(HeuristicKeys::from_action_state(action_state));
        }
    }
}

pub fn random_decisions(
    mut rng: ResMut<PolicyRng>,
    mut agents: Query<(&DecisionSource, &mut AgentAction)>,
) {
    for (source, mut action) in agents.iter_mut() {
        if *source == DecisionSource::Random {
            *action = random_action(&mut rng.0);
        }
    }
}

pub fn apply_agent_actions(
    time: Res<Time<Fixed>>,
    spatial_query: Res<SpatialQueryPipeline>,
    tags: Query<&'static SurfaceTag>,
    mut agents: Query<(
        Entity,
        &mut WallJumpAgent,
        &AgentAction,
        &Position,
        &mut Rotation,
        &mut LinearVelocity,
        &AngularVelocity,
    )>,
) {
    let dt = time.timestep().as_secs_f32();

    for (entity, mut agent, action, position, mut rotation, mut linear, angular) in
        agents.iter_mut()
    {
        let mut body = read_body(entity, position, &rotation, &linear, angular);
        let probe = AvianGroundProbe::new(&spatial_query, &tags, entity);
        agent.controller.act(action, &mut body, &probe, dt);

        rotation.0 = body.rotation;
        linear.0 = body.linear_velocity;
    }
}

pub fn resolve_episodes(
    time: Res<Time<Fixed>>,
    spatial_query: Res<SpatialQueryPipeline>,
    tags: Query<&'static SurfaceTag>,
    mut agents: Query<(
        Entity,
        &mut WallJumpAgent,
        &mut Position,
        &Rotation,
        &mut LinearVelocity,
        &mut AngularVelocity,
        Option<&CollidingEntities>,
        &mut AgentTransition,
    )>,
    mut ended: MessageWriter<EpisodeEnded>,
) {
    let now = time.elapsed_secs_f64();

    for (
        entity,
        mut agent,
        mut position,
        rotation,
        mut linear,
        mut angular,
        colliding,
        mut transition,
    ) in agents.iter_mut()
    {
        let goal_contact = colliding.is_some_and(|colliding| {
            colliding
                .iter()
                .any(|other| matches!(tags.get(*other), Ok(SurfaceTag::Goal)))
        });

        let mut body = read_body(entity, &position, rotation, &linear, &angular);
        let probe = AvianGroundProbe::new(&spatial_query, &tags, entity);
        let controller = &mut agent.controller;

        let outcome = controller.resolve(&body, &probe, goal_contact, now);
        let steps = controller.steps();
        let cumulative_reward = controller.rewards().episode_total();
        let reward = controller.take_reward();

        *transition = AgentTransition {
            observation: transition.observation,
            reward,
            cumulative_reward,
            outcome,
        };

        let Some(outcome) = outcome else {
            continue;
        };

        debug!(
            "Agent {:?} episode ended: {:?} after {} steps, reward {:.3}",
            entity, outcome, steps, cumulative_reward
        );
        ended.write(EpisodeEnded {
            agent: entity,
            outcome,
            final_reward: reward,
            cumulative_reward,
            steps,
        });

        controller.on_reset(&mut body, now);
        position.0 = body.position;
        linear.0 = body.linear_velocity;
        angular.0 = body.angular_velocity;
    }
}

pub fn record_episode_stats(
    mut ended: MessageReader<EpisodeEnded>,
    mut stats: ResMut<EpisodeStats>,
) {
    for episode in ended.read() {
        stats.record(episode);
        if stats.episodes % STATS_LOG_INTERVAL == 0 {
            stats.log_summary();
        }
    }
}

/// Log a final summary, e.g. when the launcher stops.
pub fn log_final_stats(stats: Res<EpisodeStats>) {
    info!("Training run finished");
    stats.log_summary();
}
