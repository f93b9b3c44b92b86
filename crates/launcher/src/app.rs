use avian3d::prelude::PhysicsPlugins;
use bevy::log::LogPlugin;
use bevy::prelude::{
    App, AppExit, DefaultPlugins, Fixed, FixedUpdate, IntoScheduleConfigs, Last, MessageWriter,
    MinimalPlugins, PluginGroup, Res, Resource, Time, Window, WindowPlugin, default, info,
    on_message,
};
use leafwing_input_manager::prelude::InputManagerPlugin;
use walljump::plugin::log_final_stats;
use walljump::policy::{AgentInput, PolicyRng};
use walljump::{
    DecisionSource, EpisodeStats, FIXED_TIMESTEP_HZ, WallJumpPlugin, WallJumpSettings,
    WallJumpSystems,
};

use crate::render::RenderPlugin;

#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub headless: bool,
    pub decision_source: DecisionSource,
    pub areas: usize,
    pub episodes: Option<u32>,
    pub seed: Option<u64>,
    pub settings: WallJumpSettings,
    /// `None` leaves logging uninstalled, e.g. when several apps share a test
    /// process.
    pub log_filter: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            decision_source: DecisionSource::Random,
            areas: 1,
            episodes: None,
            seed: None,
            settings: WallJumpSettings::default(),
            log_filter: Some("info".to_string()),
        }
    }
}

/// Stop the app once this many episodes have ended.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpisodeLimit(pub Option<u32>);

impl EpisodeLimit {
    pub fn reached(&self, episodes: u32) -> bool {
        self.0.is_some_and(|limit| episodes >= limit)
    }
}

pub fn create_training_app(options: LaunchOptions) -> App {
    let mut app = App::new();

    if options.headless {
        app.add_plugins((
            MinimalPlugins,
            bevy::transform::TransformPlugin,
            bevy::diagnostic::DiagnosticsPlugin,
            bevy::asset::AssetPlugin::default(),
            bevy::scene::ScenePlugin,
            bevy::mesh::MeshPlugin,
        ));
        if let Some(filter) = &options.log_filter {
            app.add_plugins(LogPlugin {
                filter: filter.clone(),
                ..default()
            });
        }
    } else {
        let plugins = DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Wall Jump".to_string(),
                resolution: (1280, 720).into(),
                ..default()
            }),
            ..default()
        });
        match &options.log_filter {
            Some(filter) => app.add_plugins(plugins.set(LogPlugin {
                filter: filter.clone(),
                ..default()
            })),
            None => app.add_plugins(plugins.disable::<LogPlugin>()),
        };
        app.add_plugins((InputManagerPlugin::<AgentInput>::default(), RenderPlugin));
    }

    app.insert_resource(Time::<Fixed>::from_hz(FIXED_TIMESTEP_HZ));
    app.add_plugins(PhysicsPlugins::default());
    app.add_plugins(WallJumpPlugin {
        settings: options.settings.clone(),
        areas: options.areas,
        decision_source: options.decision_source,
    });
    if let Some(seed) = options.seed {
        app.insert_resource(PolicyRng::seeded(seed));
    }

    app.insert_resource(EpisodeLimit(options.episodes));
    app.add_systems(
        FixedUpdate,
        stop_after_episodes.after(WallJumpSystems::Resolve),
    );
    app.add_systems(Last, log_final_stats.run_if(on_message::<AppExit>));

    info!(
        "Training {} area(s), policy {:?}, headless: {}",
        options.areas, options.decision_source, options.headless
    );

    app
}

fn stop_after_episodes(
    limit: Res<EpisodeLimit>,
    stats: Res<EpisodeStats>,
    mut exit: MessageWriter<AppExit>,
) {
    if limit.reached(stats.episodes) {
        exit.write(AppExit::Success);
    }
}
