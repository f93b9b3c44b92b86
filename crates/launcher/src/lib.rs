pub mod app;
pub mod native;
pub mod render;

pub use app::{EpisodeLimit, LaunchOptions, create_training_app};
