//! Scene setup for animated skinned models

pub mod config;
pub mod manager;

pub use config::SceneConfig;
pub use manager::{AnimatedScene, InstanceId};
