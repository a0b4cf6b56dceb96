//! Scene configuration for the animation demo

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Configuration for an animated scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Skinned M3D asset to load
    pub model_path: PathBuf,
    /// Clip every instance plays
    pub clip_name: String,
    /// Number of in-flight frames the renderer buffers skinning data for
    pub frame_resource_count: usize,
    /// Playback speed multiplier applied to every tick
    pub time_scale: f32,
    /// Number of animated instances sharing the model's skeleton
    pub instance_count: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/soldier.m3d"),
            clip_name: "Take1".to_string(),
            frame_resource_count: 3,
            time_scale: 1.0,
            instance_count: 1,
        }
    }
}

impl SceneConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.frame_resource_count == 0 {
            return Err(Error::InvalidConfig("frame_resource_count must be at least 1".into()));
        }
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "time_scale must be a non-negative number, got {}",
                self.time_scale
            )));
        }
        Ok(())
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file (sync) and validate
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
