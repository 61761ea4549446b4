//! Session configuration loaded from TOML
//!
//! Every field has a default, so an empty file (or no file) yields a working
//! session:
//!
//! ```toml
//! [physics]
//! tick_rate_hz = 90.0
//! gravity = [0.0, -9.81, 0.0]
//!
//! [tracking]
//! plane_collider_lift = 0.1
//! occlusion_proxies = true
//! ```

use crate::handles::SurfaceId;
use roomsync_physics::PhysicsConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Surface tracking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Thickness of the box drawn for a plane
    pub plane_visual_thickness: f32,
    /// Thickness of the box a plane collides as
    pub plane_collider_thickness: f32,
    /// Offset of the plane collider along the plane's up axis
    pub plane_collider_lift: f32,
    /// Add a depth-only proxy for every mesh surface
    pub occlusion_proxies: bool,
    /// Rebuild colliders when a surface's geometry changes
    pub resync_colliders_on_update: bool,
    /// Mesh colors, cycled by surface id
    pub mesh_palette: Vec<[f32; 3]>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            plane_visual_thickness: 0.0001,
            plane_collider_thickness: 0.05,
            plane_collider_lift: 0.1,
            occlusion_proxies: true,
            resync_colliders_on_update: false,
            mesh_palette: vec![
                [0.95, 0.45, 0.35],
                [0.35, 0.75, 0.95],
                [0.55, 0.9, 0.45],
                [0.95, 0.8, 0.3],
                [0.75, 0.5, 0.95],
            ],
        }
    }
}

impl TrackerConfig {
    pub fn mesh_color(&self, id: SurfaceId) -> [f32; 3] {
        if self.mesh_palette.is_empty() {
            return [1.0, 1.0, 1.0];
        }
        self.mesh_palette[(id.raw() as usize) % self.mesh_palette.len()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub physics: PhysicsConfig,
    pub tracking: TrackerConfig,
}

impl SessionConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        if !(physics.tick_rate_hz.is_finite() && physics.tick_rate_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "physics.tick_rate_hz must be positive, got {}",
                physics.tick_rate_hz
            )));
        }
        if !(physics.max_step_secs.is_finite() && physics.max_step_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "physics.max_step_secs must be positive, got {}",
                physics.max_step_secs
            )));
        }

        let tracking = &self.tracking;
        for (name, value) in [
            ("plane_visual_thickness", tracking.plane_visual_thickness),
            ("plane_collider_thickness", tracking.plane_collider_thickness),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "tracking.{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
