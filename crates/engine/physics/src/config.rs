use crate::clock::{DEFAULT_MAX_STEP_SECS, DEFAULT_TICK_RATE_HZ};
use serde::{Deserialize, Serialize};

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed tick rate of the simulation clock
    pub tick_rate_hz: f32,
    /// Gravity vector
    pub gravity: [f32; 3],
    /// Upper bound for a single step; longer stalls are clamped to this
    pub max_step_secs: f32,
    /// Enable contact events on synchronized bodies
    pub report_contacts: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            gravity: [0.0, -9.81, 0.0],
            max_step_secs: DEFAULT_MAX_STEP_SECS,
            report_contacts: true,
        }
    }
}
