mod clock;
mod config;
mod context;
mod convert;
mod error;
mod events;
mod registry;
mod shape;
mod world;

pub use clock::{
    ClockState, SimulationClock, TickReport, DEFAULT_MAX_STEP_SECS, DEFAULT_TICK_RATE_HZ,
};
pub use config::PhysicsConfig;
pub use context::PhysicsContext;
pub use error::{PhysicsError, Result};
pub use events::{ContactEvent, ContactHook, LogContacts};
pub use registry::{BodyClass, BodyOptions, BodyRegistry, BodySlot};
pub use shape::{CollisionShape, DEFAULT_BALL_RADIUS, DEFAULT_HALF_EXTENT};
pub use world::PhysicsWorld;

// Re-export for convenience
pub use glam;
pub use rapier3d;
