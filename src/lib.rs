// Render Burst - render every camera of a scene, one still per camera
//
// This is the library crate containing the burst state machine, the host
// abstraction and the supporting services. The binary crate (main.rs)
// provides the command line entry point.

pub mod cli;
pub mod config;
pub mod controller;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use controller::{
    BurstError, ConsistencyError, ControllerOptions, RenderController, StartOutcome, TickOutcome,
};
pub use host::{CommandHost, HostEvent, RenderHost};
pub use metrics::Metrics;
pub use models::{BurstState, Job, RenderTarget, RunState, SceneDescription, StopReason, UserConfig};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
