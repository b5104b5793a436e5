//! Data models for Render Burst.
//!
//! - [`Job`] / [`RenderTarget`]: one camera's render request and the target computed for it
//! - [`BurstState`]: observable progress of a burst, shared through [`StateManager`](crate::state::StateManager)
//! - [`RunState`] / [`StopReason`]: controller lifecycle
//! - [`UserConfig`]: user settings loaded from `RenderBurst Config.yaml`
//! - [`SceneDescription`]: scene exported from the host, consumed by the command host
//!
//! Config and scene structs derive `Serialize`/`Deserialize` for YAML persistence.

pub mod burst_state;
pub mod config;
pub mod job;
pub mod scene;

pub use burst_state::{BurstState, RunState, StopReason};
pub use config::{BurstSettings, FilterMode, UserConfig};
pub use job::{Job, RenderTarget};
pub use scene::{CameraEntry, FileFormat, SceneDescription};
