use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which cameras a burst renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Every visible camera
    #[default]
    All,
    /// Visible cameras that are also selected
    Selected,
}

impl FilterMode {
    pub fn selected_only(self) -> bool {
        self == FilterMode::Selected
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::All => f.write_str("all"),
            FilterMode::Selected => f.write_str("selected"),
        }
    }
}

/// User configuration from `RenderBurst Config.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub burst: BurstSettings,
}

/// Burst settings. Every field has a default, so partial files and
/// environment-only setups load fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstSettings {
    pub filter: FilterMode,

    /// Directory used when the scene has no output path override.
    /// `//` is the project directory.
    pub base_path: String,

    pub poll_interval_ms: u64,

    /// Shell command template run once per camera.
    /// Placeholders: `{camera}`, `{output}`, `{project}`, `{format}`.
    pub render_command: String,

    pub debug_mode: bool,

    pub log_dir: String,
}

impl Default for BurstSettings {
    fn default() -> Self {
        Self {
            filter: FilterMode::All,
            base_path: default_base_path(),
            poll_interval_ms: default_poll_interval_ms(),
            render_command: String::new(),
            debug_mode: false,
            log_dir: default_log_dir(),
        }
    }
}

impl BurstSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

fn default_base_path() -> String {
    "//".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_log_dir() -> String {
    "logs".to_string()
}
