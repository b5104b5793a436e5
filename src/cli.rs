use crate::config::DEFAULT_CONFIG_DIR;
use crate::models::{BurstSettings, FilterMode};
use camino::Utf8PathBuf;
use clap::Parser;

/// Command line arguments for the `renderburst` binary.
///
/// Flags override values loaded from the configuration file and environment.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "renderburst",
    version,
    about = "Render every camera of a scene, one still per camera"
)]
pub struct CliArgs {
    /// Scene description (YAML) listing the cameras and output settings.
    #[arg(long, value_name = "PATH")]
    pub scene: Utf8PathBuf,

    /// Only render cameras that are selected in the scene.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub selected: bool,

    /// Directory holding `RenderBurst Config.yaml`.
    #[arg(
        long = "config-dir",
        env = "RENDERBURST_CONFIG_DIR",
        value_name = "PATH",
        default_value = DEFAULT_CONFIG_DIR
    )]
    pub config_dir: Utf8PathBuf,

    /// Output directory used when the scene has no output path; `//` is the project directory.
    #[arg(long = "base-path", value_name = "PATH")]
    pub base_path: Option<String>,

    /// Poll interval in milliseconds.
    #[arg(long = "interval-ms", value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// Render command template; `{camera}`, `{output}`, `{project}` and `{format}` are substituted.
    #[arg(long, value_name = "TEMPLATE")]
    pub command: Option<String>,

    /// Write the scene back after the burst, with its last active camera and output path.
    #[arg(long = "save-scene", action = clap::ArgAction::SetTrue)]
    pub save_scene: bool,

    /// Log at debug level.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub debug: bool,

    /// Only log to the log file.
    #[arg(long = "no-console", action = clap::ArgAction::SetTrue)]
    pub no_console: bool,
}

impl CliArgs {
    /// Apply command line overrides on top of the loaded settings.
    pub fn apply_overrides(&self, settings: &mut BurstSettings) {
        if self.selected {
            settings.filter = FilterMode::Selected;
        }
        if let Some(base_path) = &self.base_path {
            settings.base_path = base_path.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            settings.poll_interval_ms = interval_ms;
        }
        if let Some(command) = &self.command {
            settings.render_command = command.clone();
        }
        if self.debug {
            settings.debug_mode = true;
        }
    }
}
