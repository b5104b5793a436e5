use crate::models::{SceneDescription, UserConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File};
use std::fs;

/// Default configuration directory, relative to the working directory
pub const DEFAULT_CONFIG_DIR: &str = "RenderBurst Data";

/// File name of the user configuration inside the configuration directory
pub const USER_CONFIG_FILE: &str = "RenderBurst Config.yaml";

/// Prefix of environment variable overrides, e.g. `RENDERBURST__BURST__FILTER=selected`
pub const ENV_PREFIX: &str = "RENDERBURST";

/// Configuration manager for the user configuration and scene description files.
///
/// User settings are layered: `RenderBurst Config.yaml`, then environment
/// variables prefixed `RENDERBURST__`. Command line overrides are applied
/// by the binary on top of the result.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "RenderBurst Data")
    ///
    /// # Returns
    /// A new ConfigManager instance; the directory is created if missing
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join(USER_CONFIG_FILE),
            config_dir,
        })
    }

    /// Load the user configuration.
    ///
    /// # Returns
    /// The file merged with `RENDERBURST__*` environment overrides, or
    /// defaults for every setting neither of them provides
    pub fn load_user_config(&self) -> Result<UserConfig> {
        self.load_layered(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_layered(&self, environment: Environment) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
        }

        let config: UserConfig = Config::builder()
            .add_source(File::from(self.user_config_path.as_std_path()).required(false))
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize())
            .with_context(|| format!("Failed to load user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Save the user configuration file.
    ///
    /// # Arguments
    /// * `config` - The UserConfig to save
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Load a scene description.
    ///
    /// A relative `project_dir` in the file is taken relative to the scene
    /// file's own directory.
    pub fn load_scene(&self, path: &Utf8Path) -> Result<SceneDescription> {
        let file_contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene description: {}", path))?;

        let mut scene: SceneDescription = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse scene description: {}", path))?;

        if scene.project_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Utf8Path::new("."));
            scene.project_dir = base.join(&scene.project_dir);
        }

        tracing::info!(
            "Loaded scene {} with {} cameras ({} format, output {:?})",
            path,
            scene.cameras.len(),
            scene.file_format,
            scene.output_path
        );
        Ok(scene)
    }

    /// Write a scene description back, used by `--save-scene` to keep the
    /// active camera and output path the burst left behind.
    pub fn save_scene(&self, path: &Utf8Path, scene: &SceneDescription) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(scene)
            .context("Failed to serialize scene description to YAML")?;

        fs::write(path, yaml_string)
            .with_context(|| format!("Failed to write scene description: {}", path))?;

        tracing::info!("Saved scene description to {}", path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }
}
