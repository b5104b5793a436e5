use crate::models::FileFormat;
use thiserror::Error;

/// Settings that make a burst impossible to start.
///
/// Checked before the controller activates, so a run that fails here never
/// subscribes to the host or schedules a timer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Output path not defined. Please define the output path in the render settings")]
    OutputPathUnset,

    #[error("Animation format {0} is not supported, choose a still image format")]
    UnsupportedFormat(FileFormat),
}

/// Reject output settings a per-camera still burst cannot work with.
pub fn validate_output_settings(
    output_path: &str,
    file_format: FileFormat,
) -> Result<(), ConfigurationError> {
    if output_path.is_empty() {
        return Err(ConfigurationError::OutputPathUnset);
    }

    if file_format.is_movie() {
        return Err(ConfigurationError::UnsupportedFormat(file_format));
    }

    Ok(())
}
