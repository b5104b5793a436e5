use std::fmt;

/// One camera's render request.
///
/// A job is identified by the camera name it renders. Names are unique within
/// a run (see [`crate::services::JobQueue`]) and never change once enqueued.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Job(String);

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Camera name this job renders
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Job {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Job {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Camera and output path chosen for a single dispatch.
///
/// Computed fresh every time the controller dispatches a job and handed back
/// to the caller for reporting. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    pub camera: Job,
    pub output_path: String,
}
