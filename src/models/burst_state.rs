use std::fmt;

/// Lifecycle of a single run, owned by [`crate::controller::RenderController`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    /// Created, `start()` not called yet
    #[default]
    Idle,
    /// Waiting for ticks
    Running,
    /// Configuring the scene and invoking the renderer
    Dispatching,
    /// Torn down; every further tick or notification is ignored
    Stopped,
}

impl RunState {
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running | RunState::Dispatching)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Dispatching => "dispatching",
            RunState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Why a run reached [`RunState::Stopped`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Every queued camera was rendered
    Completed,
    /// The renderer reported a cancellation
    Cancelled,
    /// The snapshot at start was empty
    NoEligibleJobs,
    /// A consistency or host error aborted the run
    Failed,
    /// The host dropped all event senders before the run finished
    Disconnected,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Completed => "completed",
            StopReason::Cancelled => "cancelled",
            StopReason::NoEligibleJobs => "no eligible cameras",
            StopReason::Failed => "failed",
            StopReason::Disconnected => "host disconnected",
        };
        f.write_str(text)
    }
}

/// Observable progress of the current burst.
///
/// Wrapped by [`crate::state::StateManager`], which emits
/// [`crate::state::StateChange`] events whenever it is updated. The
/// controller writes it; the CLI only reads it.
#[derive(Clone, Debug, Default)]
pub struct BurstState {
    pub run_state: RunState,

    // Progress
    pub total_jobs: usize,
    pub completed_jobs: Vec<String>,
    pub current_camera: Option<String>,
    pub last_output_path: Option<String>,

    pub cancel_requested: bool,
    pub stop_reason: Option<StopReason>,

    /// Last user-visible notice ("no eligible cameras", errors)
    pub notice: Option<String>,
}

impl BurstState {
    pub fn remaining_jobs(&self) -> usize {
        self.total_jobs.saturating_sub(self.completed_jobs.len())
    }

    /// Short progress line, e.g. `Rendering Cam2 (2/3)`.
    pub fn progress_summary(&self) -> String {
        match (&self.current_camera, self.run_state) {
            (Some(camera), RunState::Running | RunState::Dispatching) => format!(
                "Rendering {} ({}/{})",
                camera,
                self.completed_jobs.len() + 1,
                self.total_jobs
            ),
            (_, RunState::Stopped) => match self.stop_reason {
                Some(reason) => format!(
                    "Burst {}: {}/{} cameras rendered",
                    reason,
                    self.completed_jobs.len(),
                    self.total_jobs
                ),
                None => "Burst stopped".to_string(),
            },
            (None, RunState::Running | RunState::Dispatching) => "Starting burst...".to_string(),
            (_, RunState::Idle) => String::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = BurstState::default();
    }
}
