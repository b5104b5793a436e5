use crate::host::HostError;
use crate::models::{Job, RunState};
use crate::services::{ConfigurationError, EmptyQueueError};
use thiserror::Error;

/// The queue and the renderer disagree about which job is in flight.
///
/// Always fatal to the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error(transparent)]
    EmptyQueue(#[from] EmptyQueueError),

    #[error("Render finished for {dispatched} but the queue head is {head:?}")]
    HeadMismatch { dispatched: Job, head: Option<Job> },

    #[error("Render finished while no job was dispatched")]
    UnexpectedFinish,
}

/// Errors surfaced by [`super::RenderController`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BurstError {
    /// Rejected before activation; the run never started
    #[error("Cannot start burst: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Internal consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Burst already started (state: {0})")]
    AlreadyStarted(RunState),

    #[error("Burst has not been started")]
    NotStarted,
}

impl BurstError {
    /// Whether the error aborted an active run, as opposed to refusing to start one.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BurstError::Consistency(_) | BurstError::Host(_))
    }
}
