use crate::host::SceneContext;
use crate::models::{FilterMode, Job};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// `pop_head` was called on an empty queue.
///
/// Callers check [`JobQueue::is_empty`] or [`JobQueue::peek_head`] first, so
/// hitting this is a precondition violation, not a runtime condition.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("pop_head called on an empty job queue")]
pub struct EmptyQueueError;

/// Ordered, duplicate-free list of cameras still to render.
///
/// The queue is filled once per run by [`JobQueue::snapshot`] and only shrinks
/// afterwards, one job per completed render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    /// Snapshot the cameras eligible under `filter`, in host enumeration order.
    pub fn snapshot<S>(scene: &S, filter: FilterMode) -> Self
    where
        S: SceneContext + ?Sized,
    {
        let cameras = scene.enumerate_cameras(filter.selected_only());
        tracing::debug!(
            "Host enumerated {} cameras (filter: {})",
            cameras.len(),
            filter
        );
        Self::from_names(cameras)
    }

    /// Build a queue from camera names. Repeated names keep their first position.
    pub fn from_names<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut jobs = VecDeque::new();

        for name in names {
            let name = name.into();
            if seen.insert(name.clone()) {
                jobs.push_back(Job::new(name));
            } else {
                tracing::debug!("Dropping duplicate camera from queue: {}", name);
            }
        }

        Self { jobs }
    }

    /// First pending job, if any
    pub fn peek_head(&self) -> Option<&Job> {
        self.jobs.front()
    }

    /// Remove and return the first pending job.
    pub fn pop_head(&mut self) -> Result<Job, EmptyQueueError> {
        self.jobs.pop_front().ok_or(EmptyQueueError)
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }
}
