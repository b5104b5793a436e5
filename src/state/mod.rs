// State management module
//
// This module provides the StateManager which wraps BurstState with thread-safe access
// using Arc<RwLock<T>> and emits change events for progress reporting.

use crate::models::{BurstState, RunState, StopReason};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the burst state is modified
///
/// Observers (the CLI progress log, a UI panel) subscribe to these instead of
/// polling the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The controller moved between lifecycle states
    RunStateChanged { from: RunState, to: RunState },

    /// A burst became active
    BurstStarted { total_jobs: usize },

    /// A camera was handed to the renderer
    JobDispatched { camera: String, output_path: String },

    /// A camera finished rendering
    JobCompleted {
        camera: String,
        completed: usize,
        total: usize,
    },

    /// The renderer reported a cancellation
    CancelRequested,

    /// The burst reached its end
    BurstFinished {
        reason: StopReason,
        completed: usize,
        remaining: usize,
    },

    /// User-visible message
    Notice { message: String },
}

/// Thread-safe burst state with event emission
///
/// - Thread-safe access to [`BurstState`] via `Arc<RwLock<T>>`
/// - Detects changes on every [`update()`](Self::update) and emits [`StateChange`] events
/// - Subscribers listen through a tokio broadcast channel
///
/// The [`RenderController`](crate::controller::RenderController) is the only
/// writer; everything else reads or subscribes.
pub struct StateManager {
    state: Arc<RwLock<BurstState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(BurstState::default())),
            state_tx,
        }
    }

    /// Clone of the current state, safe to use without holding locks.
    pub fn snapshot(&self) -> BurstState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let remaining = state_manager.read(|state| state.remaining_jobs());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&BurstState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut BurstState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &BurstState, new: &BurstState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.run_state != new.run_state {
            changes.push(StateChange::RunStateChanged {
                from: old.run_state,
                to: new.run_state,
            });

            if !old.run_state.is_active() && new.run_state.is_active() {
                changes.push(StateChange::BurstStarted {
                    total_jobs: new.total_jobs,
                });
            }
        }

        if old.last_output_path != new.last_output_path || old.current_camera != new.current_camera
        {
            if let (Some(camera), Some(output_path)) = (&new.current_camera, &new.last_output_path)
            {
                changes.push(StateChange::JobDispatched {
                    camera: camera.clone(),
                    output_path: output_path.clone(),
                });
            }
        }

        if new.completed_jobs.len() > old.completed_jobs.len() {
            if let Some(camera) = new.completed_jobs.last() {
                changes.push(StateChange::JobCompleted {
                    camera: camera.clone(),
                    completed: new.completed_jobs.len(),
                    total: new.total_jobs,
                });
            }
        }

        if !old.cancel_requested && new.cancel_requested {
            changes.push(StateChange::CancelRequested);
        }

        if old.run_state != RunState::Stopped && new.run_state == RunState::Stopped {
            if let Some(reason) = new.stop_reason {
                changes.push(StateChange::BurstFinished {
                    reason,
                    completed: new.completed_jobs.len(),
                    remaining: new.remaining_jobs(),
                });
            }
        }

        if old.notice != new.notice {
            if let Some(message) = &new.notice {
                changes.push(StateChange::Notice {
                    message: message.clone(),
                });
            }
        }

        changes
    }

    // Convenience methods used by the controller

    /// Mark a burst as running with `total_jobs` cameras queued
    pub fn begin_burst(&self, total_jobs: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.reset();
            state.total_jobs = total_jobs;
            state.run_state = RunState::Running;
        })
    }

    pub fn set_run_state(&self, run_state: RunState) -> Vec<StateChange> {
        self.update(|state| state.run_state = run_state)
    }

    /// Record that `camera` was handed to the renderer, writing to `output_path`
    pub fn record_dispatch(&self, camera: &str, output_path: &str) -> Vec<StateChange> {
        self.update(|state| {
            state.current_camera = Some(camera.to_string());
            state.last_output_path = Some(output_path.to_string());
        })
    }

    pub fn record_completion(&self, camera: &str) -> Vec<StateChange> {
        self.update(|state| {
            state.completed_jobs.push(camera.to_string());
            state.current_camera = None;
        })
    }

    pub fn request_cancel(&self) -> Vec<StateChange> {
        self.update(|state| state.cancel_requested = true)
    }

    pub fn finish_burst(&self, reason: StopReason) -> Vec<StateChange> {
        self.update(|state| {
            state.stop_reason = Some(reason);
            state.run_state = RunState::Stopped;
            state.current_camera = None;
        })
    }

    pub fn post_notice(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| state.notice = Some(message))
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
