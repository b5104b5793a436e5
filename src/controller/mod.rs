//! The burst state machine.
//!
//! [`RenderController`] owns a run from `start()` to teardown: it snapshots the
//! eligible cameras, then on every poll tick either waits for the in-flight
//! render, dispatches the next camera, or stops. Render notifications move
//! the queue forward.
//!
//! ```text
//! Idle --start--> Running --tick--> Dispatching --invoked--> Running
//!   |                |                                          |
//!   +--(no cameras)--+------(cancelled / queue empty / fatal)---+--> Stopped
//! ```
//!
//! All host input arrives as [`HostEvent`]s on one channel and is handled
//! serially, so no locks guard the run state. [`RenderController::run`]
//! drives the loop; tests call [`RenderController::tick`] and the
//! notification handlers directly.

pub mod error;

pub use error::{BurstError, ConsistencyError};

use crate::host::{EventReceiver, HostEvent, RenderHost, SubscriptionId, TimerHandle};
use crate::metrics::Metrics;
use crate::models::{BurstSettings, FilterMode, Job, RenderTarget, RunState, StopReason};
use crate::services::{EmptyQueueError, JobQueue, path_resolver, validate_output_settings};
use crate::state::StateManager;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Poll interval used when none is configured
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Per-run settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Directory used when the scene has no output path override
    pub base_path: String,
    pub filter: FilterMode,
    pub poll_interval: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            base_path: path_resolver::RELATIVE_PATH_MARKER.to_string(),
            filter: FilterMode::All,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl From<&BurstSettings> for ControllerOptions {
    fn from(settings: &BurstSettings) -> Self {
        Self {
            base_path: settings.base_path.clone(),
            filter: settings.filter,
            poll_interval: settings.poll_interval(),
        }
    }
}

/// Result of [`RenderController::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// The run is active with this many cameras queued
    Started { jobs: usize },
    /// Nothing matched the filter; the run went straight to `Stopped`
    NoEligibleJobs,
}

/// What a single tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Dispatched(RenderTarget),
    /// A render is still in flight
    Waiting,
    Stopped(StopReason),
    /// The run is not active; the tick was ignored
    Inactive,
}

#[derive(Debug)]
struct InFlight {
    job: Job,
    dispatched_at: Instant,
}

/// Sequences one render per camera through a [`RenderHost`].
pub struct RenderController<H: RenderHost> {
    host: H,
    options: ControllerOptions,

    run_state: RunState,
    queue: JobQueue,
    in_flight: Option<InFlight>,
    rendering: bool,
    cancelled: bool,
    stop_reason: Option<StopReason>,
    dispatch_count: usize,

    // Released by teardown
    subscription: Option<SubscriptionId>,
    timer: Option<TimerHandle>,
    events: Option<EventReceiver>,

    status: StateManager,
    metrics: Arc<Metrics>,
}

impl<H: RenderHost> RenderController<H> {
    pub fn new(host: H, options: ControllerOptions) -> Self {
        Self::with_observers(host, options, StateManager::new(), Arc::new(Metrics::new()))
    }

    /// Create a controller reporting into an existing state manager and metrics.
    pub fn with_observers(
        host: H,
        options: ControllerOptions,
        status: StateManager,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            host,
            options,
            run_state: RunState::Idle,
            queue: JobQueue::default(),
            in_flight: None,
            rendering: false,
            cancelled: false,
            stop_reason: None,
            dispatch_count: 0,
            subscription: None,
            timer: None,
            events: None,
            status,
            metrics,
        }
    }

    /// Validate the scene's output settings, snapshot the eligible cameras and
    /// begin polling.
    ///
    /// A configuration error leaves the controller `Idle` with nothing
    /// subscribed. An empty snapshot is not an error: the run stops at once
    /// with [`StopReason::NoEligibleJobs`].
    pub fn start(&mut self) -> Result<StartOutcome, BurstError> {
        if self.run_state != RunState::Idle {
            return Err(BurstError::AlreadyStarted(self.run_state));
        }

        if let Err(err) =
            validate_output_settings(&self.host.output_path_config(), self.host.file_format())
        {
            tracing::warn!("Refusing to start burst: {}", err);
            self.status.post_notice(err.to_string());
            return Err(err.into());
        }

        self.queue = JobQueue::snapshot(&self.host, self.options.filter);

        if self.queue.is_empty() {
            tracing::info!(
                "No cameras to render (filter: {}), nothing to do",
                self.options.filter
            );
            self.status.post_notice("No cameras to render");
            self.stop(StopReason::NoEligibleJobs);
            return Ok(StartOutcome::NoEligibleJobs);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.subscription = Some(self.host.subscribe(tx.clone()));
        self.timer = Some(self.host.schedule_repeating(self.options.poll_interval, tx));
        self.events = Some(rx);

        self.run_state = RunState::Running;
        self.status.begin_burst(self.queue.len());

        let jobs = self.queue.len();
        tracing::info!(
            "Burst started: {} cameras, polling every {}ms",
            jobs,
            self.options.poll_interval.as_millis()
        );
        tracing::debug!(
            "Queue: {:?}",
            self.queue.jobs().map(Job::name).collect::<Vec<_>>()
        );

        Ok(StartOutcome::Started { jobs })
    }

    /// One poll step.
    ///
    /// Cancellation wins over everything, then an empty queue completes the
    /// run, then an in-flight render makes the tick a no-op. Only otherwise is
    /// the head camera dispatched.
    pub fn tick(&mut self) -> Result<TickOutcome, BurstError> {
        if self.run_state != RunState::Running {
            return Ok(TickOutcome::Inactive);
        }
        self.metrics.record_tick();

        if self.cancelled {
            self.stop(StopReason::Cancelled);
            return Ok(TickOutcome::Stopped(StopReason::Cancelled));
        }

        if self.queue.is_empty() {
            self.stop(StopReason::Completed);
            return Ok(TickOutcome::Stopped(StopReason::Completed));
        }

        if self.rendering {
            self.metrics.record_idle_tick();
            return Ok(TickOutcome::Waiting);
        }

        self.dispatch().map(TickOutcome::Dispatched)
    }

    fn dispatch(&mut self) -> Result<RenderTarget, BurstError> {
        self.set_run_state(RunState::Dispatching);

        match self.configure_and_invoke() {
            Ok(target) => {
                self.set_run_state(RunState::Running);
                Ok(target)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn configure_and_invoke(&mut self) -> Result<RenderTarget, BurstError> {
        let job = self
            .queue
            .peek_head()
            .cloned()
            .ok_or(ConsistencyError::from(EmptyQueueError))?;

        self.host.set_active_camera(job.name())?;

        let output_path = path_resolver::resolve(
            &self.options.base_path,
            &self.host.output_path_config(),
            job.name(),
            self.host.file_format().extension(),
            &self.host.project_dir(),
        );
        self.host.set_output_path_config(&output_path);

        self.host.invoke_render_async(true)?;

        self.rendering = true;
        self.in_flight = Some(InFlight {
            job: job.clone(),
            dispatched_at: Instant::now(),
        });
        self.dispatch_count += 1;
        self.metrics.record_dispatch();
        self.status.record_dispatch(job.name(), &output_path);

        tracing::info!("Rendering camera {} to {}", job, output_path);

        Ok(RenderTarget {
            camera: job,
            output_path,
        })
    }

    /// The host reports that a render began.
    pub fn on_render_start(&mut self) {
        if !self.run_state.is_active() {
            return;
        }
        tracing::debug!("Render started");
        self.rendering = true;
    }

    /// The host reports that a render finished and its file was written.
    ///
    /// The finished job must be the queue head; anything else aborts the run.
    pub fn on_render_finish(&mut self) -> Result<(), BurstError> {
        if !self.run_state.is_active() {
            return Ok(());
        }

        let Some(in_flight) = self.in_flight.take() else {
            return Err(self.fail(ConsistencyError::UnexpectedFinish.into()));
        };

        let head = self.queue.peek_head().cloned();
        if head.as_ref() != Some(&in_flight.job) {
            let err = ConsistencyError::HeadMismatch {
                dispatched: in_flight.job,
                head,
            };
            return Err(self.fail(err.into()));
        }

        let job = match self.queue.pop_head() {
            Ok(job) => job,
            Err(err) => return Err(self.fail(ConsistencyError::from(err).into())),
        };
        self.rendering = false;

        let elapsed = in_flight.dispatched_at.elapsed();
        self.metrics.record_render_completed(elapsed);
        self.status.record_completion(job.name());

        tracing::info!(
            "Finished camera {} in {:.2}s, {} remaining",
            job,
            elapsed.as_secs_f64(),
            self.queue.len()
        );

        Ok(())
    }

    /// The host reports a cancelled render.
    ///
    /// Only sets the flag; the next tick stops the run. Whatever is in flight
    /// stays queued.
    pub fn on_render_cancel(&mut self) {
        if !self.run_state.is_active() || self.cancelled {
            return;
        }
        tracing::info!("Render cancelled, stopping burst after this tick");
        self.cancelled = true;
        self.status.request_cancel();
    }

    /// Route one host event to its handler.
    pub fn handle_event(&mut self, event: HostEvent) -> Result<(), BurstError> {
        tracing::trace!(?event, state = %self.run_state, "Host event");

        match event {
            HostEvent::Tick => self.tick().map(|_| ()),
            HostEvent::RenderStarted => {
                self.on_render_start();
                Ok(())
            }
            HostEvent::RenderFinished => self.on_render_finish(),
            HostEvent::RenderCancelled => {
                self.on_render_cancel();
                Ok(())
            }
        }
    }

    /// Consume host events until the run stops.
    ///
    /// Call after a successful [`start`](Self::start). If every sender is
    /// dropped before the run finishes it stops with
    /// [`StopReason::Disconnected`].
    pub async fn run(&mut self) -> Result<StopReason, BurstError> {
        if let Some(reason) = self.stop_reason {
            return Ok(reason);
        }

        let Some(mut events) = self.events.take() else {
            return Err(BurstError::NotStarted);
        };

        while let Some(event) = events.recv().await {
            self.handle_event(event)?;

            if let Some(reason) = self.stop_reason {
                return Ok(reason);
            }
        }

        tracing::warn!("Host event channel closed before the burst finished");
        self.stop(StopReason::Disconnected);
        Ok(StopReason::Disconnected)
    }

    fn set_run_state(&mut self, run_state: RunState) {
        self.run_state = run_state;
        self.status.set_run_state(run_state);
    }

    /// Abort the run after a consistency or host error and hand the error back.
    fn fail(&mut self, err: BurstError) -> BurstError {
        tracing::error!("Burst aborted: {}", err);
        self.metrics.record_fatal_error();
        self.status.post_notice(err.to_string());
        self.stop(StopReason::Failed);
        err
    }

    fn stop(&mut self, reason: StopReason) {
        if self.run_state == RunState::Stopped {
            return;
        }

        self.teardown();
        self.in_flight = None;
        self.rendering = false;
        self.run_state = RunState::Stopped;
        self.stop_reason = Some(reason);
        self.status.finish_burst(reason);

        tracing::info!(
            "Burst {}: {} rendered, {} left in queue",
            reason,
            self.status.read(|s| s.completed_jobs.len()),
            self.queue.len()
        );
    }

    /// Release everything acquired by `start`. Safe to call repeatedly.
    fn teardown(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.host.unsubscribe(id);
        }
        if let Some(handle) = self.timer.take() {
            self.host.cancel_timer(handle);
        }
        if let Some(mut events) = self.events.take() {
            events.close();
        }
    }

    pub fn state(&self) -> RunState {
        self.run_state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Cameras not rendered yet. Kept after the run stops for reporting.
    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Camera handed to the renderer and not yet finished
    pub fn in_flight(&self) -> Option<&Job> {
        self.in_flight.as_ref().map(|f| &f.job)
    }

    /// Renders invoked so far in this run
    pub fn dispatch_count(&self) -> usize {
        self.dispatch_count
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn state_manager(&self) -> &StateManager {
        &self.status
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

impl<H: RenderHost> Drop for RenderController<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
