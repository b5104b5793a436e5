use super::{
    EventSender, HostError, HostEvent, NotificationBus, RenderFacade, SceneContext,
    SubscriptionId, TimerHandle, TimerService,
};
use crate::models::{FileFormat, SceneDescription};
use crate::services::path_resolver;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

type Subscribers = Arc<Mutex<HashMap<SubscriptionId, EventSender>>>;

/// Send `event` to every current subscriber.
///
/// Closed channels are skipped; their controller already tore down.
fn notify(subscribers: &Subscribers, event: HostEvent) {
    let subscribers = subscribers.lock().unwrap();
    for sink in subscribers.values() {
        let _ = sink.send(event);
    }
}

/// Headless host rendering each camera with an external command.
///
/// The scene comes from a [`SceneDescription`] file. Every render runs the
/// command template through the platform shell with these placeholders
/// substituted:
///
/// - `{camera}`: active camera name
/// - `{output}`: absolute output file path (empty when not writing to disk)
/// - `{project}`: project directory
/// - `{format}`: output format identifier, e.g. `PNG`
///
/// Exit code 0 is reported as [`HostEvent::RenderFinished`]; a non-zero exit
/// or a spawn failure is reported as [`HostEvent::RenderCancelled`], which ends
/// the burst after the current camera. Such failures are counted separately
/// from user cancellations, see [`failed_renders`](Self::failed_renders).
///
/// # Example
/// ```ignore
/// let host = CommandHost::new(
///     scene,
///     "blender -b scene.blend --python-expr 'render(\"{camera}\", \"{output}\")'",
///     runtime.handle().clone(),
/// );
/// ```
pub struct CommandHost {
    scene: SceneDescription,
    command_template: String,

    /// Matches `{camera}`, `{output}`, `{project}` and `{format}`
    placeholder_pattern: Regex,

    /// Handle to the tokio runtime render and timer tasks run on
    runtime: tokio::runtime::Handle,

    subscribers: Subscribers,
    timers: HashMap<TimerHandle, JoinHandle<()>>,
    next_id: u64,

    /// Set while a render command is running
    rendering: Arc<AtomicBool>,

    /// Render commands that exited non-zero or could not be spawned
    failed_renders: Arc<AtomicUsize>,
}

impl CommandHost {
    pub fn new(
        scene: SceneDescription,
        command_template: impl Into<String>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            scene,
            command_template: command_template.into(),
            placeholder_pattern: Regex::new(r"\{(camera|output|project|format)\}")
                .expect("Invalid placeholder regex"),
            runtime,
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            timers: HashMap::new(),
            next_id: 1,
            rendering: Arc::new(AtomicBool::new(false)),
            failed_renders: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The scene, including changes made by the burst (active camera, output path)
    pub fn scene(&self) -> &SceneDescription {
        &self.scene
    }

    /// Handle for reporting a user cancellation from another task.
    pub fn cancel_signal(&self) -> CancelSignal {
        CancelSignal {
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::SeqCst)
    }

    /// Number of renders that failed rather than being cancelled by the user
    pub fn failed_renders(&self) -> usize {
        self.failed_renders.load(Ordering::SeqCst)
    }

    /// Expand the command template for the current scene state.
    pub fn build_command(&self, write_still: bool) -> String {
        let camera = self.scene.active_camera.clone().unwrap_or_default();
        let output = if write_still {
            path_resolver::to_absolute(&self.scene.output_path, &self.scene.project_dir)
                .into_string()
        } else {
            String::new()
        };
        let project = self.scene.project_dir.to_string();
        let format = self.scene.file_format.identifier();

        self.placeholder_pattern
            .replace_all(&self.command_template, |caps: &Captures| match &caps[1] {
                "camera" => camera.clone(),
                "output" => output.clone(),
                "project" => project.clone(),
                "format" => format.to_string(),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Drop for CommandHost {
    fn drop(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }
}

impl SceneContext for CommandHost {
    fn enumerate_cameras(&self, selected_only: bool) -> Vec<String> {
        self.scene.eligible_cameras(selected_only)
    }

    fn set_active_camera(&mut self, camera: &str) -> Result<(), HostError> {
        if !self.scene.has_camera(camera) {
            return Err(HostError::UnknownCamera(camera.to_string()));
        }
        self.scene.active_camera = Some(camera.to_string());
        Ok(())
    }

    fn output_path_config(&self) -> String {
        self.scene.output_path.clone()
    }

    fn set_output_path_config(&mut self, path: &str) {
        self.scene.output_path = path.to_string();
    }

    fn file_format(&self) -> FileFormat {
        self.scene.file_format
    }

    fn project_dir(&self) -> Utf8PathBuf {
        self.scene.project_dir.clone()
    }
}

impl RenderFacade for CommandHost {
    fn invoke_render_async(&mut self, write_still: bool) -> Result<(), HostError> {
        if self.scene.active_camera.is_none() {
            return Err(HostError::Unavailable("no active camera".to_string()));
        }
        if self.rendering.swap(true, Ordering::SeqCst) {
            return Err(HostError::RenderBusy);
        }

        let command = self.build_command(write_still);
        let output_dir = write_still
            .then(|| {
                path_resolver::to_absolute(&self.scene.output_path, &self.scene.project_dir)
                    .parent()
                    .map(|p| p.to_path_buf())
            })
            .flatten();
        let subscribers = Arc::clone(&self.subscribers);
        let rendering = Arc::clone(&self.rendering);
        let failed_renders = Arc::clone(&self.failed_renders);

        self.runtime.spawn(async move {
            notify(&subscribers, HostEvent::RenderStarted);

            let outcome = execute_render_command(&command, output_dir).await;

            // Cleared before notifying so the next dispatch finds the renderer free
            rendering.store(false, Ordering::SeqCst);

            match outcome {
                Ok(0) => notify(&subscribers, HostEvent::RenderFinished),
                Ok(code) => {
                    tracing::warn!("Render command exited with code {}", code);
                    failed_renders.fetch_add(1, Ordering::SeqCst);
                    notify(&subscribers, HostEvent::RenderCancelled);
                }
                Err(e) => {
                    tracing::error!("Render command failed: {:#}", e);
                    failed_renders.fetch_add(1, Ordering::SeqCst);
                    notify(&subscribers, HostEvent::RenderCancelled);
                }
            }
        });

        Ok(())
    }
}

impl NotificationBus for CommandHost {
    fn subscribe(&mut self, sink: EventSender) -> SubscriptionId {
        let id = SubscriptionId(self.allocate_id());
        self.subscribers.lock().unwrap().insert(id, sink);
        tracing::debug!("Render notifications subscribed: {:?}", id);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.subscribers.lock().unwrap().remove(&id).is_some() {
            tracing::debug!("Render notifications unsubscribed: {:?}", id);
        }
    }
}

impl TimerService for CommandHost {
    fn schedule_repeating(&mut self, interval: Duration, sink: EventSender) -> TimerHandle {
        let handle = TimerHandle(self.allocate_id());

        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // The first tick completes immediately; the host fires after one interval
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if sink.send(HostEvent::Tick).is_err() {
                    break;
                }
            }
        });

        self.timers.insert(handle, task);
        tracing::debug!("Timer {:?} scheduled every {:?}", handle, interval);
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        if let Some(task) = self.timers.remove(&handle) {
            task.abort();
            tracing::debug!("Timer {:?} cancelled", handle);
        }
    }
}

/// Cloneable handle reporting a user cancellation to every subscriber,
/// the same way an aborted render would.
#[derive(Clone)]
pub struct CancelSignal {
    subscribers: Subscribers,
}

impl CancelSignal {
    pub fn cancel(&self) {
        tracing::info!("Cancellation signalled to render subscribers");
        notify(&self.subscribers, HostEvent::RenderCancelled);
    }
}

/// Run one render command through the platform shell.
///
/// # Returns
/// The process exit code (0 = success, -1 when killed by a signal)
async fn execute_render_command(command: &str, output_dir: Option<Utf8PathBuf>) -> Result<i32> {
    if let Some(dir) = output_dir {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", dir))?;
    }

    tracing::info!("Executing: {}", command);

    let start = Instant::now();

    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };

    let status = cmd
        .status()
        .await
        .context("Failed to run render command")?;

    let exit_code = status.code().unwrap_or(-1);

    tracing::info!(
        "Render command completed in {:.2}s with exit code {}",
        start.elapsed().as_secs_f32(),
        exit_code
    );

    Ok(exit_code)
}
