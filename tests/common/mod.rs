//! In-memory host shared by the integration tests.
//!
//! Records every call the controller makes so tests can assert on the exact
//! sequence, and lets tests push notifications to subscribers and ticks to
//! timers by hand.

#![allow(dead_code)]

use camino::Utf8PathBuf;
use renderburst::host::{
    EventSender, HostError, HostEvent, NotificationBus, RenderFacade, SceneContext,
    SubscriptionId, TimerHandle, TimerService,
};
use renderburst::models::FileFormat;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    SetActiveCamera(String),
    SetOutputPath(String),
    InvokeRender {
        camera: Option<String>,
        output_path: String,
        write_still: bool,
    },
    Subscribe(SubscriptionId),
    Unsubscribe(SubscriptionId),
    ScheduleTimer(Duration),
    CancelTimer(TimerHandle),
}

#[derive(Clone, Debug)]
pub struct FakeCamera {
    pub name: String,
    pub visible: bool,
    pub selected: bool,
}

pub struct RecordingHost {
    pub cameras: Vec<FakeCamera>,
    pub output_path: String,
    pub file_format: FileFormat,
    pub project_dir: Utf8PathBuf,
    pub active_camera: Option<String>,
    pub calls: Vec<HostCall>,
    /// When set, `invoke_render_async` fails with this error
    pub render_error: Option<HostError>,
    subscribers: HashMap<SubscriptionId, EventSender>,
    timers: HashMap<TimerHandle, EventSender>,
    next_id: u64,
}

impl RecordingHost {
    /// Host with the given visible, unselected cameras and output `//renders/`.
    pub fn new(cameras: &[&str]) -> Self {
        Self {
            cameras: cameras
                .iter()
                .map(|name| FakeCamera {
                    name: name.to_string(),
                    visible: true,
                    selected: false,
                })
                .collect(),
            output_path: "//renders/".to_string(),
            file_format: FileFormat::Png,
            project_dir: Utf8PathBuf::from("/projects/shot"),
            active_camera: None,
            calls: Vec::new(),
            render_error: None,
            subscribers: HashMap::new(),
            timers: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn with_output_path(mut self, output_path: &str) -> Self {
        self.output_path = output_path.to_string();
        self
    }

    pub fn with_format(mut self, file_format: FileFormat) -> Self {
        self.file_format = file_format;
        self
    }

    pub fn with_camera(mut self, name: &str, visible: bool, selected: bool) -> Self {
        self.cameras.push(FakeCamera {
            name: name.to_string(),
            visible,
            selected,
        });
        self
    }

    /// Cameras the controller asked to render, in order.
    pub fn rendered_cameras(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::InvokeRender { camera, .. } => camera.clone(),
                _ => None,
            })
            .collect()
    }

    pub fn render_invocations(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, HostCall::InvokeRender { .. }))
            .count()
    }

    pub fn count(&self, predicate: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Deliver a notification to every subscriber.
    pub fn notify(&self, event: HostEvent) {
        for sink in self.subscribers.values() {
            let _ = sink.send(event);
        }
    }

    /// Fire every scheduled timer once.
    pub fn fire_timers(&self) {
        for sink in self.timers.values() {
            let _ = sink.send(HostEvent::Tick);
        }
    }

    /// A sender into the controller's event channel, for scripting a run.
    pub fn event_sink(&self) -> Option<EventSender> {
        self.subscribers.values().next().cloned()
    }

    /// Drop every sender the host holds, as if the host went away.
    pub fn disconnect(&mut self) {
        self.subscribers.clear();
        self.timers.clear();
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl SceneContext for RecordingHost {
    fn enumerate_cameras(&self, selected_only: bool) -> Vec<String> {
        self.cameras
            .iter()
            .filter(|c| c.visible && (!selected_only || c.selected))
            .map(|c| c.name.clone())
            .collect()
    }

    fn set_active_camera(&mut self, camera: &str) -> Result<(), HostError> {
        self.calls.push(HostCall::SetActiveCamera(camera.to_string()));
        if !self.cameras.iter().any(|c| c.name == camera) {
            return Err(HostError::UnknownCamera(camera.to_string()));
        }
        self.active_camera = Some(camera.to_string());
        Ok(())
    }

    fn output_path_config(&self) -> String {
        self.output_path.clone()
    }

    fn set_output_path_config(&mut self, path: &str) {
        self.calls.push(HostCall::SetOutputPath(path.to_string()));
        self.output_path = path.to_string();
    }

    fn file_format(&self) -> FileFormat {
        self.file_format
    }

    fn project_dir(&self) -> Utf8PathBuf {
        self.project_dir.clone()
    }
}

impl RenderFacade for RecordingHost {
    fn invoke_render_async(&mut self, write_still: bool) -> Result<(), HostError> {
        self.calls.push(HostCall::InvokeRender {
            camera: self.active_camera.clone(),
            output_path: self.output_path.clone(),
            write_still,
        });
        match &self.render_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl NotificationBus for RecordingHost {
    fn subscribe(&mut self, sink: EventSender) -> SubscriptionId {
        let id = SubscriptionId(self.allocate_id());
        self.calls.push(HostCall::Subscribe(id));
        self.subscribers.insert(id, sink);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.calls.push(HostCall::Unsubscribe(id));
        self.subscribers.remove(&id);
    }
}

impl TimerService for RecordingHost {
    fn schedule_repeating(&mut self, interval: Duration, sink: EventSender) -> TimerHandle {
        let handle = TimerHandle(self.allocate_id());
        self.calls.push(HostCall::ScheduleTimer(interval));
        self.timers.insert(handle, sink);
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.calls.push(HostCall::CancelTimer(handle));
        self.timers.remove(&handle);
    }
}
