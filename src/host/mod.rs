//! Host facade - the capabilities a burst needs from the application that owns
//! the scene and the renderer.
//!
//! The controller never talks to a renderer directly. It calls into four narrow
//! traits and receives everything the host wants to tell it as [`HostEvent`]s on
//! a single channel:
//!
//! - [`SceneContext`]: camera enumeration, active camera, output path setting
//! - [`RenderFacade`]: fire-and-forget render invocation
//! - [`NotificationBus`]: render start / finish / cancel notifications
//! - [`TimerService`]: the repeating poll timer
//!
//! Ticks and notifications share one [`EventSender`], so a host that delivers
//! them from several threads still has them handled one at a time.
//!
//! [`command::CommandHost`] implements all four over a scene file and an
//! external render command.

pub mod command;

use crate::models::FileFormat;
use camino::Utf8PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

pub use command::{CancelSignal, CommandHost};

/// Something the host pushes to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// The poll timer fired
    Tick,
    /// A render began
    RenderStarted,
    /// A render completed and its output was written
    RenderFinished,
    /// A render was aborted
    RenderCancelled,
}

/// Channel end the host sends [`HostEvent`]s into.
pub type EventSender = mpsc::UnboundedSender<HostEvent>;

/// Receiving end held by the controller.
pub type EventReceiver = mpsc::UnboundedReceiver<HostEvent>;

/// Identifies a notification subscription for later removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Identifies a scheduled repeating timer for later cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Errors raised by host operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Camera {0} does not exist in the scene")]
    UnknownCamera(String),

    #[error("A render is already in progress")]
    RenderBusy,

    #[error("Renderer unavailable: {0}")]
    Unavailable(String),
}

/// Scene queries and mutations.
pub trait SceneContext {
    /// Camera names in host order. Hidden cameras are never returned.
    fn enumerate_cameras(&self, selected_only: bool) -> Vec<String>;

    fn set_active_camera(&mut self, camera: &str) -> Result<(), HostError>;

    /// Current output path setting; may be project-relative or empty
    fn output_path_config(&self) -> String;

    fn set_output_path_config(&mut self, path: &str);

    fn file_format(&self) -> FileFormat;

    /// Directory project-relative paths resolve against
    fn project_dir(&self) -> Utf8PathBuf;
}

/// Starts renders. Completion is reported later through the
/// [`NotificationBus`], never through the return value.
pub trait RenderFacade {
    fn invoke_render_async(&mut self, write_still: bool) -> Result<(), HostError>;
}

/// Delivery of render notifications.
pub trait NotificationBus {
    fn subscribe(&mut self, sink: EventSender) -> SubscriptionId;

    /// Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// Repeating timer delivering [`HostEvent::Tick`].
pub trait TimerService {
    fn schedule_repeating(&mut self, interval: Duration, sink: EventSender) -> TimerHandle;

    /// Unknown handles are ignored.
    fn cancel_timer(&mut self, handle: TimerHandle);
}

/// Everything the controller needs from a host.
pub trait RenderHost: SceneContext + RenderFacade + NotificationBus + TimerService {}

impl<T> RenderHost for T where T: SceneContext + RenderFacade + NotificationBus + TimerService {}

// A controller can borrow its host instead of owning it.

impl<T: SceneContext + ?Sized> SceneContext for &mut T {
    fn enumerate_cameras(&self, selected_only: bool) -> Vec<String> {
        (**self).enumerate_cameras(selected_only)
    }

    fn set_active_camera(&mut self, camera: &str) -> Result<(), HostError> {
        (**self).set_active_camera(camera)
    }

    fn output_path_config(&self) -> String {
        (**self).output_path_config()
    }

    fn set_output_path_config(&mut self, path: &str) {
        (**self).set_output_path_config(path)
    }

    fn file_format(&self) -> FileFormat {
        (**self).file_format()
    }

    fn project_dir(&self) -> Utf8PathBuf {
        (**self).project_dir()
    }
}

impl<T: RenderFacade + ?Sized> RenderFacade for &mut T {
    fn invoke_render_async(&mut self, write_still: bool) -> Result<(), HostError> {
        (**self).invoke_render_async(write_still)
    }
}

impl<T: NotificationBus + ?Sized> NotificationBus for &mut T {
    fn subscribe(&mut self, sink: EventSender) -> SubscriptionId {
        (**self).subscribe(sink)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        (**self).unsubscribe(id)
    }
}

impl<T: TimerService + ?Sized> TimerService for &mut T {
    fn schedule_repeating(&mut self, interval: Duration, sink: EventSender) -> TimerHandle {
        (**self).schedule_repeating(interval, sink)
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        (**self).cancel_timer(handle)
    }
}
