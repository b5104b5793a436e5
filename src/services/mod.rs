//! Services module - pure building blocks of a burst.
//!
//! These are **host-agnostic**: nothing here touches a renderer or a timer,
//! which keeps them trivially testable.
//!
//! # Components
//!
//! - [`path_resolver`]: derives the output file path for a camera from the base
//!   directory, the scene's output path setting and the project directory
//! - [`JobQueue`]: the ordered, duplicate-free cameras still to render
//! - [`validate_output_settings`]: the start gate rejecting an unset output
//!   path or a movie container format
//!
//! # Usage Example
//!
//! ```ignore
//! use renderburst::services::{path_resolver, JobQueue};
//!
//! let queue = JobQueue::from_names(["Front", "Side"]);
//! let camera = queue.peek_head().unwrap();
//! let path = path_resolver::resolve("//", "//renders/", camera.name(), ".png", project_dir);
//! assert_eq!(path, "//renders/Front.png");
//! ```

pub mod job_queue;
pub mod path_resolver;
pub mod validation;

pub use job_queue::{EmptyQueueError, JobQueue};
pub use validation::{ConfigurationError, validate_output_settings};
