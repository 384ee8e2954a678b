//! Session Module
//!
//! Everything that involves time or collaborators: the scheduler, the
//! renderer seam, the synchronous controller and the async driver.
//!
//! ## Module Structure
//!
//! - `scheduler`: Cancelable virtual-time task queue
//! - `renderer`: Output seam (pads, status, cues, prompts)
//! - `controller`: Run orchestration over the game transitions
//! - `driver`: Tokio event loop around a controller

pub mod scheduler;
pub mod renderer;
pub mod controller;
pub mod driver;

// Re-export key types
pub use scheduler::{Scheduler, ScheduledTask, TaskId};
pub use renderer::{Cue, Renderer, StatusStyle, TracingRenderer};
pub use controller::{RunSummary, SessionAction, SessionConfig, SessionController, SessionError};
pub use driver::{Command, SessionDriver, SessionEvent};
