//! overlayq: Overlay Queue Scheduling
//!
//! Producers enqueue transient, user-dismissible overlay items into named
//! containers. Each container runs its own scheduler that decides which items
//! are visible, in what order they arrive and leave, and when waiting items
//! are promoted.

pub mod action;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod item;
pub mod logging;
pub mod observer;
pub mod policy;
pub mod registry;
pub mod scheduler;
pub mod style;
pub mod types;

pub use action::Action;
pub use config::{ContainerConfig, OverlayConfig};
pub use item::{Item, ItemSpec, ItemView, Presence};
pub use policy::{DisplayOrder, InputShaping, Policy, Verbosity};
pub use registry::{ContainerHandle, Registry};
pub use scheduler::Snapshot;
pub use types::ItemId;
