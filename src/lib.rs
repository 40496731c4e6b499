//! Flick home screen drag and drop engine
//!
//! Features:
//! - Drop target routing with fling-to-delete and edge paging
//! - Debounced grid reorder previews on paged cell layouts
//! - Pinch between the workspace and overview with threshold animations
//! - All apps list that drops a crawling fling on touch down
//! - Deterministic timers for replaying recorded touch scenarios

pub mod alarm;
pub mod all_apps;
pub mod caps;
pub mod config;
pub mod dnd;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod grid;
pub mod input;
pub mod runner;
pub mod scenario;
pub mod scroll_guard;
pub mod state;
pub mod timers;

pub use error::{Error, Result};
