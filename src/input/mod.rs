//! Input handling - touch tracking and velocity
//!
//! This module provides:
//! - Per-slot touch point tracking (drag pointer, pinch pairs)
//! - Velocity estimation for fling-to-delete and list flings

mod touch;

pub use touch::*;

use serde::{Deserialize, Serialize};

/// Raw touch event fed into the engine, in drag layer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TouchEvent {
    Down { slot: i32, x: f64, y: f64 },
    Motion { slot: i32, x: f64, y: f64 },
    Up { slot: i32 },
    Cancel,
}
