//! Per-slot touch tracking
//!
//! Each touch slot is tracked independently so a second finger can turn a
//! drag into a pinch. Velocity is estimated from the samples of the last
//! [`VELOCITY_WINDOW_MS`] so a fling at release reflects the final motion,
//! not the whole gesture.

use std::collections::{BTreeMap, VecDeque};

use crate::geometry::Point;

/// Samples older than this are ignored for velocity
pub const VELOCITY_WINDOW_MS: u64 = 100;

/// Velocity estimate over a short sliding window of samples
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    samples: VecDeque<(u64, Point)>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_movement(&mut self, time_ms: u64, pos: Point) {
        self.samples.push_back((time_ms, pos));
        while let Some(&(t, _)) = self.samples.front() {
            if time_ms.saturating_sub(t) > VELOCITY_WINDOW_MS && self.samples.len() > 2 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Velocity in pixels per second, clamped to `max` on each axis
    pub fn velocity(&self, max: f64) -> Point {
        let (Some(&(t0, p0)), Some(&(t1, p1))) = (self.samples.front(), self.samples.back()) else {
            return Point::ZERO;
        };
        let dt = t1.saturating_sub(t0) as f64 / 1000.0;
        if dt < 0.001 {
            return Point::ZERO;
        }
        Point::new(
            ((p1.x - p0.x) / dt).clamp(-max, max),
            ((p1.y - p0.y) / dt).clamp(-max, max),
        )
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Touch point tracking
#[derive(Debug, Clone)]
pub struct TouchPoint {
    pub id: i32,
    pub start_pos: Point,
    pub current_pos: Point,
    pub last_delta: Point,
    pub tracker: VelocityTracker,
}

impl TouchPoint {
    pub fn new(id: i32, pos: Point, now: u64) -> Self {
        let mut tracker = VelocityTracker::new();
        tracker.add_movement(now, pos);
        Self {
            id,
            start_pos: pos,
            current_pos: pos,
            last_delta: Point::ZERO,
            tracker,
        }
    }

    pub fn update(&mut self, pos: Point, now: u64) {
        self.last_delta = pos - self.current_pos;
        self.current_pos = pos;
        self.tracker.add_movement(now, pos);
    }

    pub fn delta(&self) -> Point {
        self.current_pos - self.start_pos
    }

    pub fn distance(&self) -> f64 {
        self.delta().length()
    }
}

/// All active touches, keyed by slot
#[derive(Debug, Default)]
pub struct TouchTracker {
    points: BTreeMap<i32, TouchPoint>,
    pinch_initial_distance: Option<f64>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn down(&mut self, id: i32, pos: Point, now: u64) {
        self.points.insert(id, TouchPoint::new(id, pos, now));
        if self.points.len() == 2 {
            self.pinch_initial_distance = self.pinch_distance();
        }
    }

    pub fn motion(&mut self, id: i32, pos: Point, now: u64) -> Option<&TouchPoint> {
        let point = self.points.get_mut(&id)?;
        point.update(pos, now);
        Some(point)
    }

    pub fn up(&mut self, id: i32) -> Option<TouchPoint> {
        let point = self.points.remove(&id);
        if self.points.len() < 2 {
            self.pinch_initial_distance = None;
        }
        point
    }

    pub fn cancel(&mut self) {
        self.points.clear();
        self.pinch_initial_distance = None;
    }

    pub fn get(&self, id: i32) -> Option<&TouchPoint> {
        self.points.get(&id)
    }

    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Distance between the first two touch points
    pub fn pinch_distance(&self) -> Option<f64> {
        let mut it = self.points.values();
        let p1 = it.next()?;
        let p2 = it.next()?;
        Some(p1.current_pos.distance_to(p2.current_pos))
    }

    /// Current pinch scale relative to when the second finger landed
    pub fn pinch_scale(&self) -> Option<f64> {
        let initial = self.pinch_initial_distance?;
        if initial <= f64::EPSILON {
            return None;
        }
        Some(self.pinch_distance()? / initial)
    }
}
