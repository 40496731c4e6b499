//! Pinch between the workspace and overview
//!
//! A two finger pinch scales the workspace between 1.0 and the overview
//! shrink factor. Progress derived from that scale feeds the threshold
//! machine, whose crossings fade the surrounding chrome in and out.

use serde::Serialize;
use tracing::{debug, info};

use super::threshold::{HomeMode, ThresholdAnimator, ThresholdLevel, ThresholdStateMachine};
use crate::config::PinchConfig;
use crate::geometry::lerp;

const SETTLE_NUDGE: f64 = 1e-9;

/// Chrome change triggered by a threshold crossing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionEffect {
    OverviewPanelButtons { show: bool },
    HotseatAndPageIndicator { show: bool },
    SearchBar { show: bool },
    Scrim { show: bool },
    /// The pinch is over, switch modes
    SnapTo { mode: HomeMode },
}

/// Maps threshold crossings to chrome effects
#[derive(Debug, Default)]
pub struct PinchAnimator {
    effects: Vec<TransitionEffect>,
}

impl PinchAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_effects(&mut self) -> Vec<TransitionEffect> {
        std::mem::take(&mut self.effects)
    }

    fn hotseat_and_search(&mut self, show: bool) {
        self.effects.push(TransitionEffect::HotseatAndPageIndicator { show });
        self.effects.push(TransitionEffect::SearchBar { show });
    }
}

impl ThresholdAnimator for PinchAnimator {
    fn animate_threshold(&mut self, threshold: ThresholdLevel, start: HomeMode, towards: HomeMode) {
        use HomeMode::{Overview, Workspace};

        match (threshold, start) {
            (ThresholdLevel::One, Overview) => {
                self.effects.push(TransitionEffect::OverviewPanelButtons { show: towards == Overview });
            }
            (ThresholdLevel::One, Workspace) => self.hotseat_and_search(towards == Workspace),
            (ThresholdLevel::Two, Overview) => {
                self.hotseat_and_search(towards == Workspace);
                self.effects.push(TransitionEffect::Scrim { show: towards == Overview });
            }
            (ThresholdLevel::Two, Workspace) => {
                self.effects.push(TransitionEffect::OverviewPanelButtons { show: towards == Overview });
                self.effects.push(TransitionEffect::Scrim { show: towards == Overview });
            }
            (ThresholdLevel::Three, _) => {
                if start != towards {
                    self.effects.push(TransitionEffect::SnapTo { mode: towards });
                }
            }
            (ThresholdLevel::Zero, _) => {
                tracing::warn!("Asked to animate threshold zero");
            }
        }
    }
}

/// How a pinch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinchOutcome {
    pub mode: HomeMode,
    pub committed: bool,
}

/// One pinch gesture, from second finger down to release
#[derive(Debug)]
pub struct PinchSession {
    start: HomeMode,
    overview_scale: f64,
    commit_velocity: f64,
    machine: ThresholdStateMachine,
    animator: PinchAnimator,
    /// 0 = overview, 1 = workspace
    progress: f64,
    /// Progress per second at the last sample
    velocity: f64,
    last_time: u64,
    /// Set once THREE is passed; the pinch ends immediately
    snapped: Option<HomeMode>,
}

impl PinchSession {
    pub fn begin(start: HomeMode, config: &PinchConfig, now: u64) -> Self {
        info!(?start, "Pinch started");
        Self {
            start,
            overview_scale: config.overview_scale.clamp(0.05, 0.99),
            commit_velocity: config.commit_velocity,
            machine: ThresholdStateMachine::new(),
            animator: PinchAnimator::new(),
            progress: start.progress(),
            velocity: 0.0,
            last_time: now,
            snapped: None,
        }
    }

    pub fn start_mode(&self) -> HomeMode {
        self.start
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn passed(&self) -> ThresholdLevel {
        self.machine.passed()
    }

    pub fn snapped(&self) -> Option<HomeMode> {
        self.snapped
    }

    /// Workspace scale to draw for the current progress
    pub fn workspace_scale(&self) -> f64 {
        lerp(self.overview_scale, 1.0, self.progress)
    }

    pub fn take_effects(&mut self) -> Vec<TransitionEffect> {
        self.animator.take_effects()
    }

    /// Fingers moved: `pinch_scale` is current over initial finger distance
    pub fn on_scale(&mut self, pinch_scale: f64, now: u64) -> ThresholdLevel {
        if self.snapped.is_some() {
            return self.machine.passed();
        }
        let start_scale = lerp(self.overview_scale, 1.0, self.start.progress());
        let scale = (start_scale * pinch_scale).clamp(self.overview_scale, 1.0);
        let progress = (scale - self.overview_scale) / (1.0 - self.overview_scale);

        let dt = now.saturating_sub(self.last_time) as f64 / 1000.0;
        if dt > 0.0 {
            self.velocity = (progress - self.progress) / dt;
            self.last_time = now;
        }
        self.progress = progress;

        let passed = self.machine.update(progress, self.start, &mut self.animator);
        if passed == ThresholdLevel::Three {
            let mode = self.start.other();
            info!(?mode, "Pinch passed the last threshold, snapping");
            self.snapped = Some(mode);
            self.machine.reset();
        }
        passed
    }

    /// Fingers lifted: decide the final mode and settle the animation
    pub fn release(mut self) -> (PinchOutcome, Vec<TransitionEffect>) {
        if let Some(mode) = self.snapped {
            let effects = self.animator.take_effects();
            return (PinchOutcome { mode, committed: true }, effects);
        }

        // Positive velocity heads towards the workspace
        let heading_velocity = match self.start {
            HomeMode::Overview => self.velocity,
            HomeMode::Workspace => -self.velocity,
        };
        let committed = if heading_velocity >= self.commit_velocity {
            true
        } else if heading_velocity <= -self.commit_velocity {
            false
        } else {
            self.machine.passed() >= ThresholdLevel::One
        };
        let mode = if committed { self.start.other() } else { self.start };
        debug!(velocity = self.velocity, passed = ?self.machine.passed(), ?mode, "Pinch released");

        self.settle(mode.progress());
        self.machine.reset();
        info!(?mode, committed, "Pinch finished");
        let effects = self.animator.take_effects();
        (PinchOutcome { mode, committed }, effects)
    }

    /// Run the remaining progress through every boundary on the way to
    /// `target`, as the settle animation would
    fn settle(&mut self, target: f64) {
        let start = self.start;
        let travelled = |raw: f64| match start {
            HomeMode::Overview => raw,
            HomeMode::Workspace => 1.0 - raw,
        };
        let raw_at = |distance: f64| match start {
            HomeMode::Overview => distance,
            HomeMode::Workspace => 1.0 - distance,
        };

        let from = travelled(self.progress);
        let to = travelled(target);
        let mut stops: Vec<f64> = [ThresholdLevel::One, ThresholdLevel::Two, ThresholdLevel::Three]
            .into_iter()
            .map(|level| level.boundary())
            .filter(|b| (from < *b && *b <= to) || (to < *b && *b <= from))
            .collect();
        // Land just past each boundary in the direction of travel
        if to < from {
            stops.reverse();
            stops.iter_mut().for_each(|b| *b -= SETTLE_NUDGE);
        } else {
            stops.iter_mut().for_each(|b| *b += SETTLE_NUDGE);
        }
        stops.push(to);

        for distance in stops {
            self.machine.update(raw_at(distance), start, &mut self.animator);
        }
        self.progress = target;
    }
}
