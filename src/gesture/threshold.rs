//! Discrete thresholds over a continuous pinch
//!
//! Raw progress runs from 0 (overview) to 1 (workspace). The machine measures
//! distance travelled from the mode the gesture started in, so progress is
//! inverted when starting from the workspace. The last passed level is sticky:
//! a crossing fires exactly one animation no matter how many samples land in
//! the same band.

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const THRESHOLD_ONE: f64 = 0.40;
pub const THRESHOLD_TWO: f64 = 0.70;
pub const THRESHOLD_THREE: f64 = 0.95;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdLevel {
    #[default]
    Zero,
    One,
    Two,
    Three,
}

impl ThresholdLevel {
    /// Level for a travelled distance in [0, 1]
    pub fn classify(progress: f64) -> Self {
        if progress < THRESHOLD_ONE {
            ThresholdLevel::Zero
        } else if progress < THRESHOLD_TWO {
            ThresholdLevel::One
        } else if progress < THRESHOLD_THREE {
            ThresholdLevel::Two
        } else {
            ThresholdLevel::Three
        }
    }

    /// Lowest travelled distance at this level
    pub fn boundary(&self) -> f64 {
        match self {
            ThresholdLevel::Zero => 0.0,
            ThresholdLevel::One => THRESHOLD_ONE,
            ThresholdLevel::Two => THRESHOLD_TWO,
            ThresholdLevel::Three => THRESHOLD_THREE,
        }
    }
}

/// Home screen presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeMode {
    Workspace,
    Overview,
}

impl HomeMode {
    pub fn other(&self) -> HomeMode {
        match self {
            HomeMode::Workspace => HomeMode::Overview,
            HomeMode::Overview => HomeMode::Workspace,
        }
    }

    /// Raw progress value at rest in this mode
    pub fn progress(&self) -> f64 {
        match self {
            HomeMode::Workspace => 1.0,
            HomeMode::Overview => 0.0,
        }
    }
}

/// Receives one call per threshold crossing
pub trait ThresholdAnimator {
    fn animate_threshold(&mut self, threshold: ThresholdLevel, start: HomeMode, towards: HomeMode);
}

#[derive(Debug, Default)]
pub struct ThresholdStateMachine {
    passed: ThresholdLevel,
}

impl ThresholdStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passed(&self) -> ThresholdLevel {
        self.passed
    }

    /// Feed a raw progress sample (0 = overview, 1 = workspace) for a gesture
    /// that started in `start`. Returns the passed level.
    pub fn update(
        &mut self,
        raw_progress: f64,
        start: HomeMode,
        animator: &mut dyn ThresholdAnimator,
    ) -> ThresholdLevel {
        if raw_progress.is_nan() {
            return self.passed;
        }
        let raw = raw_progress.clamp(0.0, 1.0);
        let progress = match start {
            HomeMode::Overview => raw,
            HomeMode::Workspace => 1.0 - raw,
        };

        let previous = self.passed;
        self.passed = ThresholdLevel::classify(progress);
        if self.passed == previous {
            return self.passed;
        }

        let (threshold, towards) = if self.passed > previous {
            (self.passed, start.other())
        } else {
            // Reversed: head back to where the gesture started, animating the
            // level that was just given up
            (previous, start)
        };
        debug!(?previous, passed = ?self.passed, ?threshold, ?start, ?towards, "Threshold crossed");
        animator.animate_threshold(threshold, start, towards);
        self.passed
    }

    /// Forget the passed level without animating
    pub fn reset(&mut self) {
        self.passed = ThresholdLevel::Zero;
    }
}
