//! Pinch gestures between the workspace and overview

mod pinch;
mod threshold;

pub use pinch::{PinchAnimator, PinchOutcome, PinchSession, TransitionEffect};
pub use threshold::{
    HomeMode, ThresholdAnimator, ThresholdLevel, ThresholdStateMachine, THRESHOLD_ONE, THRESHOLD_THREE,
    THRESHOLD_TWO,
};
