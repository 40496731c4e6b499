//! Delayed-callback substrate for the engine
//!
//! Everything runs on one thread. A timer registration is identified by a
//! [`TimerToken`] naming its owner; when it expires the event loop hands the
//! token back to [`crate::state::HomeScreen::dispatch_timer`], which routes it.
//!
//! Two implementations:
//! - [`ManualScheduler`]: virtual clock for tests and scenario replay
//! - [`CalloopScheduler`]: real timers on a calloop event loop

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};
use serde::Serialize;

/// Owner of a timer registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerToken {
    /// Long press on an icon (starts a drag)
    LongPress,
    /// Debounced grid reorder preview
    Reorder,
    /// Page scroll while hovering the screen edge during a drag
    DragScroll,
    /// Deferred drag end after the drop animation
    DropAnimation,
    /// All apps list fling frames
    ListFling,
}

impl TimerToken {
    pub const ALL: [TimerToken; 5] = [
        TimerToken::LongPress,
        TimerToken::Reorder,
        TimerToken::DragScroll,
        TimerToken::DropAnimation,
        TimerToken::ListFling,
    ];
}

/// UI-thread timer queue (`postDelayed` / `removeCallbacks`)
pub trait Scheduler {
    /// Monotonic time in milliseconds
    fn now_ms(&self) -> u64;

    /// Schedule `token` to be dispatched `delay_ms` from now
    fn post_delayed(&mut self, token: TimerToken, delay_ms: u64);

    /// Drop every pending registration for `token`
    fn remove_callbacks(&mut self, token: TimerToken);
}

/// Deterministic scheduler driven by explicit clock advances
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: u64,
    seq: u64,
    queue: BTreeMap<(u64, u64), TimerToken>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the earliest registration due at or before `until`, moving the
    /// clock to its due time. Returns None once nothing else is due.
    pub fn pop_due(&mut self, until: u64) -> Option<TimerToken> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > until {
            return None;
        }
        let token = self.queue.remove(&key)?;
        self.now = self.now.max(key.0);
        Some(token)
    }

    /// Move the clock forward without dispatching anything
    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    /// Number of live registrations for a token
    pub fn registrations(&self, token: TimerToken) -> usize {
        self.queue.values().filter(|t| **t == token).count()
    }

    /// Due time of the earliest registration for a token
    pub fn next_due(&self, token: TimerToken) -> Option<u64> {
        self.queue
            .iter()
            .find(|(_, t)| **t == token)
            .map(|((due, _), _)| *due)
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Scheduler for ManualScheduler {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn post_delayed(&mut self, token: TimerToken, delay_ms: u64) {
        self.seq += 1;
        self.queue.insert((self.now.saturating_add(delay_ms), self.seq), token);
    }

    fn remove_callbacks(&mut self, token: TimerToken) {
        self.queue.retain(|_, t| *t != token);
    }
}

/// Loop data that can receive expired timer tokens
pub trait TimerDispatch: Sized + 'static {
    fn scheduler(&mut self) -> &mut CalloopScheduler<Self>;

    fn dispatch_timer(&mut self, token: TimerToken);
}

/// Scheduler backed by calloop timer sources
pub struct CalloopScheduler<D: 'static> {
    handle: LoopHandle<'static, D>,
    origin: Instant,
    registrations: HashMap<TimerToken, Vec<RegistrationToken>>,
}

impl<D: TimerDispatch> CalloopScheduler<D> {
    pub fn new(handle: LoopHandle<'static, D>) -> Self {
        Self {
            handle,
            origin: Instant::now(),
            registrations: HashMap::new(),
        }
    }

    /// Forget a registration that calloop already dropped after firing
    fn forget(&mut self, token: TimerToken) {
        if let Some(regs) = self.registrations.get_mut(&token) {
            if !regs.is_empty() {
                regs.remove(0);
            }
        }
    }
}

impl<D: TimerDispatch> Scheduler for CalloopScheduler<D> {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn post_delayed(&mut self, token: TimerToken, delay_ms: u64) {
        let timer = Timer::from_duration(Duration::from_millis(delay_ms));
        let inserted = self.handle.insert_source(timer, move |_, _, data: &mut D| {
            data.scheduler().forget(token);
            data.dispatch_timer(token);
            TimeoutAction::Drop
        });
        match inserted {
            Ok(reg) => self.registrations.entry(token).or_default().push(reg),
            Err(e) => tracing::error!(?token, "Failed to insert timer source: {}", e.error),
        }
    }

    fn remove_callbacks(&mut self, token: TimerToken) {
        if let Some(regs) = self.registrations.remove(&token) {
            for reg in regs {
                self.handle.remove(reg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_in_order() {
        let mut sched = ManualScheduler::new();
        sched.post_delayed(TimerToken::Reorder, 650);
        sched.post_delayed(TimerToken::LongPress, 500);
        sched.post_delayed(TimerToken::DragScroll, 500);

        assert_eq!(sched.pop_due(1000), Some(TimerToken::LongPress));
        assert_eq!(sched.now_ms(), 500);
        // Same due time keeps insertion order
        assert_eq!(sched.pop_due(1000), Some(TimerToken::DragScroll));
        assert_eq!(sched.pop_due(600), None);
        assert_eq!(sched.pop_due(1000), Some(TimerToken::Reorder));
        assert_eq!(sched.now_ms(), 650);
        assert!(sched.is_idle());
    }

    #[test]
    fn test_remove_callbacks() {
        let mut sched = ManualScheduler::new();
        sched.post_delayed(TimerToken::Reorder, 100);
        sched.post_delayed(TimerToken::Reorder, 200);
        sched.post_delayed(TimerToken::LongPress, 300);
        assert_eq!(sched.registrations(TimerToken::Reorder), 2);

        sched.remove_callbacks(TimerToken::Reorder);
        assert_eq!(sched.registrations(TimerToken::Reorder), 0);
        assert_eq!(sched.next_due(TimerToken::LongPress), Some(300));
    }
}
