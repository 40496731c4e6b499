//! Single-pending-callback delayed action
//!
//! An alarm never holds more than one timer registration. Re-arming to an
//! earlier time cancels and re-posts; re-arming to a later time only moves the
//! trigger time, and the in-flight timer reschedules itself for the remainder
//! when it fires early.

use crate::timers::{Scheduler, TimerToken};

#[derive(Debug)]
pub struct DeferredAlarm<L> {
    token: TimerToken,
    trigger_at: u64,
    last_delay: u64,
    /// Logically armed (cleared by cancel or by firing)
    pending: bool,
    /// A timer registration is live in the scheduler
    waiting_for_callback: bool,
    listener: Option<L>,
}

impl<L: Clone> DeferredAlarm<L> {
    pub fn new(token: TimerToken) -> Self {
        Self {
            token,
            trigger_at: 0,
            last_delay: 0,
            pending: false,
            waiting_for_callback: false,
            listener: None,
        }
    }

    pub fn token(&self) -> TimerToken {
        self.token
    }

    /// Value handed back when the alarm fires
    pub fn set_listener(&mut self, listener: L) {
        self.listener = Some(listener);
    }

    pub fn listener(&self) -> Option<&L> {
        self.listener.as_ref()
    }

    /// Schedule the alarm `delay_ms` from now, replacing any earlier request
    pub fn arm(&mut self, scheduler: &mut dyn Scheduler, delay_ms: u64) {
        let now = scheduler.now_ms();
        let old_trigger = self.trigger_at;
        self.pending = true;
        self.trigger_at = now.saturating_add(delay_ms);
        self.last_delay = delay_ms;

        if self.waiting_for_callback && old_trigger > self.trigger_at {
            scheduler.remove_callbacks(self.token);
            self.waiting_for_callback = false;
        }
        if !self.waiting_for_callback {
            scheduler.post_delayed(self.token, delay_ms);
            self.waiting_for_callback = true;
        }
        tracing::trace!(token = ?self.token, delay_ms, trigger_at = self.trigger_at, "Alarm armed");
    }

    /// Mark inactive. A timer already in flight becomes a no-op.
    pub fn cancel(&mut self) {
        if self.pending {
            tracing::trace!(token = ?self.token, "Alarm cancelled");
        }
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn last_delay(&self) -> u64 {
        self.last_delay
    }

    pub fn trigger_at(&self) -> u64 {
        self.trigger_at
    }

    /// Handle the expiry of this alarm's timer registration.
    ///
    /// Returns the listener when the alarm actually fires. An early expiry
    /// (trigger time was pushed later) re-posts for the remaining delay.
    pub fn on_timer(&mut self, scheduler: &mut dyn Scheduler) -> Option<L> {
        self.waiting_for_callback = false;
        if !self.pending {
            return None;
        }

        let now = scheduler.now_ms();
        if self.trigger_at > now {
            let remaining = self.trigger_at - now;
            scheduler.post_delayed(self.token, remaining);
            self.waiting_for_callback = true;
            tracing::trace!(token = ?self.token, remaining, "Alarm fired early, rescheduled");
            return None;
        }

        self.pending = false;
        tracing::debug!(token = ?self.token, "Alarm fired");
        self.listener.clone()
    }
}
