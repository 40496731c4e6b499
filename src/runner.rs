//! Scenario replay
//!
//! Simulated replay drives a [`ManualScheduler`] so the output is exactly
//! reproducible. Realtime replay schedules the same steps as calloop timers
//! and lets the engine's own timers run on the wall clock.

use std::io::Write;
use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use tracing::{debug, error, info};

use crate::caps::PlatformCaps;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::scenario::Scenario;
use crate::state::{HomeScreen, TimedEvent};
use crate::timers::{CalloopScheduler, ManualScheduler, TimerDispatch, TimerToken};

/// Time allowed after the last step for animations and flings to finish
pub const SETTLE_MS: u64 = 3000;

/// Replay on a virtual clock
pub fn run_simulated(scenario: &Scenario, config: &EngineConfig, caps: &PlatformCaps) -> Result<Vec<TimedEvent>> {
    let mut home = scenario.build(config, ManualScheduler::new(), caps)?;
    for step in &scenario.steps {
        home.advance_to(step.at);
        step.apply(&mut home);
    }
    home.advance_to(scenario.duration() + SETTLE_MS);
    home.shutdown();

    let events = home.take_events();
    info!(events = events.len(), "Simulated replay finished");
    Ok(events)
}

/// Write the event log as a JSON array
pub fn write_report<W: Write>(events: &[TimedEvent], pretty: bool, mut out: W) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut out, events)?;
    } else {
        serde_json::to_writer(&mut out, events)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Loop data for realtime replay
struct LiveEngine {
    home: HomeScreen<CalloopScheduler<LiveEngine>>,
    finished: bool,
}

impl TimerDispatch for LiveEngine {
    fn scheduler(&mut self) -> &mut CalloopScheduler<Self> {
        self.home.scheduler_mut()
    }

    fn dispatch_timer(&mut self, token: TimerToken) {
        self.home.dispatch_timer(token);
    }
}

/// Replay on a calloop event loop in wall clock time
pub fn run_realtime(scenario: &Scenario, config: &EngineConfig, caps: &PlatformCaps) -> Result<Vec<TimedEvent>> {
    let mut event_loop: EventLoop<'static, LiveEngine> = EventLoop::try_new()?;
    let handle = event_loop.handle();

    let home = scenario.build(config, CalloopScheduler::new(handle.clone()), caps)?;
    let mut engine = LiveEngine { home, finished: false };

    for step in &scenario.steps {
        let step = step.clone();
        let timer = Timer::from_duration(Duration::from_millis(step.at));
        handle
            .insert_source(timer, move |_, _, engine: &mut LiveEngine| {
                step.apply(&mut engine.home);
                TimeoutAction::Drop
            })
            .map_err(|e| e.error)?;
    }

    let end = Timer::from_duration(Duration::from_millis(scenario.duration() + SETTLE_MS));
    handle
        .insert_source(end, |_, _, engine: &mut LiveEngine| {
            engine.home.shutdown();
            engine.finished = true;
            TimeoutAction::Drop
        })
        .map_err(|e| e.error)?;

    info!(steps = scenario.steps.len(), "Realtime replay started");
    while !engine.finished {
        if let Err(e) = event_loop.dispatch(Some(Duration::from_millis(16)), &mut engine) {
            error!("Event loop error: {:?}", e);
            return Err(e.into());
        }
    }
    debug!("Realtime replay finished");
    Ok(engine.home.take_events())
}
