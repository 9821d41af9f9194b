//! Shared test utilities
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use nevira::session::{ExitTimer, ThreadTimer};
use nevira::testsupport::{ManualTimer, RecordingTerminator};
use nevira::tools::{Clock, builtin_registry_with_clock};
use nevira::{ActionContext, ActionInvoker, Config, DryRunDesktop, Persona, SessionController};

/// Monday 2026-10-12, 09:30
pub fn monday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 12)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap()
}

/// Invoker over the built-in actions with every side effect recorded
pub struct Harness {
    pub invoker: ActionInvoker,
    pub session: Arc<SessionController>,
    pub desktop: Arc<DryRunDesktop>,
    pub terminator: Arc<RecordingTerminator>,
    pub timer: Arc<ManualTimer>,
}

type Parts = (
    ActionInvoker,
    Arc<SessionController>,
    Arc<DryRunDesktop>,
    Arc<RecordingTerminator>,
);

fn build(config: &Config, timer: Arc<dyn ExitTimer>) -> Parts {
    let desktop = Arc::new(DryRunDesktop::new());
    let terminator = Arc::new(RecordingTerminator::default());
    let session = Arc::new(SessionController::with_parts(
        config.grace_delay,
        terminator.clone(),
        timer,
    ));
    let clock: Clock = Arc::new(monday_morning);
    let registry = builtin_registry_with_clock(config, desktop.clone(), clock).unwrap();
    let ctx = ActionContext::new(Arc::clone(&session), Arc::new(Persona::default()));
    let invoker = ActionInvoker::new(registry, ctx, config.action_timeout);
    (invoker, session, desktop, terminator)
}

/// Harness whose exit timer never fires
pub fn harness() -> Harness {
    let timer = Arc::new(ManualTimer::default());
    let (invoker, session, desktop, terminator) = build(&Config::default(), timer.clone());
    Harness {
        invoker,
        session,
        desktop,
        terminator,
        timer,
    }
}

/// Harness with the real exit thread and a short grace delay
pub fn harness_with_thread_timer(grace: Duration) -> (ActionInvoker, Arc<RecordingTerminator>) {
    let config = Config {
        grace_delay: grace,
        ..Config::default()
    };
    let (invoker, _, _, terminator) = build(&config, Arc::new(ThreadTimer));
    (invoker, terminator)
}
