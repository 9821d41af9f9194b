//! Test doubles shared by unit and integration tests
//!
//! Hidden from the docs; nothing here exits the process or sleeps.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::actions::ActionContext;
use crate::persona::Persona;
use crate::session::{DEFAULT_GRACE_DELAY, ExitTimer, SessionController, Terminator};
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records exit codes instead of exiting
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    codes: Mutex<Vec<i32>>,
    fired: Condvar,
}

impl RecordingTerminator {
    #[must_use]
    pub fn codes(&self) -> Vec<i32> {
        lock(&self.codes).clone()
    }

    /// Block until a termination is recorded or `limit` passes
    #[must_use]
    pub fn wait_for_exit(&self, limit: Duration) -> bool {
        let (guard, _) = self
            .fired
            .wait_timeout_while(lock(&self.codes), limit, |codes| codes.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        !guard.is_empty()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, code: i32) {
        lock(&self.codes).push(code);
        self.fired.notify_all();
    }
}

/// Records arm requests without scheduling anything
#[derive(Debug, Default)]
pub struct ManualTimer {
    armed: Mutex<Vec<Duration>>,
}

impl ManualTimer {
    #[must_use]
    pub fn armed(&self) -> Vec<Duration> {
        lock(&self.armed).clone()
    }
}

impl ExitTimer for ManualTimer {
    fn arm(&self, delay: Duration, _terminator: Arc<dyn Terminator>) -> Result<()> {
        lock(&self.armed).push(delay);
        Ok(())
    }
}

/// Always fails to arm
#[derive(Debug, Default)]
pub struct FailingTimer;

impl ExitTimer for FailingTimer {
    fn arm(&self, _delay: Duration, _terminator: Arc<dyn Terminator>) -> Result<()> {
        Err(Error::Shutdown("no threads left".into()))
    }
}

/// Session with `grace` whose termination is only recorded
#[must_use]
pub fn session_with_grace(grace: Duration) -> Arc<SessionController> {
    Arc::new(SessionController::with_parts(
        grace,
        Arc::new(RecordingTerminator::default()),
        Arc::new(ManualTimer::default()),
    ))
}

/// Session whose termination is only recorded
#[must_use]
pub fn session() -> Arc<SessionController> {
    session_with_grace(DEFAULT_GRACE_DELAY)
}

/// Action context with the default persona and a recording session
#[must_use]
pub fn context() -> ActionContext {
    ActionContext::new(session(), Arc::new(Persona::default()))
}
