//! Session lifecycle and self-termination
//!
//! The session has two states, `Running` and `ShuttingDown`, and moves
//! between them exactly once. The transition is triggered by the
//! `close_assistant` action: the farewell is returned immediately so it can be
//! spoken, and a timer on a dedicated OS thread ends the process after the
//! grace delay. The timer does not depend on the async runtime, the transport
//! or the Dialogue Driver, so a stalled upstream cannot keep the session open.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use crate::{Error, Result};

/// Default wait between the farewell and process exit
pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_secs(2);

/// Upper bound on the grace delay
pub const MAX_GRACE_DELAY: Duration = Duration::from_secs(10);

/// Exit code used for every intentional termination
pub const EXIT_CODE: i32 = 0;

/// Lifecycle state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Running,
    ShuttingDown,
}

/// Ends the process
pub trait Terminator: Send + Sync {
    fn terminate(&self, code: i32);
}

/// Calls `std::process::exit`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, code: i32) {
        tracing::info!(code, "terminating process");
        std::process::exit(code);
    }
}

/// Schedules a termination after a delay
pub trait ExitTimer: Send + Sync {
    /// Arm the timer. It must fire without further calls from the caller.
    ///
    /// # Errors
    ///
    /// Returns `Error::Shutdown` if the timer could not be scheduled
    fn arm(&self, delay: Duration, terminator: Arc<dyn Terminator>) -> Result<()>;
}

/// Sleeps on a named OS thread, then terminates
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadTimer;

impl ExitTimer for ThreadTimer {
    fn arm(&self, delay: Duration, terminator: Arc<dyn Terminator>) -> Result<()> {
        std::thread::Builder::new()
            .name("nevira-exit".to_string())
            .spawn(move || {
                std::thread::sleep(delay);
                terminator.terminate(EXIT_CODE);
            })
            .map(drop)
            .map_err(|e| Error::Shutdown(format!("failed to spawn exit timer: {e}")))
    }
}

/// Owns the shutdown flag and the termination path
pub struct SessionController {
    shutdown_requested: AtomicBool,
    state: watch::Sender<SessionState>,
    grace_delay: Duration,
    terminator: Arc<dyn Terminator>,
    timer: Arc<dyn ExitTimer>,
}

impl SessionController {
    /// Controller that really exits the process
    #[must_use]
    pub fn new(grace_delay: Duration) -> Self {
        Self::with_parts(grace_delay, Arc::new(ProcessTerminator), Arc::new(ThreadTimer))
    }

    /// Controller with injected termination and timer
    #[must_use]
    pub fn with_parts(
        grace_delay: Duration,
        terminator: Arc<dyn Terminator>,
        timer: Arc<dyn ExitTimer>,
    ) -> Self {
        let grace_delay = if grace_delay > MAX_GRACE_DELAY {
            tracing::warn!(
                requested_ms = u64::try_from(grace_delay.as_millis()).unwrap_or(u64::MAX),
                max_ms = u64::try_from(MAX_GRACE_DELAY.as_millis()).unwrap_or(u64::MAX),
                "grace delay clamped"
            );
            MAX_GRACE_DELAY
        } else {
            grace_delay
        };

        let (state, _) = watch::channel(SessionState::Running);
        Self {
            shutdown_requested: AtomicBool::new(false),
            state,
            grace_delay,
            terminator,
            timer,
        }
    }

    #[must_use]
    pub const fn grace_delay(&self) -> Duration {
        self.grace_delay
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Whether the session stopped accepting new turns
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Receiver notified when the state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolve once the session is shutting down
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|s| *s == SessionState::ShuttingDown).await;
    }

    /// Begin shutdown and return the farewell to speak
    ///
    /// Only the first call arms the exit timer. Later calls return the same
    /// farewell and change nothing. If the timer cannot be armed the process
    /// is terminated at once.
    pub fn request_shutdown(&self, farewell: String) -> String {
        if self
            .shutdown_requested
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("shutdown already requested");
            return farewell;
        }

        self.state.send_replace(SessionState::ShuttingDown);
        let grace_ms = u64::try_from(self.grace_delay.as_millis()).unwrap_or(u64::MAX);
        tracing::info!(grace_ms, "session shutting down");

        if let Err(e) = self.timer.arm(self.grace_delay, Arc::clone(&self.terminator)) {
            tracing::error!(error = %e, "exit timer unavailable, terminating now");
            self.terminator.terminate(EXIT_CODE);
        }

        farewell
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state())
            .field("grace_delay", &self.grace_delay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{FailingTimer, ManualTimer, RecordingTerminator};

    fn controller(
        grace: Duration,
    ) -> (SessionController, Arc<RecordingTerminator>, Arc<ManualTimer>) {
        let terminator = Arc::new(RecordingTerminator::default());
        let timer = Arc::new(ManualTimer::default());
        let session = SessionController::with_parts(
            grace,
            Arc::clone(&terminator) as Arc<dyn Terminator>,
            Arc::clone(&timer) as Arc<dyn ExitTimer>,
        );
        (session, terminator, timer)
    }

    #[test]
    fn starts_running() {
        let (session, terminator, timer) = controller(DEFAULT_GRACE_DELAY);
        assert_eq!(session.state(), SessionState::Running);
        assert!(!session.is_shutting_down());
        assert!(terminator.codes().is_empty());
        assert!(timer.armed().is_empty());
    }

    #[test]
    fn first_request_arms_timer_once() {
        let (session, terminator, timer) = controller(DEFAULT_GRACE_DELAY);
        let reply = session.request_shutdown("Goodbye, Boss.".into());
        assert_eq!(reply, "Goodbye, Boss.");
        assert_eq!(session.state(), SessionState::ShuttingDown);
        assert!(session.is_shutting_down());
        assert_eq!(timer.armed(), vec![DEFAULT_GRACE_DELAY]);
        assert!(terminator.codes().is_empty());
    }

    #[test]
    fn repeat_request_is_noop() {
        let (session, _terminator, timer) = controller(DEFAULT_GRACE_DELAY);
        session.request_shutdown("Goodbye.".into());
        let again = session.request_shutdown("Goodbye.".into());
        assert_eq!(again, "Goodbye.");
        assert_eq!(timer.armed().len(), 1);
    }

    #[test]
    fn grace_delay_is_clamped() {
        let (session, _, _) = controller(Duration::from_secs(600));
        assert_eq!(session.grace_delay(), MAX_GRACE_DELAY);
    }

    #[test]
    fn timer_failure_terminates_immediately() {
        let terminator = Arc::new(RecordingTerminator::default());
        let session = SessionController::with_parts(
            DEFAULT_GRACE_DELAY,
            Arc::clone(&terminator) as Arc<dyn Terminator>,
            Arc::new(FailingTimer),
        );
        let reply = session.request_shutdown("Goodbye.".into());
        assert_eq!(reply, "Goodbye.");
        assert_eq!(terminator.codes(), vec![EXIT_CODE]);
    }

    #[test]
    fn thread_timer_fires_after_delay() {
        let terminator = Arc::new(RecordingTerminator::default());
        ThreadTimer
            .arm(
                Duration::from_millis(20),
                Arc::clone(&terminator) as Arc<dyn Terminator>,
            )
            .unwrap();
        assert!(terminator.wait_for_exit(Duration::from_secs(2)));
        assert_eq!(terminator.codes(), vec![EXIT_CODE]);
    }

    #[tokio::test]
    async fn subscribers_observe_shutdown() {
        let (session, _, _) = controller(DEFAULT_GRACE_DELAY);
        let session = Arc::new(session);
        let waiter = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.wait_for_shutdown().await })
        };
        session.request_shutdown("Bye.".into());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
