//! Resolve, validate, run and contain one action call

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{self, ActionArgs};
use super::{ActionContext, ActionRegistry, ActionSummary, InvocationResult, Outcome};
use crate::Error;

/// Executes actions from a frozen registry
///
/// `invoke` never returns an error and never panics: every failure is
/// folded into an [`InvocationResult`] the assistant can speak.
#[derive(Debug, Clone)]
pub struct ActionInvoker {
    registry: Arc<ActionRegistry>,
    ctx: ActionContext,
    timeout: Option<Duration>,
}

impl ActionInvoker {
    /// Create an invoker; `timeout` of `None` lets handlers run unbounded
    #[must_use]
    pub fn new(registry: ActionRegistry, ctx: ActionContext, timeout: Option<Duration>) -> Self {
        Self {
            registry: Arc::new(registry),
            ctx,
            timeout,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn context(&self) -> &ActionContext {
        &self.ctx
    }

    /// Catalogue of available actions
    #[must_use]
    pub fn available_actions(&self) -> Vec<ActionSummary> {
        self.registry.summaries()
    }

    /// Run `name` with loosely typed `raw_args`
    pub async fn invoke(&self, name: &str, raw_args: &Value) -> InvocationResult {
        let invocation_id = Uuid::new_v4();
        let started = Instant::now();

        let Ok(descriptor) = self.registry.lookup(name) else {
            let available = self.registry.names().collect::<Vec<_>>().join(", ");
            let result = InvocationResult::failure(
                format!("I don't have an action called '{name}'. Available actions: {available}."),
                false,
            );
            log_invocation(
                invocation_id,
                name,
                &schema::redact_raw(&[], raw_args),
                &result,
                started,
            );
            return result;
        };

        let args = match ActionArgs::validate(&descriptor.params, raw_args) {
            Ok(args) => args,
            Err(err) => {
                let result =
                    InvocationResult::failure(format!("I couldn't run {name}: {err}."), false);
                log_invocation(
                    invocation_id,
                    name,
                    &schema::redact_raw(&descriptor.params, raw_args),
                    &result,
                    started,
                );
                return result;
            }
        };

        let secrets = args.secret_values(&descriptor.params);
        let handler = Arc::clone(&descriptor.handler);
        let run = AssertUnwindSafe(handler.run(&args, &self.ctx)).catch_unwind();

        let completed = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.ok(),
            None => Some(run.await),
        };

        let result = match completed {
            Some(Ok(Ok(text))) => InvocationResult::success(text),
            Some(Ok(Err(err))) => {
                let committed = err.side_effects_committed();
                InvocationResult::failure(schema::scrub(&failure_text(name, &err), &secrets), committed)
            }
            Some(Err(panic)) => {
                let detail = schema::scrub(&panic_message(panic.as_ref()), &secrets);
                tracing::error!(%invocation_id, action = %name, panic = %detail, "action panicked");
                InvocationResult::failure(
                    format!("Something went wrong while running {name}, and it stopped unexpectedly."),
                    false,
                )
            }
            None => {
                let secs = self.timeout.map_or(0, |d| d.as_secs());
                InvocationResult::failure(
                    format!("{name} took too long to respond (over {secs} seconds)."),
                    false,
                )
            }
        };

        log_invocation(
            invocation_id,
            name,
            &args.redacted(&descriptor.params),
            &result,
            started,
        );
        result
    }
}

/// Spoken text for a handler error
fn failure_text(name: &str, err: &Error) -> String {
    match err {
        Error::Rejected(msg) | Error::External(msg) | Error::PartiallyApplied(msg) => msg.clone(),
        Error::Validation { .. } => format!("I couldn't run {name}: {err}."),
        other => format!("Something went wrong while running {name}: {other}."),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn log_invocation(
    invocation_id: Uuid,
    action: &str,
    args: &Value,
    result: &InvocationResult,
    started: Instant,
) {
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match &result.outcome {
        Outcome::Success(_) => tracing::info!(
            %invocation_id,
            action,
            args = %args,
            outcome = "success",
            latency_ms,
            side_effects_committed = result.side_effects_committed,
            "action invoked"
        ),
        Outcome::Failure(reason) => tracing::warn!(
            %invocation_id,
            action,
            args = %args,
            outcome = "failure",
            reason = %reason,
            latency_ms,
            side_effects_committed = result.side_effects_committed,
            "action failed"
        ),
    }
}
