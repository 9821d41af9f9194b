//! Action declaration and dispatch
//!
//! An action is a named capability the Dialogue Driver may call: a typed
//! parameter list, a description for the language model, and a handler.
//! Actions are collected into an [`ActionRegistry`] at startup and invoked
//! through an [`ActionInvoker`], which never lets a handler failure escape.

mod invoker;
mod registry;
pub mod schema;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

pub use invoker::ActionInvoker;
pub use registry::{ActionRegistry, ActionSummary};
pub use schema::{ActionArgs, ArgValue, ParamSpec, ParamType};

use crate::Result;
use crate::persona::Persona;
use crate::session::SessionController;

/// Group used when a descriptor does not name one
pub const DEFAULT_GROUP: &str = "GENERAL";

/// Handler behind an action
///
/// Implementations receive arguments that already passed validation. A
/// returned `Err` becomes a spoken failure; it never reaches the caller as a
/// Rust error.
#[async_trait]
pub trait Action: Send + Sync {
    /// Run the action and produce the text spoken back to the user
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String>;
}

/// State shared with every handler invocation
#[derive(Clone)]
pub struct ActionContext {
    /// Session lifecycle, used by the termination action
    pub session: Arc<SessionController>,
    /// Assistant persona for reply phrasing
    pub persona: Arc<Persona>,
}

impl ActionContext {
    /// Create a new context
    #[must_use]
    pub const fn new(session: Arc<SessionController>, persona: Arc<Persona>) -> Self {
        Self { session, persona }
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("session", &self.session.state())
            .field("persona", &self.persona.name)
            .finish()
    }
}

/// Everything the registry knows about one action
#[derive(Clone)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
    pub group: String,
    pub params: Vec<ParamSpec>,
    pub handler: Arc<dyn Action>,
}

impl ActionDescriptor {
    /// Create a descriptor with no parameters
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Action + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            group: DEFAULT_GROUP.to_string(),
            params: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Append a parameter
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Set the display group
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum Outcome {
    Success(String),
    Failure(String),
}

/// Normalized result of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    pub outcome: Outcome,
    /// The handler changed something before it failed
    pub side_effects_committed: bool,
}

impl InvocationResult {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Success(text.into()),
            side_effects_committed: false,
        }
    }

    #[must_use]
    pub fn failure(reason: impl Into<String>, side_effects_committed: bool) -> Self {
        Self {
            outcome: Outcome::Failure(reason.into()),
            side_effects_committed,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// Text to speak, whichever way it ended
    #[must_use]
    pub fn text(&self) -> &str {
        match &self.outcome {
            Outcome::Success(text) | Outcome::Failure(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_result_serializes_tagged() {
        let value = serde_json::to_value(InvocationResult::success("Done, Boss.")).unwrap();
        assert_eq!(value["outcome"]["status"], "success");
        assert_eq!(value["outcome"]["text"], "Done, Boss.");
        assert_eq!(value["side_effects_committed"], false);

        let value = serde_json::to_value(InvocationResult::failure("nope", true)).unwrap();
        assert_eq!(value["outcome"]["status"], "failure");
        assert_eq!(value["side_effects_committed"], true);
    }

    #[test]
    fn text_reads_either_outcome() {
        assert_eq!(InvocationResult::success("a").text(), "a");
        assert_eq!(InvocationResult::failure("b", false).text(), "b");
        assert!(!InvocationResult::failure("b", false).is_success());
    }
}
