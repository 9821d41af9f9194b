//! Nevira - tool-dispatch core of a voice-driven personal assistant
//!
//! This library provides:
//! - A registry of named actions with typed parameter schemas
//! - An invoker that validates arguments and contains every handler failure
//! - A session controller whose termination action ends the process
//! - The built-in desktop, web and mail actions
//! - An HTTP API for the Dialogue Driver
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │          Dialogue Driver (speech + LLM)             │
//! └────────────────────┬────────────────────────────────┘
//!                      │  HTTP / CLI
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Nevira                           │
//! │   Registry  │  Invoker  │  Session Controller       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │      Desktop  │  wttr.in  │  Search  │  SMTP         │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod actions;
pub mod api;
pub mod config;
pub mod desktop;
pub mod error;
pub mod persona;
pub mod prompt;
pub mod session;
pub mod tools;

#[doc(hidden)]
pub mod testsupport;

pub use actions::{
    Action, ActionArgs, ActionContext, ActionDescriptor, ActionInvoker, ActionRegistry,
    ActionSummary, InvocationResult, Outcome, ParamSpec,
};
pub use config::Config;
pub use desktop::{Desktop, DryRunDesktop, SystemDesktop};
pub use error::{Error, Result};
pub use persona::Persona;
pub use prompt::AgentPrompt;
pub use session::{SessionController, SessionState};
pub use tools::builtin_registry;
