//! HTTP API server for Nevira
//!
//! The Dialogue Driver lists actions, invokes them one at a time and fetches
//! the agent instructions through this surface. Once the session starts
//! shutting down the server refuses new turns and stops accepting
//! connections.

pub mod actions;
mod auth;
pub mod health;

use std::sync::Arc;

use axum::Router;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::actions::ActionInvoker;
use crate::prompt::AgentPrompt;
use crate::session::SessionController;
use crate::Result;

/// Shared state for API handlers
pub struct ApiState {
    pub invoker: ActionInvoker,
    pub session: Arc<SessionController>,
    pub prompt: AgentPrompt,
    /// Bearer key required on `/api/*` when set
    pub api_key: Option<SecretString>,
}

impl ApiState {
    /// State whose prompt is generated from the invoker's registry
    #[must_use]
    pub fn new(invoker: ActionInvoker, api_key: Option<SecretString>) -> Self {
        let ctx = invoker.context();
        let prompt = AgentPrompt::build(&ctx.persona, invoker.registry());
        let session = Arc::clone(&ctx.session);
        Self {
            invoker,
            session,
            prompt,
            api_key,
        }
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    let api = actions::router(Arc::clone(&state)).layer(axum::middleware::from_fn_with_state(
        Arc::clone(&state),
        auth::require_api_key,
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .merge(health::router())
        .merge(health::ready_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            port,
        }
    }

    /// Run until the session shuts down or Ctrl-C is received
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        let session = Arc::clone(&self.state.session);
        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move {
                tokio::select! {
                    () = session.wait_for_shutdown() => {
                        tracing::info!("session ended, closing API server");
                    }
                    res = tokio::signal::ctrl_c() => {
                        if let Err(e) = res {
                            tracing::error!(error = %e, "failed to listen for ctrl-c");
                        }
                        tracing::info!("interrupted, closing API server");
                    }
                }
            })
            .await?;

        Ok(())
    }
}
