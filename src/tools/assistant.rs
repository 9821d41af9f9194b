//! Ending the session

use async_trait::async_trait;

use crate::Result;
use crate::actions::{Action, ActionArgs, ActionContext};

/// `close_assistant` action
///
/// Returns the farewell at once; the session controller ends the process
/// after its grace delay.
#[derive(Debug, Default)]
pub struct CloseAssistantTool;

#[async_trait]
impl Action for CloseAssistantTool {
    async fn run(&self, _args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        Ok(ctx.session.request_shutdown(ctx.persona.farewell()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::testsupport;

    #[tokio::test]
    async fn returns_farewell_and_shuts_down() {
        let ctx = testsupport::context();
        let text = CloseAssistantTool.run(&ActionArgs::default(), &ctx).await.unwrap();
        assert_eq!(text, "Goodbye, Boss. Nevira signing off.");
        assert_eq!(ctx.session.state(), SessionState::ShuttingDown);
    }

    #[tokio::test]
    async fn repeat_close_is_harmless() {
        let ctx = testsupport::context();
        let first = CloseAssistantTool.run(&ActionArgs::default(), &ctx).await.unwrap();
        let second = CloseAssistantTool.run(&ActionArgs::default(), &ctx).await.unwrap();
        assert_eq!(first, second);
    }
}
