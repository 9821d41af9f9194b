//! Full-screen capture to the screenshots folder

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::schedule::Clock;
use crate::actions::{Action, ActionArgs, ActionContext};
use crate::desktop::Desktop;
use crate::{Error, Result};

/// `take_screenshot` action
pub struct ScreenshotTool {
    desktop: Arc<dyn Desktop>,
    dir: PathBuf,
    clock: Clock,
}

impl ScreenshotTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>, dir: impl Into<PathBuf>, clock: Clock) -> Self {
        Self {
            desktop,
            dir: dir.into(),
            clock,
        }
    }

    /// Target path for an optional spoken filename
    ///
    /// # Errors
    ///
    /// Returns `Error::Rejected` for names that would escape the folder
    pub fn target(&self, filename: Option<&str>) -> Result<PathBuf> {
        let stem = match filename.map(str::trim).filter(|f| !f.is_empty()) {
            Some(name) => {
                let name = name.strip_suffix(".png").unwrap_or(name);
                if name.contains(['/', '\\']) || name.contains("..") || name.is_empty() {
                    return Err(Error::Rejected(format!(
                        "I can't save a screenshot as '{name}'. Please use a plain file name."
                    )));
                }
                name.to_string()
            }
            None => format!("screenshot_{}", (self.clock)().format("%Y%m%d_%H%M%S")),
        };
        Ok(self.dir.join(format!("{stem}.png")))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Action for ScreenshotTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let path = self.target(args.str("filename"))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::External(format!(
                "Could not create screenshot folder {}: {e}",
                self.dir.display()
            ))
        })?;

        self.desktop
            .screenshot(&path)
            .await
            .map_err(|e| Error::External(format!("Could not take screenshot: {e}")))?;

        tracing::info!(path = %path.display(), "screenshot saved");
        Ok(ctx.persona.reply(&format!("Screenshot saved to {}", path.display())))
    }
}
