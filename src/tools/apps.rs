//! Launch and close desktop applications

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::{normalize, per_platform};
use crate::actions::{Action, ActionArgs, ActionContext};
use crate::desktop::Desktop;
use crate::{Error, Result};

/// How an application is started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    /// Spawn a program; the first element is the executable
    Program(&'static [&'static str]),
    /// Hand a URI to the system opener
    Uri(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum App {
    Calculator,
    Notepad,
    Paint,
    Terminal,
    FileExplorer,
    TaskManager,
    Settings,
}

/// Spoken names accepted by `open_application`, in listing order
const OPENABLE: &[(&str, App)] = &[
    ("calculator", App::Calculator),
    ("notepad", App::Notepad),
    ("paint", App::Paint),
    ("cmd", App::Terminal),
    ("command prompt", App::Terminal),
    ("explorer", App::FileExplorer),
    ("file explorer", App::FileExplorer),
    ("task manager", App::TaskManager),
    ("settings", App::Settings),
];

impl App {
    const fn launch_windows(self) -> Launch {
        match self {
            Self::Calculator => Launch::Program(&["calc.exe"]),
            Self::Notepad => Launch::Program(&["notepad.exe"]),
            Self::Paint => Launch::Program(&["mspaint.exe"]),
            Self::Terminal => Launch::Program(&["cmd", "/C", "start", "", "cmd.exe"]),
            Self::FileExplorer => Launch::Program(&["explorer.exe"]),
            Self::TaskManager => Launch::Program(&["taskmgr.exe"]),
            Self::Settings => Launch::Uri("ms-settings:"),
        }
    }

    const fn launch_macos(self) -> Launch {
        match self {
            Self::Calculator => Launch::Program(&["open", "-a", "Calculator"]),
            Self::Notepad => Launch::Program(&["open", "-a", "TextEdit"]),
            Self::Paint => Launch::Program(&["open", "-a", "Preview"]),
            Self::Terminal => Launch::Program(&["open", "-a", "Terminal"]),
            Self::FileExplorer => Launch::Program(&["open", "-a", "Finder"]),
            Self::TaskManager => Launch::Program(&["open", "-a", "Activity Monitor"]),
            Self::Settings => Launch::Uri("x-apple.systempreferences:"),
        }
    }

    const fn launch_linux(self) -> Launch {
        match self {
            Self::Calculator => Launch::Program(&["gnome-calculator"]),
            Self::Notepad => Launch::Program(&["gedit"]),
            Self::Paint => Launch::Program(&["kolourpaint"]),
            Self::Terminal => Launch::Program(&["x-terminal-emulator"]),
            Self::FileExplorer => Launch::Program(&["xdg-open", "."]),
            Self::TaskManager => Launch::Program(&["gnome-system-monitor"]),
            Self::Settings => Launch::Program(&["gnome-control-center"]),
        }
    }

    fn launch(self) -> Launch {
        per_platform(self.launch_windows(), self.launch_macos(), self.launch_linux())
    }
}

pub type Processes = &'static [&'static str];

fn processes(windows: Processes, macos: Processes, linux: Processes) -> Processes {
    per_platform(windows, macos, linux)
}

fn chrome() -> Processes {
    processes(
        &["chrome.exe"],
        &["Google Chrome"],
        &["chrome", "chromium", "chromium-browser"],
    )
}

fn edge() -> Processes {
    processes(&["msedge.exe"], &["Microsoft Edge"], &["msedge", "microsoft-edge"])
}

fn firefox() -> Processes {
    processes(&["firefox.exe"], &["firefox"], &["firefox", "firefox-bin", "firefox-esr"])
}

/// Process names killed by `close_application`, in listing order
fn closable() -> [(&'static str, Processes); 5] {
    [
        (
            "calculator",
            processes(
                &["Calculator.exe", "ApplicationFrameHost.exe"],
                &["Calculator"],
                &["gnome-calculator", "kcalc"],
            ),
        ),
        ("notepad", processes(&["notepad.exe"], &["TextEdit"], &["gedit"])),
        ("paint", processes(&["mspaint.exe"], &["Preview"], &["kolourpaint"])),
        ("chrome", chrome()),
        ("edge", edge()),
    ]
}

/// Browsers `close_browser` knows, in listing order
fn browsers() -> [(&'static str, Processes); 3] {
    [("chrome", chrome()), ("edge", edge()), ("firefox", firefox())]
}

/// Process names for a spoken browser name; "all" covers every browser
#[must_use]
pub fn browser_processes(browser: &str) -> Option<Vec<&'static str>> {
    let name = normalize(browser);
    if name == "all" {
        return Some(browsers().iter().flat_map(|(_, names)| names.iter().copied()).collect());
    }
    browsers()
        .into_iter()
        .find(|(key, _)| *key == name)
        .map(|(_, names)| names.to_vec())
}

/// Executable name for a force close, as the process table shows it
///
/// Windows lists images with their extension, so `.exe` is appended when
/// the name has none.
fn force_close_target(app_name: &str) -> Result<String> {
    let name = app_name.trim();
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(Error::Rejected(format!(
            "'{app_name}' is not a process name I can close."
        )));
    }
    if cfg!(target_os = "windows") && Path::new(name).extension().is_none() {
        return Ok(format!("{name}.exe"));
    }
    Ok(name.to_string())
}

/// Kill every process in `targets`, counting the ones that ran
///
/// A failure after at least one kill is reported as partially applied.
async fn kill_all(desktop: &dyn Desktop, label: &str, targets: &[&str]) -> Result<usize> {
    let mut killed = 0_usize;
    for process in targets {
        match desktop.kill_process(process).await {
            Ok(true) => killed += 1,
            Ok(false) => tracing::debug!(process, "not running"),
            Err(e) if killed > 0 => {
                tracing::warn!(process, error = %e, "close stopped partway");
                return Err(Error::PartiallyApplied(format!(
                    "I closed part of {label}, but could not stop {process}: {e}"
                )));
            }
            Err(e) => {
                return Err(Error::External(format!("Could not close {label}: {e}")));
            }
        }
    }
    Ok(killed)
}

/// Launch command for a spoken application name
#[must_use]
pub fn launch_for(app_name: &str) -> Option<Launch> {
    let name = normalize(app_name);
    OPENABLE
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, app)| app.launch())
}

/// Process names for a spoken application name
#[must_use]
pub fn processes_for(app_name: &str) -> Option<Processes> {
    let name = normalize(app_name);
    closable()
        .into_iter()
        .find(|(key, _)| *key == name)
        .map(|(_, names)| names)
}

/// `open_application` action
pub struct OpenAppTool {
    desktop: Arc<dyn Desktop>,
}

impl OpenAppTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self { desktop }
    }
}

#[async_trait]
impl Action for OpenAppTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let app_name = normalize(args.required_str("app_name")?);
        let launch = launch_for(&app_name).ok_or_else(|| {
            let available = OPENABLE.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ");
            Error::Rejected(format!(
                "I don't know how to open '{app_name}'. Available apps: {available}"
            ))
        })?;

        let opened = match launch {
            Launch::Program(argv) => self.desktop.launch(argv).await,
            Launch::Uri(uri) => self.desktop.open_url(uri).await,
        };
        opened.map_err(|e| Error::External(format!("Could not open {app_name}: {e}")))?;

        tracing::info!(app = %app_name, "opened application");
        Ok(ctx.persona.reply(&format!("Opening {app_name} now")))
    }
}

/// `close_application` action
pub struct CloseAppTool {
    desktop: Arc<dyn Desktop>,
}

impl CloseAppTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self { desktop }
    }
}

#[async_trait]
impl Action for CloseAppTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let app_name = normalize(args.required_str("app_name")?);
        let targets = processes_for(&app_name).ok_or_else(|| {
            let available = closable().iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ");
            Error::Rejected(format!(
                "I don't know how to close '{app_name}'. Available: {available}"
            ))
        })?;

        let killed = kill_all(self.desktop.as_ref(), &app_name, targets).await?;

        tracing::info!(app = %app_name, killed, "closed application");
        if killed == 0 {
            return Ok(ctx.persona.reply(&format!("{app_name} isn't running")));
        }
        Ok(ctx.persona.reply(&format!("Closed {app_name}")))
    }
}

/// `force_close_application` action
pub struct ForceCloseTool {
    desktop: Arc<dyn Desktop>,
}

impl ForceCloseTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self { desktop }
    }
}

#[async_trait]
impl Action for ForceCloseTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let app_name = args.required_str("app_name")?.trim().to_string();
        let process = force_close_target(&app_name)?;

        let killed = kill_all(self.desktop.as_ref(), &app_name, &[process.as_str()]).await?;
        tracing::info!(process = %process, killed, "force closed application");
        if killed == 0 {
            return Ok(ctx.persona.reply(&format!("{app_name} isn't running")));
        }
        Ok(ctx.persona.reply(&format!("Force closed {app_name}")))
    }
}

/// `close_browser` action
pub struct CloseBrowserTool {
    desktop: Arc<dyn Desktop>,
}

impl CloseBrowserTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self { desktop }
    }
}

#[async_trait]
impl Action for CloseBrowserTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let browser = normalize(args.non_blank("browser").unwrap_or("all"));
        let targets = browser_processes(&browser).ok_or_else(|| {
            Error::Rejected(format!(
                "I don't know the browser '{browser}'. Use: chrome, edge, firefox, or all."
            ))
        })?;

        let label = if browser == "all" { "the browsers" } else { browser.as_str() };
        let killed = kill_all(self.desktop.as_ref(), label, &targets).await?;
        tracing::info!(browser = %browser, killed, "closed browser");
        let text = match (killed, browser.as_str()) {
            (0, "all") => "No browser is running".to_string(),
            (0, name) => format!("{name} isn't running"),
            (_, "all") => "Closed all browsers".to_string(),
            (_, name) => format!("Closed {name}"),
        };
        Ok(ctx.persona.reply(&text))
    }
}
