//! Built-in actions for Nevira
//!
//! [`builtin_registry`] registers every action in the order and groups the
//! agent instructions present them.

mod apps;
mod assistant;
mod browser;
mod email;
mod media;
mod schedule;
mod screenshot;
mod system;
mod web;

use std::sync::Arc;

pub use apps::{
    CloseAppTool, CloseBrowserTool, ForceCloseTool, Launch, OpenAppTool, Processes,
    browser_processes, launch_for, processes_for,
};
pub use assistant::CloseAssistantTool;
pub use browser::{GoogleSearchTool, SITES, SiteTarget, WebsiteTool, google_search_url, resolve_site};
pub use email::EmailTool;
pub use media::{MediaControlTool, MusicPlatform, MusicTool, VolumeTool};
pub use schedule::{Clock, ClockTool, ScheduleTool, describe_time, local_clock};
pub use screenshot::ScreenshotTool;
pub use system::{Battery, SystemSnapshot, SystemStatusTool};
pub use web::{SearchProvider, SearchResult, WeatherTool, WebSearchTool};

use crate::Result;
use crate::actions::{ActionDescriptor, ActionRegistry, ParamSpec};
use crate::config::Config;
use crate::desktop::Desktop;

pub const GROUP_INFORMATION: &str = "INFORMATION & SEARCH";
pub const GROUP_COMMUNICATION: &str = "COMMUNICATION";
pub const GROUP_SYSTEM: &str = "SYSTEM CONTROL";
pub const GROUP_APPLICATIONS: &str = "APPLICATIONS";
pub const GROUP_MEDIA: &str = "MUSIC & MEDIA";
pub const GROUP_ASSISTANT: &str = "ASSISTANT CONTROL";

/// Lowercase, trimmed, inner whitespace collapsed
pub(crate) fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Value whose synonym list contains `spoken` (already normalized)
pub(crate) fn match_synonym<T: Copy>(table: &[(&[&str], T)], spoken: &str) -> Option<T> {
    table
        .iter()
        .find(|(synonyms, _)| synonyms.contains(&spoken))
        .map(|(_, value)| *value)
}

/// Pick the value for the platform this binary was built for
pub(crate) const fn per_platform<T: Copy>(windows: T, macos: T, other: T) -> T {
    if cfg!(target_os = "windows") {
        windows
    } else if cfg!(target_os = "macos") {
        macos
    } else {
        other
    }
}

/// Registry holding every built-in action
///
/// # Errors
///
/// Returns error if an action fails to register
pub fn builtin_registry(config: &Config, desktop: Arc<dyn Desktop>) -> Result<ActionRegistry> {
    builtin_registry_with_clock(config, desktop, local_clock())
}

/// Registry holding every built-in action, reading time from `clock`
///
/// # Errors
///
/// Returns error if an action fails to register
pub fn builtin_registry_with_clock(
    config: &Config,
    desktop: Arc<dyn Desktop>,
    clock: Clock,
) -> Result<ActionRegistry> {
    let mut registry = ActionRegistry::new();

    // INFORMATION & SEARCH
    registry.register(
        ActionDescriptor::new(
            "get_weather",
            "Get the current weather for a given city.",
            WeatherTool::new(config.weather_url.clone()),
        )
        .param(ParamSpec::string("city", "City name, e.g. \"London\""))
        .group(GROUP_INFORMATION),
    )?;
    registry.register(
        ActionDescriptor::new(
            "search_web",
            "Search the internet and return the top results.",
            WebSearchTool::new(config.brave_api_key.clone()),
        )
        .param(ParamSpec::string("query", "What to search for"))
        .group(GROUP_INFORMATION),
    )?;
    registry.register(
        ActionDescriptor::new(
            "search_google",
            "Open a Google search for a query in the default browser.",
            GoogleSearchTool::new(Arc::clone(&desktop)),
        )
        .param(ParamSpec::string("query", "The search query"))
        .group(GROUP_INFORMATION),
    )?;
    registry.register(
        ActionDescriptor::new(
            "get_time_and_date",
            "Get the current time, date, and day of the week.",
            ClockTool::new(Arc::clone(&clock)),
        )
        .group(GROUP_INFORMATION),
    )?;
    registry.register(
        ActionDescriptor::new(
            "get_schedule",
            "Get the user's schedule for a day. Returns today's schedule when no day is given.",
            ScheduleTool::new(config.schedule.clone(), Arc::clone(&clock)),
        )
        .param(
            ParamSpec::string("day", "Day of the week (monday, tuesday, ...) or \"today\"")
                .optional(),
        )
        .group(GROUP_INFORMATION),
    )?;

    // COMMUNICATION
    registry.register(
        ActionDescriptor::new(
            "send_email",
            "Send an email through Gmail.",
            EmailTool::new(&config.email),
        )
        .param(ParamSpec::string("to_email", "Recipient email address"))
        .param(ParamSpec::string("subject", "Email subject line"))
        .param(ParamSpec::string("message", "Email body content"))
        .param(ParamSpec::string("cc_email", "Optional CC email address").optional())
        .group(GROUP_COMMUNICATION),
    )?;

    // SYSTEM CONTROL
    registry.register(
        ActionDescriptor::new(
            "get_system_status",
            "Check CPU, memory, disk and battery status.",
            SystemStatusTool,
        )
        .group(GROUP_SYSTEM),
    )?;
    registry.register(
        ActionDescriptor::new(
            "control_volume",
            "Control system volume.",
            VolumeTool::new(Arc::clone(&desktop)),
        )
        .param(ParamSpec::string("action", "One of: up, down, mute, unmute"))
        .group(GROUP_SYSTEM),
    )?;
    registry.register(
        ActionDescriptor::new(
            "take_screenshot",
            "Take a screenshot and save it to the screenshots folder.",
            ScreenshotTool::new(
                Arc::clone(&desktop),
                config.screenshot_dir.clone(),
                Arc::clone(&clock),
            ),
        )
        .param(ParamSpec::string("filename", "Optional file name without extension").optional())
        .group(GROUP_SYSTEM),
    )?;

    // APPLICATIONS
    registry.register(
        ActionDescriptor::new(
            "open_application",
            "Open apps like calculator, notepad, paint, command prompt, file explorer, task manager or settings.",
            OpenAppTool::new(Arc::clone(&desktop)),
        )
        .param(ParamSpec::string("app_name", "Name of the application"))
        .group(GROUP_APPLICATIONS),
    )?;
    registry.register(
        ActionDescriptor::new(
            "close_application",
            "Close applications like calculator, notepad, paint, chrome or edge.",
            CloseAppTool::new(Arc::clone(&desktop)),
        )
        .param(ParamSpec::string("app_name", "Name of the application to close"))
        .group(GROUP_APPLICATIONS),
    )?;
    registry.register(
        ActionDescriptor::new(
            "force_close_application",
            "Force close any running application by its process name.",
            ForceCloseTool::new(Arc::clone(&desktop)),
        )
        .param(ParamSpec::string("app_name", "Process name, e.g. \"vlc\" or \"discord\""))
        .group(GROUP_APPLICATIONS),
    )?;
    registry.register(
        ActionDescriptor::new(
            "open_website",
            "Open websites like YouTube, Facebook, GitHub or Google, or any web address.",
            WebsiteTool::new(Arc::clone(&desktop)),
        )
        .param(ParamSpec::string("site_name", "Site name or web address"))
        .group(GROUP_APPLICATIONS),
    )?;

    // MUSIC & MEDIA
    registry.register(
        ActionDescriptor::new(
            "play_music",
            "Play music from YouTube or Spotify.",
            MusicTool::new(Arc::clone(&desktop)),
        )
        .param(ParamSpec::string("query", "Song, artist or playlist").optional())
        .param(ParamSpec::string("platform", "youtube or spotify").with_default("youtube"))
        .group(GROUP_MEDIA),
    )?;
    registry.register(
        ActionDescriptor::new(
            "open_youtube_music",
            "Open YouTube Music, searching for a query when one is given.",
            MusicTool::pinned(Arc::clone(&desktop), MusicPlatform::YouTubeMusic),
        )
        .param(ParamSpec::string("query", "Song, artist or playlist").optional())
        .group(GROUP_MEDIA),
    )?;
    registry.register(
        ActionDescriptor::new(
            "open_spotify",
            "Open Spotify, searching for a query when one is given.",
            MusicTool::pinned(Arc::clone(&desktop), MusicPlatform::Spotify),
        )
        .param(ParamSpec::string("query", "Song, artist or playlist").optional())
        .group(GROUP_MEDIA),
    )?;
    registry.register(
        ActionDescriptor::new(
            "control_media",
            "Control playback: play, pause, next, previous or stop.",
            MediaControlTool::new(Arc::clone(&desktop)),
        )
        .param(ParamSpec::string("action", "One of: play, pause, next, previous, stop"))
        .group(GROUP_MEDIA),
    )?;
    registry.register(
        ActionDescriptor::new(
            "close_browser",
            "Close browser windows: chrome, edge, firefox or all.",
            CloseBrowserTool::new(desktop),
        )
        .param(ParamSpec::string("browser", "chrome, edge, firefox or all").with_default("all"))
        .group(GROUP_MEDIA),
    )?;

    // ASSISTANT CONTROL
    registry.register(
        ActionDescriptor::new(
            "close_assistant",
            "Close the assistant and end the session completely. Always call when the user says goodbye, exit, close, disconnect, bye, shut down, or stop.",
            CloseAssistantTool,
        )
        .group(GROUP_ASSISTANT),
    )?;

    tracing::debug!(actions = registry.len(), "built-in actions registered");
    Ok(registry)
}
