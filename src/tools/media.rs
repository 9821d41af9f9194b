//! Volume, playback and music actions

use std::sync::Arc;

use async_trait::async_trait;

use super::{match_synonym, normalize};
use crate::actions::{Action, ActionArgs, ActionContext};
use crate::desktop::{Desktop, MediaKey};
use crate::{Error, Result};

const VOLUME_ACTIONS: &[(&[&str], MediaKey)] = &[
    (&["up", "increase", "raise", "louder"], MediaKey::VolumeUp),
    (&["down", "decrease", "lower", "quieter"], MediaKey::VolumeDown),
    (&["mute", "silence"], MediaKey::Mute),
    (&["unmute"], MediaKey::Unmute),
];

const PLAYBACK_ACTIONS: &[(&[&str], Playback)] = &[
    (&["play", "resume"], Playback::Resume),
    (&["pause"], Playback::Pause),
    (&["toggle", "play/pause", "playpause"], Playback::Toggle),
    (&["next", "skip"], Playback::Next),
    (&["previous", "prev", "back"], Playback::Previous),
    (&["stop"], Playback::Stop),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Playback {
    Resume,
    Pause,
    Toggle,
    Next,
    Previous,
    Stop,
}

impl Playback {
    const fn key(self) -> MediaKey {
        match self {
            Self::Resume | Self::Pause | Self::Toggle => MediaKey::PlayPause,
            Self::Next => MediaKey::Next,
            Self::Previous => MediaKey::Previous,
            Self::Stop => MediaKey::Stop,
        }
    }

    const fn confirmation(self) -> &'static str {
        match self {
            Self::Resume => "Resuming playback",
            Self::Pause => "Playback paused",
            Self::Toggle => "Playback toggled",
            Self::Next => "Skipping to the next track",
            Self::Previous => "Back to the previous track",
            Self::Stop => "Playback stopped",
        }
    }
}

/// `control_volume` action
pub struct VolumeTool {
    desktop: Arc<dyn Desktop>,
}

impl VolumeTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self { desktop }
    }
}

#[async_trait]
impl Action for VolumeTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let action = normalize(args.required_str("action")?);
        let key = match_synonym(VOLUME_ACTIONS, &action).ok_or_else(|| {
            Error::Rejected(format!(
                "Invalid action '{action}'. Use: up, down, mute, or unmute."
            ))
        })?;

        self.desktop
            .media_key(key)
            .await
            .map_err(|e| Error::External(format!("Could not control volume: {e}")))?;

        let text = match key {
            MediaKey::VolumeUp => "Volume increased",
            MediaKey::VolumeDown => "Volume decreased",
            MediaKey::Mute => "Volume muted",
            _ => "Volume unmuted",
        };
        tracing::info!(%key, "volume changed");
        Ok(ctx.persona.reply(text))
    }
}

/// `control_media` action
pub struct MediaControlTool {
    desktop: Arc<dyn Desktop>,
}

impl MediaControlTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self { desktop }
    }
}

#[async_trait]
impl Action for MediaControlTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let action = normalize(args.required_str("action")?);
        let playback = match_synonym(PLAYBACK_ACTIONS, &action).ok_or_else(|| {
            Error::Rejected(format!(
                "Invalid media action '{action}'. Use: play, pause, next, previous, or stop."
            ))
        })?;

        self.desktop
            .media_key(playback.key())
            .await
            .map_err(|e| Error::External(format!("Could not control playback: {e}")))?;

        tracing::info!(?playback, "media key sent");
        Ok(ctx.persona.reply(playback.confirmation()))
    }
}

/// Streaming service a music request opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicPlatform {
    YouTube,
    YouTubeMusic,
    Spotify,
}

impl MusicPlatform {
    fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "youtube" | "yt" => Some(Self::YouTube),
            "youtube music" | "yt music" | "ytmusic" => Some(Self::YouTubeMusic),
            "spotify" => Some(Self::Spotify),
            _ => None,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::YouTubeMusic => "YouTube Music",
            Self::Spotify => "Spotify",
        }
    }

    /// Search page for `query`, or the home page without one
    fn url(self, query: Option<&str>) -> String {
        match (self, query) {
            (Self::YouTube, Some(q)) => format!(
                "https://www.youtube.com/results?search_query={}",
                urlencoding::encode(q)
            ),
            (Self::YouTube | Self::YouTubeMusic, None) => "https://music.youtube.com".to_string(),
            (Self::YouTubeMusic, Some(q)) => format!(
                "https://music.youtube.com/search?q={}",
                urlencoding::encode(q)
            ),
            (Self::Spotify, Some(q)) => {
                format!("https://open.spotify.com/search/{}", urlencoding::encode(q))
            }
            (Self::Spotify, None) => "https://open.spotify.com".to_string(),
        }
    }
}

/// `play_music` action, or `open_youtube_music` / `open_spotify` when
/// pinned to one platform
pub struct MusicTool {
    desktop: Arc<dyn Desktop>,
    pinned: Option<MusicPlatform>,
}

impl MusicTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self {
            desktop,
            pinned: None,
        }
    }

    /// Always open `platform`; the `platform` argument is not read
    #[must_use]
    pub fn pinned(desktop: Arc<dyn Desktop>, platform: MusicPlatform) -> Self {
        Self {
            desktop,
            pinned: Some(platform),
        }
    }
}

#[async_trait]
impl Action for MusicTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let platform = match (self.pinned, args.non_blank("platform")) {
            (Some(platform), _) => platform,
            (None, None) => MusicPlatform::YouTube,
            (None, Some(p)) => MusicPlatform::parse(p).ok_or_else(|| {
                Error::Rejected(format!(
                    "I can't play music on '{p}'. Available platforms: youtube, spotify."
                ))
            })?,
        };
        let query = args.non_blank("query");
        let url = platform.url(query);

        self.desktop
            .open_url(&url)
            .await
            .map_err(|e| Error::External(format!("Could not open {}: {e}", platform.label())))?;

        tracing::info!(platform = platform.label(), query, "music opened");
        let text = match query {
            Some(q) => format!("Playing '{q}' on {}", platform.label()),
            None => format!("Opening {}", platform.label()),
        };
        Ok(ctx.persona.reply(&text))
    }
}
