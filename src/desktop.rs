//! Operating system automation
//!
//! Every built-in action that touches the local machine goes through the
//! [`Desktop`] trait. [`SystemDesktop`] shells out to the platform tools;
//! [`DryRunDesktop`] only records and logs what would have run.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use sysinfo::{ProcessRefreshKind, RefreshKind, System, UpdateKind};
use tokio::process::Command;

use crate::{Error, Result};

/// Hardware media and volume keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKey {
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
    PlayPause,
    Next,
    Previous,
    Stop,
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VolumeUp => "volume-up",
            Self::VolumeDown => "volume-down",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::PlayPause => "play-pause",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// Local machine operations used by the built-in actions
#[async_trait]
pub trait Desktop: Send + Sync {
    /// Open a URL or URI scheme with the default handler
    async fn open_url(&self, url: &str) -> Result<()>;

    /// Start a program without waiting for it; `argv[0]` is the program
    async fn launch(&self, argv: &[&str]) -> Result<()>;

    /// Kill every process with this exact name; `Ok(false)` if none ran
    async fn kill_process(&self, name: &str) -> Result<bool>;

    /// Press a media or volume key
    async fn media_key(&self, key: MediaKey) -> Result<()>;

    /// Capture the whole screen as PNG into `path`
    async fn screenshot(&self, path: &Path) -> Result<()>;
}

/// Real desktop backed by platform commands
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDesktop;

impl SystemDesktop {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Run a command to completion and fail on a non-zero exit
async fn run(program: &str, args: &[&str]) -> Result<()> {
    let status = status(program, args).await?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::External(format!("{program} exited with {status}")))
    }
}

async fn status(program: &str, args: &[&str]) -> Result<std::process::ExitStatus> {
    if which::which(program).is_err() {
        return Err(Error::External(format!("{program} is not installed")));
    }
    tracing::debug!(program, ?args, "running command");
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| Error::External(format!("failed to run {program}: {e}")))
}

/// First program from `candidates` found on PATH
fn first_installed<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|program| which::which(program).is_ok())
}

/// Program and argv that hand `url` to the default handler
///
/// No shell is involved, so `&`, `|` and `^` in query strings reach the
/// handler untouched.
fn url_opener(url: &str) -> (&'static str, Vec<&str>) {
    if cfg!(target_os = "windows") {
        ("rundll32", vec!["url.dll,FileProtocolHandler", url])
    } else if cfg!(target_os = "macos") {
        ("open", vec![url])
    } else {
        ("xdg-open", vec![url])
    }
}

/// Whether a process table entry is the program `name`
///
/// Linux truncates the kernel process name to 15 bytes, so the executable
/// file name and `argv[0]` are compared as well.
fn process_matches(
    name: &str,
    process_name: &OsStr,
    exe: Option<&Path>,
    argv0: Option<&OsStr>,
) -> bool {
    let wanted = OsStr::new(name);
    let same = |candidate: &OsStr| {
        if cfg!(target_os = "windows") {
            candidate.eq_ignore_ascii_case(wanted)
        } else {
            candidate == wanted
        }
    };
    same(process_name)
        || exe.and_then(Path::file_name).is_some_and(same)
        || argv0
            .and_then(|arg| Path::new(arg).file_name())
            .is_some_and(same)
}

/// Kill every process named `name`, skipping this one
fn kill_by_name(name: &str) -> Result<bool> {
    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(
            ProcessRefreshKind::new()
                .with_exe(UpdateKind::OnlyIfNotSet)
                .with_cmd(UpdateKind::OnlyIfNotSet),
        ),
    );
    let own = sysinfo::get_current_pid().ok();

    let mut killed = 0_usize;
    let mut stuck = Vec::new();
    for process in system.processes().values() {
        let argv0 = process.cmd().first().map(OsString::as_os_str);
        if Some(process.pid()) == own || !process_matches(name, process.name(), process.exe(), argv0)
        {
            continue;
        }
        if process.kill() {
            killed += 1;
        } else {
            stuck.push(process.pid().as_u32());
        }
    }

    tracing::debug!(process = name, killed, stuck = stuck.len(), "kill by name");
    if !stuck.is_empty() {
        return Err(Error::External(format!(
            "could not kill {name} (pid {stuck:?})"
        )));
    }
    Ok(killed > 0)
}

#[cfg(target_os = "windows")]
fn powershell_keypress(code: u8) -> String {
    format!("(New-Object -ComObject WScript.Shell).SendKeys([char]{code})")
}

#[async_trait]
impl Desktop for SystemDesktop {
    async fn open_url(&self, url: &str) -> Result<()> {
        let (program, args) = url_opener(url);
        run(program, &args).await
    }

    async fn launch(&self, argv: &[&str]) -> Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(Error::External("nothing to launch".to_string()));
        };
        if which::which(program).is_err() {
            return Err(Error::External(format!("{program} is not installed")));
        }
        tracing::debug!(program, ?args, "launching program");
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|e| Error::External(format!("failed to launch {program}: {e}")))
    }

    async fn kill_process(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        tokio::task::spawn_blocking(move || kill_by_name(&name))
            .await
            .map_err(|e| Error::External(format!("process lookup failed: {e}")))?
    }

    async fn media_key(&self, key: MediaKey) -> Result<()> {
        #[cfg(target_os = "windows")]
        {
            let code = match key {
                MediaKey::Mute | MediaKey::Unmute => 173,
                MediaKey::VolumeDown => 174,
                MediaKey::VolumeUp => 175,
                MediaKey::Next => 176,
                MediaKey::Previous => 177,
                MediaKey::Stop => 178,
                MediaKey::PlayPause => 179,
            };
            return run("powershell", &["-NoProfile", "-Command", &powershell_keypress(code)]).await;
        }

        #[cfg(target_os = "macos")]
        {
            let script = match key {
                MediaKey::VolumeUp => {
                    "set volume output volume ((output volume of (get volume settings)) + 10)"
                }
                MediaKey::VolumeDown => {
                    "set volume output volume ((output volume of (get volume settings)) - 10)"
                }
                MediaKey::Mute => "set volume with output muted",
                MediaKey::Unmute => "set volume without output muted",
                MediaKey::PlayPause => "tell application \"Music\" to playpause",
                MediaKey::Next => "tell application \"Music\" to next track",
                MediaKey::Previous => "tell application \"Music\" to previous track",
                MediaKey::Stop => "tell application \"Music\" to stop",
            };
            return run("osascript", &["-e", script]).await;
        }

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let (program, args): (&str, &[&str]) = match key {
                MediaKey::VolumeUp => ("pactl", &["set-sink-volume", "@DEFAULT_SINK@", "+10%"]),
                MediaKey::VolumeDown => ("pactl", &["set-sink-volume", "@DEFAULT_SINK@", "-10%"]),
                MediaKey::Mute => ("pactl", &["set-sink-mute", "@DEFAULT_SINK@", "1"]),
                MediaKey::Unmute => ("pactl", &["set-sink-mute", "@DEFAULT_SINK@", "0"]),
                MediaKey::PlayPause => ("playerctl", &["play-pause"]),
                MediaKey::Next => ("playerctl", &["next"]),
                MediaKey::Previous => ("playerctl", &["previous"]),
                MediaKey::Stop => ("playerctl", &["stop"]),
            };
            if which::which(program).is_ok() {
                return run(program, args).await;
            }

            // Fall back to synthetic key presses under X11
            let keysym = match key {
                MediaKey::VolumeUp => "XF86AudioRaiseVolume",
                MediaKey::VolumeDown => "XF86AudioLowerVolume",
                MediaKey::Mute | MediaKey::Unmute => "XF86AudioMute",
                MediaKey::PlayPause => "XF86AudioPlay",
                MediaKey::Next => "XF86AudioNext",
                MediaKey::Previous => "XF86AudioPrev",
                MediaKey::Stop => "XF86AudioStop",
            };
            run("xdotool", &["key", keysym]).await
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let target = path.to_string_lossy();

        #[cfg(target_os = "windows")]
        {
            let script = format!(
                "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
                 $b = [System.Windows.Forms.SystemInformation]::VirtualScreen; \
                 $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
                 $g = [System.Drawing.Graphics]::FromImage($bmp); \
                 $g.CopyFromScreen($b.Left, $b.Top, 0, 0, $bmp.Size); \
                 $bmp.Save('{}', [System.Drawing.Imaging.ImageFormat]::Png)",
                target.replace('\'', "''")
            );
            return run("powershell", &["-NoProfile", "-Command", &script]).await;
        }

        #[cfg(target_os = "macos")]
        return run("screencapture", &["-x", &target]).await;

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let tool = first_installed(&["grim", "gnome-screenshot", "scrot", "import"])
                .ok_or_else(|| {
                    Error::External(
                        "no screenshot tool found (install grim, gnome-screenshot, scrot or imagemagick)"
                            .to_string(),
                    )
                })?;
            match tool {
                "gnome-screenshot" => run(tool, &["-f", &target]).await,
                "scrot" => run(tool, &["--overwrite", &target]).await,
                "import" => run(tool, &["-window", "root", &target]).await,
                _ => run(tool, &[&target]).await,
            }
        }
    }
}

/// Records commands instead of running them
///
/// Used by `--dry-run` and by tests. Commands containing one of the
/// configured failure patterns return an error, to exercise failure paths.
#[derive(Debug, Default)]
pub struct DryRunDesktop {
    commands: Mutex<Vec<String>>,
    fail_on: Vec<String>,
}

impl DryRunDesktop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any command whose description contains `pattern`
    #[must_use]
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.fail_on.push(pattern.into());
        self
    }

    /// Commands recorded so far
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn record(&self, command: String) -> Result<()> {
        if self.fail_on.iter().any(|p| command.contains(p.as_str())) {
            tracing::info!(%command, "dry run: simulated failure");
            return Err(Error::External(format!("simulated failure for '{command}'")));
        }
        tracing::info!(%command, "dry run");
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
        Ok(())
    }
}

#[async_trait]
impl Desktop for DryRunDesktop {
    async fn open_url(&self, url: &str) -> Result<()> {
        self.record(format!("open {url}"))
    }

    async fn launch(&self, argv: &[&str]) -> Result<()> {
        self.record(format!("launch {}", argv.join(" ")))
    }

    async fn kill_process(&self, name: &str) -> Result<bool> {
        self.record(format!("kill {name}")).map(|()| true)
    }

    async fn media_key(&self, key: MediaKey) -> Result<()> {
        self.record(format!("key {key}"))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(format!("screenshot {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_records_commands() {
        let desktop = DryRunDesktop::new();
        desktop.open_url("https://example.com").await.unwrap();
        desktop.media_key(MediaKey::Mute).await.unwrap();
        assert!(desktop.kill_process("notepad.exe").await.unwrap());
        assert_eq!(
            desktop.commands(),
            ["open https://example.com", "key mute", "kill notepad.exe"]
        );
    }

    #[tokio::test]
    async fn dry_run_simulates_failures() {
        let desktop = DryRunDesktop::new().failing_on("chrome");
        assert!(desktop.kill_process("chrome").await.is_err());
        assert!(desktop.commands().is_empty());
    }

    #[test]
    fn first_installed_skips_missing_programs() {
        assert_eq!(first_installed(&["definitely-not-a-real-program-xyz"]), None);
    }

    #[tokio::test]
    async fn launch_rejects_empty_argv() {
        assert!(SystemDesktop::new().launch(&[]).await.is_err());
    }

    #[test]
    fn url_opener_keeps_query_in_one_argument() {
        let url = "https://www.google.com/search?q=rust&hl=en|x^y";
        let (program, args) = url_opener(url);
        assert_ne!(program, "cmd");
        assert_eq!(args.last(), Some(&url));
        assert_eq!(args.iter().filter(|a| a.contains("google")).count(), 1);
    }

    #[test]
    fn long_names_match_through_exe_and_argv() {
        // Kernel name is cut to 15 bytes
        let comm = OsStr::new("gnome-calculato");
        assert!(!process_matches("gnome-calculator", comm, None, None));
        assert!(process_matches(
            "gnome-calculator",
            comm,
            Some(Path::new("/usr/bin/gnome-calculator")),
            None
        ));
        assert!(process_matches(
            "gnome-calculator",
            comm,
            None,
            Some(OsStr::new("/usr/bin/gnome-calculator"))
        ));
        assert!(!process_matches(
            "gnome-calculator",
            OsStr::new("gnome-calendar"),
            Some(Path::new("/usr/bin/gnome-calendar")),
            None
        ));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn kills_process_with_long_name() {
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("nevira-long-sleeper");
        std::fs::copy("/bin/sleep", &binary).unwrap();
        // A concurrent fork can still hold the copy open for writing
        let mut child = (0..20)
            .find_map(|_| {
                std::process::Command::new(&binary)
                    .arg("30")
                    .spawn()
                    .inspect_err(|_| std::thread::sleep(Duration::from_millis(25)))
                    .ok()
            })
            .unwrap();

        let desktop = SystemDesktop::new();
        assert!(desktop.kill_process("nevira-long-sleeper").await.unwrap());

        let deadline = Instant::now() + Duration::from_secs(5);
        while child.try_wait().unwrap().is_none() {
            assert!(Instant::now() < deadline, "process survived the kill");
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(!desktop.kill_process("nevira-long-sleeper").await.unwrap());
    }
}
