//! Playback dispatch
//!
//! Choosing a play action yields either an in-app request (work id and
//! file) played with the built-in mpv/VLC launcher, or an external player
//! command handed the resolved stream URL. A missing external player gets a
//! notice and an attempt to open its install page.

use std::process::Stdio;
use thiserror::Error;
use tokio::process::{Child, Command};

use crate::api::BackendSession;
use crate::models::{PlayableFile, RecordedWork};

/// Config value selecting the in-app player
pub const INTERNAL_PLAYER: &str = "internal";

/// Supported local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerType {
    /// mpv media player (default)
    #[default]
    Mpv,
    /// VLC media player
    Vlc,
}

impl PlayerType {
    /// Get the command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Vlc => {
                // On macOS, VLC is an app bundle - check for it
                #[cfg(target_os = "macos")]
                if std::path::Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Mpv => "mpv",
        }
    }

    /// Get a display name for this player
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "VLC",
            PlayerType::Mpv => "mpv",
        }
    }

    /// Guess the player family from a command name
    pub fn from_command(cmd: &str) -> Option<Self> {
        let base = cmd.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(cmd).to_lowercase();
        if base.starts_with("mpv") {
            Some(PlayerType::Mpv)
        } else if base.starts_with("vlc") {
            Some(PlayerType::Vlc)
        } else {
            None
        }
    }

    fn title_arg(&self, title: &str) -> String {
        match self {
            PlayerType::Mpv => format!("--force-media-title={}", title),
            PlayerType::Vlc => format!("--meta-title={}", title),
        }
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Errors from local player operations
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
}

// =============================================================================
// Dispatch
// =============================================================================

/// How a play action should be carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackRequest {
    /// Play inside the app, resolving the stream from the ids
    Internal {
        work_id: u64,
        file: PlayableFile,
        title: String,
    },
    /// Hand an already resolved URL to another program
    External {
        command: String,
        url: String,
        title: String,
    },
}

/// Result of carrying out a playback request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Started { player: String, url: String },
    /// Player missing; message for the user
    PlayerMissing { notice: String },
}

/// Build the request for playing `file` of `work` with the configured player
pub fn dispatch(
    player_setting: &str,
    session: &BackendSession,
    work: &RecordedWork,
    file: &PlayableFile,
) -> PlaybackRequest {
    let setting = player_setting.trim();
    if setting.is_empty() || setting == INTERNAL_PLAYER {
        PlaybackRequest::Internal {
            work_id: work.id,
            file: file.clone(),
            title: work.name.clone(),
        }
    } else {
        PlaybackRequest::External {
            command: setting.to_string(),
            url: session.stream_url(work.id, file),
            title: work.name.clone(),
        }
    }
}

/// Launch the player for a request
pub async fn execute(
    request: &PlaybackRequest,
    session: &BackendSession,
    install_url: &str,
) -> Result<PlaybackOutcome, PlayerError> {
    match request {
        PlaybackRequest::Internal {
            work_id,
            file,
            title,
        } => {
            let url = session.stream_url(*work_id, file);
            let player = LocalPlayer::first_available().await;
            tracing::info!(%url, player = %player.player_type(), "internal playback");
            player.play(&url, title).await?;
            Ok(PlaybackOutcome::Started {
                player: player.player_type().to_string(),
                url,
            })
        }
        PlaybackRequest::External {
            command,
            url,
            title,
        } => match spawn_external(command, url, title) {
            Ok(_) => {
                tracing::info!(%url, %command, "external playback");
                Ok(PlaybackOutcome::Started {
                    player: command.clone(),
                    url: url.clone(),
                })
            }
            Err(PlayerError::NotFound(cmd)) => {
                tracing::warn!(%cmd, "external player missing");
                open_install_page(install_url);
                Ok(PlaybackOutcome::PlayerMissing {
                    notice: format!("Player '{}' is not installed. Please install it.", cmd),
                })
            }
            Err(e) => Err(e),
        },
    }
}

/// Spawn a configured external player detached from our terminal
fn spawn_external(command: &str, url: &str, title: &str) -> Result<Child, PlayerError> {
    let mut cmd = Command::new(command);
    cmd.arg(url);
    if let Some(kind) = PlayerType::from_command(command) {
        cmd.arg(kind.title_arg(title));
    }
    spawn_detached(cmd, command)
}

/// Spawn with no stdio, in a new session so the player survives the TUI
/// and never reads from its raw-mode terminal
fn spawn_detached(mut cmd: Command, program: &str) -> Result<Child, PlayerError> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PlayerError::NotFound(program.to_string())
        } else {
            PlayerError::StartFailed(e)
        }
    })
}

/// Try to open the player's install page; failures are ignored
fn open_install_page(install_url: &str) {
    if install_url.is_empty() {
        return;
    }
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    let result = Command::new(opener)
        .arg(install_url)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    if let Err(e) = result {
        tracing::debug!(error = %e, "could not open install page");
    }
}

// =============================================================================
// Local Player
// =============================================================================

/// Built-in player launcher
pub struct LocalPlayer {
    player_type: PlayerType,
}

impl LocalPlayer {
    /// Create a new local player with the specified type
    pub fn new(player_type: PlayerType) -> Self {
        Self { player_type }
    }

    /// mpv if installed, otherwise VLC
    pub async fn first_available() -> Self {
        let mpv = Self::new(PlayerType::Mpv);
        if mpv.is_available().await {
            return mpv;
        }
        Self::new(PlayerType::Vlc)
    }

    /// Get the player type
    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    /// Check if the player is available on the system
    pub async fn is_available(&self) -> bool {
        let cmd = self.player_type.command();

        // If it's a full path (macOS app bundle), check if it exists
        if cmd.starts_with('/') {
            return std::path::Path::new(cmd).exists();
        }

        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Play a stream URL with `title` as the window title
    pub async fn play(&self, stream_url: &str, title: &str) -> Result<Child, PlayerError> {
        spawn_detached(self.command(stream_url, title), self.player_type.command())
    }

    fn command(&self, stream_url: &str, title: &str) -> Command {
        let mut cmd = Command::new(self.player_type.command());
        cmd.arg(stream_url);
        cmd.arg(self.player_type.title_arg(title));

        match self.player_type {
            PlayerType::Vlc => {
                cmd.arg("--no-video-title-show");
            }
            PlayerType::Mpv => {
                cmd.arg("--force-window=immediate");
            }
        }

        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BackendVariant, FileKind};

    fn work() -> RecordedWork {
        RecordedWork {
            id: 12,
            name: "ニュース".into(),
            rule_id: None,
            thumbnail_ref: String::new(),
            is_recording: false,
            playable_files: Vec::new(),
            description: String::new(),
            extended: String::new(),
            channel_id: 0,
            start_at: 0,
            end_at: 0,
        }
    }

    fn encoded() -> PlayableFile {
        PlayableFile {
            file_id: 3,
            display_name: "H.264".into(),
            kind: FileKind::LegacyEncoded,
        }
    }

    #[test]
    fn test_player_type_command() {
        let vlc_cmd = PlayerType::Vlc.command();
        assert!(vlc_cmd == "vlc" || vlc_cmd == "/Applications/VLC.app/Contents/MacOS/VLC");
        assert_eq!(PlayerType::Mpv.command(), "mpv");
        assert_eq!(PlayerType::default(), PlayerType::Mpv);
    }

    #[test]
    fn test_player_type_from_command() {
        assert_eq!(PlayerType::from_command("/usr/bin/mpv"), Some(PlayerType::Mpv));
        assert_eq!(PlayerType::from_command("VLC"), Some(PlayerType::Vlc));
        assert_eq!(PlayerType::from_command("iina"), None);
    }

    #[test]
    fn test_dispatch_internal() {
        let session = BackendSession::new(BackendVariant::Legacy, "http://tv:8888", None);
        let req = dispatch(INTERNAL_PLAYER, &session, &work(), &encoded());
        assert_eq!(
            req,
            PlaybackRequest::Internal {
                work_id: 12,
                file: encoded(),
                title: "ニュース".into(),
            }
        );
        assert!(matches!(dispatch("", &session, &work(), &encoded()), PlaybackRequest::Internal { .. }));
    }

    #[test]
    fn test_dispatch_external_resolves_url() {
        let session = BackendSession::new(BackendVariant::Legacy, "http://tv:8888", None);
        match dispatch("mpv", &session, &work(), &encoded()) {
            PlaybackRequest::External { command, url, title } => {
                assert_eq!(command, "mpv");
                assert_eq!(url, "http://tv:8888/api/recorded/12/file?encodedId=3");
                assert_eq!(title, "ニュース");
            }
            other => panic!("Expected external request, got {:?}", other),
        }
    }

    #[test]
    fn test_local_player_passes_title() {
        let player = LocalPlayer::new(PlayerType::Mpv);
        let cmd = player.command("http://tv:8888/api/videos/1", "ニュース");
        let args: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(args[0], "http://tv:8888/api/videos/1");
        assert!(args.iter().any(|a| *a == "--force-media-title=ニュース"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_spawned_player_leaves_terminal() {
        // Exits 0 only when it leads its own session and stdin is not a TTY
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(r#"set -- $(cat /proc/$$/stat); [ "$6" = "$$" ] && [ ! -t 0 ]"#);
        let mut child = spawn_detached(cmd, "sh").unwrap();
        assert!(child.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn test_missing_external_player_is_a_notice() {
        let session = BackendSession::new(BackendVariant::V2, "http://tv:8888", None);
        let req = PlaybackRequest::External {
            command: "recdeck-no-such-player-xyz".into(),
            url: "http://tv:8888/api/videos/1".into(),
            title: "t".into(),
        };
        let outcome = execute(&req, &session, "").await.unwrap();
        assert!(matches!(outcome, PlaybackOutcome::PlayerMissing { .. }));
    }
}
