//! CLI - Command Line Interface for recdeck
//!
//! Every lookup the TUI does is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Latest recordings matching a keyword
//! recdeck list --keyword ニュース --json
//!
//! # Related rows for a recording, as the Detail screen builds them
//! recdeck related 1234
//!
//! # Play the original TS of a recording
//! recdeck play 1234 --file 0
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::config::Config;
use crate::models::BackendVariant;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Server unreachable or answered with an error
    NetworkError = 3,
    /// Recording not found
    NotFound = 4,
    /// Player could not be started
    PlayerFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// recdeck - terminal client for an EPGStation recording server
///
/// Run without arguments to launch interactive TUI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "recdeck",
    version,
    about = "Terminal client for an EPGStation recording server",
    long_about = "Browse recordings, related series and rule matches, and play \
                  them with a local or external player.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  recdeck                             Launch interactive TUI\n\
                  recdeck list --keyword ニュース     Search recordings\n\
                  recdeck related 1234                Related rows of a recording\n\
                  recdeck detail 1234                 Open a recording in the TUI"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Recording server base URL (overrides config and RECDECK_SERVER)
    #[arg(long, short = 's', global = true)]
    pub server: Option<String>,

    /// Server API generation
    #[arg(long, global = true, value_enum)]
    pub api: Option<ApiVersion>,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has a non-interactive subcommand)
    pub fn is_cli_mode(&self) -> bool {
        !matches!(self.command, None | Some(Command::Detail(_)))
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Config file, environment, then flags, later ones winning
    pub fn load_config(&self) -> Config {
        let config = match &self.config {
            Some(path) => Config::load_from(path).with_env(),
            None => Config::load(),
        };
        self.apply_overrides(config)
    }

    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if let Some(api) = self.api {
            config.api_version = api.into();
        }
        config
    }
}

/// `--api` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiVersion {
    /// EPGStation 1.x (`/api/recorded` with `encoded` files)
    V1,
    /// EPGStation 2.x (`/api/recorded` with `videoFiles`)
    V2,
}

impl From<ApiVersion> for BackendVariant {
    fn from(v: ApiVersion) -> Self {
        match v {
            ApiVersion::V1 => BackendVariant::Legacy,
            ApiVersion::V2 => BackendVariant::V2,
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List one page of recordings
    #[command(visible_alias = "ls")]
    List(ListCmd),

    /// Show a recording, normalized
    #[command(visible_alias = "i")]
    Show(ShowCmd),

    /// First page of both related rows of a recording
    #[command(visible_alias = "rel")]
    Related(RelatedCmd),

    /// Print the series title derived from a raw program title
    Title(TitleCmd),

    /// Play one of a recording's files
    #[command(visible_alias = "p")]
    Play(PlayCmd),

    /// Open a recording's Detail screen in the TUI
    #[command(visible_alias = "d")]
    Detail(DetailCmd),
}

/// List recordings
#[derive(Args, Debug)]
pub struct ListCmd {
    /// Keyword filter
    #[arg(long, short = 'k')]
    pub keyword: Option<String>,

    /// Automation rule id filter
    #[arg(long, short = 'r')]
    pub rule: Option<u64>,

    /// Results to skip
    #[arg(long, default_value = "0")]
    pub offset: u64,

    /// Page size (defaults to the configured page size)
    #[arg(long, short = 'n')]
    pub limit: Option<u64>,
}

/// Show a recording
#[derive(Args, Debug)]
pub struct ShowCmd {
    /// Recording id
    pub id: u64,
}

/// Related rows of a recording
#[derive(Args, Debug)]
pub struct RelatedCmd {
    /// Recording id
    pub id: u64,
}

/// Derive a series title
#[derive(Args, Debug)]
pub struct TitleCmd {
    /// Raw program title
    pub raw: String,
}

/// Play a recording
#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Recording id
    pub id: u64,

    /// File id to play (first file if omitted; 0 is the original TS on 1.x)
    #[arg(long, short = 'f')]
    pub file: Option<u64>,
}

/// Open a recording in the TUI
#[derive(Args, Debug)]
pub struct DetailCmd {
    /// Recording id
    pub id: u64,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print a plain line, or the data as JSON in JSON mode
    pub fn print_line<T: Serialize>(&self, line: impl std::fmt::Display, data: T) -> anyhow::Result<()> {
        if self.json {
            self.print(data)
        } else {
            println!("{}", line);
            Ok(())
        }
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_is_tui_mode() {
        let cli = Cli::parse_from(["recdeck"]);
        assert!(!cli.is_cli_mode());
    }

    #[test]
    fn test_detail_is_tui_mode() {
        let cli = Cli::parse_from(["recdeck", "detail", "42"]);
        assert!(!cli.is_cli_mode());
        match cli.command {
            Some(Command::Detail(cmd)) => assert_eq!(cmd.id, 42),
            _ => panic!("Expected Detail command"),
        }
    }

    #[test]
    fn test_list_command() {
        let cli = Cli::parse_from(["recdeck", "list", "--keyword", "ドラマ", "--offset", "24", "-n", "12"]);
        assert!(cli.is_cli_mode());
        match cli.command {
            Some(Command::List(cmd)) => {
                assert_eq!(cmd.keyword.as_deref(), Some("ドラマ"));
                assert_eq!(cmd.rule, None);
                assert_eq!(cmd.offset, 24);
                assert_eq!(cmd.limit, Some(12));
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_play_command() {
        let cli = Cli::parse_from(["recdeck", "play", "7", "--file", "0"]);
        match cli.command {
            Some(Command::Play(cmd)) => {
                assert_eq!(cmd.id, 7);
                assert_eq!(cmd.file, Some(0));
            }
            _ => panic!("Expected Play command"),
        }
    }

    #[test]
    fn test_global_flags_override_config() {
        let cli = Cli::parse_from([
            "recdeck",
            "--json",
            "--quiet",
            "--server",
            "http://tv.local:8888",
            "--api",
            "v1",
            "title",
            "[新]ドラマ第3話",
        ]);
        assert!(cli.json);
        assert!(cli.quiet);
        let config = cli.apply_overrides(Config::default());
        assert_eq!(config.server_url, "http://tv.local:8888");
        assert_eq!(config.api_version, BackendVariant::Legacy);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::NotFound), 4);
        assert_eq!(i32::from(ExitCode::PlayerFailed), 5);
    }

    #[test]
    fn test_json_output_error_envelope() {
        let out = JsonOutput::<()>::error_msg("gone", ExitCode::NotFound);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["error"], "gone");
        assert_eq!(json["exit_code"], 4);
        assert!(json.get("data").is_none());
    }
}
