//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and conversion into the domain types.

use crate::config::{ReportFormat, SummarizerBackend};
use crate::models::{FormatHint, ModeHint};
use clap::Parser;
use std::path::PathBuf;

/// PlayerScope - multi-source cricket player stats
///
/// Collects player data from several sources concurrently, reports which
/// sources worked and summarizes the result with a local LLM.
///
/// Examples:
///   playerscope --player "Virat Kohli"
///   playerscope --player "Jasprit Bumrah" --format test --mode bowling
///   playerscope --compare "Joe Root" "Steve Smith" --format test
///   playerscope --player "Babar Azam" --summarizer plain --report-format json
///   playerscope --event-stats
///   playerscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Player to analyze
    #[arg(
        short,
        long,
        value_name = "NAME",
        conflicts_with = "compare",
        required_unless_present_any = ["compare", "init_config", "event_stats"]
    )]
    pub player: Option<String>,

    /// Two players to compare
    #[arg(long, num_args = 2, value_names = ["PLAYER_A", "PLAYER_B"])]
    pub compare: Option<Vec<String>>,

    /// Match format to focus on
    #[arg(short, long, default_value = "all", value_name = "FORMAT")]
    pub format: FormatArg,

    /// Aspect of the game to focus on
    #[arg(short, long, default_value = "batting", value_name = "MODE")]
    pub mode: ModeArg,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub report_format: Option<ReportFormatArg>,

    /// Summarizer backend (ollama, plain)
    #[arg(long, value_name = "BACKEND")]
    pub summarizer: Option<SummarizerArg>,

    /// Ollama model to use for summaries
    ///
    /// Can also be set via PLAYERSCOPE_MODEL env var or .playerscope.toml config.
    #[arg(long, env = "PLAYERSCOPE_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Per-source timeout in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Only live data counts towards calling the summarizer
    ///
    /// Fallback placeholders are still passed along when live data exists.
    #[arg(long)]
    pub live_only: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .playerscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .playerscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Print statistics from the event log and exit
    #[arg(long)]
    pub event_stats: bool,

    /// Event log file (overrides config)
    #[arg(long, value_name = "FILE")]
    pub events_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatArg {
    Test,
    Odi,
    T20,
    All,
}

impl From<FormatArg> for FormatHint {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Test => FormatHint::Test,
            FormatArg::Odi => FormatHint::Odi,
            FormatArg::T20 => FormatHint::T20,
            FormatArg::All => FormatHint::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    Batting,
    Bowling,
    Fielding,
}

impl From<ModeArg> for ModeHint {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Batting => ModeHint::Batting,
            ModeArg::Bowling => ModeHint::Bowling,
            ModeArg::Fielding => ModeHint::Fielding,
        }
    }
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormatArg {
    /// Markdown format (default)
    Markdown,
    /// JSON format
    Json,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Markdown => ReportFormat::Markdown,
            ReportFormatArg::Json => ReportFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SummarizerArg {
    /// Local LLM via Ollama
    Ollama,
    /// Offline rendering, no LLM
    Plain,
}

impl From<SummarizerArg> for SummarizerBackend {
    fn from(arg: SummarizerArg) -> Self {
        match arg {
            SummarizerArg::Ollama => SummarizerBackend::Ollama,
            SummarizerArg::Plain => SummarizerBackend::Plain,
        }
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze(String),
    Compare(String, String),
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The analysis or comparison requested, if any.
    pub fn command(&self) -> Option<Command> {
        if let Some(ref pair) = self.compare {
            if let [a, b] = pair.as_slice() {
                return Some(Command::Compare(a.clone(), b.clone()));
            }
        }
        self.player.clone().map(Command::Analyze)
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config || self.event_stats {
            return Ok(());
        }

        match self.command() {
            None => return Err("Either --player or --compare is required".to_string()),
            Some(Command::Analyze(ref name)) if name.trim().is_empty() => {
                return Err("Player name must not be empty".to_string());
            }
            Some(Command::Compare(ref a, ref b)) => {
                if a.trim().is_empty() || b.trim().is_empty() {
                    return Err("Player names must not be empty".to_string());
                }
                if a.trim().eq_ignore_ascii_case(b.trim()) {
                    return Err("Cannot compare a player with themselves".to_string());
                }
            }
            Some(Command::Analyze(_)) => {}
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
