//! PlayerScope - concurrent multi-source cricket player stats
//!
//! A CLI tool that queries several data sources at once, reports which of
//! them worked and turns the collected data into a summary.
//!
//! Exit codes:
//!   0 - Report completed
//!   1 - Runtime error (bad config, unknown provider, write failure, etc.)
//!   2 - Terminal report (no usable sources, or the summarizer failed)

mod analysis;
mod cli;
mod collector;
mod config;
mod coordinator;
mod events;
mod models;
mod providers;
mod report;
mod summarizer;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use cli::{Args, Command};
use collector::Collector;
use config::{Config, ReportFormat, DEFAULT_CONFIG_FILE};
use coordinator::Coordinator;
use events::{EventLog, EventStats};
use indicatif::{ProgressBar, ProgressStyle};
use models::{FallbackPolicy, FormatHint, ModeHint, Report};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("PlayerScope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .playerscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to choose providers, summarizer backend, timeouts, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the requested operation. Returns the exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.event_stats {
        return handle_event_stats(&config);
    }

    let Some(command) = args.command() else {
        anyhow::bail!("Either --player or --compare is required");
    };

    // Build the pipeline
    let registry = providers::build_registry(&config.providers, &config.collector.http_settings())
        .context("Failed to set up data sources")?;
    let collector = Collector::new(Arc::new(registry), config.collector.provider_timeout());
    let summarizer = summarizer::build_summarizer(&config.summarizer)?;

    let mut coordinator = Coordinator::new(collector, summarizer)
        .with_policy(FallbackPolicy::from_flag(
            config.policy.fallback_counts_as_success,
        ));
    if config.events.enabled {
        coordinator = coordinator.with_event_log(Arc::new(EventLog::with_file(&config.events.path)));
    }

    println!("🏏 Sources: {}", config.providers.enabled.join(", "));
    println!("🤖 Summarizer: {:?}", config.summarizer.backend);

    let format: FormatHint = args.format.into();
    let mode: ModeHint = args.mode.into();

    let spinner = if args.quiet {
        ProgressBar::hidden()
    } else {
        create_spinner()
    };

    let report = match command {
        Command::Analyze(ref player) => {
            spinner.set_message(format!("Collecting data for {}...", player.trim()));
            coordinator.analyze_one(player, format, mode).await
        }
        Command::Compare(ref a, ref b) => {
            spinner.set_message(format!("Collecting data for {} and {}...", a.trim(), b.trim()));
            coordinator.compare_two(a, b, format, mode).await
        }
    };
    spinner.finish_and_clear();

    let content = match config.general.report_format {
        ReportFormat::Json => report::generate_json_report(&report)?,
        ReportFormat::Markdown => report::generate_markdown_report(&report),
    };

    match config.general.output {
        Some(ref output) => {
            report::write_report(&content, Path::new(output))?;
            println!("\n📝 Report saved to: {}", output);
        }
        None => println!("\n{}", content),
    }

    print_summary(&report);

    if report.status.is_success() {
        Ok(0)
    } else {
        warn!("Finished without a summary: {:?}", report.status);
        Ok(2)
    }
}

fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_summary(report: &Report) {
    let health = &report.health;

    println!("\n📊 Summary:");
    println!("   Subject: {}", report.subject);
    println!("   Sources used: {}", report.source_count);
    println!(
        "   Source health: {} ({:.0}% live) | 🟢 Live: {} | 🟡 Fallback: {} | 🔴 Failed: {}",
        health.rating(),
        health.live_rate(),
        health.live,
        health.fallback,
        health.failed
    );
    println!("   Duration: {:.1}s", report.elapsed_seconds);

    if report.status.is_success() {
        println!("\n✅ Done.");
    } else {
        eprintln!("\n⛔ {}", report.body);
    }
}

/// Handle --event-stats: print statistics from the event log.
fn handle_event_stats(config: &Config) -> Result<i32> {
    let path = Path::new(&config.events.path);
    let events = EventLog::load(path)?;
    let stats = EventStats::from_events(&events);

    println!("📈 Event statistics ({})", path.display());
    println!("   Total events: {}", stats.total_events);
    println!("   Successful: {}", stats.successful_events);
    println!("   Failed: {}", stats.failed_events);
    println!("   Success rate: {:.1}%", stats.success_rate);
    println!(
        "   Average processing time: {:.2}s",
        stats.average_processing_time
    );
    for (event_type, count) in &stats.event_types {
        println!("   - {}: {}", event_type, count);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
