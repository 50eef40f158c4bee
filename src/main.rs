use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use debug_thread::config::ThreadConfig;
use debug_thread::logging::{self, LogConfig};
use debug_thread::replay::{ReplayOptions, ReplayReport, replay};
use debug_thread::thread::ThreadEvent;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

// ── CLI ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "debug-thread",
    version,
    about = "Replay DevTools protocol logs through a debuggee thread model"
)]
struct Cli {
    /// Path to a config.toml file
    #[arg(short = 'c', long, value_name = "PATH", env = "DEBUG_THREAD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Feed a newline-delimited JSON event log to a thread and print the result
    Replay {
        /// Event log, one `{method, params}` object per line
        #[arg(value_name = "FILE")]
        log: PathBuf,
        /// Document URL used until the log navigates
        #[arg(long, value_name = "URL")]
        document_url: Option<String>,
        /// Thread name
        #[arg(long)]
        name: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LogConfig::from_env().with_verbosity(cli.verbose));

    let config = ThreadConfig::load(cli.config)?;

    match cli.command {
        Commands::Replay {
            log,
            document_url,
            name,
            json,
        } => {
            let file = File::open(&log).with_context(|| format!("Cannot open {}", log.display()))?;
            let options = ReplayOptions {
                document_url,
                thread_name: name,
                config,
            };
            let report = replay(BufReader::new(file), options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn print_report(report: &ReplayReport) {
    let name = if report.name.is_empty() {
        "<unnamed>"
    } else {
        report.name.as_str()
    };
    println!("Thread #{} ({})", report.thread_id, name);
    println!(
        "  {} events read, {} skipped, {}",
        report.lines,
        report.skipped,
        if report.paused { "paused" } else { "running" }
    );

    println!();
    println!("Notifications:");
    for event in &report.events {
        match event {
            ThreadEvent::NameChanged { name, .. } => println!("  name-changed  {name}"),
            ThreadEvent::Paused { reason, .. } => println!("  paused        {reason}"),
            ThreadEvent::Resumed { .. } => println!("  resumed"),
        }
    }

    println!();
    println!("Scripts ({}):", report.scripts.len());
    let width = report
        .scripts
        .iter()
        .map(|s| s.script_id.len())
        .max()
        .unwrap_or(0);
    for script in &report.scripts {
        match &script.source_map_url {
            Some(map) => println!("  {:>width$}  {}  -> {}", script.script_id, script.url, map),
            None => println!("  {:>width$}  {}", script.script_id, script.url),
        }
    }
}
