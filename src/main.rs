//! Motion Scan Agent CLI
//!
//! Reads raw sensor stream chunks from stdin (one chunk per line, e.g. piped
//! from a serial logger), runs the parsing pipeline, and prints a live
//! readout of the newest window row at the display cadence.

use clap::{Parser, Subcommand};
use motion_scan_agent::{
    config::Config,
    pipeline::ScanPipeline,
    stats::create_shared_stats_with_persistence,
    window::WindowRow,
    VERSION,
};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How often the live readout line is refreshed.
const READOUT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "motion-scan")]
#[command(version = VERSION)]
#[command(about = "Streaming reassembler for wearable motion sensor data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline, reading raw chunks from stdin
    Start {
        /// Sliding window capacity in rows
        #[arg(long)]
        capacity: Option<usize>,

        /// Expected milliseconds between scans (diagnostic checks)
        #[arg(long)]
        interval_ms: Option<i64>,

        /// Suppress the live readout line
        #[arg(long)]
        quiet: bool,
    },

    /// Show stats persisted by the last session
    Status,

    /// Show the active configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            capacity,
            interval_ms,
            quiet,
        } => cmd_start(capacity, interval_ms, quiet),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    }
}

fn cmd_start(capacity: Option<usize>, interval_ms: Option<i64>, quiet: bool) {
    println!("Motion Scan Agent v{VERSION}");

    let mut config = Config::load().unwrap_or_default();
    if let Some(capacity) = capacity {
        config.window_capacity = capacity;
    }
    if let Some(interval_ms) = interval_ms {
        config.expected_interval_ms = interval_ms;
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    println!("  Window capacity: {} rows", config.window_capacity);
    println!("  Expected interval: {} ms", config.expected_interval_ms);
    println!("  Counter modulus: {}", config.counter_modulus);
    println!();
    println!("Reading chunks from stdin. Press Ctrl+C to stop.");
    println!();

    let stats = create_shared_stats_with_persistence(config.data_path.join("session_stats.json"));
    println!("Session ID: {}", stats.session_id());

    let mut pipeline = ScanPipeline::new(&config, stats.clone());
    let window = pipeline.window();
    let chunk_sender = pipeline.chunk_sender();

    if let Err(e) = pipeline.start() {
        eprintln!("Error starting pipeline: {e}");
        std::process::exit(1);
    }

    // Feed stdin lines into the pipeline. EOF ends this thread, which the
    // run loop below watches for.
    let stdin_handle = thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if chunk_sender.send(line).is_err() {
                break;
            }
        }
    });

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not install Ctrl+C handler: {e}");
    }

    // Consumer loop: read the window at the display cadence. Never waits on
    // new data; an idle stream just shows the last (or unfilled) row.
    let display_interval = Duration::from_millis(config.display_interval_ms.max(1));
    let mut last_readout = Instant::now();

    while running.load(Ordering::SeqCst) {
        thread::sleep(display_interval);

        if !quiet && last_readout.elapsed() >= READOUT_INTERVAL {
            if let Some(row) = window.latest() {
                println!("{}", format_readout(&row));
            }
            last_readout = Instant::now();
        }

        if stdin_handle.is_finished() {
            println!("Input stream ended.");
            break;
        }
    }

    println!();
    println!("Stopping pipeline...");
    pipeline.stop();
    let _ = stdin_handle.join();

    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save session stats: {e}");
    }

    println!();
    println!("{}", stats.summary());
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Motion Scan Agent Status");
    println!("========================");
    println!();

    let stats_path = config.data_path.join("session_stats.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Last session:");
                if let Some(id) = stats.get("session_id") {
                    println!("  Session ID: {id}");
                }
                if let Some(scans) = stats.get("scans_parsed") {
                    println!("  Scans parsed: {scans}");
                }
                if let Some(rejected) = stats.get("chunks_rejected") {
                    println!("  Chunks rejected: {rejected}");
                }
                if let Some(missing) = stats.get("fields_missing") {
                    println!("  Fields missing: {missing}");
                }
                if let Some(anomalies) = stats.get("counter_anomalies") {
                    println!("  Counter anomalies: {anomalies}");
                }
                if let Some(duration) = stats.get("session_duration_secs") {
                    println!("  Duration: {duration}s");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();
    println!("Config file: {:?}", Config::config_path());
    println!();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing config: {e}"),
    }
}

/// One-line live readout of the newest window row. NaN columns show as `--`.
fn format_readout(row: &WindowRow) -> String {
    fn col(value: f64, precision: usize) -> String {
        if value.is_nan() {
            "--".to_string()
        } else {
            format!("{value:.precision$}")
        }
    }

    format!(
        "m: {} c: {} x: {} y: {} z: {} | abs: {} pitch: {} roll: {} yaw: {}",
        col(row.timestamp_ms, 0),
        col(row.counter, 0),
        col(row.x, 0),
        col(row.y, 0),
        col(row.z, 0),
        col(row.magnitude, 1),
        col(row.pitch, 1),
        col(row.roll, 1),
        col(row.yaw, 1),
    )
}
