//! testwire - relay typed test-execution events from a runner's output
//!
//! Attaches to a test runner's interleaved text output (stdin or a capture
//! file), separates protocol frames from plain output, fans decoded events
//! out to the built-in listeners, and prints a run summary.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use color_eyre::eyre::eyre;
use serde::Serialize;
use tokio::io::BufReader;

use testwire_core::prelude::*;
use testwire_core::{logging, RunSummary};
use testwire_stream::{Dispatcher, LogNotifier, RunAggregator, StreamItem};

/// Relay typed test-execution events from a test runner's output stream
#[derive(Parser, Debug)]
#[command(name = "testwire")]
#[command(about = "Relay typed test-execution events from a runner's output stream", long_about = None)]
struct Args {
    /// Captured runner output to read instead of stdin
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Framework identifier recorded with the run (opaque to the protocol)
    #[arg(long, default_value = "junit")]
    framework: String,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Do not forward passthrough output to stdout
    #[arg(long)]
    quiet: bool,
}

/// Run summary plus the framework identifier the action supplied
#[derive(Debug, Serialize)]
struct RunReport {
    framework: String,
    #[serde(flatten)]
    summary: RunSummary,
}

fn handle_item(item: StreamItem, dispatcher: &mut Dispatcher, quiet: bool) {
    match item {
        StreamItem::Message(event) => {
            // Failures are already logged by the dispatcher; delivery
            // to the remaining listeners has happened regardless.
            let _report = dispatcher.publish(&event);
        }
        StreamItem::Passthrough(line) => {
            if !quiet {
                println!("{line}");
            }
        }
        StreamItem::MalformedFrame { text, error } => {
            warn!("skipping malformed frame: {} ({})", error, text);
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    logging::init()?;

    info!("attaching to runner output (framework: {})", args.framework);
    debug!("detailed log: {}", logging::get_current_log_file().display());

    let aggregator = Arc::new(Mutex::new(RunAggregator::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Arc::clone(&aggregator));
    dispatcher.register(LogNotifier);

    let quiet = args.quiet;
    let mut on_item = |item: StreamItem| handle_item(item, &mut dispatcher, quiet);

    match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            testwire_stream::demux_reader(BufReader::new(file), &mut on_item).await?;
        }
        None => {
            testwire_stream::demux_reader(BufReader::new(tokio::io::stdin()), &mut on_item)
                .await?;
        }
    }

    let summary = aggregator
        .lock()
        .map_err(|_| eyre!("aggregator state poisoned"))?
        .summary();
    let failed = summary.failed;

    let report = RunReport {
        framework: args.framework,
        summary,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let summary = &report.summary;
    eprintln!(
        "[{}] {} started, {} passed, {} failed, {} ignored ({} suites)",
        report.framework,
        summary.tests_started,
        summary.passed,
        summary.failed,
        summary.ignored,
        summary.suites,
    );
    if let Some(duration) = summary.duration() {
        eprintln!("run took {} ms", duration.num_milliseconds());
    }
    for record in &summary.tests {
        if let Some(message) = &record.message {
            eprintln!("  {}: {}", record.name, message);
        }
    }
    for diagnostic in &summary.diagnostics {
        eprintln!("  note: {diagnostic}");
    }
}
