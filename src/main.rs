use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use lifecycle::{ForwardOnly, Phase, TransitionPolicy, Worker};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        config
            .log_level
            .as_deref()
            .unwrap_or("info")
            .parse()
            .context("Invalid log level")?
    };

    // RUST_LOG still wins over the configured level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .context("Failed to initialize logger")?;

    info!("Logging initialized at {}", level);
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => handle_run_command(None, None, config),
        Some(Commands::Run {
            run_ms,
            item_interval_ms,
        }) => handle_run_command(*run_ms, *item_interval_ms, config),
        Some(Commands::Phases) => handle_phases_command(),
    }
}

fn handle_run_command(run_ms: Option<u64>, item_interval_ms: Option<u64>, config: &Config) -> Result<()> {
    let run_for = Duration::from_millis(run_ms.unwrap_or(config.worker.run_ms));
    let interval = Duration::from_millis(item_interval_ms.unwrap_or(config.worker.item_interval_ms));
    info!("Running worker '{}' for {:?} (item interval {:?})", config.worker.name, run_for, interval);

    let (work_tx, work_rx) = crossbeam_channel::bounded::<u64>(0);
    let counter = Arc::new(AtomicU64::new(0));

    let handle = {
        let counter = Arc::clone(&counter);
        Worker::new(config.worker.name.clone(), work_rx)
            .spawn(move |item| {
                counter.fetch_add(item, Ordering::SeqCst);
            })
            .context("Failed to spawn worker")?
    };

    // Feeds ones until the worker drops its receiver
    let producer = thread::Builder::new()
        .name("producer".to_string())
        .spawn(move || {
            while work_tx.send(1).is_ok() {
                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
        })
        .context("Failed to spawn producer")?;

    handle.wait_until_running();
    println!("{} {}", "Worker:".green(), Phase::Running);
    thread::sleep(run_for);

    handle.signal().request_shutdown();
    let at_request = counter.load(Ordering::SeqCst);
    let stats = handle.join().context("Worker did not stop cleanly")?;
    let at_stop = counter.load(Ordering::SeqCst);

    producer
        .join()
        .map_err(|_| eyre::eyre!("Producer thread panicked"))?;

    println!("{} {}", "Worker:".green(), Phase::Stopped);
    println!("  processed: {}", stats.processed);
    println!("  after shutdown request: {}", at_stop - at_request);
    Ok(())
}

fn handle_phases_command() -> Result<()> {
    let policy = ForwardOnly;
    for from in Phase::ALL {
        let next: Vec<String> = Phase::ALL
            .iter()
            .filter(|to| policy.allows(&from, to))
            .map(|to| to.to_string())
            .collect();
        if next.is_empty() {
            println!("{} {}", from.to_string().cyan(), "(terminal)".dimmed());
        } else {
            println!("{} -> {}", from.to_string().cyan(), next.join(", "));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    setup_logging(&config, cli.is_verbose()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
