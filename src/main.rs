use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clipshift::config::Config;
use clipshift::logging::{Logger, MemorySink};
use clipshift::paste::recording::PasteEvent;
use clipshift::simulation::{self, Scenario};

mod cli;

use cli::Cli;
use cli::commands::Commands;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clipshift")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("clipshift.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Simulate {
            modifier_down,
            letter_down,
            fail_sends,
            restore,
        } => {
            let scenario = Scenario {
                modifier_down: *modifier_down,
                letter_down: *letter_down,
                failing_sends: *fail_sends,
                restore: *restore,
            };
            handle_simulate_command(scenario, cli.is_verbose(), config)
        }
        Commands::Config => handle_config_command(config),
    }
}

fn handle_simulate_command(scenario: Scenario, verbose: bool, config: &Config) -> Result<()> {
    info!("Simulating paste: {:?}", scenario);

    let sink = Arc::new(MemorySink::new());
    let logger = if verbose {
        Logger::new(sink.clone())
    } else {
        Logger::default()
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = runtime.block_on(simulation::run(config, scenario, logger));

    println!(
        "{} {} + {}",
        "Gesture:".cyan(),
        config.paste.modifier_key,
        config.paste.letter_key
    );
    for event in report.rig.timeline.events() {
        println!("  {}", describe_event(&event));
    }

    if verbose {
        println!("{}", "Log:".cyan());
        for line in sink.lines() {
            println!("  {}", line.as_str().dimmed());
        }
    }

    match report.outcome {
        Ok(()) => {
            println!("{}", "Paste simulated.".green());
            Ok(())
        }
        Err(err) => {
            println!("{} {}", "Paste failed:".red(), err);
            println!(
                "  interceptor enabled: {}, installed: {}, hook ignored: {}",
                report.rig.interceptor.is_enabled(),
                report.rig.interceptor.is_installed(),
                report.rig.suspension.should_ignore_hook()
            );
            Err(err).context("Simulated paste failed")
        }
    }
}

fn describe_event(event: &PasteEvent) -> String {
    match event {
        PasteEvent::InterceptorEnabled(true) => "interceptor enabled".green().to_string(),
        PasteEvent::InterceptorEnabled(false) => "interceptor disabled".yellow().to_string(),
        PasteEvent::HookUninstalled => "hook uninstalled".yellow().to_string(),
        PasteEvent::HookInstalled(handle) => format!("hook installed on window {:#x}", handle.0).as_str().green().to_string(),
        PasteEvent::MediatorDisconnected => "mediator disconnected".yellow().to_string(),
        PasteEvent::MediatorConnected => "mediator connected".green().to_string(),
        PasteEvent::KeysSent {
            operations,
            hook_ignored,
        } => {
            let keys: Vec<String> = operations.iter().map(ToString::to_string).collect();
            let hook = if *hook_ignored { "hook ignored" } else { "hook live" };
            format!("send [{}] ({})", keys.join(", "), hook).as_str().bold().to_string()
        }
    }
}

fn handle_config_command(config: &Config) -> Result<()> {
    info!("Printing effective configuration");
    print!("{}", config.to_yaml()?);
    Ok(())
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
