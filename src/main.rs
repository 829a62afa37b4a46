//! hostwatch - plugin-based host monitoring agent
//!
//! A thin shell over the monitoring pipeline: loads configuration,
//! registers providers and channels, and runs cycles either once (for an
//! external scheduler) or on a fixed interval.

use clap::Parser;
use hostwatch::config::{AgentConfig, ConfigFile};
use hostwatch::services::MonitorService;

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hostwatch", version, about = "Host monitoring agent")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "HOSTWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Run exactly one monitoring cycle and exit
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let config = load_config(&cli);

    let mut service = MonitorService::from_config(&config);
    if cli.once {
        let report = service.run_cycle();
        log::info!(
            "cycle complete: {} evaluated, {} events, {} provider failures",
            report.rules_evaluated,
            report.events_emitted,
            report.providers_failed
        );
    } else {
        service.run();
    }
}

fn load_config(cli: &Cli) -> AgentConfig {
    if let Some(path) = &cli.config {
        match ConfigFile::load(path) {
            Ok(config) => return config,
            Err(e) => {
                log::error!("{}", e);
                eprintln!("Error: {}", e);
                eprintln!();
                eprintln!("Hint: Check the path passed via --config or HOSTWATCH_CONFIG.");
                std::process::exit(1);
            }
        }
    }

    match ConfigFile::load_default() {
        Some(config) => config,
        None => {
            log::warn!(
                "no configuration found, starting with empty registries (looked in {:?})",
                ConfigFile::default_paths()
            );
            AgentConfig::default()
        }
    }
}
