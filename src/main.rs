//! tablerescue - Main entry point
//!
//! Parses the command line, loads and validates the configuration, picks the
//! backend (simulated or AWS) and hands over to the menu or a one-shot command.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::tty::IsTty;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use tablerescue::cli::{Cli, Commands};
use tablerescue::cleanup::{announce, cleanup, has_transient_resources};
use tablerescue::services::{BackupVault, TableStore};
use tablerescue::{
    Clock, ConsoleGateway, InMemoryCloud, Interrupt, Journal, ManualClock, Poller, RescueConfig,
    Session, SessionEnd, preflight, selector,
};

/// Exit code for a forced second Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

/// Initialize tracing on stderr; RUST_LOG wins over `-v`
fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("tablerescue starting up");

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
    let command = cli.command();
    if let Commands::Validate { config } = &command {
        return validate_config(config);
    }

    let config = load_config(cli)?;
    let backend = Backend::connect(cli, &config)?;
    let (store, vault) = backend.services();
    let clock = backend.clock();

    match command {
        Commands::Validate { config } => validate_config(&config),
        Commands::Tables => list_tables(store),
        Commands::Backups { table } => list_backups(store, table.as_deref()),
        Commands::RecoveryPoints { table } => {
            list_recovery_points(vault, clock.as_ref(), &config.vault_name, table.as_deref())
        }
        Commands::Cleanup { journal } => {
            let interrupt = install_interrupt_handler()?;
            let timeout = effective_timeout(cli, &config)?;
            let color = color_enabled(cli);
            let mut gateway = ConsoleGateway::stdio(color);
            let mut session = Session::new(
                store,
                vault,
                &mut gateway,
                clock.as_ref(),
                Poller::new(timeout).with_interrupt(interrupt),
                config.recovery_settings(),
            );
            cleanup_from_journal(&mut session, &journal)
        }
        Commands::Run => {
            preflight::run_preflight_checks(
                store,
                vault,
                &config.vault_name,
                config.reserved_table.as_deref(),
            );
            let interrupt = install_interrupt_handler()?;
            let timeout = effective_timeout(cli, &config)?;
            info!(%timeout, simulated = cli.simulate.is_some(), "starting menu");

            let color = color_enabled(cli);
            let mut gateway = ConsoleGateway::stdio(color);
            let mut session = Session::new(
                store,
                vault,
                &mut gateway,
                clock.as_ref(),
                Poller::new(timeout).with_interrupt(interrupt),
                config.recovery_settings(),
            );
            let journal = config.journal_dir.as_ref().map(Journal::new);
            match selector::run_menu(&mut session, journal.as_ref())? {
                SessionEnd::Quit => info!("session ended"),
                SessionEnd::Aborted => warn!("session aborted by operator"),
            }
            Ok(0)
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

fn validate_config(path: &Path) -> Result<i32> {
    info!("Validating configuration file: {:?}", path);
    match RescueConfig::load_from_file(path).and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => {
            println!("✓ Configuration file is valid: {:?}", path);
            println!("  vault: {}", config.vault_name);
            println!("  timeout: {}", config.timeout()?);
            Ok(0)
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            eprintln!("✗ Configuration validation failed: {:#}", e);
            Ok(1)
        }
    }
}

fn load_config(cli: &Cli) -> Result<RescueConfig> {
    let config = RescueConfig::load_from_file(&cli.config)?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {:?}", cli.config))?;
    debug!(vault = %config.vault_name, "configuration loaded");
    Ok(config)
}

/// `--timeout` overrides the configured value
fn effective_timeout(cli: &Cli, config: &RescueConfig) -> Result<tablerescue::Timeout> {
    match cli.timeout {
        Some(timeout) => Ok(timeout),
        None => config.timeout(),
    }
}

fn color_enabled(cli: &Cli) -> bool {
    !cli.no_color && std::io::stdout().is_tty()
}

/// First Ctrl-C stops the current wait at the next tick; a second one exits.
fn install_interrupt_handler() -> Result<Interrupt> {
    let interrupt = Interrupt::new();
    let flag = interrupt.clone();
    ctrlc::set_handler(move || {
        if flag.trip() {
            eprintln!("\nInterrupted again, exiting.");
            std::process::exit(EXIT_INTERRUPTED);
        }
        eprintln!("\nInterrupt received; stopping at the next check. Press Ctrl-C again to quit now.");
    })
    .context("Failed to install Ctrl-C handler")?;
    Ok(interrupt)
}

// ============================================================================
// Backends
// ============================================================================

enum Backend {
    Simulated(InMemoryCloud, ManualClock),
    #[cfg(feature = "aws")]
    Aws(tablerescue::AwsCloud),
}

impl Backend {
    fn connect(cli: &Cli, config: &RescueConfig) -> Result<Self> {
        if let Some(fixture) = &cli.simulate {
            info!("Rehearsal mode with fixture {:?}", fixture);
            let clock = ManualClock::new(Utc::now());
            let cloud = InMemoryCloud::load_fixture(fixture)
                .with_context(|| format!("Failed to load fixture {:?}", fixture))?
                .with_clock(clock.clone());
            return Ok(Self::Simulated(cloud, clock));
        }
        Self::connect_live(config)
    }

    #[cfg(feature = "aws")]
    fn connect_live(config: &RescueConfig) -> Result<Self> {
        let cloud = tablerescue::AwsCloud::connect(config.region.as_deref())
            .context("Failed to set up the AWS clients")?;
        Ok(Self::Aws(cloud))
    }

    #[cfg(not(feature = "aws"))]
    fn connect_live(_config: &RescueConfig) -> Result<Self> {
        anyhow::bail!("this build has no AWS support (feature `aws`); use --simulate <fixture>")
    }

    fn services(&self) -> (&dyn TableStore, &dyn BackupVault) {
        match self {
            Self::Simulated(cloud, _) => (cloud, cloud),
            #[cfg(feature = "aws")]
            Self::Aws(cloud) => (cloud, cloud),
        }
    }

    /// Rehearsals never really sleep
    fn clock(&self) -> Box<dyn Clock> {
        match self {
            Self::Simulated(_, clock) => Box::new(clock.clone()),
            #[cfg(feature = "aws")]
            Self::Aws(_) => Box::new(tablerescue::SystemClock),
        }
    }
}

// ============================================================================
// One-shot commands
// ============================================================================

fn list_tables(store: &dyn TableStore) -> Result<i32> {
    let mut names = store.list_tables()?;
    names.sort();
    for name in names {
        match store.describe_table(&name)? {
            Some(table) => println!(
                "{:<40} {:<12} protection={} pitr={}",
                table.name,
                table.status.to_string(),
                on_off(table.deletion_protection),
                on_off(table.pitr.enabled)
            ),
            None => println!("{:<40} (gone)", name),
        }
    }
    Ok(0)
}

fn list_backups(store: &dyn TableStore, table: Option<&str>) -> Result<i32> {
    let mut backups = store.list_backups(table)?;
    backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    for backup in backups {
        println!(
            "{:<50} {:<24} {:<10} {}",
            backup.name,
            backup.table,
            backup.status.to_string(),
            backup
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default()
        );
    }
    Ok(0)
}

fn list_recovery_points(
    vault: &dyn BackupVault,
    clock: &dyn Clock,
    vault_name: &str,
    table: Option<&str>,
) -> Result<i32> {
    let now = clock.now();
    let mut points = vault.list_recovery_points(vault_name, table)?;
    points.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    for point in points {
        println!(
            "{:<24} {:<10} {:<5} {}  {}",
            point.resource_name,
            point.status.to_string(),
            point.tier(now).to_string(),
            point
                .completed_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default(),
            point.arn
        );
    }
    Ok(0)
}

fn cleanup_from_journal(session: &mut Session<'_>, path: &Path) -> Result<i32> {
    let ctx = Journal::load(path).with_context(|| format!("Failed to load journal {:?}", path))?;
    info!(run_id = ctx.run_id(), "cleanup from journal");
    if !has_transient_resources(&ctx) {
        println!("✓ Nothing to clean up for {}", ctx.run_id());
        return Ok(0);
    }
    let report = cleanup(session, &ctx);
    announce(session, &report);
    Ok(if report.is_clean() { 0 } else { 1 })
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
