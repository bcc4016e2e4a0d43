//! Command handlers

use std::io::BufRead;
use std::path::Path;
use std::thread;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::cli::{Cli, Commands, LedgerAction};
use crate::output::{output_config, output_payment, output_visits};
use plategate_app::config::Config;
use plategate_app::launch::{build_entry_station, build_exit_station};
use plategate_app::repository::open_ledger;
use plategate_app::station::{StationStats, StopSignal};
use plategate_domain::port::Clock;
use plategate_domain::repository::VisitLedger;
use plategate_domain::service::PlateValidator;
use plategate_infra::SystemClock;
use plategate_types::{Error, OutputFormat, Result, StationKind};

pub async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match &cli.command {
        Commands::Entry => cmd_station(StationKind::Entry, Config::load(config_path)?).await,
        Commands::Exit => cmd_station(StationKind::Exit, Config::load(config_path)?).await,

        Commands::Ledger { action } => {
            let config = Config::load(config_path)?;
            match action {
                LedgerAction::Show { plate, open } => {
                    cmd_ledger_show(&config, cli.format, plate.as_deref(), *open)
                }
                LedgerAction::Pay { plate, amount } => {
                    cmd_ledger_pay(&config, cli.format, plate, *amount)
                }
            }
        }

        Commands::Config { show, init } => cmd_config(config_path, cli.format, *show, *init),
    }
}

/// Run a station on a blocking thread until it stops by itself or the
/// operator asks it to
async fn cmd_station(kind: StationKind, config: Config) -> Result<()> {
    let stop = StopSignal::new();
    watch_stdin_for_quit(stop.clone());

    let worker = {
        let stop = stop.clone();
        tokio::task::spawn_blocking(move || run_station(kind, &config, &stop))
    };
    tokio::pin!(worker);

    println!("{} station running. Press 'q' then Enter, or Ctrl-C, to stop.", kind);

    let joined = tokio::select! {
        joined = &mut worker => joined,
        _ = shutdown_signal() => {
            stop.stop();
            worker.await
        }
    };

    let stats = joined.map_err(|e| Error::Station(e.to_string()))??;
    println!(
        "Stopped: {} decisions from {} readings over {} frames",
        stats.decisions, stats.readings, stats.frames
    );
    Ok(())
}

fn run_station(kind: StationKind, config: &Config, stop: &StopSignal) -> Result<StationStats> {
    match kind {
        StationKind::Entry => build_entry_station(config)?.run(stop),
        StationKind::Exit => build_exit_station(config)?.run(stop),
    }
}

/// A `q` line on stdin stops the station. The reader is a plain thread so a
/// pending read never holds up process exit.
fn watch_stdin_for_quit(stop: StopSignal) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                    info!("quit requested from console");
                    stop.stop();
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "stdin unreadable, use Ctrl-C to stop");
                    return;
                }
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, stopping station"),
        _ = terminate => info!("received terminate signal, stopping station"),
    }
}

fn cmd_ledger_show(
    config: &Config,
    format: OutputFormat,
    plate: Option<&str>,
    open_only: bool,
) -> Result<()> {
    let ledger = open_ledger(config)?;
    let visits: Vec<_> = ledger
        .find_all()?
        .into_iter()
        .filter(|v| plate.map_or(true, |p| v.plate == p))
        .filter(|v| !open_only || v.is_open())
        .collect();

    output_visits(format, &visits)
}

fn cmd_ledger_pay(config: &Config, format: OutputFormat, plate: &str, amount: Decimal) -> Result<()> {
    let validator = PlateValidator::new(config.validator.marker.trim());
    let plate = validator
        .validate(plate)
        .ok_or_else(|| Error::InvalidPlate(plate.to_string()))?;

    if amount.is_sign_negative() {
        return Err(Error::InvalidAmount(format!("{} is negative", amount)));
    }

    let ledger = open_ledger(config)?;
    let visit = ledger
        .record_payment(&plate, amount, SystemClock.now())?
        .ok_or_else(|| Error::NoOpenVisit(plate.clone()))?;

    info!(plate = %visit.plate, %amount, "payment recorded");
    output_payment(format, &visit)
}

fn cmd_config(path: Option<&Path>, format: OutputFormat, show: bool, init: bool) -> Result<()> {
    let source = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };

    if init {
        if source.exists() {
            println!("Configuration already exists: {}", source.display());
        } else {
            let written = Config::default().save(Some(&source))?;
            println!("Configuration written to {}", written.display());
        }
    }

    if show || !init {
        let config = Config::load(Some(&source))?;
        output_config(format, &config, &source)?;
    }

    Ok(())
}
