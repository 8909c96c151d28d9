mod app;
mod bearing;
mod catalog;
mod config;
mod radio;
mod tracker;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::app::App;
use crate::bearing::{BearingFilter, Compass, FileBearingSource};
use crate::catalog::{Catalog, Satellite};
use crate::config::Config;
use crate::radio::{ProcessDaemon, RadioController, RigctlConnector};
use crate::tracker::{DopplerEngine, Sgp4Propagator, TrackingSession};

#[derive(Parser)]
#[command(name = "sat-o-track")]
#[command(about = "Satellite doppler tracking and radio control")]
struct Cli {
    /// Configuration file
    #[arg(long, short, default_value = "satpredict.yaml")]
    config: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and catalog
    Validate,
    /// List the configured satellites and their transponders
    List,
    /// Compute the current position and frequencies once, as JSON
    Snapshot {
        #[arg(long)]
        satellite: Option<u32>,
        #[arg(long)]
        transponder: Option<usize>,
    },
    /// Track a satellite and drive the radio
    Track {
        #[arg(long)]
        satellite: Option<u32>,
        /// Enable CAT control at startup
        #[arg(long)]
        cat: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading {}: {}", cli.config, e);
            return ExitCode::FAILURE;
        }
    };

    let catalog = match Catalog::load(
        config.catalog.tle_folder.clone(),
        config.catalog.transponder_folder.clone(),
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Validate => validate(&config, &catalog),
        Commands::List => list(&config, &catalog),
        Commands::Snapshot {
            satellite,
            transponder,
        } => snapshot(&config, &catalog, satellite, transponder),
        Commands::Track { satellite, cat } => track(config, catalog, satellite, cat),
    }
}

fn validate(config: &Config, catalog: &Catalog) -> ExitCode {
    if catalog.is_empty() {
        eprintln!("Catalog is empty, check {}", config.catalog.tle_folder.display());
        return ExitCode::FAILURE;
    }
    let found = catalog.query(&config.satellites);
    println!(
        "Configuration '{}' is valid ({} locations, {}/{} satellites in catalog)",
        config.name,
        config.locations.len(),
        found.len(),
        config.satellites.len()
    );
    for missing in config
        .satellites
        .iter()
        .filter(|n| catalog.get(**n).is_err())
    {
        println!("  missing: {}", missing);
    }
    ExitCode::SUCCESS
}

fn list(config: &Config, catalog: &Catalog) -> ExitCode {
    for sat in catalog.query(&config.satellites) {
        println!("{} {}", sat.catalog_number, sat.elements.display_name());
        for (i, trsp) in sat.transponders.iter().enumerate() {
            println!(
                "  {}: {} [{}] down {:?} up {:?}{}",
                i,
                trsp.name,
                trsp.mode,
                trsp.downlink,
                trsp.uplink,
                if trsp.invert { " inverting" } else { "" }
            );
        }
    }
    ExitCode::SUCCESS
}

fn snapshot(
    config: &Config,
    catalog: &Catalog,
    satellite: Option<u32>,
    transponder: Option<usize>,
) -> ExitCode {
    let mut session = match build_session(config, catalog, satellite) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(index) = transponder {
        let selected = session
            .satellite()
            .and_then(|sat| sat.transponders.get(index).cloned());
        if selected.is_none() {
            eprintln!("No transponder {}", index);
            return ExitCode::FAILURE;
        }
        session.select_transponder(selected);
    }

    let snapshot = match session.tick(chrono::Utc::now()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", e.kind(), e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error encoding snapshot: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn track(config: Config, catalog: Catalog, satellite: Option<u32>, cat: bool) -> ExitCode {
    let session = match build_session(&config, &catalog, satellite) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut radio = RadioController::new(
        config.radio.device.clone(),
        config.radio.settle,
        ProcessDaemon::new(&config.radio.daemon),
        RigctlConnector::new(config.radio.port),
    );
    let compass = Compass::new(
        config.bearing.source.clone().map(FileBearingSource::new),
        BearingFilter::new(config.bearing.taps.clone()),
    );
    if compass.is_available() {
        log::info!("Reading antenna bearing from sensor");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cat {
        // The rigctl connect is spawned onto this runtime.
        let _runtime = runtime.enter();
        if let Err(e) = radio.enable() {
            log::warn!("{}: {}", e.kind(), e);
        }
    }

    let app = App {
        config,
        catalog,
        session,
        radio,
        compass,
    };
    runtime.block_on(app.run());
    ExitCode::SUCCESS
}

fn build_session(
    config: &Config,
    catalog: &Catalog,
    satellite: Option<u32>,
) -> Result<TrackingSession<Sgp4Propagator>, String> {
    let location = config.active_location().map_err(|e| e.to_string())?;
    let doppler = DopplerEngine::new(
        config.tracking.nudge_step_hz,
        config.tracking.velocity_correction,
    );
    let mut session = TrackingSession::new(Sgp4Propagator, doppler, location.clone());

    let selected: Option<Satellite> = match satellite {
        Some(n) => Some(catalog.get(n).map_err(|e| e.to_string())?.clone()),
        None => catalog.query(&config.satellites).first().map(|s| (*s).clone()),
    };
    if selected.is_none() {
        log::warn!("None of the configured satellites is in the catalog");
    }
    session.select_satellite(selected);

    Ok(session)
}
