use std::io::Write;
use std::time::Instant;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use crate::bearing::{Bearing, Compass, FileBearingSource};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::radio::{ProcessDaemon, RadioController, RigctlConnector};
use crate::tracker::{NudgeDirection, Sgp4Propagator, Snapshot, TrackerError, TrackingSession};

pub type Session = TrackingSession<Sgp4Propagator>;
pub type Radio = RadioController<ProcessDaemon, RigctlConnector>;

/// Discrete operator intents read from the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Nudge(NudgeDirection),
    Satellite(u32),
    Transponder(usize),
    Location(String),
    Cat(bool),
    Ptt(bool),
    Bearing(f64, f64),
    Quit,
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let verb = words.next().ok_or_else(|| "empty command".to_string())?;
    let arg = words.next();

    let on_off = |arg: Option<&str>| match arg {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err(format!("usage: {} on|off", verb)),
    };
    let number = |arg: Option<&str>| {
        arg.and_then(|a| a.parse::<f64>().ok())
            .ok_or_else(|| "usage: bearing AZ EL".to_string())
    };

    match verb {
        "up" => Ok(ConsoleCommand::Nudge(NudgeDirection::Up)),
        "down" => Ok(ConsoleCommand::Nudge(NudgeDirection::Down)),
        "sat" => arg
            .and_then(|a| a.parse().ok())
            .map(ConsoleCommand::Satellite)
            .ok_or_else(|| "usage: sat CATALOG_NUMBER".to_string()),
        "trsp" => arg
            .and_then(|a| a.parse().ok())
            .map(ConsoleCommand::Transponder)
            .ok_or_else(|| "usage: trsp INDEX".to_string()),
        "loc" => arg
            .map(|a| ConsoleCommand::Location(a.to_string()))
            .ok_or_else(|| "usage: loc NAME".to_string()),
        "cat" => on_off(arg).map(ConsoleCommand::Cat),
        "ptt" => on_off(arg).map(ConsoleCommand::Ptt),
        "bearing" => Ok(ConsoleCommand::Bearing(number(arg)?, number(words.next())?)),
        "quit" | "q" => Ok(ConsoleCommand::Quit),
        other => Err(format!("unknown command: {}", other)),
    }
}

pub struct App {
    pub config: Config,
    pub catalog: Catalog,
    pub session: Session,
    pub radio: Radio,
    pub compass: Compass<FileBearingSource>,
}

impl App {
    /// Single-threaded loop: tracking tick, radio sync tick, console, Ctrl-C.
    pub async fn run(mut self) {
        let mut tracking = tokio::time::interval(self.config.tracking.tick);
        tracking.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut radio_sync = tokio::time::interval(self.config.radio.sync_interval);
        radio_sync.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut console_open = true;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = tracking.tick() => self.on_tick(),
                _ = radio_sync.tick() => self.on_sync(),
                line = lines.next_line(), if console_open => match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match parse_command(&line) {
                        Ok(ConsoleCommand::Quit) => break,
                        Ok(command) => self.on_command(command),
                        Err(msg) => println!("\n{}", msg),
                    },
                    Ok(None) => console_open = false,
                    Err(e) => {
                        log::warn!("Console read failed: {}", e);
                        console_open = false;
                    }
                },
                _ = &mut ctrl_c => break,
            }
        }

        println!();
        self.radio.disable();
    }

    fn on_tick(&mut self) {
        match self.session.tick(Utc::now()) {
            Ok(_) => {}
            Err(TrackerError::NoActiveSatellite) => {}
            Err(e) => log::warn!("Tracking skipped ({}): {}", e.kind(), e),
        }

        if let Err(e) = self.radio.poll(Instant::now()) {
            log::warn!("{}: {}", e.kind(), e);
        }

        self.compass.poll();

        // Keep the display still while keyed.
        if !self.radio.is_transmitting() {
            let line = render(&self.session.snapshot(), self.compass.last(), self.radio.status());
            print!("\r{}", line);
            if let Err(e) = std::io::stdout().flush() {
                log::debug!("Status line flush failed: {}", e);
            }
        }
    }

    fn on_sync(&mut self) {
        let transmitting = self.radio.is_transmitting();
        self.radio.sync(
            self.session.frequencies(),
            self.session.mode(),
            transmitting,
            Instant::now(),
        );
    }

    fn on_command(&mut self, command: ConsoleCommand) {
        match command {
            ConsoleCommand::Nudge(direction) => {
                let state = self.session.nudge(direction);
                log::debug!("Nudged to {:?}", state);
            }
            ConsoleCommand::Satellite(catalog_number) => match self.catalog.get(catalog_number) {
                Ok(sat) => self.session.select_satellite(Some(sat.clone())),
                Err(e) => println!("\n{}", e),
            },
            ConsoleCommand::Transponder(index) => {
                let transponder = self
                    .session
                    .satellite()
                    .and_then(|sat| sat.transponders.get(index).cloned());
                match transponder {
                    Some(t) => self.session.select_transponder(Some(t)),
                    None => println!("\nno transponder {}", index),
                }
            }
            ConsoleCommand::Location(name) => match self.config.find_location(&name) {
                Some(loc) => self.session.select_location(loc.clone()),
                None => println!("\nunknown location {}", name),
            },
            ConsoleCommand::Cat(true) => {
                if let Err(e) = self.radio.enable() {
                    println!("\n{}", e.kind());
                }
                log::info!("CAT {}", self.radio.state());
            }
            ConsoleCommand::Cat(false) => self.radio.disable(),
            ConsoleCommand::Ptt(enabled) => self.radio.set_ptt(
                enabled,
                self.session.frequencies(),
                self.session.mode(),
                Instant::now(),
            ),
            ConsoleCommand::Bearing(az, el) => {
                self.compass.push(az, el);
            }
            ConsoleCommand::Quit => {}
        }
    }
}

fn mhz(hz: Option<u64>) -> String {
    match hz {
        Some(hz) => format!("{:.5}", hz as f64 / 1e6),
        None => "---".to_string(),
    }
}

pub fn render(snapshot: &Snapshot, bearing: Option<Bearing>, radio_status: &str) -> String {
    let name = snapshot.satellite.as_deref().unwrap_or("no satellite");
    let position = match &snapshot.sample {
        Some(s) => format!("az {:5.1} el {:5.1}", s.azimuth_deg, s.elevation_deg),
        None => "az  ---  el  ---".to_string(),
    };
    let antenna = match bearing {
        Some(b) => format!("ant {:3.0}/{:2.0}", b.azimuth_deg, b.elevation_deg),
        None => "ant ---".to_string(),
    };
    format!(
        "{} {} | dn {} up {} ({:+} Hz) | {} | {}",
        name,
        position,
        mhz(snapshot.frequencies.downlink_corrected),
        mhz(snapshot.frequencies.uplink_corrected),
        snapshot.frequencies.nudge_offset_hz,
        antenna,
        radio_status,
    )
}
