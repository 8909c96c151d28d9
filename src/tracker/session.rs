use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{Satellite, Transponder, TransponderMode};
use crate::tracker::doppler::{DopplerEngine, FrequencyState, NudgeDirection};
use crate::tracker::{KinematicSample, Location, Propagator, TrackerError};

/// Read-only view of the session handed to the display and the radio.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub location: String,
    pub satellite: Option<String>,
    pub transponder: Option<String>,
    pub mode: Option<TransponderMode>,
    pub sample: Option<KinematicSample>,
    pub frequencies: FrequencyState,
}

/// Active location, satellite and transponder plus the state derived from them each tick.
pub struct TrackingSession<P: Propagator> {
    propagator: P,
    doppler: DopplerEngine,
    location: Location,
    satellite: Option<Satellite>,
    transponder: Option<Transponder>,
    last_sample: Option<KinematicSample>,
}

impl<P: Propagator> TrackingSession<P> {
    pub fn new(propagator: P, doppler: DopplerEngine, location: Location) -> Self {
        Self {
            propagator,
            doppler,
            location,
            satellite: None,
            transponder: None,
            last_sample: None,
        }
    }

    pub fn satellite(&self) -> Option<&Satellite> {
        self.satellite.as_ref()
    }

    pub fn mode(&self) -> Option<TransponderMode> {
        self.transponder.as_ref().map(|t| t.mode)
    }

    pub fn frequencies(&self) -> &FrequencyState {
        self.doppler.state()
    }

    /// Selects the satellite and defaults to its first transponder. `None` pauses tracking.
    pub fn select_satellite(&mut self, satellite: Option<Satellite>) {
        match &satellite {
            Some(sat) => log::info!("Tracking {} ({})", sat.elements.display_name(), sat.catalog_number),
            None => log::info!("Tracking paused, no satellite selected"),
        }
        let first = satellite
            .as_ref()
            .and_then(|sat| sat.transponders.first().cloned());
        self.satellite = satellite;
        self.last_sample = None;
        self.select_transponder(first);
    }

    pub fn select_transponder(&mut self, transponder: Option<Transponder>) {
        if let Some(trsp) = &transponder {
            log::info!("Transponder {} ({})", trsp.name, trsp.mode);
        }
        self.doppler.select_transponder(transponder.as_ref());
        self.transponder = transponder;
        if let Some(sample) = &self.last_sample {
            self.doppler.recompute(sample.radial_velocity_m_s);
        }
    }

    /// Takes effect on the next tick.
    pub fn select_location(&mut self, location: Location) {
        log::info!("Location {}", location.name);
        self.location = location;
    }

    /// Propagate to `now` and refresh the corrected frequencies.
    ///
    /// On a propagation failure the previous sample is kept and the error is returned.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Snapshot, TrackerError> {
        let satellite = self
            .satellite
            .as_ref()
            .ok_or(TrackerError::NoActiveSatellite)?;

        let sample = self
            .propagator
            .propagate(&satellite.elements, &self.location, now)?;
        self.doppler.recompute(sample.radial_velocity_m_s);
        log::debug!(
            "az {:.1} el {:.1} v {:.1} m/s down {:?} up {:?}",
            sample.azimuth_deg,
            sample.elevation_deg,
            sample.radial_velocity_m_s,
            self.doppler.state().downlink_corrected,
            self.doppler.state().uplink_corrected,
        );
        self.last_sample = Some(sample);

        Ok(self.snapshot())
    }

    /// Shift the transponder bases without re-propagating.
    pub fn nudge(&mut self, direction: NudgeDirection) -> FrequencyState {
        self.doppler.nudge(direction);
        if let Some(sample) = &self.last_sample {
            self.doppler.recompute(sample.radial_velocity_m_s);
        }
        self.doppler.state().clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            location: self.location.name.clone(),
            satellite: self.satellite.as_ref().map(|s| s.elements.display_name()),
            transponder: self.transponder.as_ref().map(|t| t.name.clone()),
            mode: self.mode(),
            sample: self.last_sample.clone(),
            frequencies: self.doppler.state().clone(),
        }
    }
}
