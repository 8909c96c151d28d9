use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::bearing::error::BearingError;
use crate::bearing::filter::{normalize_azimuth, BearingFilter};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bearing {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// Raw tilt-compensated heading from a compass/accelerometer driver.
pub trait BearingSource {
    fn read(&mut self) -> Result<(f64, f64), BearingError>;
}

/// Reads the last `azimuth elevation` line the sensor driver wrote to a file.
pub struct FileBearingSource {
    path: PathBuf,
}

impl FileBearingSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl BearingSource for FileBearingSource {
    fn read(&mut self) -> Result<(f64, f64), BearingError> {
        let content = fs::read_to_string(&self.path)?;
        let line = content
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| BearingError::Malformed(String::new()))?;
        parse_line(line)
    }
}

fn parse_line(line: &str) -> Result<(f64, f64), BearingError> {
    let malformed = || BearingError::Malformed(line.to_string());
    let mut fields = line.split_whitespace().map(str::parse::<f64>);
    let az = fields.next().ok_or_else(malformed)?.map_err(|_| malformed())?;
    let el = fields.next().ok_or_else(malformed)?.map_err(|_| malformed())?;
    if !az.is_finite() || !el.is_finite() {
        return Err(malformed());
    }
    Ok((az, el))
}

/// Smoothed antenna bearing. The source is dropped after its first failed read.
pub struct Compass<S: BearingSource> {
    source: Option<S>,
    filter: BearingFilter,
    last: Option<Bearing>,
}

impl<S: BearingSource> Compass<S> {
    pub fn new(source: Option<S>, filter: BearingFilter) -> Self {
        Self {
            source,
            filter,
            last: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.source.is_some()
    }

    pub fn last(&self) -> Option<Bearing> {
        self.last
    }

    pub fn poll(&mut self) -> Option<Bearing> {
        let source = self.source.as_mut()?;
        match source.read() {
            Ok((az, el)) => Some(self.push(az, el)),
            Err(e) => {
                log::warn!("Bearing source failed ({}), disabling it", e);
                self.source = None;
                None
            }
        }
    }

    /// Feed a sample that did not come from the source.
    pub fn push(&mut self, azimuth_deg: f64, elevation_deg: f64) -> Bearing {
        let (az, el) = self.filter.push(azimuth_deg, elevation_deg);
        let bearing = Bearing {
            azimuth_deg: normalize_azimuth(az),
            elevation_deg: el,
        };
        self.last = Some(bearing);
        bearing
    }
}
