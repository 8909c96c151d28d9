use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::catalog::OrbitalElements;
use crate::tracker::location::{Location, EARTH_ROTATION_RAD_S};
use crate::tracker::{KinematicSample, PropagationError};

/// Evaluates where a satellite is, relative to an observer, at a given time.
pub trait Propagator {
    fn propagate(
        &self,
        elements: &OrbitalElements,
        location: &Location,
        time: DateTime<Utc>,
    ) -> Result<KinematicSample, PropagationError>;
}

/// SGP4 propagation of two-line elements, rotated into the observer's topocentric frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Propagator;

impl Propagator for Sgp4Propagator {
    fn propagate(
        &self,
        elements: &OrbitalElements,
        location: &Location,
        timestamp: DateTime<Utc>,
    ) -> Result<KinematicSample, PropagationError> {
        let parsed = Elements::from_tle(
            Some(elements.name.clone()),
            elements.line1.as_bytes(),
            elements.line2.as_bytes(),
        )?;
        let constants = Constants::from_elements(&parsed)?;

        let minutes = parsed
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| PropagationError::Propagation(e.to_string()))?;

        let prediction = constants
            .propagate(minutes)
            .map_err(|e| PropagationError::Propagation(e.to_string()))?;

        let sidereal = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(
            &timestamp.naive_utc(),
        ));

        let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);
        let sat_vel_ecef =
            teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal);

        let sta_ecef = location.position_ecef_km();

        let dr = [
            sat_ecef[0] - sta_ecef[0],
            sat_ecef[1] - sta_ecef[1],
            sat_ecef[2] - sta_ecef[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

        let enu = ecef_to_enu(dr, location.lat_rad(), location.lon_rad());
        let azimuth = enu.0.atan2(enu.1).to_degrees().rem_euclid(360.0);
        let elevation = if range_km > 0.0 {
            (enu.2 / range_km).asin().to_degrees()
        } else {
            0.0
        };

        let los_unit = if range_km > 0.0 {
            [dr[0] / range_km, dr[1] / range_km, dr[2] / range_km]
        } else {
            [0.0, 0.0, 0.0]
        };
        // The station is at rest in ECEF.
        let range_rate_km_s = sat_vel_ecef[0] * los_unit[0]
            + sat_vel_ecef[1] * los_unit[1]
            + sat_vel_ecef[2] * los_unit[2];

        Ok(KinematicSample {
            timestamp,
            azimuth_deg: azimuth,
            elevation_deg: elevation,
            range_km,
            radial_velocity_m_s: range_rate_km_s * 1000.0,
        })
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = [
        vel_teme[0] * cos_gmst + vel_teme[1] * sin_gmst,
        -vel_teme[0] * sin_gmst + vel_teme[1] * cos_gmst,
        vel_teme[2],
    ];
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}
