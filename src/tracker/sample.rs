use chrono::{DateTime, Utc};
use serde::Serialize;

/// Satellite position as seen from the active location at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KinematicSample {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    /// Positive when the satellite is receding.
    pub radial_velocity_m_s: f64,
}
