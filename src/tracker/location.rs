use serde::{Deserialize, Serialize};

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

/// A named observer position on the ground.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Location {
    pub name: String,
    #[serde(rename = "longitude")]
    pub longitude_deg: f64,
    #[serde(rename = "latitude")]
    pub latitude_deg: f64,
    #[serde(rename = "elevation", default)]
    pub elevation_m: f64,
}

impl Location {
    pub fn new(name: &str, longitude_deg: f64, latitude_deg: f64, elevation_m: f64) -> Self {
        Self {
            name: name.to_string(),
            longitude_deg,
            latitude_deg,
            elevation_m,
        }
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.elevation_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - e2) + alt_km) * sin_lat,
        ]
    }
}
