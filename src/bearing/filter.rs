use std::collections::VecDeque;

pub const DEFAULT_TAPS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// FIR smoothing of azimuth/elevation samples.
///
/// Azimuth is averaged as a unit vector so that samples either side of north
/// (359° and 1°) average to north instead of south. Newest sample is weighted
/// by the first tap.
#[derive(Debug, Clone)]
pub struct BearingFilter {
    taps: Vec<f64>,
    history: VecDeque<[f64; 3]>,
}

impl Default for BearingFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TAPS.to_vec())
    }
}

impl BearingFilter {
    /// `taps` are expected to sum to 1; see `Config::validate`.
    pub fn new(taps: Vec<f64>) -> Self {
        let history = VecDeque::from(vec![[0.0; 3]; taps.len()]);
        Self { taps, history }
    }

    /// Returns the smoothed `(azimuth, elevation)`, azimuth in −180..180.
    pub fn push(&mut self, azimuth_deg: f64, elevation_deg: f64) -> (f64, f64) {
        let az = azimuth_deg.to_radians();
        self.history.pop_back();
        self.history
            .push_front([az.cos(), az.sin(), elevation_deg.max(0.0)]);

        let mut sum = [0.0; 3];
        for (tap, v) in self.taps.iter().zip(self.history.iter()) {
            sum[0] += tap * v[0];
            sum[1] += tap * v[1];
            sum[2] += tap * v[2];
        }

        (sum[1].atan2(sum[0]).to_degrees(), sum[2])
    }
}

/// Map an azimuth in −180..180 to 0..360 for display.
pub fn normalize_azimuth(azimuth_deg: f64) -> f64 {
    azimuth_deg.rem_euclid(360.0)
}
