use serde::Serialize;

use crate::catalog::Transponder;

pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;
pub const DEFAULT_NUDGE_STEP_HZ: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Up,
    Down,
}

/// Base and doppler-corrected frequencies of the selected transponder, in Hz.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrequencyState {
    pub uplink_base: Option<u64>,
    pub downlink_base: Option<u64>,
    pub uplink_corrected: Option<u64>,
    pub downlink_corrected: Option<u64>,
    /// Operator's net nudge in downlink terms. Tracked even when only an uplink exists.
    pub nudge_offset_hz: i64,
}

pub struct DopplerEngine {
    state: FrequencyState,
    invert: bool,
    step_hz: u64,
    velocity_correction: f64,
}

impl Default for DopplerEngine {
    fn default() -> Self {
        Self::new(DEFAULT_NUDGE_STEP_HZ, 1.0)
    }
}

impl DopplerEngine {
    /// `velocity_correction` scales the propagator's radial velocity before it is used.
    pub fn new(step_hz: u64, velocity_correction: f64) -> Self {
        Self {
            state: FrequencyState::default(),
            invert: false,
            step_hz,
            velocity_correction,
        }
    }

    pub fn state(&self) -> &FrequencyState {
        &self.state
    }

    pub fn select_transponder(&mut self, transponder: Option<&Transponder>) {
        self.state = FrequencyState::default();
        self.invert = false;

        let Some(trsp) = transponder else {
            return;
        };

        self.invert = trsp.invert;
        self.state.downlink_base = trsp.downlink.map(|down| down.first());
        self.state.uplink_base = trsp.uplink.map(|up| {
            if trsp.invert {
                up.second()
            } else {
                up.first()
            }
        });
    }

    /// Derive corrected frequencies from the bases. Never touches the bases.
    pub fn recompute(&mut self, radial_velocity_m_s: f64) {
        let v = radial_velocity_m_s * self.velocity_correction;
        let shift = ((SPEED_OF_LIGHT_M_S + v) / (SPEED_OF_LIGHT_M_S - v)).sqrt();

        self.state.downlink_corrected = self
            .state
            .downlink_base
            .map(|f| (f as f64 * shift).round() as u64);
        self.state.uplink_corrected = self
            .state
            .uplink_base
            .map(|f| (f as f64 / shift).round() as u64);
    }

    pub fn nudge(&mut self, direction: NudgeDirection) {
        if self.state.downlink_base.is_none() && self.state.uplink_base.is_none() {
            return;
        }

        let step = self.step_hz;
        self.state.downlink_base = self
            .state
            .downlink_base
            .map(|down| offset(down, direction, step));
        self.state.nudge_offset_hz += match direction {
            NudgeDirection::Up => step as i64,
            NudgeDirection::Down => -(step as i64),
        };

        // An inverting transponder moves its downlink down as the uplink goes up.
        let uplink_direction = match (self.invert, direction) {
            (false, d) => d,
            (true, NudgeDirection::Up) => NudgeDirection::Down,
            (true, NudgeDirection::Down) => NudgeDirection::Up,
        };
        self.state.uplink_base = self
            .state
            .uplink_base
            .map(|up| offset(up, uplink_direction, step));
    }
}

fn offset(freq: u64, direction: NudgeDirection, step: u64) -> u64 {
    match direction {
        NudgeDirection::Up => freq.saturating_add(step),
        NudgeDirection::Down => freq.saturating_sub(step),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FrequencySpec, TransponderMode};

    fn linear(invert: bool) -> Transponder {
        Transponder {
            name: "linear".into(),
            mode: TransponderMode::Linear,
            downlink: Some(FrequencySpec::Pair([145_960_000, 145_990_000])),
            uplink: Some(FrequencySpec::Pair([435_120_000, 435_150_000])),
            invert,
            tone: None,
        }
    }

    fn fm() -> Transponder {
        Transponder {
            name: "fm".into(),
            mode: TransponderMode::Fm,
            downlink: Some(FrequencySpec::Single(145_800_000)),
            uplink: Some(FrequencySpec::Single(145_990_000)),
            invert: false,
            tone: None,
        }
    }

    #[test]
    fn test_base_resolution_non_inverting() {
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&linear(false)));
        assert_eq!(engine.state().downlink_base, Some(145_960_000));
        assert_eq!(engine.state().uplink_base, Some(435_120_000));
    }

    #[test]
    fn test_base_resolution_inverting_takes_upper_uplink_edge() {
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&linear(true)));
        assert_eq!(engine.state().downlink_base, Some(145_960_000));
        assert_eq!(engine.state().uplink_base, Some(435_150_000));
    }

    #[test]
    fn test_nudge_round_trip() {
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&fm()));
        let before = engine.state().clone();
        engine.nudge(NudgeDirection::Up);
        engine.nudge(NudgeDirection::Down);
        assert_eq!(engine.state().downlink_base, before.downlink_base);
        assert_eq!(engine.state().uplink_base, before.uplink_base);
        assert_eq!(engine.state().nudge_offset_hz, 0);
    }

    #[test]
    fn test_nudge_non_inverting_moves_together() {
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&linear(false)));
        engine.nudge(NudgeDirection::Up);
        assert_eq!(engine.state().downlink_base, Some(145_960_100));
        assert_eq!(engine.state().uplink_base, Some(435_120_100));
        assert_eq!(engine.state().nudge_offset_hz, 100);
    }

    #[test]
    fn test_nudge_inverting_moves_opposite() {
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&linear(true)));
        engine.nudge(NudgeDirection::Up);
        assert_eq!(engine.state().downlink_base, Some(145_960_100));
        assert_eq!(engine.state().uplink_base, Some(435_149_900));
    }

    #[test]
    fn test_custom_nudge_step() {
        let mut engine = DopplerEngine::new(1_000, 1.0);
        engine.select_transponder(Some(&fm()));
        engine.nudge(NudgeDirection::Down);
        assert_eq!(engine.state().downlink_base, Some(145_799_000));
        assert_eq!(engine.state().nudge_offset_hz, -1_000);
    }

    #[test]
    fn test_zero_velocity_is_identity() {
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&fm()));
        engine.recompute(0.0);
        assert_eq!(engine.state().downlink_corrected, Some(145_800_000));
        assert_eq!(engine.state().uplink_corrected, Some(145_990_000));
    }

    #[test]
    fn test_approaching_satellite_shift() {
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&fm()));
        engine.recompute(-7_000.0);

        let shift = ((SPEED_OF_LIGHT_M_S - 7_000.0) / (SPEED_OF_LIGHT_M_S + 7_000.0)).sqrt();
        let expected_down = (145_800_000.0 * shift).round() as u64;
        let expected_up = (145_990_000.0 / shift).round() as u64;
        assert_eq!(engine.state().downlink_corrected, Some(expected_down));
        assert_eq!(engine.state().uplink_corrected, Some(expected_up));
        assert!(expected_down < 145_800_000);
        assert!(expected_up > 145_990_000);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&linear(true)));
        engine.recompute(5_432.1);
        let first = engine.state().clone();
        engine.recompute(5_432.1);
        assert_eq!(engine.state(), &first);
    }

    #[test]
    fn test_velocity_correction_scales_shift() {
        let mut plain = DopplerEngine::new(DEFAULT_NUDGE_STEP_HZ, 1.0);
        let mut corrected = DopplerEngine::new(DEFAULT_NUDGE_STEP_HZ, 1.055);
        plain.select_transponder(Some(&fm()));
        corrected.select_transponder(Some(&fm()));
        plain.recompute(-6_000.0 * 1.055);
        corrected.recompute(-6_000.0);
        assert_eq!(plain.state().downlink_corrected, corrected.state().downlink_corrected);
    }

    #[test]
    fn test_no_transponder_stays_empty() {
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&fm()));
        engine.nudge(NudgeDirection::Up);
        engine.select_transponder(None);
        engine.recompute(-3_000.0);
        engine.nudge(NudgeDirection::Up);
        assert_eq!(engine.state(), &FrequencyState::default());
    }

    #[test]
    fn test_beacon_only_has_no_uplink() {
        let beacon = Transponder {
            name: "beacon".into(),
            mode: TransponderMode::Cw,
            downlink: Some(FrequencySpec::Single(145_825_000)),
            uplink: None,
            invert: false,
            tone: None,
        };
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&beacon));
        engine.nudge(NudgeDirection::Up);
        engine.recompute(1_000.0);
        assert_eq!(engine.state().uplink_base, None);
        assert_eq!(engine.state().uplink_corrected, None);
        assert!(engine.state().downlink_corrected.is_some());
    }

    #[test]
    fn test_uplink_only_nudge_tracks_offset() {
        let uplink_only = Transponder {
            name: "command".into(),
            mode: TransponderMode::Fm,
            downlink: None,
            uplink: Some(FrequencySpec::Single(435_300_000)),
            invert: true,
            tone: None,
        };
        let mut engine = DopplerEngine::default();
        engine.select_transponder(Some(&uplink_only));
        engine.nudge(NudgeDirection::Up);
        engine.nudge(NudgeDirection::Up);
        assert_eq!(engine.state().nudge_offset_hz, 200);
        assert_eq!(engine.state().downlink_base, None);
        assert_eq!(engine.state().uplink_base, Some(435_299_800));
    }
}
