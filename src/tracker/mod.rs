mod doppler;
mod error;
mod location;
mod propagator;
mod sample;
mod session;

pub use doppler::{DopplerEngine, FrequencyState, NudgeDirection, DEFAULT_NUDGE_STEP_HZ};
pub use error::{PropagationError, TrackerError};
pub use location::Location;
pub use propagator::{Propagator, Sgp4Propagator};
pub use sample::KinematicSample;
pub use session::{Snapshot, TrackingSession};
