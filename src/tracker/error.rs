use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropagationError {
    #[error("invalid tle: {0}")]
    InvalidTle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("propagation failed: {0}")]
    Propagation(String),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("no active satellite")]
    NoActiveSatellite,
    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

impl TrackerError {
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::NoActiveSatellite => "NoActiveSatellite",
            TrackerError::Propagation(_) => "PropagationError",
        }
    }
}
