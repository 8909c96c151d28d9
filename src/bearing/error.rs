use thiserror::Error;

#[derive(Debug, Error)]
pub enum BearingError {
    #[error("sensor read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed sensor sample: {0:?}")]
    Malformed(String),
}
