use thiserror::Error;

#[derive(Debug, Error)]
pub enum RadioError {
    #[error("radio device {0} not present")]
    DeviceUnavailable(String),
    #[error("rig control daemon lost")]
    DaemonLost,
    #[error("rig control io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RadioError {
    pub fn kind(&self) -> &'static str {
        match self {
            RadioError::DeviceUnavailable(_) => "DeviceUnavailable",
            RadioError::DaemonLost => "DaemonLost",
            RadioError::Io(_) => "Io",
        }
    }
}
