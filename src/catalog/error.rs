use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("catalog file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("invalid TLE in {file}: {message}")]
    InvalidTle { file: String, message: String },
    #[error("invalid transponder file {file}: {source}")]
    InvalidTransponders {
        file: String,
        source: serde_json::Error,
    },
    #[error("unknown catalog number: {0}")]
    UnknownSatellite(u32),
}

impl CatalogError {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::DirectoryNotFound(_) => "DirectoryNotFound",
            CatalogError::FileRead(_) => "FileRead",
            CatalogError::InvalidTle { .. } => "InvalidTle",
            CatalogError::InvalidTransponders { .. } => "InvalidTransponders",
            CatalogError::UnknownSatellite(_) => "UnknownSatellite",
        }
    }
}
