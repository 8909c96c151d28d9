mod error;
mod store;
mod tle_loader;
mod transponders;
mod types;

pub use error::CatalogError;
pub use store::Catalog;
pub use types::{FrequencySpec, OrbitalElements, Satellite, Transponder, TransponderMode};

#[cfg(test)]
pub(crate) use tle_loader::{parse_tle_text, tests::ISS_TLE};
