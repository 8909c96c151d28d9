use std::collections::HashMap;
use std::path::PathBuf;

use crate::catalog::error::CatalogError;
use crate::catalog::tle_loader::TleLoader;
use crate::catalog::transponders::TransponderLoader;
use crate::catalog::types::{OrbitalElements, Satellite, Transponder};

/// Read model of the satellite catalog, keyed by catalog number.
#[derive(Debug, Default)]
pub struct Catalog {
    satellites: HashMap<u32, Satellite>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join element sets from `tle_dir` with transponder lists from `trsp_dir`.
    pub fn load(tle_dir: PathBuf, trsp_dir: PathBuf) -> Result<Self, CatalogError> {
        let elements = TleLoader::new(tle_dir).load_all()?;
        let mut transponders = TransponderLoader::new(trsp_dir).load_all()?;

        let mut catalog = Catalog::new();
        for entry in elements {
            let list = transponders.remove(&entry.catalog_number).unwrap_or_default();
            catalog.insert(entry, list);
        }

        for orphan in transponders.keys() {
            log::warn!("Transponders for {} have no element set", orphan);
        }

        log::info!("Loaded {} satellites", catalog.len());
        Ok(catalog)
    }

    /// Replaces any existing entry for the same catalog number.
    pub fn insert(&mut self, elements: OrbitalElements, transponders: Vec<Transponder>) {
        let catalog_number = elements.catalog_number;
        self.satellites.insert(
            catalog_number,
            Satellite {
                catalog_number,
                elements,
                transponders,
            },
        );
    }

    pub fn get(&self, catalog_number: u32) -> Result<&Satellite, CatalogError> {
        self.satellites
            .get(&catalog_number)
            .ok_or(CatalogError::UnknownSatellite(catalog_number))
    }

    /// Known entries for `filter`, in the requested order.
    pub fn query(&self, filter: &[u32]) -> Vec<&Satellite> {
        filter
            .iter()
            .filter_map(|n| self.satellites.get(n))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }
}
