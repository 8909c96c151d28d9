use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::error::CatalogError;
use crate::catalog::types::Transponder;

/// Reads `<catalog number>.trsp` files, each a JSON list of transponders.
pub struct TransponderLoader {
    trsp_dir: PathBuf,
}

impl TransponderLoader {
    pub fn new(trsp_dir: PathBuf) -> Self {
        Self { trsp_dir }
    }

    pub fn load_all(&self) -> Result<HashMap<u32, Vec<Transponder>>, CatalogError> {
        let mut transponders = HashMap::new();

        // No transponder folder just means no transponders.
        if !self.trsp_dir.exists() {
            log::warn!(
                "Transponder directory {} not found",
                self.trsp_dir.display()
            );
            return Ok(transponders);
        }

        for entry in fs::read_dir(&self.trsp_dir)? {
            let path = entry?.path();
            if path.extension().map(|ext| ext != "trsp").unwrap_or(true) {
                continue;
            }

            let Some(catalog_number) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
            else {
                log::warn!("Ignoring transponder file {}", path.display());
                continue;
            };

            match read_transponder_file(&path) {
                Ok(list) => {
                    transponders.insert(catalog_number, list);
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        Ok(transponders)
    }
}

fn read_transponder_file(path: &Path) -> Result<Vec<Transponder>, CatalogError> {
    let content = fs::read_to_string(path)?;
    parse_transponders(&content, &path.display().to_string())
}

pub fn parse_transponders(content: &str, source: &str) -> Result<Vec<Transponder>, CatalogError> {
    serde_json::from_str(content).map_err(|e| CatalogError::InvalidTransponders {
        file: source.to_string(),
        source: e,
    })
}
