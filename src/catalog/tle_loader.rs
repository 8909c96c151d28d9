use std::fs;
use std::path::{Path, PathBuf};

use sgp4::Elements;

use crate::catalog::error::CatalogError;
use crate::catalog::types::OrbitalElements;

pub struct TleLoader {
    tle_dir: PathBuf,
}

impl TleLoader {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self { tle_dir }
    }

    /// Load every element set found in the TLE directory. Unparseable files are skipped.
    pub fn load_all(&self) -> Result<Vec<OrbitalElements>, CatalogError> {
        if !self.tle_dir.exists() {
            return Err(CatalogError::DirectoryNotFound(
                self.tle_dir.display().to_string(),
            ));
        }

        let mut results = Vec::new();
        for entry in fs::read_dir(&self.tle_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_tle = path
                .extension()
                .map(|ext| ext == "tle" || ext == "txt")
                .unwrap_or(false);
            if !is_tle {
                continue;
            }

            match parse_tle_file(&path) {
                Ok(mut entries) => results.append(&mut entries),
                Err(e) => log::warn!("Failed to parse TLE file {}: {}", path.display(), e),
            }
        }

        Ok(results)
    }
}

fn parse_tle_file(path: &Path) -> Result<Vec<OrbitalElements>, CatalogError> {
    let content = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    parse_tle_text(&content, &filename)
}

/// Validate each entry with sgp4 and split `NAME (NICK)` name lines.
pub fn parse_tle_text(content: &str, source: &str) -> Result<Vec<OrbitalElements>, CatalogError> {
    let mut results = Vec::new();

    for (name, line1, line2) in parse_multi_tle(content) {
        let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| CatalogError::InvalidTle {
                file: source.to_string(),
                message: e.to_string(),
            })?;

        let catalog_number = elements.norad_id as u32;
        let (name, nickname) = match name {
            Some(line) => split_name(&line),
            None => (format!("NORAD {}", catalog_number), None),
        };

        results.push(OrbitalElements {
            catalog_number,
            name,
            nickname,
            line1,
            line2,
        });
    }

    Ok(results)
}

/// `"AO-7 (OSCAR 7)"` -> `("AO-7", Some("OSCAR 7"))`
pub fn split_name(line: &str) -> (String, Option<String>) {
    let trimmed = line.trim().trim_end_matches(&[' ', ')'][..]);
    match trimmed.rsplit_once(" (") {
        Some((name, nick)) if line.trim_end().ends_with(')') => {
            (name.trim().to_string(), Some(nick.trim().to_string()))
        }
        _ => (line.trim().to_string(), None),
    }
}

/// Parse multi-satellite TLE content
fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008
";

    #[test]
    fn test_split_name_with_nickname() {
        assert_eq!(
            split_name("ISS (ZARYA)"),
            ("ISS".to_string(), Some("ZARYA".to_string()))
        );
        assert_eq!(
            split_name("AO-7 (OSCAR 7)  "),
            ("AO-7".to_string(), Some("OSCAR 7".to_string()))
        );
    }

    #[test]
    fn test_split_name_plain() {
        assert_eq!(split_name("FUNCUBE-1"), ("FUNCUBE-1".to_string(), None));
    }

    #[test]
    fn test_parse_three_line_entry() {
        let parsed = parse_tle_text(ISS_TLE, "test").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].catalog_number, 25544);
        assert_eq!(parsed[0].name, "ISS");
        assert_eq!(parsed[0].nickname.as_deref(), Some("ZARYA"));
        assert!(parsed[0].line2.starts_with("2 25544"));
    }

    #[test]
    fn test_parse_two_line_entry() {
        let two_line: String = ISS_TLE.lines().skip(1).collect::<Vec<_>>().join("\n");
        let parsed = parse_tle_text(&two_line, "test").unwrap();
        assert_eq!(parsed[0].name, "NORAD 25544");
        assert_eq!(parsed[0].nickname, None);
    }

    #[test]
    fn test_garbage_lines_are_skipped() {
        let content = format!("# amateur.txt\n\n{}", ISS_TLE);
        let parsed = parse_tle_text(&content, "test").unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_missing_directory() {
        let loader = TleLoader::new(PathBuf::from("/nonexistent/sat-o-track/tle"));
        assert!(matches!(
            loader.load_all(),
            Err(CatalogError::DirectoryNotFound(_))
        ));
    }
}
