use serde::{Deserialize, Serialize};

/// Two-line element set for one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitalElements {
    pub catalog_number: u32,
    pub name: String,
    pub nickname: Option<String>,
    pub line1: String,
    pub line2: String,
}

impl OrbitalElements {
    pub fn display_name(&self) -> String {
        match &self.nickname {
            Some(nick) => format!("{} ({})", self.name, nick),
            None => self.name.clone(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, strum_macros::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TransponderMode {
    Linear,
    Fm,
    Cw,
    Digi,
}

/// A single frequency or the two edges of a passband, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FrequencySpec {
    Single(u64),
    Pair([u64; 2]),
}

impl FrequencySpec {
    pub fn first(&self) -> u64 {
        match self {
            FrequencySpec::Single(f) => *f,
            FrequencySpec::Pair([low, _]) => *low,
        }
    }

    pub fn second(&self) -> u64 {
        match self {
            FrequencySpec::Single(f) => *f,
            FrequencySpec::Pair([_, high]) => *high,
        }
    }
}

/// CTCSS access tone in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Tone(pub f64);

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transponder {
    pub name: String,
    pub mode: TransponderMode,
    #[serde(rename = "down", default)]
    pub downlink: Option<FrequencySpec>,
    #[serde(rename = "up", default)]
    pub uplink: Option<FrequencySpec>,
    #[serde(default)]
    pub invert: bool,
    #[serde(rename = "pl", default)]
    pub tone: Option<Tone>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Satellite {
    pub catalog_number: u32,
    pub elements: OrbitalElements,
    pub transponders: Vec<Transponder>,
}
