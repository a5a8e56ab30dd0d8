pub mod client;
pub mod pulselive;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pulselive::RecordFields;

/// One entry of `stats.content` exactly as the API returned it.
///
/// Kept opaque until normalization so a single malformed entry can be dropped
/// without failing the page it arrived on.
pub type RawApiRecord = serde_json::Value;

// ---------------------------------------------------------------------------
// Domain types: flat model, independent of the pulselive wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub rank: u32,
    pub name: String,
    pub nationality: String,
    pub goals: u32,
}

/// A raw record that could not be flattened into a [`PlayerStat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRecord {
    /// The entry is not an object or one of its fields has the wrong type.
    Malformed(String),
    MissingName,
    MissingNationality,
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidRecord::Malformed(msg) => write!(f, "Invalid result: {msg}"),
            InvalidRecord::MissingName => write!(f, "Invalid result: missing owner.name.display"),
            InvalidRecord::MissingNationality => {
                write!(f, "Invalid result: missing owner.birth.country.country")
            }
        }
    }
}

impl std::error::Error for InvalidRecord {}

impl PlayerStat {
    /// Flatten one raw API record.
    ///
    /// `owner.name.display` and `owner.birth.country.country` are required.
    /// `rank` and `value` (goals) fall back to 0 when absent, null or zero.
    pub fn from_raw(record: &RawApiRecord) -> Result<Self, InvalidRecord> {
        let fields = RecordFields::deserialize(record)
            .map_err(|e| InvalidRecord::Malformed(e.to_string()))?;

        let owner = fields.owner.unwrap_or_default();
        let name = owner
            .name
            .and_then(|n| n.display)
            .ok_or(InvalidRecord::MissingName)?;
        let nationality = owner
            .birth
            .and_then(|b| b.country)
            .and_then(|c| c.country)
            .ok_or(InvalidRecord::MissingNationality)?;

        Ok(PlayerStat {
            rank: whole_number(fields.rank),
            name,
            nationality,
            goals: whole_number(fields.value),
        })
    }
}

/// The API reports numbers as JSON numbers that may carry a fractional part
/// (`1282.0`), which is truncated. Negative and non-finite values clamp to 0;
/// values above `u32::MAX` saturate to `u32::MAX`.
fn whole_number(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v as u32,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
