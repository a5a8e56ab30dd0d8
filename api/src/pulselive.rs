/// Pulselive football API raw wire types, the serde shapes for the ranked stats
/// endpoint. Mapped onto the flat domain model in lib.rs / client.rs.
use serde::Deserialize;

use crate::RawApiRecord;

// ---------------------------------------------------------------------------
// Ranked stats page  (/football/stats/ranked/players/goals)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct RankedStatsResponse {
    pub stats: Option<RankedStats>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RankedStats {
    pub page_info: Option<PageInfo>,
    /// Left untyped; each entry is validated on its own.
    pub content: Option<Vec<RawApiRecord>>,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: Option<u32>,
    pub num_pages: Option<u32>,
    pub page_size: Option<u32>,
    pub num_entries: Option<u32>,
}

// ---------------------------------------------------------------------------
// Content entry
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct RecordFields {
    pub owner: Option<Owner>,
    pub rank: Option<f64>,
    /// Goal count for the goals ranking.
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Owner {
    pub name: Option<OwnerName>,
    pub birth: Option<Birth>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OwnerName {
    pub display: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Birth {
    pub country: Option<Country>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Country {
    /// Country name, e.g. "Brazil".
    pub country: Option<String>,
}
