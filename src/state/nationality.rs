use icu_collator::{Collator, CollatorOptions};
use log::warn;
use premier_api::PlayerStat;
use serde::Serialize;
use std::collections::HashMap;

/// Per-nationality rollup. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalityAggregate {
    pub name: String,
    /// Numerically smallest rank seen.
    pub best_player_rank: u32,
    pub worst_player_rank: u32,
    pub total_players: u32,
    /// Highest goal count seen.
    pub best_player_goals: u32,
    pub worst_player_goals: u32,
    pub total_goals: u64,
}

pub type NationalityMap = HashMap<String, NationalityAggregate>;

impl NationalityAggregate {
    /// Rollup holding exactly one player.
    pub fn from_player(player: &PlayerStat) -> Self {
        Self {
            name: player.nationality.clone(),
            best_player_rank: player.rank,
            worst_player_rank: player.rank,
            total_players: 1,
            best_player_goals: player.goals,
            worst_player_goals: player.goals,
            total_goals: u64::from(player.goals),
        }
    }

    pub fn add_player(&mut self, player: &PlayerStat) {
        self.merge(&Self::from_player(player));
    }

    /// Combine two rollups of the same nationality.
    pub fn merge(&mut self, other: &Self) {
        self.best_player_rank = self.best_player_rank.min(other.best_player_rank);
        self.worst_player_rank = self.worst_player_rank.max(other.worst_player_rank);
        self.best_player_goals = self.best_player_goals.max(other.best_player_goals);
        self.worst_player_goals = self.worst_player_goals.min(other.worst_player_goals);
        self.total_players += other.total_players;
        self.total_goals += other.total_goals;
    }
}

/// Fold one player into the map. Players without a nationality are skipped.
pub fn fold(mut acc: NationalityMap, player: &PlayerStat) -> NationalityMap {
    if player.nationality.is_empty() {
        return acc;
    }
    match acc.get_mut(&player.nationality) {
        Some(existing) => existing.add_player(player),
        None => {
            acc.insert(player.nationality.clone(), NationalityAggregate::from_player(player));
        }
    }
    acc
}

/// Roll the players up by nationality, sorted by nationality name.
pub fn aggregate(players: &[PlayerStat]) -> Vec<NationalityAggregate> {
    let map = players.iter().fold(NationalityMap::new(), fold);
    let mut aggregates: Vec<NationalityAggregate> = map.into_values().collect();
    sort_by_name(&mut aggregates);
    aggregates
}

/// Root-locale collation, so "Côte D'Ivoire" sorts among the C's and
/// "england" before "England".
fn sort_by_name(aggregates: &mut [NationalityAggregate]) {
    match Collator::try_new(&Default::default(), CollatorOptions::new()) {
        Ok(collator) => aggregates.sort_by(|a, b| {
            collator
                .compare(&a.name, &b.name)
                .then_with(|| a.name.cmp(&b.name))
        }),
        Err(e) => {
            warn!("collator unavailable ({e}), sorting nationalities by code point");
            aggregates.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
