//! Persisted records: match snapshots and the high score table.

use serde::{Deserialize, Serialize};

/// Error reported when snapshot data cannot be interpreted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid value `{value}` for `{field}`")]
pub struct LoadDataInvalid {
    /// Name of the offending snapshot field.
    pub field: &'static str,
    /// Raw value that could not be interpreted.
    pub value: String,
}

/// Persisted description of a single tower.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerRecord {
    /// Archetype tag, for example `"sniper"`.
    pub archetype: String,
    /// Horizontal world position.
    pub x: f32,
    /// Vertical world position.
    pub y: f32,
    /// Level in `1..=max_level`.
    pub level: u32,
}

/// Persisted state sufficient to resume a match between waves.
///
/// Enemies and projectiles in flight are not captured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    /// Player money.
    pub money: u32,
    /// Remaining lives.
    pub lives: i32,
    /// Accumulated score.
    pub score: u64,
    /// Number of waves already started.
    pub wave: u32,
    /// Difficulty tag.
    pub difficulty: String,
    /// Map layout tag.
    pub map_type: String,
    /// Every placed tower.
    #[serde(default)]
    pub towers: Vec<TowerRecord>,
}

/// Single finished-match entry in the high score table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    /// Player name.
    pub name: String,
    /// Final score.
    pub score: u64,
    /// Waves started before the match ended.
    pub wave: u32,
    /// Difficulty tag.
    pub difficulty: String,
    /// Map layout tag.
    pub map: String,
    /// Seconds since the Unix epoch when the entry was recorded.
    pub timestamp: u64,
}

/// Default number of entries retained by a [`HighScoreTable`].
pub const HIGH_SCORE_CAPACITY: usize = 10;

fn default_capacity() -> usize {
    HIGH_SCORE_CAPACITY
}

/// Bounded table of the best scores, highest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreTable {
    #[serde(default = "default_capacity")]
    capacity: usize,
    #[serde(default)]
    entries: Vec<HighScore>,
}

impl Default for HighScoreTable {
    fn default() -> Self {
        Self::with_capacity(HIGH_SCORE_CAPACITY)
    }
}

impl HighScoreTable {
    /// Creates an empty table retaining at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    /// Inserts an entry, returning its zero-based rank if it was retained.
    ///
    /// Ties rank below entries that were recorded earlier.
    pub fn record(&mut self, entry: HighScore) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|existing| existing.score < entry.score)
            .unwrap_or(self.entries.len());
        if rank >= self.capacity {
            return None;
        }
        self.entries.insert(rank, entry);
        self.entries.truncate(self.capacity);
        Some(rank)
    }

    /// Entries ordered from best to worst.
    #[must_use]
    pub fn entries(&self) -> &[HighScore] {
        &self.entries
    }

    /// Maximum number of retained entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u64) -> HighScore {
        HighScore {
            name: name.to_owned(),
            score,
            wave: 3,
            difficulty: "normal".to_owned(),
            map: "forest".to_owned(),
            timestamp: 0,
        }
    }

    #[test]
    fn keeps_best_scores_in_descending_order() {
        let mut table = HighScoreTable::with_capacity(3);
        assert_eq!(table.record(entry("a", 100)), Some(0));
        assert_eq!(table.record(entry("b", 300)), Some(0));
        assert_eq!(table.record(entry("c", 200)), Some(1));
        assert_eq!(table.record(entry("d", 50)), None);
        assert_eq!(table.record(entry("e", 250)), Some(1));

        let names: Vec<&str> = table.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "e", "c"]);
    }

    #[test]
    fn ties_rank_after_earlier_entries() {
        let mut table = HighScoreTable::default();
        let _ = table.record(entry("first", 10));
        assert_eq!(table.record(entry("second", 10)), Some(1));
    }

    #[test]
    fn snapshot_survives_json() {
        let snapshot = SaveSnapshot {
            money: 380,
            lives: 30,
            score: 0,
            wave: 0,
            difficulty: "easy".to_owned(),
            map_type: "forest".to_owned(),
            towers: vec![TowerRecord {
                archetype: "sniper".to_owned(),
                x: 160.0,
                y: 224.0,
                level: 2,
            }],
        };
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let restored: SaveSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, snapshot);
    }
}
