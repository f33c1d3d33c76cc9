//! Saving and restoring matches between waves.

use tower_siege_core::{
    Balance, Difficulty, LoadDataInvalid, MapKind, MatchStatus, SaveSnapshot, TowerKind,
    TowerRecord, Vec2, WavePhase,
};
use tower_siege_system_pathfinding::GridError;
use tower_siege_system_waves::WaveDirector;

use crate::{Match, MatchConfig, Tower};

/// Entries that were dropped while restoring a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// One error per skipped or defaulted value.
    pub skipped: Vec<LoadDataInvalid>,
}

impl LoadReport {
    /// Reports whether every value in the snapshot was honoured.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, field: &'static str, value: impl ToString) {
        let error = LoadDataInvalid {
            field,
            value: value.to_string(),
        };
        log::warn!("snapshot: {error}");
        self.skipped.push(error);
    }
}

impl Match {
    /// Captures money, lives, score, cleared waves and towers.
    ///
    /// Enemies and projectiles in flight are not part of a snapshot, so a wave
    /// that is still spawning or on the field is stored as not yet played and
    /// replays after loading.
    #[must_use]
    pub fn save_snapshot(&self) -> SaveSnapshot {
        SaveSnapshot {
            money: self.economy.money,
            lives: self.economy.lives,
            score: self.economy.score,
            wave: self.director.cleared(),
            difficulty: self.config.difficulty.as_str().to_owned(),
            map_type: self.config.map.as_str().to_owned(),
            towers: self
                .towers
                .iter()
                .map(|tower| TowerRecord {
                    archetype: tower.kind().as_str().to_owned(),
                    x: tower.position().x,
                    y: tower.position().y,
                    level: tower.level(),
                })
                .collect(),
        }
    }

    /// Rebuilds a match from a snapshot.
    ///
    /// Unknown difficulty or map tags fall back to their defaults. Towers with
    /// an unknown archetype, an out-of-range level or a position that is not a
    /// free tower spot are skipped. Every fallback is listed in the returned
    /// [`LoadReport`]. Tower stats are rederived by replaying upgrades, which
    /// are not charged.
    ///
    /// # Errors
    ///
    /// Propagates [`GridError`] if the map layout fails to parse.
    pub fn from_snapshot(
        snapshot: &SaveSnapshot,
        seed: u64,
        balance: Balance,
    ) -> Result<(Self, LoadReport), GridError> {
        let mut report = LoadReport::default();

        let difficulty = snapshot
            .difficulty
            .parse::<Difficulty>()
            .unwrap_or_else(|_| {
                report.skip("difficulty", &snapshot.difficulty);
                Difficulty::default()
            });
        let map = snapshot.map_type.parse::<MapKind>().unwrap_or_else(|_| {
            report.skip("map_type", &snapshot.map_type);
            MapKind::default()
        });

        let mut game = Self::new(MatchConfig {
            difficulty,
            map,
            seed,
            balance,
        })?;
        game.economy.money = snapshot.money;
        game.economy.lives = snapshot.lives;
        game.economy.score = snapshot.score;
        game.director = WaveDirector::new(
            game.config.balance.waves.clone(),
            difficulty,
            snapshot.wave,
        );

        for record in &snapshot.towers {
            game.restore_tower(record, &mut report);
        }
        game.selected_tower = None;

        game.status = if game.economy.lives <= 0 {
            MatchStatus::GameOver
        } else if game.director.phase() == WavePhase::Victory {
            MatchStatus::Victory
        } else {
            MatchStatus::Running
        };

        Ok((game, report))
    }

    fn restore_tower(&mut self, record: &TowerRecord, report: &mut LoadReport) {
        let Ok(kind) = record.archetype.parse::<TowerKind>() else {
            report.skip("towers.archetype", &record.archetype);
            return;
        };
        let rules = &self.config.balance.combat;
        if record.level == 0 || record.level > rules.max_tower_level {
            report.skip("towers.level", record.level);
            return;
        }
        let position = Vec2::new(record.x, record.y);
        let Ok(cell) = self.spot_at(position) else {
            report.skip("towers.position", format!("({}, {})", record.x, record.y));
            return;
        };

        let stats = self.config.balance.tower(kind);
        let center = self.grid.cell_center(cell);
        let id = self.towers.insert_with(cell, |id| {
            let mut tower = Tower::new(id, stats, center, rules);
            for _ in 1..record.level {
                let _ = tower.upgrade(rules);
            }
            tower
        });
        log::debug!("restored {kind} tower {} at level {}", id.get(), record.level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_siege_core::Command;

    #[test]
    fn saved_towers_keep_archetype_and_level() {
        let mut game = Match::new(MatchConfig::default()).expect("forest parses");
        let spot = crate::query::tower_spots(&game)[0];
        let tower = game
            .place_tower(TowerKind::Sniper, spot)
            .expect("placement succeeds");
        let _ = game.upgrade_tower(tower).expect("upgrade succeeds");

        let snapshot = game.save_snapshot();
        assert_eq!(snapshot.towers.len(), 1);
        assert_eq!(snapshot.towers[0].archetype, "sniper");
        assert_eq!(snapshot.towers[0].level, 2);
        assert_eq!(snapshot.wave, 0);
        assert_eq!(snapshot.difficulty, "normal");
        assert_eq!(snapshot.map_type, "forest");
    }

    #[test]
    fn unknown_tags_fall_back_and_are_reported() {
        let snapshot = SaveSnapshot {
            money: 10,
            lives: 3,
            score: 0,
            wave: 1,
            difficulty: "nightmare".to_owned(),
            map_type: "moon".to_owned(),
            towers: Vec::new(),
        };
        let (game, report) =
            Match::from_snapshot(&snapshot, 0, Balance::default()).expect("defaults load");

        assert_eq!(report.skipped.len(), 2);
        assert_eq!(crate::query::difficulty(&game), Difficulty::Normal);
        assert_eq!(crate::query::map(&game), MapKind::Forest);
    }

    #[test]
    fn restored_match_accepts_commands() {
        let snapshot = SaveSnapshot {
            money: 1000,
            lives: 20,
            score: 50,
            wave: 2,
            difficulty: "easy".to_owned(),
            map_type: "city".to_owned(),
            towers: Vec::new(),
        };
        let (mut game, report) =
            Match::from_snapshot(&snapshot, 3, Balance::default()).expect("city loads");
        assert!(report.is_clean());

        let mut events = Vec::new();
        crate::apply(&mut game, Command::StartWaveNow, &mut events);
        assert!(events
            .iter()
            .any(|event| matches!(event, tower_siege_core::Event::WaveStarted { wave: 3, .. })));
    }
}
