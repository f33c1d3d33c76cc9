//! Tunable numbers that drive a match.
//!
//! [`Balance::default`] carries the canonical values. Every table can be
//! overridden from TOML; missing keys fall back to the canonical defaults so
//! a partial file only needs to name what it changes.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::archetypes::{EnemyKind, EnemyStats, TowerKind, TowerStats};

/// Error raised while reading or writing a balance document.
#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    /// The TOML document could not be parsed into a [`Balance`].
    #[error("failed to parse balance document: {0}")]
    Parse(#[from] toml::de::Error),
    /// The balance could not be rendered as TOML.
    #[error("failed to render balance document: {0}")]
    Render(#[from] toml::ser::Error),
    /// A parsed value violates a structural requirement.
    #[error("invalid balance value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human readable description of the violation.
        reason: String,
    },
}

/// Difficulty selected for a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Generous money and lives, thinner waves.
    Easy,
    /// Baseline tuning.
    #[default]
    Normal,
    /// Doubled waves and tougher enemies.
    Hard,
}

impl Difficulty {
    /// Every difficulty in ascending order.
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Normal, Self::Hard];

    /// Stable tag used in snapshots and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = crate::UnknownArchetype;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| crate::UnknownArchetype(value.to_owned()))
    }
}

/// Named battlefield layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    /// Single winding route through woodland.
    #[default]
    Forest,
    /// Long switchback route between city blocks.
    City,
    /// Two entrances converging on one exit.
    Hell,
    /// Tight zig-zag route.
    Cyber,
}

impl MapKind {
    /// Every layout in menu order.
    pub const ALL: [MapKind; 4] = [Self::Forest, Self::City, Self::Hell, Self::Cyber];

    /// Stable tag used in snapshots and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forest => "forest",
            Self::City => "city",
            Self::Hell => "hell",
            Self::Cyber => "cyber",
        }
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapKind {
    type Err = crate::UnknownArchetype;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|map| map.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| crate::UnknownArchetype(value.to_owned()))
    }
}

/// One value per difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerDifficulty<T> {
    /// Value used on [`Difficulty::Easy`].
    pub easy: T,
    /// Value used on [`Difficulty::Normal`].
    pub normal: T,
    /// Value used on [`Difficulty::Hard`].
    pub hard: T,
}

impl<T: Copy> PerDifficulty<T> {
    /// Selects the value for `difficulty`.
    #[must_use]
    pub fn get(&self, difficulty: Difficulty) -> T {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
        }
    }
}

/// Money, lives and score rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// Money available when a match starts.
    pub starting_money: PerDifficulty<u32>,
    /// Lives available when a match starts.
    pub starting_lives: PerDifficulty<i32>,
    /// Lives removed whenever an enemy reaches the end of its route.
    pub lives_per_escape: i32,
    /// Score awarded per unit of bounty.
    pub score_per_bounty: u64,
    /// Multiplier applied to enemy health.
    pub health_multiplier: PerDifficulty<f32>,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            starting_money: PerDifficulty {
                easy: 500,
                normal: 350,
                hard: 250,
            },
            starting_lives: PerDifficulty {
                easy: 30,
                normal: 20,
                hard: 15,
            },
            lives_per_escape: 5,
            score_per_bounty: 10,
            health_multiplier: PerDifficulty {
                easy: 1.3,
                normal: 1.8,
                hard: 2.5,
            },
        }
    }
}

/// Count of a single archetype within a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveEntry {
    /// Archetype to spawn.
    pub kind: EnemyKind,
    /// Number of enemies before difficulty scaling.
    pub count: u32,
}

/// Composition of a single wave before difficulty scaling.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveSpec {
    /// Archetype counts in table order.
    #[serde(default)]
    pub counts: Vec<WaveEntry>,
}

impl WaveSpec {
    fn from_row(row: [u32; 11]) -> Self {
        let counts = EnemyKind::ALL
            .into_iter()
            .zip(row)
            .filter(|(_, count)| *count > 0)
            .map(|(kind, count)| WaveEntry { kind, count })
            .collect();
        Self { counts }
    }

    /// Counts adjusted for `difficulty`.
    ///
    /// Easy removes one of each boss and trims other archetypes by the easy
    /// scale; hard multiplies every archetype. Entries that scale to zero
    /// are dropped.
    #[must_use]
    pub fn scaled(&self, difficulty: Difficulty, rules: &WaveRules) -> Vec<WaveEntry> {
        self.counts
            .iter()
            .map(|entry| {
                let count = match difficulty {
                    Difficulty::Easy if entry.kind.is_boss() => {
                        entry.count.saturating_sub(rules.easy_boss_reduction)
                    }
                    Difficulty::Easy => scale_count(entry.count, rules.easy_count_scale),
                    Difficulty::Normal => entry.count,
                    Difficulty::Hard => scale_count(entry.count, rules.hard_count_scale),
                };
                WaveEntry {
                    kind: entry.kind,
                    count,
                }
            })
            .filter(|entry| entry.count > 0)
            .collect()
    }
}

fn scale_count(count: u32, scale: f32) -> u32 {
    (count as f32 * scale).floor().max(0.0) as u32
}

/// Wave pacing and composition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveRules {
    /// Idle time before the next wave starts on its own, in milliseconds.
    pub auto_start_delay_ms: u64,
    /// Gap between consecutive spawns of a wave, in milliseconds.
    pub spawn_stride_ms: u64,
    /// Multiplier applied to non-boss counts on easy.
    pub easy_count_scale: f32,
    /// Multiplier applied to all counts on hard.
    pub hard_count_scale: f32,
    /// Bosses removed per archetype on easy.
    pub easy_boss_reduction: u32,
    /// Base composition of every wave in order.
    pub table: Vec<WaveSpec>,
}

impl WaveRules {
    /// Idle time before an automatic wave start.
    #[must_use]
    pub fn auto_start_delay(&self) -> Duration {
        Duration::from_millis(self.auto_start_delay_ms)
    }

    /// Gap between consecutive spawns.
    #[must_use]
    pub fn spawn_stride(&self) -> Duration {
        Duration::from_millis(self.spawn_stride_ms)
    }
}

impl Default for WaveRules {
    fn default() -> Self {
        // slime orc goblin skeleton knight tank ninja dragon giant wizard cyber
        let rows: [[u32; 11]; 14] = [
            [18, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            [20, 8, 10, 0, 0, 2, 5, 0, 0, 0, 0],
            [25, 12, 15, 5, 0, 3, 8, 0, 0, 0, 0],
            [30, 15, 18, 8, 2, 5, 10, 0, 0, 0, 0],
            [25, 18, 20, 12, 4, 6, 12, 0, 0, 0, 0],
            [30, 20, 25, 15, 6, 8, 15, 1, 0, 0, 0],
            [35, 22, 28, 18, 8, 10, 18, 0, 1, 0, 0],
            [40, 25, 35, 22, 10, 12, 20, 0, 0, 1, 0],
            [45, 28, 38, 25, 12, 15, 22, 1, 1, 0, 0],
            [50, 32, 45, 28, 15, 18, 25, 1, 0, 1, 0],
            [55, 35, 48, 30, 18, 20, 28, 0, 1, 1, 0],
            [60, 40, 55, 35, 22, 22, 30, 2, 0, 1, 1],
            [65, 45, 60, 40, 25, 25, 32, 1, 2, 1, 1],
            [70, 50, 65, 45, 28, 28, 35, 2, 2, 2, 1],
        ];

        Self {
            auto_start_delay_ms: 15_000,
            spawn_stride_ms: 1_500,
            easy_count_scale: 0.7,
            hard_count_scale: 2.0,
            easy_boss_reduction: 1,
            table: rows.into_iter().map(WaveSpec::from_row).collect(),
        }
    }
}

/// Projectile, movement and upgrade rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Distance below which an enemy counts as having reached a waypoint.
    pub arrival_epsilon: f32,
    /// Live projectile count that triggers trimming.
    pub projectile_cap: usize,
    /// Projectile count kept after trimming, newest first.
    pub projectile_trim: usize,
    /// Distance beyond the field edges at which projectiles are discarded.
    pub field_margin: f32,
    /// Collision radius of a projectile.
    pub projectile_radius: f32,
    /// Highest level a tower can reach.
    pub max_tower_level: u32,
    /// Damage multiplier per level, index 0 being level one.
    pub level_damage_multipliers: Vec<f32>,
    /// Range multiplier applied on every upgrade.
    pub range_growth: f32,
    /// Fire rate multiplier applied on every upgrade.
    pub fire_rate_growth: f32,
    /// Upgrade cost multiplier applied on every upgrade.
    pub upgrade_cost_growth: f32,
    /// Frame rate the homing factor is calibrated against.
    pub reference_frame_rate: f32,
}

impl CombatRules {
    /// Damage multiplier for a tower at `level`.
    #[must_use]
    pub fn damage_multiplier(&self, level: u32) -> f32 {
        let index = usize::try_from(level.saturating_sub(1)).unwrap_or(usize::MAX);
        self.level_damage_multipliers
            .get(index)
            .or_else(|| self.level_damage_multipliers.last())
            .copied()
            .unwrap_or(1.0)
    }
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            arrival_epsilon: 2.0,
            projectile_cap: 100,
            projectile_trim: 80,
            field_margin: 128.0,
            projectile_radius: 5.0,
            max_tower_level: 4,
            level_damage_multipliers: vec![1.0, 1.5, 2.2, 3.0],
            range_growth: 1.2,
            fire_rate_growth: 1.25,
            upgrade_cost_growth: 1.6,
            reference_frame_rate: 60.0,
        }
    }
}

/// Complete tuning of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    /// Money, lives and score.
    pub economy: EconomyRules,
    /// Wave pacing and composition.
    pub waves: WaveRules,
    /// Projectiles, movement and upgrades.
    pub combat: CombatRules,
    /// Tower archetype records. Missing archetypes use canonical stats.
    pub towers: Vec<TowerStats>,
    /// Enemy archetype records. Missing archetypes use canonical stats.
    pub enemies: Vec<EnemyStats>,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            economy: EconomyRules::default(),
            waves: WaveRules::default(),
            combat: CombatRules::default(),
            towers: TowerKind::ALL.into_iter().map(TowerStats::canonical).collect(),
            enemies: EnemyKind::ALL.into_iter().map(EnemyStats::canonical).collect(),
        }
    }
}

impl Balance {
    /// Parses a TOML document, filling omitted values from the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceError::Parse`] for malformed documents and
    /// [`BalanceError::Invalid`] when a value violates a structural rule.
    pub fn from_toml_str(source: &str) -> Result<Self, BalanceError> {
        let balance: Balance = toml::from_str(source)?;
        balance.validate()?;
        Ok(balance)
    }

    /// Renders the balance as a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceError::Render`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, BalanceError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Statistics of a tower archetype.
    #[must_use]
    pub fn tower(&self, kind: TowerKind) -> TowerStats {
        self.towers
            .iter()
            .find(|stats| stats.kind == kind)
            .copied()
            .unwrap_or_else(|| TowerStats::canonical(kind))
    }

    /// Statistics of an enemy archetype.
    #[must_use]
    pub fn enemy(&self, kind: EnemyKind) -> EnemyStats {
        self.enemies
            .iter()
            .find(|stats| stats.kind == kind)
            .copied()
            .unwrap_or_else(|| EnemyStats::canonical(kind))
    }

    /// Number of waves in the table.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        u32::try_from(self.waves.table.len()).unwrap_or(u32::MAX)
    }

    fn validate(&self) -> Result<(), BalanceError> {
        if self.combat.max_tower_level == 0 {
            return Err(BalanceError::Invalid {
                field: "combat.max_tower_level",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.combat.projectile_trim > self.combat.projectile_cap {
            return Err(BalanceError::Invalid {
                field: "combat.projectile_trim",
                reason: format!(
                    "{} exceeds projectile_cap {}",
                    self.combat.projectile_trim, self.combat.projectile_cap
                ),
            });
        }
        for enemy in &self.enemies {
            if !(0.0..1.0).contains(&enemy.armor) || !(0.0..1.0).contains(&enemy.evasion) {
                return Err(BalanceError::Invalid {
                    field: "enemies",
                    reason: format!("{} armor and evasion must lie in [0, 1)", enemy.kind),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easy_first_wave_is_twelve_slimes() {
        let balance = Balance::default();
        let first = balance.waves.table[0].scaled(Difficulty::Easy, &balance.waves);
        assert_eq!(
            first,
            vec![WaveEntry {
                kind: EnemyKind::Slime,
                count: 12
            }]
        );
    }

    #[test]
    fn easy_drops_single_bosses_and_hard_doubles_them() {
        let balance = Balance::default();
        let sixth = &balance.waves.table[5];
        let easy = sixth.scaled(Difficulty::Easy, &balance.waves);
        assert!(easy.iter().all(|entry| !entry.kind.is_boss()));

        let hard = sixth.scaled(Difficulty::Hard, &balance.waves);
        let dragons = hard
            .iter()
            .find(|entry| entry.kind == EnemyKind::BossDragon)
            .map(|entry| entry.count);
        assert_eq!(dragons, Some(2));
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let balance = Balance::from_toml_str(
            "[economy]\nlives_per_escape = 1\n\n[economy.starting_money]\neasy = 900\nnormal = 350\nhard = 250\n",
        )
        .expect("parse");
        assert_eq!(balance.economy.lives_per_escape, 1);
        assert_eq!(balance.economy.starting_money.get(Difficulty::Easy), 900);
        assert_eq!(balance.economy.score_per_bounty, 10);
        assert_eq!(balance.waves.table.len(), 14);
        assert_eq!(balance.tower(TowerKind::Sniper).cost, 120);
    }

    #[test]
    fn default_balance_survives_toml_rendering() {
        let balance = Balance::default();
        let rendered = balance.to_toml_string().expect("render");
        let parsed = Balance::from_toml_str(&rendered).expect("parse");
        assert_eq!(parsed, balance);
    }

    #[test]
    fn rejects_trim_above_cap() {
        let error = Balance::from_toml_str("[combat]\nprojectile_cap = 10\nprojectile_trim = 20\n")
            .expect_err("trim above cap");
        assert!(matches!(
            error,
            BalanceError::Invalid {
                field: "combat.projectile_trim",
                ..
            }
        ));
    }

    #[test]
    fn damage_multiplier_saturates_at_last_entry() {
        let rules = CombatRules::default();
        assert_eq!(rules.damage_multiplier(1), 1.0);
        assert_eq!(rules.damage_multiplier(4), 3.0);
        assert_eq!(rules.damage_multiplier(9), 3.0);
    }
}
