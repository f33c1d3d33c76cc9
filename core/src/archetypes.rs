//! Data-driven archetype descriptors for enemies and towers.
//!
//! Every enemy and tower variant is described by a plain stat record. The
//! simulation never branches on an archetype tag to find numbers; it looks up
//! the record in the active [`crate::Balance`] and, for towers, resolves the
//! tagged [`AbilitySpec`] into a concrete [`Ability`] for the current level.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Error returned when an archetype tag cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown archetype `{0}`")]
pub struct UnknownArchetype(pub String);

/// Categories of enemies that waves may contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Weak, slow melee blob.
    Slime,
    /// Sturdy melee brute.
    Orc,
    /// Fragile and quick.
    Goblin,
    /// Medium melee variant.
    Skeleton,
    /// Heavy melee variant.
    Knight,
    /// Armored heavy that shrugs off a fraction of every hit.
    Tank,
    /// Fast enemy that evades a fraction of hits entirely.
    Ninja,
    /// Boss tier.
    BossDragon,
    /// Boss tier.
    BossGiant,
    /// Boss tier.
    BossWizard,
    /// Boss tier.
    BossCyber,
}

impl EnemyKind {
    /// Every enemy archetype in wave-table order.
    pub const ALL: [EnemyKind; 11] = [
        Self::Slime,
        Self::Orc,
        Self::Goblin,
        Self::Skeleton,
        Self::Knight,
        Self::Tank,
        Self::Ninja,
        Self::BossDragon,
        Self::BossGiant,
        Self::BossWizard,
        Self::BossCyber,
    ];

    /// Stable tag used in snapshots and configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slime => "slime",
            Self::Orc => "orc",
            Self::Goblin => "goblin",
            Self::Skeleton => "skeleton",
            Self::Knight => "knight",
            Self::Tank => "tank",
            Self::Ninja => "ninja",
            Self::BossDragon => "boss_dragon",
            Self::BossGiant => "boss_giant",
            Self::BossWizard => "boss_wizard",
            Self::BossCyber => "boss_cyber",
        }
    }

    /// Reports whether the archetype belongs to the boss tier.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(
            self,
            Self::BossDragon | Self::BossGiant | Self::BossWizard | Self::BossCyber
        )
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnemyKind {
    type Err = UnknownArchetype;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownArchetype(value.to_owned()))
    }
}

/// Categories of towers the player may build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Long-range archer-class tower that rolls critical hits.
    Sniper,
    /// Slow shells that splash enemies around the impact point.
    Artillery,
    /// Bolts that chain to nearby enemies on impact.
    Laser,
    /// Salvos of homing missiles.
    Rocket,
    /// Instant-hit arcs striking several enemies with damage falloff.
    Tesla,
}

impl TowerKind {
    /// Every tower archetype in build-menu order.
    pub const ALL: [TowerKind; 5] = [
        Self::Sniper,
        Self::Artillery,
        Self::Laser,
        Self::Rocket,
        Self::Tesla,
    ];

    /// Stable tag used in snapshots and configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sniper => "sniper",
            Self::Artillery => "artillery",
            Self::Laser => "laser",
            Self::Rocket => "rocket",
            Self::Tesla => "tesla",
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TowerKind {
    type Err = UnknownArchetype;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownArchetype(value.to_owned()))
    }
}

/// Base statistics of an enemy archetype before level and difficulty scaling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Archetype the record describes.
    pub kind: EnemyKind,
    /// Health at level zero before the difficulty multiplier.
    pub base_health: f32,
    /// Health added per level.
    pub health_per_level: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Bounty at level zero before the bounty factor.
    pub base_bounty: f32,
    /// Bounty added per level.
    pub bounty_per_level: f32,
    /// Multiplier applied to the levelled bounty.
    pub bounty_factor: f32,
    /// Sprite diameter in world units at scale 1.
    pub size: f32,
    /// Sprite scale factor.
    pub scale: f32,
    /// Fraction of incoming damage absorbed, in `[0, 1)`.
    #[serde(default)]
    pub armor: f32,
    /// Probability that a hit is negated entirely, in `[0, 1)`.
    #[serde(default)]
    pub evasion: f32,
}

impl EnemyStats {
    /// Canonical statistics for the provided archetype.
    #[must_use]
    pub fn canonical(kind: EnemyKind) -> Self {
        let (base_health, health_per_level, speed) = match kind {
            EnemyKind::Slime => (120.0, 25.0, 54.0),
            EnemyKind::Orc => (220.0, 35.0, 42.0),
            EnemyKind::Goblin => (75.0, 15.0, 84.0),
            EnemyKind::Skeleton => (270.0, 40.0, 60.0),
            EnemyKind::Knight => (420.0, 60.0, 36.0),
            EnemyKind::Tank => (500.0, 80.0, 24.0),
            EnemyKind::Ninja => (90.0, 20.0, 108.0),
            EnemyKind::BossDragon => (2200.0, 250.0, 27.0),
            EnemyKind::BossGiant => (3000.0, 350.0, 21.0),
            EnemyKind::BossWizard => (1600.0, 180.0, 33.0),
            EnemyKind::BossCyber => (2800.0, 300.0, 30.0),
        };
        let (base_bounty, bounty_per_level, bounty_factor) = match kind {
            EnemyKind::Slime => (12.0, 2.0, 0.7),
            EnemyKind::Orc => (18.0, 4.0, 0.8),
            EnemyKind::Goblin => (14.0, 2.0, 0.6),
            EnemyKind::Skeleton => (25.0, 5.0, 0.9),
            EnemyKind::Knight => (35.0, 7.0, 1.0),
            EnemyKind::Tank => (40.0, 8.0, 1.1),
            EnemyKind::Ninja => (20.0, 3.0, 0.9),
            EnemyKind::BossDragon => (250.0, 30.0, 1.2),
            EnemyKind::BossGiant => (300.0, 35.0, 1.3),
            EnemyKind::BossWizard => (220.0, 25.0, 1.1),
            EnemyKind::BossCyber => (320.0, 40.0, 1.4),
        };
        let (size, scale) = match kind {
            EnemyKind::Slime => (22.0, 0.8),
            EnemyKind::Orc => (26.0, 0.9),
            EnemyKind::Goblin => (20.0, 0.7),
            EnemyKind::Skeleton => (24.0, 0.85),
            EnemyKind::Knight => (30.0, 1.0),
            EnemyKind::Tank => (35.0, 1.1),
            EnemyKind::Ninja => (18.0, 0.75),
            EnemyKind::BossDragon => (50.0, 1.5),
            EnemyKind::BossGiant => (55.0, 1.7),
            EnemyKind::BossWizard => (45.0, 1.4),
            EnemyKind::BossCyber => (52.0, 1.6),
        };
        let armor = if kind == EnemyKind::Tank { 0.3 } else { 0.0 };
        let evasion = if kind == EnemyKind::Ninja { 0.2 } else { 0.0 };

        Self {
            kind,
            base_health,
            health_per_level,
            speed,
            base_bounty,
            bounty_per_level,
            bounty_factor,
            size,
            scale,
            armor,
            evasion,
        }
    }

    /// Maximum health at `level` under the match's difficulty multiplier.
    #[must_use]
    pub fn max_health(&self, level: u32, difficulty_multiplier: f32) -> f32 {
        ((self.base_health + level as f32 * self.health_per_level) * difficulty_multiplier).floor()
    }

    /// Money awarded for killing an enemy of this archetype at `level`.
    #[must_use]
    pub fn bounty(&self, level: u32) -> u32 {
        let raw = (self.base_bounty + level as f32 * self.bounty_per_level) * self.bounty_factor;
        raw.floor().max(0.0) as u32
    }

    /// Collision radius derived from the sprite size and scale.
    #[must_use]
    pub fn hit_radius(&self) -> f32 {
        self.size * self.scale / 2.0
    }
}

/// Level-dependent special ability description attached to a tower archetype.
///
/// Each variant carries its level-one parameters together with the fixed
/// increments applied on every upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilitySpec {
    /// Independent critical roll per shot.
    CriticalStrike {
        /// Probability of a critical shot at level one.
        chance: f32,
        /// Chance added per level above one.
        chance_per_level: f32,
        /// Damage multiplier of a critical shot at level one.
        multiplier: f32,
        /// Multiplier added per level above one.
        multiplier_per_level: f32,
    },
    /// Area damage around the impact point.
    Splash {
        /// Splash radius at level one.
        radius: f32,
        /// Radius added per level above one.
        radius_per_level: f32,
        /// Fraction of the shot's damage dealt to splashed enemies.
        percent: f32,
        /// Fraction added per level above one.
        percent_per_level: f32,
    },
    /// Impact jumps to nearby enemies with geometric falloff.
    Chain {
        /// Enemies struck in total, including the primary, at level one.
        targets: u32,
        /// Targets added per level above one.
        targets_per_level: u32,
        /// Damage ratio applied per jump.
        reduction: f32,
        /// Maximum distance of a single jump.
        range: f32,
    },
    /// Several homing missiles per attack.
    HomingSalvo {
        /// Missiles per salvo once unlocked, at level one.
        missiles: u32,
        /// Missiles added per level above one.
        missiles_per_level: u32,
        /// Homing interpolation factor at level one.
        homing: f32,
        /// Homing factor added per level above one.
        homing_per_level: f32,
        /// Level at which salvos replace single missiles.
        unlock_level: u32,
    },
    /// Instant strikes on several enemies with geometric falloff.
    ArcFalloff {
        /// Simultaneous targets once unlocked, at level one.
        max_targets: u32,
        /// Targets added per level above one.
        max_targets_per_level: u32,
        /// Damage ratio applied per additional target.
        reduction: f32,
        /// Level at which the arc strikes more than one enemy.
        unlock_level: u32,
    },
}

impl AbilitySpec {
    /// Resolves the ability parameters for a tower at `level`.
    #[must_use]
    pub fn at_level(&self, level: u32) -> Ability {
        let steps = level.saturating_sub(1);
        let steps_f = steps as f32;
        match *self {
            Self::CriticalStrike {
                chance,
                chance_per_level,
                multiplier,
                multiplier_per_level,
            } => Ability::CriticalStrike {
                chance: (chance + steps_f * chance_per_level).clamp(0.0, 1.0),
                multiplier: multiplier + steps_f * multiplier_per_level,
            },
            Self::Splash {
                radius,
                radius_per_level,
                percent,
                percent_per_level,
            } => Ability::Splash {
                radius: radius + steps_f * radius_per_level,
                percent: percent + steps_f * percent_per_level,
            },
            Self::Chain {
                targets,
                targets_per_level,
                reduction,
                range,
            } => Ability::Chain {
                targets: targets.saturating_add(steps.saturating_mul(targets_per_level)),
                reduction,
                range,
            },
            Self::HomingSalvo {
                missiles,
                missiles_per_level,
                homing,
                homing_per_level,
                unlock_level,
            } => Ability::HomingSalvo {
                missiles: if level < unlock_level {
                    1
                } else {
                    missiles.saturating_add(steps.saturating_mul(missiles_per_level))
                },
                homing: (homing + steps_f * homing_per_level).clamp(0.0, 1.0),
            },
            Self::ArcFalloff {
                max_targets,
                max_targets_per_level,
                reduction,
                unlock_level,
            } => Ability::ArcFalloff {
                max_targets: if level < unlock_level {
                    1
                } else {
                    max_targets.saturating_add(steps.saturating_mul(max_targets_per_level))
                },
                reduction,
            },
        }
    }
}

/// Concrete ability parameters of a tower at its current level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ability {
    /// Critical roll per projectile.
    CriticalStrike {
        /// Probability in `[0, 1]`.
        chance: f32,
        /// Damage multiplier on a critical shot.
        multiplier: f32,
    },
    /// Area damage around the impact point.
    Splash {
        /// Radius around the impact point.
        radius: f32,
        /// Fraction of the shot's damage dealt to splashed enemies.
        percent: f32,
    },
    /// Chain jumps after impact.
    Chain {
        /// Enemies struck in total, including the primary.
        targets: u32,
        /// Damage ratio applied per jump.
        reduction: f32,
        /// Maximum distance of a single jump.
        range: f32,
    },
    /// Homing missile salvo.
    HomingSalvo {
        /// Missiles per attack.
        missiles: u32,
        /// Homing interpolation factor.
        homing: f32,
    },
    /// Instant multi-target strike.
    ArcFalloff {
        /// Simultaneous targets.
        max_targets: u32,
        /// Damage ratio applied per additional target.
        reduction: f32,
    },
}

impl Ability {
    /// Reports whether attacks are delivered by projectiles rather than instantly.
    #[must_use]
    pub const fn fires_projectiles(&self) -> bool {
        !matches!(self, Self::ArcFalloff { .. })
    }

    /// Number of projectiles emitted per attack.
    #[must_use]
    pub const fn projectiles_per_attack(&self) -> u32 {
        match self {
            Self::HomingSalvo { missiles, .. } => *missiles,
            Self::ArcFalloff { .. } => 0,
            _ => 1,
        }
    }

    /// Homing factor of emitted projectiles, if they steer.
    #[must_use]
    pub const fn homing(&self) -> Option<f32> {
        match self {
            Self::HomingSalvo { homing, .. } => Some(*homing),
            _ => None,
        }
    }
}

/// Base statistics of a tower archetype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Archetype the record describes.
    pub kind: TowerKind,
    /// Money debited on placement.
    pub cost: u32,
    /// Damage per hit at level one.
    pub base_damage: f32,
    /// Targeting radius at level one.
    pub base_range: f32,
    /// Attacks per second at level one.
    pub base_fire_rate: f32,
    /// Seed value of the upgrade cost progression.
    pub upgrade_cost: u32,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Special ability and its per-level progression.
    pub ability: AbilitySpec,
}

impl TowerStats {
    /// Canonical statistics for the provided archetype.
    #[must_use]
    pub fn canonical(kind: TowerKind) -> Self {
        match kind {
            TowerKind::Sniper => Self {
                kind,
                cost: 120,
                base_damage: 25.0,
                base_range: 280.0,
                base_fire_rate: 1.2,
                upgrade_cost: 80,
                projectile_speed: 960.0,
                ability: AbilitySpec::CriticalStrike {
                    chance: 0.15,
                    chance_per_level: 0.05,
                    multiplier: 2.0,
                    multiplier_per_level: 0.5,
                },
            },
            TowerKind::Artillery => Self {
                kind,
                cost: 320,
                base_damage: 50.0,
                base_range: 220.0,
                base_fire_rate: 0.8,
                upgrade_cost: 160,
                projectile_speed: 540.0,
                ability: AbilitySpec::Splash {
                    radius: 60.0,
                    radius_per_level: 20.0,
                    percent: 0.5,
                    percent_per_level: 0.1,
                },
            },
            TowerKind::Laser => Self {
                kind,
                cost: 240,
                base_damage: 18.0,
                base_range: 240.0,
                base_fire_rate: 2.5,
                upgrade_cost: 120,
                projectile_speed: 720.0,
                ability: AbilitySpec::Chain {
                    targets: 3,
                    targets_per_level: 1,
                    reduction: 0.7,
                    range: 150.0,
                },
            },
            TowerKind::Rocket => Self {
                kind,
                cost: 280,
                base_damage: 35.0,
                base_range: 200.0,
                base_fire_rate: 1.5,
                upgrade_cost: 140,
                projectile_speed: 420.0,
                ability: AbilitySpec::HomingSalvo {
                    missiles: 2,
                    missiles_per_level: 1,
                    homing: 0.15,
                    homing_per_level: 0.05,
                    unlock_level: 2,
                },
            },
            TowerKind::Tesla => Self {
                kind,
                cost: 300,
                base_damage: 12.0,
                base_range: 180.0,
                base_fire_rate: 3.0,
                upgrade_cost: 150,
                projectile_speed: 0.0,
                ability: AbilitySpec::ArcFalloff {
                    max_targets: 4,
                    max_targets_per_level: 2,
                    reduction: 0.8,
                    unlock_level: 2,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for kind in EnemyKind::ALL {
            assert_eq!(kind.as_str().parse::<EnemyKind>(), Ok(kind));
        }
        for kind in TowerKind::ALL {
            assert_eq!(kind.as_str().parse::<TowerKind>(), Ok(kind));
        }
        assert_eq!(
            "catapult".parse::<TowerKind>(),
            Err(UnknownArchetype("catapult".to_owned()))
        );
    }

    #[test]
    fn tags_parse_regardless_of_case() {
        assert_eq!("Sniper".parse::<TowerKind>(), Ok(TowerKind::Sniper));
        assert_eq!("TESLA".parse::<TowerKind>(), Ok(TowerKind::Tesla));
        assert_eq!("Boss_Dragon".parse::<EnemyKind>(), Ok(EnemyKind::BossDragon));
        assert_eq!("Ninja".parse::<EnemyKind>(), Ok(EnemyKind::Ninja));
    }

    #[test]
    fn slime_scaling_matches_canonical_formula() {
        let slime = EnemyStats::canonical(EnemyKind::Slime);
        assert_eq!(slime.max_health(1, 1.3), 188.0);
        assert_eq!(slime.bounty(1), 9);
        assert!((slime.hit_radius() - 8.8).abs() < 1e-4);
    }

    #[test]
    fn only_tank_and_ninja_carry_defences() {
        for kind in EnemyKind::ALL {
            let stats = EnemyStats::canonical(kind);
            assert_eq!(stats.armor > 0.0, kind == EnemyKind::Tank);
            assert_eq!(stats.evasion > 0.0, kind == EnemyKind::Ninja);
        }
    }

    #[test]
    fn salvo_and_arc_unlock_at_level_two() {
        let rocket = TowerStats::canonical(TowerKind::Rocket).ability;
        assert_eq!(rocket.at_level(1).projectiles_per_attack(), 1);
        assert_eq!(rocket.at_level(2).projectiles_per_attack(), 3);

        let tesla = TowerStats::canonical(TowerKind::Tesla).ability;
        assert_eq!(
            tesla.at_level(1),
            Ability::ArcFalloff {
                max_targets: 1,
                reduction: 0.8
            }
        );
        assert_eq!(
            tesla.at_level(3),
            Ability::ArcFalloff {
                max_targets: 8,
                reduction: 0.8
            }
        );
    }

    #[test]
    fn critical_chance_grows_per_level() {
        let sniper = TowerStats::canonical(TowerKind::Sniper).ability;
        match sniper.at_level(4) {
            Ability::CriticalStrike { chance, multiplier } => {
                assert!((chance - 0.30).abs() < 1e-6);
                assert!((multiplier - 3.5).abs() < 1e-6);
            }
            other => panic!("unexpected ability: {other:?}"),
        }
    }
}
