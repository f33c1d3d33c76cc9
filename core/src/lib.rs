#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tower Siege engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative match, and pure systems. Adapters submit [`Command`] values
//! describing player intent, the world executes those commands through its
//! `apply` entry point and broadcasts [`Event`] values describing what
//! happened. Read-only views expose the match state without granting
//! mutable access.

mod archetypes;
mod balance;
mod records;

use std::time::Duration;

pub use archetypes::{
    Ability, AbilitySpec, EnemyKind, EnemyStats, TowerKind, TowerStats, UnknownArchetype,
};
pub use balance::{
    Balance, BalanceError, CombatRules, Difficulty, EconomyRules, MapKind, PerDifficulty,
    WaveEntry, WaveRules, WaveSpec,
};
pub use glam::Vec2;
pub use records::{
    HighScore, HighScoreTable, LoadDataInvalid, SaveSnapshot, TowerRecord, HIGH_SCORE_CAPACITY,
};
use serde::{Deserialize, Serialize};

/// Commands that express all permissible match mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Chooses the tower archetype used by subsequent placements.
    SelectTowerKind {
        /// Archetype to build next.
        kind: TowerKind,
    },
    /// Requests a tower of the selected archetype at the provided position.
    PlaceTower {
        /// World position inside the desired tower spot.
        position: Vec2,
    },
    /// Marks an existing tower as the upgrade target.
    SelectTower {
        /// Identifier of the tower to select.
        tower: TowerId,
    },
    /// Requests an upgrade of the currently selected tower.
    UpgradeSelectedTower,
    /// Requests that the next wave starts without waiting for the countdown.
    StartWaveNow,
    /// Freezes the simulation clock.
    Pause,
    /// Resumes a paused simulation.
    Resume,
    /// Discards the match in progress and starts over on the same map.
    Restart,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the match after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms the archetype used by subsequent placements.
    TowerKindSelected {
        /// Archetype now selected.
        kind: TowerKind,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Archetype of the tower.
        kind: TowerKind,
        /// Centre of the occupied spot.
        position: Vec2,
        /// Money debited for construction.
        cost: u32,
    },
    /// Reports that a placement request was rejected.
    TowerPlacementRejected {
        /// Archetype requested for placement.
        kind: TowerKind,
        /// Position supplied with the request.
        position: Vec2,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower became the upgrade target.
    TowerSelected {
        /// Identifier of the selected tower.
        tower: TowerId,
    },
    /// Confirms that a tower was upgraded.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached by the upgrade.
        level: u32,
        /// Money debited for the upgrade.
        cost: u32,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Tower targeted by the request, if one was selected.
        tower: Option<TowerId>,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Announces that a tower attacked.
    TowerFired {
        /// Identifier of the attacking tower.
        tower: TowerId,
        /// Archetype of the attacking tower.
        kind: TowerKind,
        /// Projectiles emitted, zero for instant strikes.
        projectiles: u32,
    },
    /// Announces that a hit rolled a critical multiplier.
    CriticalHit {
        /// Enemy struck by the critical hit.
        enemy: EnemyId,
        /// Position of the struck enemy.
        position: Vec2,
    },
    /// Announces that an enemy evaded a hit.
    HitEvaded {
        /// Enemy that evaded.
        enemy: EnemyId,
    },
    /// Confirms that an enemy entered the field.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Archetype of the enemy.
        kind: EnemyKind,
        /// Index of the route the enemy follows.
        route: usize,
    },
    /// Announces that a boss entered the field.
    BossSpawned {
        /// Identifier assigned to the boss.
        enemy: EnemyId,
        /// Boss archetype.
        kind: EnemyKind,
    },
    /// Reports that an enemy was killed.
    EnemyKilled {
        /// Identifier of the killed enemy.
        enemy: EnemyId,
        /// Archetype of the killed enemy.
        kind: EnemyKind,
        /// Money credited for the kill.
        bounty: u32,
    },
    /// Reports that an enemy reached the end of its route.
    EnemyEscaped {
        /// Identifier of the escaped enemy.
        enemy: EnemyId,
        /// Archetype of the escaped enemy.
        kind: EnemyKind,
        /// Lives removed by the escape.
        lives_lost: i32,
    },
    /// Announces that the next wave will start automatically.
    CountdownStarted {
        /// One-based number of the upcoming wave.
        wave: u32,
        /// Delay before the automatic start.
        delay: Duration,
    },
    /// Announces that a wave started spawning.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Enemies scheduled for the wave.
        enemies: u32,
    },
    /// Reports that a manual wave start was rejected.
    WaveStartRejected {
        /// Specific reason the start failed.
        reason: StartWaveError,
    },
    /// Announces that every enemy of a wave has spawned and left the field.
    WaveCleared {
        /// One-based wave number.
        wave: u32,
    },
    /// Confirms that the simulation clock is frozen.
    Paused,
    /// Confirms that the simulation clock runs again.
    Resumed,
    /// Confirms that the match was reset to its starting state.
    Restarted,
    /// Announces that the final wave was cleared.
    Victory {
        /// Final score.
        score: u64,
    },
    /// Announces that the player ran out of lives.
    GameOver {
        /// Final score.
        score: u64,
    },
}

/// Overall state of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Simulation advances on every tick.
    Running,
    /// Ticks are ignored until the match resumes.
    Paused,
    /// Lives reached zero. Terminal.
    GameOver,
    /// Every wave was cleared. Terminal.
    Victory,
}

impl MatchStatus {
    /// Reports whether the match has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

/// Lifecycle phase of the wave director.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// Waiting for the field to empty before counting down.
    Idle,
    /// Counting down toward an automatic start.
    Countdown {
        /// Time left before the next wave starts.
        remaining: Duration,
    },
    /// Enemies of the current wave are still being released.
    Spawning,
    /// Every enemy has spawned; waiting for the field to clear.
    Active,
    /// Every wave has been cleared.
    Victory,
}

/// Reasons a tower placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The player cannot afford the tower.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Cost of the tower.
        required: u32,
        /// Money currently available.
        available: u32,
    },
    /// A tower already occupies the spot.
    #[error("tower spot is already occupied")]
    OccupiedSpot,
    /// The position is not inside a buildable spot.
    #[error("position is not a tower spot")]
    InvalidSpot,
    /// The match has ended.
    #[error("the match is over")]
    MatchOver,
}

/// Reasons a tower upgrade request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum UpgradeError {
    /// The player cannot afford the upgrade.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Cost of the upgrade.
        required: u32,
        /// Money currently available.
        available: u32,
    },
    /// The tower is already at its highest level.
    #[error("tower is already at maximum level")]
    MaxLevelReached,
    /// No tower is selected or the identifier is unknown.
    #[error("no such tower")]
    MissingTower,
    /// The match has ended.
    #[error("the match is over")]
    MatchOver,
}

/// Reasons a manual wave start may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum StartWaveError {
    /// A wave is still spawning or has enemies on the field.
    #[error("a wave is already in progress")]
    WaveInProgress,
    /// Every wave in the table has been started.
    #[error("no waves remain")]
    NoWavesRemaining,
    /// The match has ended.
    #[error("the match is over")]
    MatchOver,
}

/// Error reported when no walkable route connects two cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("no walkable route from {start:?} to {end:?}")]
pub struct PathNotFound {
    /// Route origin.
    pub start: CellCoord,
    /// Route destination.
    pub end: CellCoord,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Money, lives and score of the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Economy {
    /// Money available for construction and upgrades.
    pub money: u32,
    /// Lives remaining; the match is lost at zero or below.
    pub lives: i32,
    /// Accumulated score.
    pub score: u64,
}

/// Immutable representation of a single enemy used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier assigned to the enemy.
    pub id: EnemyId,
    /// Archetype of the enemy.
    pub kind: EnemyKind,
    /// Current world position.
    pub position: Vec2,
    /// Unit vector of the last movement step, zero before the first step.
    pub heading: Vec2,
    /// Remaining health.
    pub health: f32,
    /// Health at spawn.
    pub max_health: f32,
    /// One-based wave number the enemy was scaled for.
    pub level: u32,
    /// Index of the route the enemy follows.
    pub route: usize,
    /// Index of the waypoint the enemy walks toward.
    pub waypoint: usize,
}

/// Read-only snapshot describing all enemies on the field.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower.
    pub id: TowerId,
    /// Archetype of the tower.
    pub kind: TowerKind,
    /// Centre of the occupied spot.
    pub position: Vec2,
    /// Current level.
    pub level: u32,
    /// Damage per hit at the current level.
    pub damage: f32,
    /// Targeting radius at the current level.
    pub range: f32,
    /// Attacks per second at the current level.
    pub fire_rate: f32,
    /// Enemy currently tracked, if any.
    pub target: Option<EnemyId>,
    /// Cost of the next upgrade, `None` at the highest level.
    pub upgrade_cost: Option<u32>,
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Archetype of the tower that fired it.
    pub source: TowerKind,
    /// Current world position.
    pub position: Vec2,
    /// Unit direction of travel.
    pub heading: Vec2,
    /// Enemy the projectile tracks, if still alive.
    pub target: Option<EnemyId>,
    /// Whether the projectile rolled a critical hit.
    pub critical: bool,
}

/// Read-only snapshot describing all projectiles in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectile snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured projectiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Progress of the wave director.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveStatus {
    /// Current lifecycle phase.
    pub phase: WavePhase,
    /// Number of waves started so far.
    pub started: u32,
    /// Number of waves in the table.
    pub total: u32,
    /// Enemies released in the current wave.
    pub spawned: u32,
    /// Enemies scheduled for the current wave.
    pub scheduled: u32,
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, EnemyId, EnemySnapshot, EnemyView, EnemyKind, MatchStatus, Vec2};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn enemy_view_orders_by_identifier() {
        let snapshot = |id| EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Slime,
            position: Vec2::ZERO,
            heading: Vec2::X,
            health: 1.0,
            max_health: 1.0,
            level: 1,
            route: 0,
            waypoint: 0,
        };
        let view = EnemyView::from_snapshots(vec![snapshot(3), snapshot(1), snapshot(2)]);
        let ids: Vec<u32> = view.iter().map(|s| s.id.get()).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn only_game_over_and_victory_are_terminal() {
        assert!(MatchStatus::GameOver.is_terminal());
        assert!(MatchStatus::Victory.is_terminal());
        assert!(!MatchStatus::Paused.is_terminal());
        assert!(!MatchStatus::Running.is_terminal());
    }
}
