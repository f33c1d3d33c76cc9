//! Authoritative tower state management utilities.

use std::collections::BTreeMap;

use tower_siege_core::{
    Ability, CellCoord, CombatRules, EnemyId, TowerId, TowerKind, TowerSnapshot, TowerStats, Vec2,
};

/// Stats a tower would have after its next upgrade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpgradePreview {
    /// Level reached by the upgrade.
    pub level: u32,
    /// Damage per hit after the upgrade.
    pub damage: f32,
    /// Targeting radius after the upgrade.
    pub range: f32,
    /// Attacks per second after the upgrade.
    pub fire_rate: f32,
    /// Money the upgrade costs.
    pub cost: u32,
}

/// A placed tower with its level-derived stats.
///
/// Derived stats are recomputed from the archetype's base stats on every
/// level change, so a tower is fully described by its archetype and level.
#[derive(Clone, Debug)]
pub struct Tower {
    id: TowerId,
    stats: TowerStats,
    position: Vec2,
    level: u32,
    damage: f32,
    range: f32,
    fire_rate: f32,
    upgrade_cost: u32,
    ability: Ability,
    pub(crate) fire_timer: f32,
    pub(crate) target: Option<EnemyId>,
}

impl Tower {
    /// Creates a level one tower at `position`.
    #[must_use]
    pub fn new(id: TowerId, stats: TowerStats, position: Vec2, rules: &CombatRules) -> Self {
        let mut tower = Self {
            id,
            stats,
            position,
            level: 1,
            damage: 0.0,
            range: 0.0,
            fire_rate: 0.0,
            upgrade_cost: stats.upgrade_cost,
            ability: stats.ability.at_level(1),
            fire_timer: 0.0,
            target: None,
        };
        tower.recompute(rules);
        tower
    }

    /// Identifier allocated to the tower.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Archetype of the tower.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.stats.kind
    }

    /// Fixed world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Damage per hit.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Targeting radius.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Attacks per second.
    #[must_use]
    pub const fn fire_rate(&self) -> f32 {
        self.fire_rate
    }

    /// Ability parameters at the current level.
    #[must_use]
    pub const fn ability(&self) -> Ability {
        self.ability
    }

    /// Projectile speed in world units per second.
    #[must_use]
    pub const fn projectile_speed(&self) -> f32 {
        self.stats.projectile_speed
    }

    /// Reports whether enough time accumulated since the last attack.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.fire_rate > 0.0 && self.fire_timer >= 1.0 / self.fire_rate
    }

    /// Stats after the next upgrade, `None` at the highest level.
    #[must_use]
    pub fn upgrade_preview(&self, rules: &CombatRules) -> Option<UpgradePreview> {
        if self.level >= rules.max_tower_level {
            return None;
        }
        let level = self.level + 1;
        let (damage, range, fire_rate) = self.derived_stats(level, rules);
        Some(UpgradePreview {
            level,
            damage,
            range,
            fire_rate,
            cost: grow_cost(self.upgrade_cost, rules.upgrade_cost_growth),
        })
    }

    /// Raises the level by one and returns the cost of the upgrade.
    ///
    /// At the highest level nothing changes and zero is returned.
    pub fn upgrade(&mut self, rules: &CombatRules) -> u32 {
        let Some(preview) = self.upgrade_preview(rules) else {
            return 0;
        };
        self.level = preview.level;
        self.upgrade_cost = preview.cost;
        self.recompute(rules);
        preview.cost
    }

    pub(crate) fn snapshot(&self, rules: &CombatRules) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.stats.kind,
            position: self.position,
            level: self.level,
            damage: self.damage,
            range: self.range,
            fire_rate: self.fire_rate,
            target: self.target,
            upgrade_cost: self.upgrade_preview(rules).map(|preview| preview.cost),
        }
    }

    fn recompute(&mut self, rules: &CombatRules) {
        let (damage, range, fire_rate) = self.derived_stats(self.level, rules);
        self.damage = damage;
        self.range = range;
        self.fire_rate = fire_rate;
        self.ability = self.stats.ability.at_level(self.level);
    }

    fn derived_stats(&self, level: u32, rules: &CombatRules) -> (f32, f32, f32) {
        let steps = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
        (
            self.stats.base_damage * rules.damage_multiplier(level),
            self.stats.base_range * rules.range_growth.powi(steps),
            self.stats.base_fire_rate * rules.fire_rate_growth.powi(steps),
        )
    }
}

fn grow_cost(cost: u32, growth: f32) -> u32 {
    (cost as f32 * growth).round().max(0.0) as u32
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    cells: BTreeMap<CellCoord, TowerId>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            cells: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Allocates an identifier and stores the tower built from it.
    pub(crate) fn insert_with<F>(&mut self, cell: CellCoord, build: F) -> TowerId
    where
        F: FnOnce(TowerId) -> Tower,
    {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get() + 1);
        let _ = self.entries.insert(id, build(id));
        let _ = self.cells.insert(cell, id);
        id
    }

    pub(crate) fn is_occupied(&self, cell: CellCoord) -> bool {
        self.cells.contains_key(&cell)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.values_mut()
    }
}
