//! Enemy entities walking the precomputed routes.

use rand::Rng;
use tower_siege_core::{EnemyId, EnemyKind, EnemySnapshot, EnemyStats, Vec2};
use tower_siege_system_combat::{Combatant, HitOutcome};

/// Enemy state stored inside the match.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) level: u32,
    pub(crate) route: usize,
    pub(crate) bounty: u32,
    position: Vec2,
    heading: Vec2,
    waypoint: usize,
    health: f32,
    max_health: f32,
    speed: f32,
    armor: f32,
    evasion: f32,
    hit_radius: f32,
    alive: bool,
    escaped: bool,
}

impl Enemy {
    /// Creates an enemy standing on the first waypoint of its route.
    pub(crate) fn spawn(
        id: EnemyId,
        stats: &EnemyStats,
        level: u32,
        difficulty_multiplier: f32,
        route: usize,
        start: Vec2,
    ) -> Self {
        let max_health = stats.max_health(level, difficulty_multiplier);
        Self {
            id,
            kind: stats.kind,
            level,
            route,
            bounty: stats.bounty(level),
            position: start,
            heading: Vec2::ZERO,
            waypoint: 0,
            health: max_health,
            max_health,
            speed: stats.speed,
            armor: stats.armor,
            evasion: stats.evasion,
            hit_radius: stats.hit_radius(),
            alive: max_health > 0.0,
            escaped: false,
        }
    }

    /// Walks toward the current waypoint, or moves the cursor on arrival.
    pub(crate) fn advance(&mut self, dt: f32, waypoints: &[Vec2], arrival_epsilon: f32) {
        if !self.alive {
            return;
        }
        let Some(&target) = waypoints.get(self.waypoint) else {
            return;
        };

        let delta = target - self.position;
        let distance = delta.length();
        if distance > arrival_epsilon {
            let step = (self.speed * dt).min(distance);
            self.heading = delta / distance;
            self.position += self.heading * step;
        } else {
            self.waypoint += 1;
        }
    }

    /// Reports whether the cursor moved past the last waypoint.
    pub(crate) fn has_reached_end(&self, waypoint_count: usize) -> bool {
        self.waypoint >= waypoint_count
    }

    /// Removes the enemy from play after it reached the base.
    pub(crate) fn escape(&mut self) {
        self.alive = false;
        self.escaped = true;
    }

    /// Reports whether the enemy should stay in the active set.
    pub(crate) fn is_on_field(&self) -> bool {
        self.alive && !self.escaped
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            heading: self.heading,
            health: self.health,
            max_health: self.max_health,
            level: self.level,
            route: self.route,
            waypoint: self.waypoint,
        }
    }
}

impl Combatant for Enemy {
    fn id(&self) -> EnemyId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn hit_radius(&self) -> f32 {
        self.hit_radius
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn apply_damage<R: Rng + ?Sized>(
        &mut self,
        raw: f32,
        critical: bool,
        rng: &mut R,
    ) -> HitOutcome {
        if !self.alive {
            return HitOutcome {
                killed: false,
                critical,
                evaded: false,
            };
        }

        if self.evasion > 0.0 && rng.gen::<f32>() < self.evasion {
            return HitOutcome {
                killed: false,
                critical,
                evaded: true,
            };
        }

        self.health -= (raw * (1.0 - self.armor)).max(0.0);
        let killed = self.health <= 0.0;
        if killed {
            self.alive = false;
        }
        HitOutcome {
            killed,
            critical,
            evaded: false,
        }
    }
}

/// Index of `id` in an enemy slice ordered by identifier.
pub(crate) fn index_of(enemies: &[Enemy], id: EnemyId) -> Option<usize> {
    enemies.binary_search_by_key(&id, |enemy| enemy.id).ok()
}
