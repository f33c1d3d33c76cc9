//! Projectiles in flight between towers and enemies.

use tower_siege_core::{EnemyId, ProjectileId, ProjectileSnapshot, TowerKind, Vec2};
use tower_siege_system_combat::{aim, steer_homing, Strike};

/// Projectile state stored inside the match.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) source: TowerKind,
    pub(crate) position: Vec2,
    pub(crate) target: Option<EnemyId>,
    pub(crate) strike: Strike,
    velocity: Vec2,
    speed: f32,
    homing: Option<f32>,
}

impl Projectile {
    /// Launches a projectile from `origin` aimed at `target_position`.
    pub(crate) fn launch(
        id: ProjectileId,
        source: TowerKind,
        origin: Vec2,
        target: EnemyId,
        target_position: Vec2,
        speed: f32,
        homing: Option<f32>,
        strike: Strike,
    ) -> Self {
        Self {
            id,
            source,
            position: origin,
            target: Some(target),
            strike,
            velocity: aim(origin, target_position, speed),
            speed,
            homing,
        }
    }

    /// Replaces the tracked enemy and re-aims straight at it.
    pub(crate) fn retarget(&mut self, target: Option<(EnemyId, Vec2)>) {
        match target {
            Some((id, position)) => {
                self.target = Some(id);
                self.velocity = aim(self.position, position, self.speed);
            }
            None => self.target = None,
        }
    }

    /// Moves the projectile, steering toward `target_position` if it homes.
    pub(crate) fn advance(&mut self, dt: f32, target_position: Option<Vec2>, frame_rate: f32) {
        if let (Some(homing), Some(target)) = (self.homing, target_position) {
            self.velocity = steer_homing(
                self.velocity,
                self.position,
                target,
                self.speed,
                homing,
                dt,
                frame_rate,
            );
        }
        self.position += self.velocity * dt;
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            source: self.source,
            position: self.position,
            heading: self.velocity.normalize_or_zero(),
            target: self.target,
            critical: self.strike.critical,
        }
    }
}
