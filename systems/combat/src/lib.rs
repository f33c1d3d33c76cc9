#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolver shared by every tower archetype.
//!
//! The resolver is generic over [`Combatant`] so it never owns enemies. All
//! functions take the live enemy slice of the current tick and refer to
//! enemies by their index in that slice; callers translate indices into
//! stable [`EnemyId`] handles when they need to remember a target across
//! ticks. Damage results are appended to a caller-supplied [`Hit`] buffer so
//! the caller can credit bounties and emit notifications.

mod impact;
mod targeting;

use rand::Rng;
use tower_siege_core::{EnemyId, Vec2};

pub use impact::{find_impact, resolve_impact, strike_arc, Effect, Strike};
pub use targeting::{nearest_alive, select_target, select_targets};

/// Capability interface of anything a tower can damage.
pub trait Combatant {
    /// Stable handle of the combatant.
    fn id(&self) -> EnemyId;

    /// Current world position.
    fn position(&self) -> Vec2;

    /// Collision radius.
    fn hit_radius(&self) -> f32;

    /// Reports whether the combatant can still be targeted and damaged.
    fn is_alive(&self) -> bool;

    /// Applies a hit of `raw` damage after the combatant's own defences.
    fn apply_damage<R: Rng + ?Sized>(&mut self, raw: f32, critical: bool, rng: &mut R)
        -> HitOutcome;
}

/// Result of a single damage application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitOutcome {
    /// The hit brought health to zero or below.
    pub killed: bool,
    /// The hit carried a critical multiplier.
    pub critical: bool,
    /// The hit was negated by evasion.
    pub evaded: bool,
}

/// Record of a resolved hit for economy and notification handling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Enemy that was struck.
    pub enemy: EnemyId,
    /// Position of the enemy when struck.
    pub position: Vec2,
    /// Raw damage before the enemy's defences.
    pub damage: f32,
    /// Outcome reported by the enemy.
    pub outcome: HitOutcome,
}

/// Rolls a critical hit, returning the final damage and whether it was critical.
pub fn roll_critical<R: Rng + ?Sized>(
    damage: f32,
    chance: f32,
    multiplier: f32,
    rng: &mut R,
) -> (f32, bool) {
    if rng.gen::<f32>() < chance {
        (damage * multiplier, true)
    } else {
        (damage, false)
    }
}

/// Damage dealt to the `k`-th target (zero based) of a falloff strike.
#[must_use]
pub fn falloff(damage: f32, reduction: f32, k: u32) -> f32 {
    let exponent = i32::try_from(k).unwrap_or(i32::MAX);
    damage * reduction.powi(exponent)
}

/// Velocity of `speed` pointing from `from` toward `to`.
///
/// Coincident points keep a minimal separation so the direction is defined.
#[must_use]
pub fn aim(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length().max(0.1);
    delta / distance * speed
}

/// Blends `velocity` toward the target direction and restores its speed.
///
/// `homing` is the interpolation factor per reference frame; the blend for
/// this step is scaled by `dt` so steering is frame-rate independent.
#[must_use]
pub fn steer_homing(
    velocity: Vec2,
    position: Vec2,
    target: Vec2,
    speed: f32,
    homing: f32,
    dt: f32,
    reference_frame_rate: f32,
) -> Vec2 {
    let desired = aim(position, target, speed);
    let factor = (homing * dt * reference_frame_rate).clamp(0.0, 1.0);
    let blended = velocity + (desired - velocity) * factor;
    let current = blended.length();
    if current > 0.0 {
        blended / current * speed
    } else {
        desired
    }
}
