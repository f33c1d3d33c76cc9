//! Impact resolution: primary hits, splash, chain jumps and arc strikes.

use rand::Rng;
use tower_siege_core::Vec2;

use crate::{falloff, Combatant, Hit};

/// Secondary effect carried by a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    /// Only the struck enemy is damaged.
    None,
    /// Enemies around the impact point take a fraction of the damage.
    Splash {
        /// Radius around the impact point.
        radius: f32,
        /// Fraction of the damage dealt to splashed enemies.
        percent: f32,
    },
    /// The hit jumps to nearby enemies with geometric falloff.
    Chain {
        /// Enemies struck in total, including the primary.
        targets: u32,
        /// Damage ratio applied per jump.
        reduction: f32,
        /// Maximum distance of a single jump.
        range: f32,
    },
}

/// Payload delivered when a projectile connects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strike {
    /// Damage dealt to the struck enemy.
    pub damage: f32,
    /// Whether the damage already includes a critical multiplier.
    pub critical: bool,
    /// Secondary effect applied after the primary hit.
    pub effect: Effect,
}

/// Index of the first alive enemy overlapping a projectile.
pub fn find_impact<C: Combatant>(position: Vec2, radius: f32, enemies: &[C]) -> Option<usize> {
    enemies.iter().position(|enemy| {
        let reach = radius + enemy.hit_radius();
        enemy.is_alive() && position.distance_squared(enemy.position()) <= reach * reach
    })
}

/// Applies a strike to `enemies[primary]` and its secondary effect.
///
/// Splash and chain damage never carry the critical flag. Every hit, evaded
/// or not, is appended to `out`.
pub fn resolve_impact<C: Combatant, R: Rng + ?Sized>(
    impact: Vec2,
    strike: &Strike,
    primary: usize,
    enemies: &mut [C],
    rng: &mut R,
    out: &mut Vec<Hit>,
) {
    if !enemies.get(primary).is_some_and(Combatant::is_alive) {
        return;
    }
    hit(enemies, primary, strike.damage, strike.critical, rng, out);

    match strike.effect {
        Effect::None => {}
        Effect::Splash { radius, percent } => {
            let damage = strike.damage * percent;
            let radius_sq = radius * radius;
            for index in 0..enemies.len() {
                if index == primary || !enemies[index].is_alive() {
                    continue;
                }
                if impact.distance_squared(enemies[index].position()) <= radius_sq {
                    hit(enemies, index, damage, false, rng, out);
                }
            }
        }
        Effect::Chain {
            targets,
            reduction,
            range,
        } => {
            let mut struck = vec![primary];
            let range_sq = range * range;
            for jump in 1..targets {
                let Some(&last) = struck.last() else {
                    break;
                };
                let from = enemies[last].position();
                let next = enemies
                    .iter()
                    .enumerate()
                    .filter(|(index, enemy)| enemy.is_alive() && !struck.contains(index))
                    .map(|(index, enemy)| (index, from.distance_squared(enemy.position())))
                    .filter(|(_, distance_sq)| *distance_sq <= range_sq)
                    .fold(None, |best: Option<(usize, f32)>, candidate| match best {
                        Some(existing) if existing.1 <= candidate.1 => Some(existing),
                        _ => Some(candidate),
                    });
                let Some((index, _)) = next else {
                    break;
                };
                struck.push(index);
                hit(
                    enemies,
                    index,
                    falloff(strike.damage, reduction, jump),
                    false,
                    rng,
                    out,
                );
            }
        }
    }
}

/// Strikes the listed enemies instantly, the `k`-th taking `damage * reduction^k`.
pub fn strike_arc<C: Combatant, R: Rng + ?Sized>(
    damage: f32,
    reduction: f32,
    targets: &[usize],
    enemies: &mut [C],
    rng: &mut R,
    out: &mut Vec<Hit>,
) {
    for (k, &index) in targets.iter().enumerate() {
        if !enemies.get(index).is_some_and(Combatant::is_alive) {
            continue;
        }
        let k = u32::try_from(k).unwrap_or(u32::MAX);
        hit(enemies, index, falloff(damage, reduction, k), false, rng, out);
    }
}

fn hit<C: Combatant, R: Rng + ?Sized>(
    enemies: &mut [C],
    index: usize,
    damage: f32,
    critical: bool,
    rng: &mut R,
    out: &mut Vec<Hit>,
) {
    let enemy = &mut enemies[index];
    let position = enemy.position();
    let outcome = enemy.apply_damage(damage, critical, rng);
    out.push(Hit {
        enemy: enemy.id(),
        position,
        damage,
        outcome,
    });
}
