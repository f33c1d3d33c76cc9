//! Target selection over the live enemy slice.

use tower_siege_core::Vec2;

use crate::Combatant;

/// Index of the nearest alive enemy within `range` of `origin`.
///
/// Only a strictly smaller distance replaces the current best, so the first
/// enemy in slice order wins ties.
pub fn select_target<C: Combatant>(origin: Vec2, range: f32, enemies: &[C]) -> Option<usize> {
    let range_sq = range * range;
    let mut best: Option<(usize, f32)> = None;

    for (index, enemy) in enemies.iter().enumerate() {
        if !enemy.is_alive() {
            continue;
        }
        let distance_sq = origin.distance_squared(enemy.position());
        if distance_sq > range_sq {
            continue;
        }
        match best {
            Some((_, best_sq)) if distance_sq >= best_sq => {}
            _ => best = Some((index, distance_sq)),
        }
    }

    best.map(|(index, _)| index)
}

/// Collects up to `max_targets` alive enemies within `range`, nearest first.
///
/// Enemies at equal distance keep their slice order. The output buffer is
/// cleared before populating it.
pub fn select_targets<C: Combatant>(
    origin: Vec2,
    range: f32,
    max_targets: usize,
    enemies: &[C],
    out: &mut Vec<usize>,
) {
    out.clear();
    if max_targets == 0 {
        return;
    }

    let range_sq = range * range;
    let mut candidates: Vec<(usize, f32)> = enemies
        .iter()
        .enumerate()
        .filter(|(_, enemy)| enemy.is_alive())
        .map(|(index, enemy)| (index, origin.distance_squared(enemy.position())))
        .filter(|(_, distance_sq)| *distance_sq <= range_sq)
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

    out.extend(
        candidates
            .into_iter()
            .take(max_targets)
            .map(|(index, _)| index),
    );
}

/// Index of the alive enemy closest to `point`, regardless of range.
pub fn nearest_alive<C: Combatant>(point: Vec2, enemies: &[C]) -> Option<usize> {
    select_target(point, f32::INFINITY, enemies)
}
