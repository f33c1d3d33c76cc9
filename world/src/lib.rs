#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative match state for Tower Siege.
//!
//! A [`Match`] owns every enemy, tower and projectile together with the
//! economy and the wave director. All mutation flows through [`apply`], which
//! executes one [`Command`] and appends the resulting [`Event`] values. The
//! [`query`] module exposes read-only views for presentation layers.

mod enemies;
mod projectiles;
mod snapshot;
mod towers;

use std::{collections::VecDeque, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tower_siege_core::{
    Ability, Balance, CellCoord, Command, Difficulty, Economy, EnemyId, Event, MapKind,
    MatchStatus, PlacementError, ProjectileId, StartWaveError, TowerId, TowerKind, UpgradeError,
    Vec2, WavePhase,
};
use tower_siege_system_combat::{self as combat, Combatant, Effect, Hit, Strike};
use tower_siege_system_pathfinding::{derive_routes, maps, CellKind, GridError, Route, TileGrid};
use tower_siege_system_waves::{SpawnOrder, WaveDirector};

use enemies::Enemy;
use projectiles::Projectile;
use towers::TowerRegistry;

pub use snapshot::LoadReport;
pub use towers::{Tower, UpgradePreview};

/// Parameters fixed when a match is created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchConfig {
    /// Difficulty scaling money, lives, enemy health and wave sizes.
    pub difficulty: Difficulty,
    /// Battlefield layout.
    pub map: MapKind,
    /// Seed of the match's random number generator.
    pub seed: u64,
    /// Tuning tables.
    pub balance: Balance,
}

impl MatchConfig {
    fn starting_economy(&self) -> Economy {
        let rules = &self.balance.economy;
        Economy {
            money: rules.starting_money.get(self.difficulty),
            lives: rules.starting_lives.get(self.difficulty),
            score: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Scratch {
    spawns: Vec<SpawnOrder>,
    hits: Vec<Hit>,
    targets: Vec<usize>,
}

/// Represents the authoritative state of a single match.
#[derive(Debug)]
pub struct Match {
    config: MatchConfig,
    grid: TileGrid,
    routes: Vec<Route>,
    economy: Economy,
    status: MatchStatus,
    director: WaveDirector,
    enemies: Vec<Enemy>,
    next_enemy_id: u32,
    towers: TowerRegistry,
    projectiles: VecDeque<Projectile>,
    next_projectile_id: u32,
    selected_kind: TowerKind,
    selected_tower: Option<TowerId>,
    rng: ChaCha8Rng,
    scratch: Scratch,
}

impl Match {
    /// Creates a match on one of the built-in layouts.
    ///
    /// # Errors
    ///
    /// Propagates [`GridError`] if the layout fails to parse.
    pub fn new(config: MatchConfig) -> Result<Self, GridError> {
        let grid = maps::builtin(config.map)?;
        Ok(Self::with_grid(config, grid))
    }

    /// Creates a match on a custom tile grid.
    #[must_use]
    pub fn with_grid(config: MatchConfig, grid: TileGrid) -> Self {
        let routes = derive_routes(&grid);
        let economy = config.starting_economy();
        let director = WaveDirector::new(config.balance.waves.clone(), config.difficulty, 0);
        let status = if director.phase() == WavePhase::Victory {
            MatchStatus::Victory
        } else {
            MatchStatus::Running
        };
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Self {
            config,
            grid,
            routes,
            economy,
            status,
            director,
            enemies: Vec::new(),
            next_enemy_id: 0,
            towers: TowerRegistry::new(),
            projectiles: VecDeque::new(),
            next_projectile_id: 0,
            selected_kind: TowerKind::Sniper,
            selected_tower: None,
            rng,
            scratch: Scratch::default(),
        }
    }

    /// Builds a tower of `kind` on the spot containing `position`.
    ///
    /// The new tower becomes the selected tower.
    ///
    /// # Errors
    ///
    /// Fails without changing state if the match is over, the position is not
    /// a free tower spot, or the player cannot afford the tower.
    pub fn place_tower(&mut self, kind: TowerKind, position: Vec2) -> Result<TowerId, PlacementError> {
        if self.status.is_terminal() {
            return Err(PlacementError::MatchOver);
        }
        let cell = self.spot_at(position)?;
        let stats = self.config.balance.tower(kind);
        if self.economy.money < stats.cost {
            return Err(PlacementError::InsufficientFunds {
                required: stats.cost,
                available: self.economy.money,
            });
        }

        self.economy.money -= stats.cost;
        let center = self.grid.cell_center(cell);
        let rules = &self.config.balance.combat;
        let id = self
            .towers
            .insert_with(cell, |id| Tower::new(id, stats, center, rules));
        self.selected_tower = Some(id);
        Ok(id)
    }

    /// Upgrades a tower, returning the money paid.
    ///
    /// # Errors
    ///
    /// Fails without changing state if the match is over, the tower does not
    /// exist, it is at its highest level, or the player cannot afford it.
    pub fn upgrade_tower(&mut self, tower: TowerId) -> Result<u32, UpgradeError> {
        if self.status.is_terminal() {
            return Err(UpgradeError::MatchOver);
        }
        let rules = &self.config.balance.combat;
        let entry = self.towers.get_mut(tower).ok_or(UpgradeError::MissingTower)?;
        let preview = entry
            .upgrade_preview(rules)
            .ok_or(UpgradeError::MaxLevelReached)?;
        if self.economy.money < preview.cost {
            return Err(UpgradeError::InsufficientFunds {
                required: preview.cost,
                available: self.economy.money,
            });
        }

        self.economy.money -= preview.cost;
        Ok(entry.upgrade(rules))
    }

    /// Returns the match to its starting state on the same map and seed.
    ///
    /// Towers, enemies, projectiles and pending spawns are discarded.
    pub fn restart(&mut self) {
        let config = &self.config;
        self.economy = config.starting_economy();
        self.director.reset();
        self.status = if self.director.phase() == WavePhase::Victory {
            MatchStatus::Victory
        } else {
            MatchStatus::Running
        };
        self.enemies.clear();
        self.next_enemy_id = 0;
        self.towers = TowerRegistry::new();
        self.projectiles.clear();
        self.next_projectile_id = 0;
        self.selected_kind = TowerKind::Sniper;
        self.selected_tower = None;
        self.rng = ChaCha8Rng::seed_from_u64(config.seed);
        log::info!("restarted match on {}", config.map);
    }

    fn spot_at(&self, position: Vec2) -> Result<CellCoord, PlacementError> {
        let cell = self
            .grid
            .cell_at(position)
            .filter(|cell| self.grid.kind(*cell) == Some(CellKind::TowerSpot))
            .ok_or(PlacementError::InvalidSpot)?;
        if self.towers.is_occupied(cell) {
            return Err(PlacementError::OccupiedSpot);
        }
        Ok(cell)
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        let seconds = dt.as_secs_f32();

        self.release_spawns(dt, out_events);
        if self.advance_enemies(seconds, out_events) {
            return;
        }

        self.scratch.hits.clear();
        self.advance_towers(seconds, out_events);
        self.advance_projectiles(seconds);
        self.credit_hits(out_events);
        self.enemies.retain(Enemy::is_on_field);

        self.director.reconcile(self.enemies.len(), out_events);
        if self.director.phase() == WavePhase::Victory {
            self.status = MatchStatus::Victory;
            log::info!("victory with score {}", self.economy.score);
            out_events.push(Event::Victory {
                score: self.economy.score,
            });
        }
    }

    fn release_spawns(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut spawns = std::mem::take(&mut self.scratch.spawns);
        spawns.clear();
        self.director
            .advance(dt, &mut self.rng, &mut spawns, out_events);
        for order in spawns.drain(..) {
            self.spawn_enemy(order, out_events);
        }
        self.scratch.spawns = spawns;
    }

    fn spawn_enemy(&mut self, order: SpawnOrder, out_events: &mut Vec<Event>) {
        let route = if self.routes.len() > 1 {
            self.rng.gen_range(0..self.routes.len())
        } else {
            0
        };
        let Some(start) = self.routes.get(route).map(Route::start) else {
            return;
        };

        let balance = &self.config.balance;
        let stats = balance.enemy(order.kind);
        let multiplier = balance
            .economy
            .health_multiplier
            .get(self.config.difficulty);
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id += 1;
        self.enemies
            .push(Enemy::spawn(id, &stats, order.wave, multiplier, route, start));

        out_events.push(Event::EnemySpawned {
            enemy: id,
            kind: order.kind,
            route,
        });
        if order.kind.is_boss() {
            out_events.push(Event::BossSpawned {
                enemy: id,
                kind: order.kind,
            });
        }
    }

    /// Moves every enemy and handles escapes. Returns `true` on game over.
    fn advance_enemies(&mut self, seconds: f32, out_events: &mut Vec<Event>) -> bool {
        let epsilon = self.config.balance.combat.arrival_epsilon;
        let lives_lost = self.config.balance.economy.lives_per_escape;

        for enemy in &mut self.enemies {
            let waypoints = self
                .routes
                .get(enemy.route)
                .map_or(&[][..], Route::waypoints);
            enemy.advance(seconds, waypoints, epsilon);
            if enemy.is_on_field() && enemy.has_reached_end(waypoints.len()) {
                enemy.escape();
                self.economy.lives = self.economy.lives.saturating_sub(lives_lost);
                out_events.push(Event::EnemyEscaped {
                    enemy: enemy.id,
                    kind: enemy.kind,
                    lives_lost,
                });
            }
        }

        if self.economy.lives > 0 {
            return false;
        }

        self.status = MatchStatus::GameOver;
        self.enemies.retain(Enemy::is_on_field);
        log::info!("game over with score {}", self.economy.score);
        out_events.push(Event::GameOver {
            score: self.economy.score,
        });
        true
    }

    fn advance_towers(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        for tower in self.towers.iter_mut() {
            tower.fire_timer += seconds;

            if let Ability::ArcFalloff {
                max_targets,
                reduction,
            } = tower.ability()
            {
                if !tower.can_attack() {
                    continue;
                }
                let max_targets = usize::try_from(max_targets).unwrap_or(usize::MAX);
                combat::select_targets(
                    tower.position(),
                    tower.range(),
                    max_targets,
                    self.enemies.as_slice(),
                    &mut self.scratch.targets,
                );
                let Some(&first) = self.scratch.targets.first() else {
                    continue;
                };
                tower.target = Some(self.enemies[first].id);
                combat::strike_arc(
                    tower.damage(),
                    reduction,
                    &self.scratch.targets,
                    self.enemies.as_mut_slice(),
                    &mut self.rng,
                    &mut self.scratch.hits,
                );
                tower.fire_timer = 0.0;
                out_events.push(Event::TowerFired {
                    tower: tower.id(),
                    kind: tower.kind(),
                    projectiles: 0,
                });
                continue;
            }

            let tracked = tower
                .target
                .and_then(|id| enemies::index_of(&self.enemies, id))
                .filter(|&index| {
                    let enemy = &self.enemies[index];
                    enemy.is_alive()
                        && enemy.position().distance(tower.position()) <= tower.range()
                });
            let target = tracked
                .or_else(|| combat::select_target(tower.position(), tower.range(), self.enemies.as_slice()));
            tower.target = target.map(|index| self.enemies[index].id);

            let Some(index) = target else {
                continue;
            };
            if !tower.can_attack() {
                continue;
            }

            let ability = tower.ability();
            let enemy = &self.enemies[index];
            let volley = ability.projectiles_per_attack();
            for _ in 0..volley {
                let (damage, critical) = match ability {
                    Ability::CriticalStrike { chance, multiplier } => {
                        combat::roll_critical(tower.damage(), chance, multiplier, &mut self.rng)
                    }
                    _ => (tower.damage(), false),
                };
                let effect = match ability {
                    Ability::Splash { radius, percent } => Effect::Splash { radius, percent },
                    Ability::Chain {
                        targets,
                        reduction,
                        range,
                    } => Effect::Chain {
                        targets,
                        reduction,
                        range,
                    },
                    _ => Effect::None,
                };

                let id = ProjectileId::new(self.next_projectile_id);
                self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
                self.projectiles.push_back(Projectile::launch(
                    id,
                    tower.kind(),
                    tower.position(),
                    enemy.id,
                    enemy.position(),
                    tower.projectile_speed(),
                    ability.homing(),
                    Strike {
                        damage,
                        critical,
                        effect,
                    },
                ));
            }

            tower.fire_timer = 0.0;
            out_events.push(Event::TowerFired {
                tower: tower.id(),
                kind: tower.kind(),
                projectiles: volley,
            });
        }
    }

    fn advance_projectiles(&mut self, seconds: f32) {
        let rules = &self.config.balance.combat;
        let grid = &self.grid;
        let roster = &mut self.enemies;
        let rng = &mut self.rng;
        let hits = &mut self.scratch.hits;

        self.projectiles.retain_mut(|projectile| {
            if let Some(id) = projectile.target {
                let alive = enemies::index_of(roster.as_slice(), id)
                    .is_some_and(|index| roster[index].is_alive());
                if !alive {
                    let replacement = combat::nearest_alive(projectile.position, roster.as_slice())
                        .map(|index| (roster[index].id, roster[index].position()));
                    projectile.retarget(replacement);
                }
            }

            let target_position = projectile
                .target
                .and_then(|id| enemies::index_of(roster.as_slice(), id))
                .map(|index| roster[index].position());
            projectile.advance(seconds, target_position, rules.reference_frame_rate);

            let impact = combat::find_impact(
                projectile.position,
                rules.projectile_radius,
                roster.as_slice(),
            );
            if let Some(primary) = impact {
                combat::resolve_impact(
                    projectile.position,
                    &projectile.strike,
                    primary,
                    roster.as_mut_slice(),
                    &mut *rng,
                    &mut *hits,
                );
                return false;
            }

            grid.contains_with_margin(projectile.position, rules.field_margin)
        });

        if self.projectiles.len() > rules.projectile_cap {
            let excess = self.projectiles.len() - rules.projectile_trim;
            let _ = self.projectiles.drain(..excess);
        }
    }

    fn credit_hits(&mut self, out_events: &mut Vec<Event>) {
        let score_per_bounty = self.config.balance.economy.score_per_bounty;

        for hit in self.scratch.hits.drain(..) {
            if hit.outcome.evaded {
                out_events.push(Event::HitEvaded { enemy: hit.enemy });
                continue;
            }
            if hit.outcome.critical {
                out_events.push(Event::CriticalHit {
                    enemy: hit.enemy,
                    position: hit.position,
                });
            }
            if !hit.outcome.killed {
                continue;
            }
            let Some(index) = enemies::index_of(&self.enemies, hit.enemy) else {
                continue;
            };
            let enemy = &self.enemies[index];
            self.economy.money = self.economy.money.saturating_add(enemy.bounty);
            self.economy.score = self
                .economy
                .score
                .saturating_add(u64::from(enemy.bounty) * score_per_bounty);
            out_events.push(Event::EnemyKilled {
                enemy: enemy.id,
                kind: enemy.kind,
                bounty: enemy.bounty,
            });
        }
    }
}

/// Applies the provided command to the match, mutating state deterministically.
///
/// Commands that cannot be honoured leave the state untouched and report a
/// rejection event. Once the match is over, ticks are ignored.
pub fn apply(game: &mut Match, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SelectTowerKind { kind } => {
            game.selected_kind = kind;
            out_events.push(Event::TowerKindSelected { kind });
        }
        Command::PlaceTower { position } => {
            let kind = game.selected_kind;
            match game.place_tower(kind, position) {
                Ok(tower) => {
                    let center = game.towers.get(tower).map_or(position, Tower::position);
                    out_events.push(Event::TowerPlaced {
                        tower,
                        kind,
                        position: center,
                        cost: game.config.balance.tower(kind).cost,
                    });
                }
                Err(reason) => {
                    log::debug!("rejected {kind} placement at {position}: {reason}");
                    out_events.push(Event::TowerPlacementRejected {
                        kind,
                        position,
                        reason,
                    });
                }
            }
        }
        Command::SelectTower { tower } => {
            if game.towers.get(tower).is_some() {
                game.selected_tower = Some(tower);
                out_events.push(Event::TowerSelected { tower });
            } else {
                log::debug!("ignored selection of unknown tower {}", tower.get());
            }
        }
        Command::UpgradeSelectedTower => {
            let selected = game.selected_tower;
            let result = selected
                .ok_or(UpgradeError::MissingTower)
                .and_then(|tower| game.upgrade_tower(tower).map(|cost| (tower, cost)));
            match result {
                Ok((tower, cost)) => {
                    let level = game.towers.get(tower).map_or(0, Tower::level);
                    out_events.push(Event::TowerUpgraded { tower, level, cost });
                }
                Err(reason) => {
                    log::debug!("rejected upgrade: {reason}");
                    out_events.push(Event::TowerUpgradeRejected {
                        tower: selected,
                        reason,
                    });
                }
            }
        }
        Command::StartWaveNow => {
            let result = if game.status.is_terminal() {
                Err(StartWaveError::MatchOver)
            } else {
                game.director.start_wave_now(&mut game.rng, out_events)
            };
            if let Err(reason) = result {
                log::debug!("rejected wave start: {reason}");
                out_events.push(Event::WaveStartRejected { reason });
            }
        }
        Command::Pause => {
            if game.status == MatchStatus::Running {
                game.status = MatchStatus::Paused;
                out_events.push(Event::Paused);
            }
        }
        Command::Resume => {
            if game.status == MatchStatus::Paused {
                game.status = MatchStatus::Running;
                out_events.push(Event::Resumed);
            }
        }
        Command::Restart => {
            game.restart();
            out_events.push(Event::Restarted);
        }
        Command::Tick { dt } => {
            if game.status == MatchStatus::Running {
                game.tick(dt, out_events);
            }
        }
    }
}

/// Query functions that provide read-only access to the match state.
pub mod query {
    use super::{Match, Tower, UpgradePreview};
    use tower_siege_core::{
        Balance, Difficulty, Economy, EnemyView, HighScore, MapKind, MatchStatus, ProjectileView,
        TowerId, TowerKind, TowerView, Vec2, WaveStatus,
    };
    use tower_siege_system_pathfinding::{Route, TileGrid};

    /// Money, lives and score.
    #[must_use]
    pub fn economy(game: &Match) -> Economy {
        game.economy
    }

    /// Overall match status.
    #[must_use]
    pub fn status(game: &Match) -> MatchStatus {
        game.status
    }

    /// Difficulty the match was created with.
    #[must_use]
    pub fn difficulty(game: &Match) -> Difficulty {
        game.config.difficulty
    }

    /// Layout the match is played on.
    #[must_use]
    pub fn map(game: &Match) -> MapKind {
        game.config.map
    }

    /// Tuning tables in effect.
    #[must_use]
    pub fn balance(game: &Match) -> &Balance {
        &game.config.balance
    }

    /// Tile grid of the battlefield.
    #[must_use]
    pub fn tile_grid(game: &Match) -> &TileGrid {
        &game.grid
    }

    /// Routes enemies follow, one per start tile.
    #[must_use]
    pub fn routes(game: &Match) -> &[Route] {
        &game.routes
    }

    /// World-space centres of every buildable spot, in row-major order.
    #[must_use]
    pub fn tower_spots(game: &Match) -> Vec<Vec2> {
        game.grid
            .tower_spots()
            .into_iter()
            .map(|cell| game.grid.cell_center(cell))
            .collect()
    }

    /// Progress of the wave director.
    #[must_use]
    pub fn wave_status(game: &Match) -> WaveStatus {
        game.director.status()
    }

    /// Archetype used by the next placement.
    #[must_use]
    pub fn selected_kind(game: &Match) -> TowerKind {
        game.selected_kind
    }

    /// Tower targeted by upgrade commands.
    #[must_use]
    pub fn selected_tower(game: &Match) -> Option<TowerId> {
        game.selected_tower
    }

    /// Read-only access to a single tower.
    #[must_use]
    pub fn tower(game: &Match, tower: TowerId) -> Option<&Tower> {
        game.towers.get(tower)
    }

    /// Stats and cost of a tower's next upgrade.
    #[must_use]
    pub fn upgrade_preview(game: &Match, tower: TowerId) -> Option<UpgradePreview> {
        game.towers
            .get(tower)
            .and_then(|entry| entry.upgrade_preview(&game.config.balance.combat))
    }

    /// Captures a read-only view of the enemies on the field.
    #[must_use]
    pub fn enemy_view(game: &Match) -> EnemyView {
        EnemyView::from_snapshots(game.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(game: &Match) -> TowerView {
        let rules = &game.config.balance.combat;
        TowerView::from_snapshots(game.towers.iter().map(|tower| tower.snapshot(rules)).collect())
    }

    /// Captures a read-only view of the projectiles in flight.
    #[must_use]
    pub fn projectile_view(game: &Match) -> ProjectileView {
        ProjectileView::from_snapshots(
            game.projectiles
                .iter()
                .map(|projectile| projectile.snapshot())
                .collect(),
        )
    }

    /// High score record for a won match, `None` before victory.
    #[must_use]
    pub fn high_score(game: &Match, name: &str, timestamp: u64) -> Option<HighScore> {
        (game.status == MatchStatus::Victory).then(|| HighScore {
            name: name.to_owned(),
            score: game.economy.score,
            wave: game.director.started(),
            difficulty: game.config.difficulty.as_str().to_owned(),
            map: game.config.map.as_str().to_owned(),
            timestamp,
        })
    }
}
