use std::time::Duration;

use tower_siege_core::{
    AbilitySpec, Balance, Command, Difficulty, Event, MapKind, MatchStatus, PlacementError,
    TowerKind, UpgradeError, Vec2, WavePhase,
};
use tower_siege_system_pathfinding::TileGrid;
use tower_siege_world::{apply, query, Match, MatchConfig};

const FRAME: Duration = Duration::from_micros(16_667);

fn config(difficulty: Difficulty, map: MapKind, balance: Balance) -> MatchConfig {
    MatchConfig {
        difficulty,
        map,
        seed: 7,
        balance,
    }
}

fn place(game: &mut Match, kind: TowerKind, position: Vec2) -> Vec<Event> {
    let mut events = Vec::new();
    apply(game, Command::SelectTowerKind { kind }, &mut events);
    apply(game, Command::PlaceTower { position }, &mut events);
    events
}

fn tick_until<F>(game: &mut Match, limit: usize, events: &mut Vec<Event>, mut done: F)
where
    F: FnMut(&[Event]) -> bool,
{
    for _ in 0..limit {
        apply(game, Command::Tick { dt: FRAME }, events);
        if done(events) {
            return;
        }
    }
    panic!("condition not reached within {limit} ticks");
}

#[test]
fn easy_first_wave_is_cleared_by_overwhelming_towers() {
    let mut balance = Balance::default();
    for stats in &mut balance.towers {
        if stats.kind == TowerKind::Tesla {
            stats.cost = 0;
            stats.base_damage = 1.0e6;
            stats.base_range = 5000.0;
            stats.base_fire_rate = 30.0;
        }
    }
    let mut game = Match::new(config(Difficulty::Easy, MapKind::Forest, balance))
        .expect("forest parses");
    let spots = query::tower_spots(&game);

    let events = place(&mut game, TowerKind::Sniper, spots[0]);
    assert!(matches!(
        events.last(),
        Some(Event::TowerPlaced {
            kind: TowerKind::Sniper,
            cost: 120,
            ..
        })
    ));
    assert_eq!(query::economy(&game).money, 380);

    let _ = place(&mut game, TowerKind::Tesla, spots[1]);
    assert_eq!(query::economy(&game).money, 380);

    let mut events = Vec::new();
    apply(&mut game, Command::StartWaveNow, &mut events);
    assert!(events.contains(&Event::WaveStarted {
        wave: 1,
        enemies: 12
    }));

    tick_until(&mut game, 60 * 60, &mut events, |events| {
        events.contains(&Event::WaveCleared { wave: 1 })
    });

    let kills = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyKilled { bounty: 9, .. }))
        .count();
    assert_eq!(kills, 12);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemyEscaped { .. })));

    let economy = query::economy(&game);
    assert_eq!(economy.money, 380 + 108);
    assert_eq!(economy.score, 1080);
    assert_eq!(economy.lives, 30);
    assert!(query::enemy_view(&game).is_empty());
    assert!(matches!(
        query::wave_status(&game).phase,
        WavePhase::Countdown { .. }
    ));
}

#[test]
fn easy_first_wave_is_cleared_by_projectiles_alone() {
    let mut balance = Balance::default();
    for stats in &mut balance.towers {
        if stats.kind == TowerKind::Rocket {
            stats.cost = 0;
            stats.base_damage = 1.0e6;
            stats.base_range = 5000.0;
            stats.base_fire_rate = 4.0;
            stats.ability = AbilitySpec::HomingSalvo {
                missiles: 1,
                missiles_per_level: 0,
                homing: 1.0,
                homing_per_level: 0.0,
                unlock_level: 2,
            };
        }
    }
    let mut game = Match::new(config(Difficulty::Easy, MapKind::Forest, balance))
        .expect("forest parses");
    let spots = query::tower_spots(&game);

    let _ = place(&mut game, TowerKind::Sniper, spots[0]);
    let _ = place(&mut game, TowerKind::Rocket, spots[1]);
    assert_eq!(query::economy(&game).money, 380);

    let mut events = Vec::new();
    apply(&mut game, Command::StartWaveNow, &mut events);
    tick_until(&mut game, 60 * 60, &mut events, |events| {
        events.contains(&Event::WaveCleared { wave: 1 })
    });

    let volleys: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::TowerFired { projectiles, .. } => Some(*projectiles),
            _ => None,
        })
        .collect();
    assert!(!volleys.is_empty());
    assert!(volleys.iter().all(|&count| count >= 1));

    let kills = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyKilled { bounty: 9, .. }))
        .count();
    assert_eq!(kills, 12);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemyEscaped { .. })));

    let economy = query::economy(&game);
    assert_eq!(economy.money, 380 + 12 * 9);
    assert_eq!(economy.score, 12 * 90);
    assert_eq!(economy.lives, 30);
    assert!(query::enemy_view(&game).is_empty());
}

#[test]
fn restart_discards_progress_and_pending_spawns() {
    let mut game = Match::new(config(Difficulty::Easy, MapKind::Forest, Balance::default()))
        .expect("forest parses");
    let spot = query::tower_spots(&game)[0];
    let _ = place(&mut game, TowerKind::Sniper, spot);

    let mut events = Vec::new();
    apply(&mut game, Command::StartWaveNow, &mut events);
    for _ in 0..120 {
        apply(&mut game, Command::Tick { dt: FRAME }, &mut events);
    }
    assert!(!query::enemy_view(&game).is_empty());

    events.clear();
    apply(&mut game, Command::Restart, &mut events);
    assert_eq!(events, vec![Event::Restarted]);
    assert_eq!(query::economy(&game).money, 500);
    assert_eq!(query::economy(&game).lives, 30);
    assert_eq!(query::status(&game), MatchStatus::Running);
    assert_eq!(query::wave_status(&game).started, 0);
    assert_eq!(query::wave_status(&game).phase, WavePhase::Idle);
    assert!(query::enemy_view(&game).is_empty());
    assert_eq!(query::tower_view(&game).iter().count(), 0);
    assert_eq!(query::selected_tower(&game), None);

    events.clear();
    for _ in 0..60 * 5 {
        apply(&mut game, Command::Tick { dt: FRAME }, &mut events);
    }
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemySpawned { .. })));
    assert!(matches!(
        query::wave_status(&game).phase,
        WavePhase::Countdown { .. }
    ));
    assert_eq!(game.place_tower(TowerKind::Sniper, spot).map(|_| ()), Ok(()));
}

#[test]
fn hard_match_ends_after_three_escapes() {
    let grid = TileGrid::parse("S # # # # E\nT T T T T T\n", 64.0).expect("corridor parses");
    let mut game = Match::with_grid(
        config(Difficulty::Hard, MapKind::Forest, Balance::default()),
        grid,
    );
    assert_eq!(query::economy(&game).lives, 15);

    let mut events = Vec::new();
    apply(&mut game, Command::StartWaveNow, &mut events);
    tick_until(&mut game, 60 * 60, &mut events, |events| {
        events.iter().any(|event| matches!(event, Event::GameOver { .. }))
    });

    let escapes = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyEscaped { lives_lost: 5, .. }))
        .count();
    assert_eq!(escapes, 3);
    assert_eq!(query::economy(&game).lives, 0);
    assert_eq!(query::status(&game), MatchStatus::GameOver);

    let before = query::enemy_view(&game).into_vec();
    let mut after = Vec::new();
    apply(&mut game, Command::Tick { dt: FRAME }, &mut after);
    assert!(after.is_empty());
    assert_eq!(query::enemy_view(&game).into_vec(), before);

    let spot = query::tower_spots(&game)[0];
    assert_eq!(
        game.place_tower(TowerKind::Sniper, spot),
        Err(PlacementError::MatchOver)
    );
    assert!(query::high_score(&game, "ada", 0).is_none());
}

#[test]
fn placement_is_rejected_off_spot_when_occupied_or_unaffordable() {
    let mut game = Match::new(config(Difficulty::Hard, MapKind::City, Balance::default()))
        .expect("city parses");
    let spots = query::tower_spots(&game);
    let route_start = query::routes(&game)[0].start();

    assert_eq!(
        game.place_tower(TowerKind::Sniper, route_start),
        Err(PlacementError::InvalidSpot)
    );
    assert_eq!(
        game.place_tower(TowerKind::Sniper, Vec2::new(-10.0, -10.0)),
        Err(PlacementError::InvalidSpot)
    );

    let first = game
        .place_tower(TowerKind::Sniper, spots[0])
        .expect("hard starts with enough for a sniper");
    assert_eq!(
        game.place_tower(TowerKind::Sniper, spots[0]),
        Err(PlacementError::OccupiedSpot)
    );

    let money = query::economy(&game).money;
    let events = place(&mut game, TowerKind::Tesla, spots[1]);
    assert!(matches!(
        events.last(),
        Some(Event::TowerPlacementRejected {
            reason: PlacementError::InsufficientFunds { required: 300, .. },
            ..
        })
    ));
    assert_eq!(query::economy(&game).money, money);
    assert_eq!(query::tower_view(&game).iter().count(), 1);
    assert_eq!(query::selected_tower(&game), Some(first));
}

#[test]
fn upgrade_rejections_leave_money_untouched() {
    let mut balance = Balance::default();
    balance.economy.starting_money.normal = 2000;
    let mut game = Match::new(config(Difficulty::Normal, MapKind::Forest, balance))
        .expect("forest parses");

    let mut events = Vec::new();
    apply(&mut game, Command::UpgradeSelectedTower, &mut events);
    assert!(events.contains(&Event::TowerUpgradeRejected {
        tower: None,
        reason: UpgradeError::MissingTower
    }));

    let spot = query::tower_spots(&game)[0];
    let _ = place(&mut game, TowerKind::Sniper, spot);
    for _ in 0..3 {
        apply(&mut game, Command::UpgradeSelectedTower, &mut events);
    }
    let money = query::economy(&game).money;
    assert_eq!(money, 2000 - 120 - 128 - 205 - 328);

    events.clear();
    apply(&mut game, Command::UpgradeSelectedTower, &mut events);
    assert!(matches!(
        events.as_slice(),
        [Event::TowerUpgradeRejected {
            reason: UpgradeError::MaxLevelReached,
            ..
        }]
    ));
    assert_eq!(query::economy(&game).money, money);
}

#[test]
fn pause_freezes_time_and_resume_restores_it() {
    let mut game = Match::new(MatchConfig::default()).expect("forest parses");
    let mut events = Vec::new();
    apply(&mut game, Command::StartWaveNow, &mut events);
    apply(&mut game, Command::Pause, &mut events);
    assert_eq!(query::status(&game), MatchStatus::Paused);

    events.clear();
    for _ in 0..120 {
        apply(&mut game, Command::Tick { dt: FRAME }, &mut events);
    }
    assert!(events.is_empty());
    assert_eq!(query::wave_status(&game).spawned, 0);

    apply(&mut game, Command::Resume, &mut events);
    apply(&mut game, Command::Tick { dt: FRAME }, &mut events);
    assert_eq!(events.first(), Some(&Event::Resumed));
    assert_eq!(query::wave_status(&game).spawned, 1);
}

#[test]
fn identical_scripts_replay_identically() {
    let run = || {
        let mut balance = Balance::default();
        balance.economy.starting_money.normal = 5000;
        let mut game = Match::new(config(Difficulty::Normal, MapKind::Hell, balance))
            .expect("hell parses");
        let spots = query::tower_spots(&game);
        let mut events = Vec::new();
        for (spot, kind) in spots.iter().zip(TowerKind::ALL) {
            events.extend(place(&mut game, kind, *spot));
            apply(&mut game, Command::UpgradeSelectedTower, &mut events);
        }
        apply(&mut game, Command::StartWaveNow, &mut events);
        for _ in 0..60 * 40 {
            apply(&mut game, Command::Tick { dt: FRAME }, &mut events);
        }
        (events, game.save_snapshot())
    };

    let (first_events, first_snapshot) = run();
    let (second_events, second_snapshot) = run();
    assert_eq!(first_events, second_events);
    assert_eq!(first_snapshot, second_snapshot);
    assert!(first_events
        .iter()
        .any(|event| matches!(event, Event::TowerFired { .. })));
}
