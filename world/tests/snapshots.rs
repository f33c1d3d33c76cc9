use std::time::Duration;

use tower_siege_core::{
    Balance, Command, Difficulty, EnemyKind, Event, MapKind, MatchStatus, SaveSnapshot, TowerKind,
    TowerRecord, WaveEntry, WavePhase, WaveSpec,
};
use tower_siege_world::{apply, query, Match, MatchConfig};

fn rich_config() -> MatchConfig {
    let mut balance = Balance::default();
    balance.economy.starting_money.hard = 10_000;
    MatchConfig {
        difficulty: Difficulty::Hard,
        map: MapKind::Hell,
        seed: 21,
        balance,
    }
}

#[test]
fn reloaded_towers_match_the_originals() {
    let mut game = Match::new(rich_config()).expect("hell parses");
    let spots = query::tower_spots(&game);
    for (index, kind) in TowerKind::ALL.into_iter().enumerate() {
        let tower = game.place_tower(kind, spots[index]).expect("placement succeeds");
        for _ in 0..index.min(3) {
            let _ = game.upgrade_tower(tower).expect("upgrade succeeds");
        }
    }

    let snapshot = game.save_snapshot();
    let json = serde_json::to_string(&snapshot).expect("snapshot serialises");
    let decoded: SaveSnapshot = serde_json::from_str(&json).expect("snapshot parses");
    let (restored, report) =
        Match::from_snapshot(&decoded, 21, rich_config().balance).expect("snapshot loads");

    assert!(report.is_clean());
    assert_eq!(query::economy(&restored), query::economy(&game));
    assert_eq!(query::difficulty(&restored), Difficulty::Hard);
    assert_eq!(query::map(&restored), MapKind::Hell);
    assert_eq!(
        query::tower_view(&restored).into_vec(),
        query::tower_view(&game).into_vec()
    );
    assert_eq!(restored.save_snapshot(), snapshot);
}

#[test]
fn invalid_tower_entries_are_skipped() {
    let game = Match::new(rich_config()).expect("hell parses");
    let spot = query::tower_spots(&game)[0];
    let record = |archetype: &str, x: f32, y: f32, level: u32| TowerRecord {
        archetype: archetype.to_owned(),
        x,
        y,
        level,
    };

    let snapshot = SaveSnapshot {
        money: 75,
        lives: 10,
        score: 900,
        wave: 3,
        difficulty: "hard".to_owned(),
        map_type: "hell".to_owned(),
        towers: vec![
            record("tesla", spot.x, spot.y, 2),
            record("tesla", spot.x, spot.y, 1),
            record("catapult", spot.x, spot.y, 1),
            record("laser", -500.0, 20.0, 1),
            record("sniper", spot.x, spot.y, 9),
        ],
    };
    let (restored, report) =
        Match::from_snapshot(&snapshot, 0, Balance::default()).expect("snapshot loads");

    let fields: Vec<&str> = report.skipped.iter().map(|skip| skip.field).collect();
    assert_eq!(
        fields,
        [
            "towers.position",
            "towers.archetype",
            "towers.position",
            "towers.level"
        ]
    );
    let towers = query::tower_view(&restored).into_vec();
    assert_eq!(towers.len(), 1);
    assert_eq!(towers[0].kind, TowerKind::Tesla);
    assert_eq!(towers[0].level, 2);
    assert_eq!(query::economy(&restored).money, 75);
    assert_eq!(query::wave_status(&restored).started, 3);
}

#[test]
fn exhausted_lives_restore_as_game_over() {
    let snapshot = SaveSnapshot {
        money: 0,
        lives: 0,
        score: 10,
        wave: 5,
        difficulty: "normal".to_owned(),
        map_type: "cyber".to_owned(),
        towers: Vec::new(),
    };
    let (restored, _) =
        Match::from_snapshot(&snapshot, 0, Balance::default()).expect("snapshot loads");
    assert_eq!(query::status(&restored), MatchStatus::GameOver);
}

#[test]
fn saving_during_the_final_wave_replays_it_on_load() {
    let mut balance = Balance::default();
    balance.waves.table = vec![WaveSpec {
        counts: vec![WaveEntry {
            kind: EnemyKind::Knight,
            count: 5,
        }],
    }];
    let config = MatchConfig {
        balance: balance.clone(),
        ..MatchConfig::default()
    };
    let mut game = Match::new(config).expect("forest parses");

    let mut events = Vec::new();
    apply(&mut game, Command::StartWaveNow, &mut events);
    for _ in 0..60 {
        apply(&mut game, Command::Tick { dt: Duration::from_millis(16) }, &mut events);
    }
    assert_eq!(query::wave_status(&game).phase, WavePhase::Spawning);
    assert!(!query::enemy_view(&game).is_empty());

    let snapshot = game.save_snapshot();
    assert_eq!(snapshot.wave, 0);

    let (mut restored, report) =
        Match::from_snapshot(&snapshot, 0, balance).expect("snapshot loads");
    assert!(report.is_clean());
    assert_eq!(query::status(&restored), MatchStatus::Running);
    assert_eq!(query::wave_status(&restored).started, 0);
    assert!(query::high_score(&restored, "ada", 0).is_none());

    events.clear();
    apply(&mut restored, Command::StartWaveNow, &mut events);
    assert!(events.contains(&Event::WaveStarted {
        wave: 1,
        enemies: 5
    }));
}
