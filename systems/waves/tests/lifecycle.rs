use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tower_siege_core::{Balance, Difficulty, EnemyKind, Event, StartWaveError, WavePhase};
use tower_siege_system_waves::{SpawnOrder, WaveDirector};

fn drain_wave(
    director: &mut WaveDirector,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<Event>,
) -> Vec<SpawnOrder> {
    let mut spawns = Vec::new();
    while director.phase() == WavePhase::Spawning {
        director.advance(Duration::from_millis(250), rng, &mut spawns, events);
    }
    spawns
}

#[test]
fn every_wave_schedules_exactly_its_scaled_count() {
    let balance = Balance::default();
    for difficulty in Difficulty::ALL {
        let mut director = WaveDirector::new(balance.waves.clone(), difficulty, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut events = Vec::new();

        for number in 1..=director.total_waves() {
            let expected: u32 = director
                .composition(number)
                .iter()
                .map(|entry| entry.count)
                .sum();

            assert_eq!(director.start_wave_now(&mut rng, &mut events), Ok(number));
            let spawns = drain_wave(&mut director, &mut rng, &mut events);
            assert_eq!(spawns.len() as u32, expected, "{difficulty} wave {number}");
            assert_eq!(director.status().scheduled, expected);

            director.reconcile(0, &mut events);
            assert!(events.contains(&Event::WaveCleared { wave: number }));
        }

        assert_eq!(director.phase(), WavePhase::Victory);
        assert_eq!(
            director.start_wave_now(&mut rng, &mut events),
            Err(StartWaveError::NoWavesRemaining)
        );
    }
}

#[test]
fn wave_clears_only_after_all_spawned_and_field_empty() {
    let balance = Balance::default();
    let mut director = WaveDirector::new(balance.waves.clone(), Difficulty::Easy, 0);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut events = Vec::new();
    let mut spawns = Vec::new();

    assert_eq!(director.start_wave_now(&mut rng, &mut events), Ok(1));
    director.advance(Duration::ZERO, &mut rng, &mut spawns, &mut events);
    assert_eq!(spawns.len(), 1);

    director.reconcile(0, &mut events);
    assert_eq!(director.phase(), WavePhase::Spawning);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::WaveCleared { .. })));

    let rest = drain_wave(&mut director, &mut rng, &mut events);
    assert_eq!(spawns.len() + rest.len(), 12);
    assert_eq!(director.phase(), WavePhase::Active);

    director.reconcile(3, &mut events);
    assert_eq!(director.phase(), WavePhase::Active);

    director.reconcile(0, &mut events);
    assert!(events.contains(&Event::WaveCleared { wave: 1 }));
    assert!(events.contains(&Event::CountdownStarted {
        wave: 2,
        delay: Duration::from_secs(15)
    }));
}

#[test]
fn shuffle_is_a_seeded_permutation() {
    let balance = Balance::default();
    let roster = |seed| {
        let mut director = WaveDirector::new(balance.waves.clone(), Difficulty::Normal, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut events = Vec::new();
        let _ = director.start_wave_now(&mut rng, &mut events);
        drain_wave(&mut director, &mut rng, &mut events)
            .into_iter()
            .map(|order| order.kind)
            .collect::<Vec<EnemyKind>>()
    };

    let first = roster(42);
    assert_eq!(first, roster(42));

    let mut sorted = first.clone();
    sorted.sort();
    let mut other = roster(43);
    other.sort();
    assert_eq!(sorted, other);
}
