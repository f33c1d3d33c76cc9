#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave director that schedules enemy spawns and tracks the wave lifecycle.
//!
//! The director never touches enemies. It consumes elapsed time, emits
//! [`SpawnOrder`] values when scheduled spawns fall due, and learns how many
//! enemies remain on the field through [`WaveDirector::reconcile`]. Pending
//! spawns live in a min-heap keyed by their absolute release time, so
//! scheduling is deterministic and independent of the caller's frame rate.

use std::{cmp::Reverse, collections::BinaryHeap, time::Duration};

use rand::{seq::SliceRandom, Rng};
use tower_siege_core::{
    Difficulty, EnemyKind, Event, StartWaveError, WaveEntry, WavePhase, WaveRules, WaveStatus,
};

/// Request to create one enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnOrder {
    /// Archetype to create.
    pub kind: EnemyKind,
    /// One-based number of the wave the enemy belongs to.
    pub wave: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledSpawn {
    fire_at: Duration,
    sequence: u64,
    kind: EnemyKind,
}

/// State machine driving wave composition, spawn timing and auto-start.
#[derive(Debug)]
pub struct WaveDirector {
    rules: WaveRules,
    difficulty: Difficulty,
    phase: WavePhase,
    started: u32,
    elapsed: Duration,
    schedule: BinaryHeap<Reverse<ScheduledSpawn>>,
    sequence: u64,
    spawned: u32,
    scheduled: u32,
}

impl WaveDirector {
    /// Creates a director for a match that has already started `started` waves.
    #[must_use]
    pub fn new(rules: WaveRules, difficulty: Difficulty, started: u32) -> Self {
        let mut director = Self {
            rules,
            difficulty,
            phase: WavePhase::Idle,
            started: 0,
            elapsed: Duration::ZERO,
            schedule: BinaryHeap::new(),
            sequence: 0,
            spawned: 0,
            scheduled: 0,
        };
        director.started = started.min(director.total_waves());
        if director.started >= director.total_waves() {
            director.phase = WavePhase::Victory;
        }
        director
    }

    /// Number of waves in the table.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        u32::try_from(self.rules.table.len()).unwrap_or(u32::MAX)
    }

    /// Number of waves started so far.
    #[must_use]
    pub const fn started(&self) -> u32 {
        self.started
    }

    /// Number of waves whose enemies have all spawned and left the field.
    #[must_use]
    pub const fn cleared(&self) -> u32 {
        match self.phase {
            WavePhase::Spawning | WavePhase::Active => self.started.saturating_sub(1),
            _ => self.started,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Progress summary for read-only queries.
    #[must_use]
    pub fn status(&self) -> WaveStatus {
        WaveStatus {
            phase: self.phase,
            started: self.started,
            total: self.total_waves(),
            spawned: self.spawned,
            scheduled: self.scheduled,
        }
    }

    /// Difficulty-scaled composition of the one-based wave `number`.
    #[must_use]
    pub fn composition(&self, number: u32) -> Vec<WaveEntry> {
        if number == 0 {
            return Vec::new();
        }
        let index = usize::try_from(number - 1).unwrap_or(usize::MAX);
        self.rules
            .table
            .get(index)
            .map(|spec| spec.scaled(self.difficulty, &self.rules))
            .unwrap_or_default()
    }

    /// Advances the director clock, releasing spawns that fall due.
    ///
    /// A running countdown that expires starts the next wave; the first spawn
    /// of that wave is released in the same call.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt: Duration,
        rng: &mut R,
        out_spawns: &mut Vec<SpawnOrder>,
        out_events: &mut Vec<Event>,
    ) {
        self.elapsed = self.elapsed.saturating_add(dt);

        if let WavePhase::Countdown { remaining } = self.phase {
            if remaining <= dt {
                self.start_wave(rng, out_events);
            } else {
                self.phase = WavePhase::Countdown {
                    remaining: remaining - dt,
                };
            }
        }

        self.release_due(out_spawns);
    }

    /// Updates the lifecycle from the number of enemies still on the field.
    ///
    /// A fully spawned wave with an empty field is cleared, which leads to
    /// [`WavePhase::Victory`] after the last wave. An idle director with an
    /// empty field starts the auto-start countdown.
    pub fn reconcile(&mut self, live_enemies: usize, out_events: &mut Vec<Event>) {
        if self.phase == WavePhase::Active && self.spawned == self.scheduled && live_enemies == 0
        {
            log::info!("wave {} cleared", self.started);
            out_events.push(Event::WaveCleared { wave: self.started });
            self.phase = if self.started >= self.total_waves() {
                WavePhase::Victory
            } else {
                WavePhase::Idle
            };
        }

        if self.phase == WavePhase::Idle && live_enemies == 0 {
            let delay = self.rules.auto_start_delay();
            self.phase = WavePhase::Countdown { remaining: delay };
            out_events.push(Event::CountdownStarted {
                wave: self.started + 1,
                delay,
            });
        }
    }

    /// Starts the next wave immediately, preempting any countdown.
    ///
    /// Returns the one-based number of the started wave. Its spawns are
    /// released by the next [`WaveDirector::advance`].
    ///
    /// # Errors
    ///
    /// Fails while a wave is spawning or active, and once every wave has
    /// been started.
    pub fn start_wave_now<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) -> Result<u32, StartWaveError> {
        match self.phase {
            WavePhase::Idle | WavePhase::Countdown { .. } => {
                if self.started >= self.total_waves() {
                    return Err(StartWaveError::NoWavesRemaining);
                }
                self.start_wave(rng, out_events);
                Ok(self.started)
            }
            WavePhase::Spawning | WavePhase::Active => Err(StartWaveError::WaveInProgress),
            WavePhase::Victory => Err(StartWaveError::NoWavesRemaining),
        }
    }

    /// Drops every pending spawn and returns to the first wave.
    pub fn reset(&mut self) {
        self.schedule.clear();
        self.phase = if self.total_waves() == 0 {
            WavePhase::Victory
        } else {
            WavePhase::Idle
        };
        self.started = 0;
        self.elapsed = Duration::ZERO;
        self.sequence = 0;
        self.spawned = 0;
        self.scheduled = 0;
    }

    fn start_wave<R: Rng + ?Sized>(&mut self, rng: &mut R, out_events: &mut Vec<Event>) {
        let number = self.started + 1;
        let mut roster: Vec<EnemyKind> = self
            .composition(number)
            .into_iter()
            .flat_map(|entry| {
                std::iter::repeat(entry.kind).take(usize::try_from(entry.count).unwrap_or(0))
            })
            .collect();
        roster.shuffle(rng);

        let stride = self.rules.spawn_stride();
        for (offset, kind) in (0_u32..).zip(roster.iter().copied()) {
            self.schedule.push(Reverse(ScheduledSpawn {
                fire_at: self.elapsed.saturating_add(stride.saturating_mul(offset)),
                sequence: self.sequence,
                kind,
            }));
            self.sequence += 1;
        }

        self.started = number;
        self.spawned = 0;
        self.scheduled = u32::try_from(roster.len()).unwrap_or(u32::MAX);
        self.phase = if roster.is_empty() {
            WavePhase::Active
        } else {
            WavePhase::Spawning
        };

        log::info!("wave {number} started with {} enemies", self.scheduled);
        out_events.push(Event::WaveStarted {
            wave: number,
            enemies: self.scheduled,
        });
    }

    fn release_due(&mut self, out_spawns: &mut Vec<SpawnOrder>) {
        while let Some(Reverse(next)) = self.schedule.peek() {
            if next.fire_at > self.elapsed {
                break;
            }
            let kind = next.kind;
            let _ = self.schedule.pop();
            self.spawned += 1;
            out_spawns.push(SpawnOrder {
                kind,
                wave: self.started,
            });
        }

        if self.phase == WavePhase::Spawning && self.schedule.is_empty() {
            self.phase = WavePhase::Active;
        }
    }
}
