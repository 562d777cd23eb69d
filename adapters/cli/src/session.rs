//! Headless session loop driving the world and its systems.

use std::{collections::VecDeque, fmt, time::Duration};

use anchor_defence_core::{
    BaseSnapshot, Command, EnemySnapshot, EnemyState, Event, GameRules, PlayerSnapshot,
    TowerSnapshot, Vec3,
};
use anchor_defence_system_clock::SimulationClock;
use anchor_defence_system_tower_combat::TowerCombat;
use anchor_defence_world::{apply, query, World};
use serde::Serialize;
use tracing::debug;

use crate::scenario::{Scenario, ScheduledCommand};

/// Upper bound on tower scheduling passes within a single step.
const MAX_FIRING_PASSES: usize = 64;

/// Running totals of notable events observed by a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Tower shots that hit an enemy.
    pub shots: u32,
    /// Enemies killed by towers.
    pub kills: u32,
    /// Enemies that reached a base.
    pub arrivals: u32,
    /// Arrivals whose target player owned no base.
    pub orphaned: u32,
    /// Field refreshes.
    pub refreshes: u32,
    /// Spawn and upgrade requests that were refused.
    pub rejections: u32,
}

impl SessionStats {
    fn record(&mut self, event: &Event) {
        match event {
            Event::TowerFired { .. } => self.shots += 1,
            Event::EnemyKilled { .. } => self.kills += 1,
            Event::EnemyReachedBase { .. } => self.arrivals += 1,
            Event::OrphanDamageDropped { .. } => self.orphaned += 1,
            Event::FieldRefreshed { .. } => self.refreshes += 1,
            Event::EnemySpawnRejected { .. } | Event::TowerUpgradeRejected { .. } => {
                self.rejections += 1;
            }
            _ => {}
        }
    }
}

/// World plus the systems that drive it, advanced in fixed simulated steps.
#[derive(Debug)]
pub struct Session {
    world: World,
    combat: TowerCombat,
    clock: SimulationClock,
    script: VecDeque<ScheduledCommand>,
    stats: SessionStats,
}

impl Session {
    /// Creates an empty session governed by `rules`.
    #[must_use]
    pub fn new(rules: GameRules) -> Self {
        let clock = SimulationClock::new(rules.clock_interval());
        Self {
            world: World::with_rules(rules),
            combat: TowerCombat::new(),
            clock,
            script: VecDeque::new(),
            stats: SessionStats::default(),
        }
    }

    /// Creates a session with the scenario's field and objects in place and
    /// its script queued.
    ///
    /// The field is classified once up front so scripted waves due at time
    /// zero find the spawn point.
    #[must_use]
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let mut session = Self::new(scenario.rules.clone());
        for command in scenario.setup_commands() {
            let _ = session.submit(command);
        }
        let _ = session.submit(Command::RefreshField);
        session.script = scenario.scripted_commands().into();
        session
    }

    /// Read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Totals gathered so far.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Applies a single command and returns the events it produced.
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(&mut self.world, command, &mut events);
        self.record(&events);
        events
    }

    /// Advances the session by `dt` of simulated time.
    ///
    /// Scripted commands due at the current time run first, then the tick,
    /// then the periodic clock, then every tower whose cooldown elapsed.
    pub fn advance(&mut self, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        let now = query::simulation_time(&self.world);
        while self.script.front().is_some_and(|entry| entry.at <= now) {
            if let Some(entry) = self.script.pop_front() {
                apply(&mut self.world, entry.command, &mut events);
            }
        }

        let tick_start = events.len();
        apply(&mut self.world, Command::Tick { dt }, &mut events);

        let mut commands = Vec::new();
        self.clock.handle(
            &events[tick_start..],
            query::field_ready(&self.world),
            query::objects_changed(&self.world),
            &mut commands,
        );
        for command in commands.drain(..) {
            apply(&mut self.world, command, &mut events);
        }

        let mut passes = 0;
        loop {
            self.combat
                .handle(query::tower_cooldowns(&self.world), &mut commands);
            if commands.is_empty() {
                break;
            }
            if passes == MAX_FIRING_PASSES {
                debug!(
                    deferred = commands.len(),
                    "firing pass limit reached, remaining shots wait for the next step"
                );
                commands.clear();
                break;
            }
            passes += 1;
            for command in commands.drain(..) {
                apply(&mut self.world, command, &mut events);
            }
        }

        self.record(&events);
        events
    }

    /// Runs the session for `duration` in steps of `step`.
    pub fn run_for(&mut self, duration: Duration, step: Duration) {
        if step.is_zero() {
            return;
        }
        let mut elapsed = Duration::ZERO;
        while elapsed < duration {
            let dt = step.min(duration - elapsed);
            let _ = self.advance(dt);
            elapsed += dt;
        }
        debug!(secs = elapsed.as_secs_f64(), "session run finished");
    }

    /// Captures the current state for presentation.
    #[must_use]
    pub fn report(&self) -> Report {
        Report {
            simulated_secs: query::simulation_time(&self.world).as_secs_f64(),
            players: query::players(&self.world),
            bases: query::bases(&self.world),
            towers: query::tower_view(&self.world).into_vec(),
            enemies: query::enemy_view(&self.world).into_vec(),
            display_path: query::display_path(&self.world).to_vec(),
            stats: self.stats,
        }
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            self.stats.record(event);
        }
    }
}

/// Final state of a session.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    /// Simulated seconds elapsed.
    pub simulated_secs: f64,
    /// Player economies.
    pub players: Vec<PlayerSnapshot>,
    /// Base health.
    pub bases: Vec<BaseSnapshot>,
    /// Tower statistics and upgrade prices.
    pub towers: Vec<TowerSnapshot>,
    /// Every enemy slot.
    pub enemies: Vec<EnemySnapshot>,
    /// Highlighted path cells between spawn and base.
    pub display_path: Vec<Vec3>,
    /// Event totals.
    pub stats: SessionStats,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "simulated {:.1}s", self.simulated_secs)?;
        for player in &self.players {
            writeln!(
                f,
                "player {}: money {:.0}, income {:.0}/s",
                player.number.get(),
                player.money,
                player.income
            )?;
        }
        for base in &self.bases {
            writeln!(f, "base of player {}: health {}", base.owner.get(), base.health)?;
        }
        for tower in &self.towers {
            writeln!(
                f,
                "tower {}: damage {}, interval {:.1}s, range {:.3} (next: damage {:.0}, speed {:.0}, range {:.0})",
                tower.id.get(),
                tower.damage,
                tower.interval_secs,
                tower.range,
                tower.costs.damage,
                tower.costs.speed,
                tower.costs.range
            )?;
        }
        let alive = self
            .enemies
            .iter()
            .filter(|enemy| enemy.state != EnemyState::Dead)
            .count();
        writeln!(f, "enemies: {alive} alive of {} slots", self.enemies.len())?;
        writeln!(f, "path: {} cells", self.display_path.len())?;
        write!(
            f,
            "shots {}, kills {}, arrivals {}, orphaned {}, refreshes {}, rejections {}",
            self.stats.shots,
            self.stats.kills,
            self.stats.arrivals,
            self.stats.orphaned,
            self.stats.refreshes,
            self.stats.rejections
        )
    }
}
