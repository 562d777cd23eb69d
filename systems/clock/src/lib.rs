#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Periodic simulation clock that drives field refreshes and income.
//!
//! Each elapsed interval produces, in order: a `RefreshField` command when the
//! field is ready and tracked objects moved, then an `ApplyIncome` command
//! covering exactly one interval. Presentation layers treat the resulting
//! `IncomeApplied` event as the cue to re-read player and tower statistics.

use std::time::Duration;

use anchor_defence_core::{Command, Event};

/// Pure system that converts elapsed simulation time into periodic commands.
#[derive(Debug)]
pub struct SimulationClock {
    interval: Duration,
    accumulator: Duration,
}

impl SimulationClock {
    /// Creates a clock that fires once per `interval` of simulated time.
    ///
    /// A zero interval disables the clock.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    /// Interval between two clock firings.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Consumes world events and emits the commands of every elapsed interval.
    ///
    /// `field_ready` and `objects_changed` describe the world as observed
    /// before the emitted commands are applied. At most one refresh is queued
    /// per call because a single refresh observes every pending change.
    pub fn handle(
        &mut self,
        events: &[Event],
        field_ready: bool,
        objects_changed: bool,
        out: &mut Vec<Command>,
    ) {
        if self.interval.is_zero() {
            return;
        }

        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.accumulator = self.accumulator.saturating_add(*dt);
            }
        }

        let mut refresh_pending = field_ready && objects_changed;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;

            if refresh_pending {
                out.push(Command::RefreshField);
                refresh_pending = false;
            }

            out.push(Command::ApplyIncome {
                elapsed: self.interval,
            });
        }
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advanced(millis: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }
    }

    #[test]
    fn partial_interval_emits_nothing() {
        let mut clock = SimulationClock::default();
        let mut out = Vec::new();

        clock.handle(&[advanced(499)], true, true, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn refresh_precedes_income() {
        let mut clock = SimulationClock::default();
        let mut out = Vec::new();

        clock.handle(&[advanced(250), advanced(250)], true, true, &mut out);

        assert_eq!(
            out,
            vec![
                Command::RefreshField,
                Command::ApplyIncome {
                    elapsed: Duration::from_millis(500),
                },
            ]
        );
    }

    #[test]
    fn refresh_requires_ready_field_and_changes() {
        let mut clock = SimulationClock::default();
        let mut out = Vec::new();

        clock.handle(&[advanced(500)], false, true, &mut out);
        clock.handle(&[advanced(500)], true, false, &mut out);

        assert!(!out.contains(&Command::RefreshField));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn long_step_pays_every_interval_but_refreshes_once() {
        let mut clock = SimulationClock::default();
        let mut out = Vec::new();

        clock.handle(&[advanced(1600)], true, true, &mut out);

        let refreshes = out
            .iter()
            .filter(|command| matches!(command, Command::RefreshField))
            .count();
        let payments = out
            .iter()
            .filter(|command| matches!(command, Command::ApplyIncome { .. }))
            .count();
        assert_eq!(refreshes, 1);
        assert_eq!(payments, 3);
    }

    #[test]
    fn zero_interval_disables_the_clock() {
        let mut clock = SimulationClock::new(Duration::ZERO);
        let mut out = Vec::new();

        clock.handle(&[advanced(10_000)], true, true, &mut out);

        assert!(out.is_empty());
    }
}
