//! Enemy slots and the per-enemy movement state machine.
//!
//! An enemy walks its path one grid step at a time, spending `speed` seconds of
//! simulated time per step. While a step is in progress the enemy is heading
//! towards a fixed cell; assigning a new path does not interrupt that step, it
//! only replaces the cells that follow.

use std::{collections::VecDeque, time::Duration};

use anchor_defence_core::{
    planar_distance, EnemySlot, EnemySnapshot, EnemyState, PlayerNumber, Vec3,
};

use crate::ordinal;

/// Result of advancing an enemy through simulated time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// Still walking, or not walking at all.
    Moving,
    /// Ran out of path before reaching its target.
    Stuck,
    /// Reached its target.
    Arrived,
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) health: i32,
    pub(crate) damage: i32,
    pub(crate) target_player: PlayerNumber,
    pub(crate) target: Option<Vec3>,
    state: EnemyState,
    launched: bool,
    speed: f64,
    position: Vec3,
    heading: Option<Vec3>,
    progress: f64,
    path: VecDeque<Vec3>,
}

impl Enemy {
    pub(crate) fn new(
        health: i32,
        damage: i32,
        speed: f64,
        position: Vec3,
        target: Option<Vec3>,
        target_player: PlayerNumber,
    ) -> Self {
        Self {
            health,
            damage,
            target_player,
            target,
            state: EnemyState::Idle,
            launched: false,
            speed,
            position,
            heading: None,
            progress: 0.0,
            path: VecDeque::new(),
        }
    }

    pub(crate) const fn state(&self) -> EnemyState {
        self.state
    }

    pub(crate) const fn is_dead(&self) -> bool {
        matches!(self.state, EnemyState::Dead)
    }

    pub(crate) const fn is_stuck(&self) -> bool {
        matches!(self.state, EnemyState::Stuck)
    }

    /// Whether the enemy has ever started walking a non-empty path.
    pub(crate) const fn is_launched(&self) -> bool {
        self.launched
    }

    /// Position of the last cell the enemy fully reached.
    pub(crate) const fn last_cell(&self) -> Vec3 {
        self.position
    }

    /// Cell the enemy is walking to, if a step is in progress.
    pub(crate) const fn heading(&self) -> Option<Vec3> {
        self.heading
    }

    /// Current position, interpolated along the step in progress.
    pub(crate) fn current_position(&self) -> Vec3 {
        match self.heading {
            Some(heading) if self.state == EnemyState::Running && self.speed > 0.0 => {
                let fraction = (self.progress / self.speed).clamp(0.0, 1.0) as f32;
                self.position.lerp(heading, fraction)
            }
            _ => self.position,
        }
    }

    /// Distance from the current position through every remaining path cell.
    pub(crate) fn remaining_distance(&self) -> f32 {
        let mut total = 0.0;
        let mut from = self.current_position();
        for cell in &self.path {
            total += planar_distance(from, *cell);
            from = *cell;
        }
        total
    }

    /// Drops every path cell taken from a replaced grid.
    ///
    /// The enemy counts as never launched again, so the next assigned path
    /// places it on that path's first cell. A walking or stuck enemy keeps
    /// walking once that path arrives.
    pub(crate) fn discard_path(&mut self) {
        if self.is_dead() {
            return;
        }
        self.path.clear();
        self.heading = None;
        self.progress = 0.0;
        self.launched = false;
        if self.is_stuck() {
            self.state = EnemyState::Running;
        }
    }

    /// Walking without a step in progress, as left by [`Self::discard_path`].
    const fn awaits_path(&self) -> bool {
        matches!(self.state, EnemyState::Running) && self.heading.is_none()
    }

    /// Replaces the remaining path.
    ///
    /// An enemy that never started walking is placed on the first cell, which
    /// is consumed. A stuck enemy resumes walking immediately.
    pub(crate) fn assign_path(&mut self, path: Vec<Vec3>) {
        if self.is_dead() {
            return;
        }
        self.path = path.into();

        if !self.launched {
            if let Some(first) = self.path.pop_front() {
                self.position = first;
                self.heading = None;
                self.progress = 0.0;
            }
        }

        if self.is_stuck() || self.awaits_path() {
            self.start_running();
        }
    }

    /// Starts the next step, or marks the enemy stuck when the path is empty.
    pub(crate) fn start_running(&mut self) {
        self.progress = 0.0;
        match self.path.front() {
            Some(next) => {
                self.heading = Some(*next);
                self.state = EnemyState::Running;
                self.launched = true;
            }
            None => {
                self.heading = None;
                self.state = EnemyState::Stuck;
            }
        }
    }

    /// Spends `dt` of simulated time walking along the path.
    pub(crate) fn advance(&mut self, dt: Duration) -> StepOutcome {
        if self.state != EnemyState::Running || self.heading.is_none() {
            return StepOutcome::Moving;
        }

        self.progress += dt.as_secs_f64();
        while self.progress >= self.speed {
            let carry = self.progress - self.speed;
            if let Some(heading) = self.heading.take() {
                self.position = heading;
            }
            let _ = self.path.pop_front();
            self.start_running();
            self.progress = carry;

            if self.target == Some(self.position) {
                self.state = EnemyState::Finished;
                self.heading = None;
                self.progress = 0.0;
                return StepOutcome::Arrived;
            }
            if self.is_stuck() {
                self.progress = 0.0;
                return StepOutcome::Stuck;
            }
        }
        StepOutcome::Moving
    }

    /// Subtracts `amount`; returns `true` when the hit killed the enemy.
    pub(crate) fn hit(&mut self, amount: i32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health <= 0 {
            self.kill();
            true
        } else {
            false
        }
    }

    pub(crate) fn kill(&mut self) {
        self.state = EnemyState::Dead;
        self.path.clear();
        self.heading = None;
        self.progress = 0.0;
    }

    pub(crate) fn snapshot(&self, slot: EnemySlot) -> EnemySnapshot {
        EnemySnapshot {
            slot,
            state: self.state,
            health: self.health,
            damage: self.damage,
            position: self.current_position(),
            remaining_distance: self.remaining_distance(),
            target_player: self.target_player,
        }
    }
}

/// Arena of enemy slots; dead slots are overwritten by later spawns.
#[derive(Debug, Default)]
pub(crate) struct EnemySlots {
    slots: Vec<Enemy>,
}

impl EnemySlots {
    /// Stores `enemy` in the first dead slot, or appends a new one.
    ///
    /// Returns the slot and whether it was reused.
    pub(crate) fn insert(&mut self, enemy: Enemy) -> (EnemySlot, bool) {
        if let Some(index) = self.slots.iter().position(Enemy::is_dead) {
            self.slots[index] = enemy;
            return (EnemySlot::new(ordinal(index)), true);
        }
        self.slots.push(enemy);
        (EnemySlot::new(ordinal(self.slots.len() - 1)), false)
    }

    pub(crate) fn get_mut(&mut self, slot: EnemySlot) -> Option<&mut Enemy> {
        self.slots.get_mut(usize::try_from(slot.get()).ok()?)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EnemySlot, &Enemy)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, enemy)| (EnemySlot::new(ordinal(index)), enemy))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (EnemySlot, &mut Enemy)> {
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(index, enemy)| (EnemySlot::new(ordinal(index)), enemy))
    }

    pub(crate) fn snapshots(&self) -> Vec<EnemySnapshot> {
        self.iter().map(|(slot, enemy)| enemy.snapshot(slot)).collect()
    }
}
