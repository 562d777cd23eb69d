#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that schedules tower shots from cooldown data.
//!
//! Every tower runs on its own interval. Rather than each tower re-arming a
//! timer for itself, the world tracks a next-fire instant per tower and this
//! system is polled after every tick, emitting one `FireTower` command for each
//! tower whose cooldown has elapsed. Target selection and damage happen when
//! the world applies the command, against live enemy state.

use anchor_defence_core::{Command, TowerCooldownView};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireTower` entries for towers whose cooldown elapsed.
    pub fn handle(&mut self, tower_cooldowns: TowerCooldownView, out: &mut Vec<Command>) {
        self.scratch.clear();

        for snapshot in tower_cooldowns.iter() {
            if snapshot.ready_in.is_zero() {
                self.scratch.push(Command::FireTower {
                    tower: snapshot.tower,
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
