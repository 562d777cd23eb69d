//! Authoritative tower state, upgrade pricing and firing schedule.

use std::time::Duration;

use anchor_defence_core::{
    planar_distance, seconds_to_duration, GameRules, TowerCooldownSnapshot, TowerId,
    TowerSnapshot, UpgradeAxis, UpgradeCosts, UpgradeError, Vec3,
};

use crate::ordinal;

/// Amount a speed upgrade removes from the attack interval.
const INTERVAL_STEP_SECS: f64 = 0.1;

/// Number of range upgrades that add one full base range.
const RANGE_UPGRADES_PER_BASE_RANGE: f32 = 5.0;

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) position: Vec3,
    pub(crate) damage: i32,
    interval_secs: f64,
    base_range: f32,
    damage_upgrades: u32,
    speed_upgrades: u32,
    range_upgrades: u32,
    next_fire_at: Duration,
}

impl TowerState {
    fn new(id: TowerId, position: Vec3, rules: &GameRules, now: Duration) -> Self {
        Self {
            id,
            position,
            damage: rules.tower_damage,
            interval_secs: rules.tower_interval_secs,
            base_range: rules.tower_base_range(),
            damage_upgrades: 0,
            speed_upgrades: 0,
            range_upgrades: 0,
            next_fire_at: now,
        }
    }

    /// Current targeting radius.
    pub(crate) fn range(&self) -> f32 {
        self.base_range + self.base_range * (self.range_upgrades as f32 / RANGE_UPGRADES_PER_BASE_RANGE)
    }

    pub(crate) fn is_ready(&self, now: Duration) -> bool {
        self.next_fire_at <= now
    }

    /// Schedules the next shot one interval after the one just taken.
    pub(crate) fn rearm(&mut self) {
        let interval = seconds_to_duration(self.interval_secs);
        self.next_fire_at = self.next_fire_at.saturating_add(interval);
    }

    pub(crate) fn cooldown(&self, now: Duration) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: self.id,
            ready_in: self.next_fire_at.saturating_sub(now),
        }
    }

    /// Price of the next upgrade on every axis.
    pub(crate) fn costs(&self, rules: &GameRules) -> UpgradeCosts {
        let damage = f64::from(self.damage_upgrades);
        let speed = f64::from(self.speed_upgrades);
        let range = f64::from(self.range_upgrades);
        UpgradeCosts {
            damage: rules.damage_upgrade_price + rules.damage_upgrade_price * 2.0 * damage,
            speed: rules.speed_upgrade_price + rules.speed_upgrade_price * speed * speed,
            range: rules.range_upgrade_price + rules.range_upgrade_price * range * range,
        }
    }

    /// Checks that an upgrade along `axis` would change the tower.
    pub(crate) fn check_upgrade(&self, axis: UpgradeAxis, rules: &GameRules) -> Result<(), UpgradeError> {
        match axis {
            UpgradeAxis::Speed if self.interval_secs <= rules.min_tower_interval_secs => {
                Err(UpgradeError::SpeedFloor)
            }
            _ => Ok(()),
        }
    }

    /// Applies an upgrade whose price has already been paid.
    pub(crate) fn upgrade(&mut self, axis: UpgradeAxis, rules: &GameRules) {
        match axis {
            UpgradeAxis::Damage => {
                self.damage += 1;
                self.damage_upgrades += 1;
            }
            UpgradeAxis::Speed => {
                let shortened = ((self.interval_secs - INTERVAL_STEP_SECS) * 10.0).round() / 10.0;
                self.interval_secs = shortened.max(rules.min_tower_interval_secs);
                self.speed_upgrades += 1;
            }
            UpgradeAxis::Range => {
                self.range_upgrades += 1;
            }
        }
    }

    pub(crate) fn snapshot(&self, rules: &GameRules) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            position: self.position,
            damage: self.damage,
            interval_secs: self.interval_secs,
            range: self.range(),
            damage_upgrades: self.damage_upgrades,
            speed_upgrades: self.speed_upgrades,
            range_upgrades: self.range_upgrades,
            costs: self.costs(rules),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug, Default)]
pub(crate) struct TowerRegistry {
    entries: Vec<TowerState>,
}

impl TowerRegistry {
    /// Creates a tower that is ready to fire at `now`.
    pub(crate) fn place(&mut self, position: Vec3, rules: &GameRules, now: Duration) -> TowerId {
        let id = TowerId::new(ordinal(self.entries.len()));
        self.entries.push(TowerState::new(id, position, rules, now));
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(usize::try_from(id.get()).ok()?)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(usize::try_from(id.get()).ok()?)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.iter()
    }

    /// First tower whose horizontal distance to `position` is below `spacing`.
    pub(crate) fn near(&self, position: Vec3, spacing: f32) -> Option<TowerId> {
        self.entries
            .iter()
            .find(|tower| planar_distance(tower.position, position) < spacing)
            .map(|tower| tower.id)
    }
}
