//! Player economies and the bases they own.

use std::time::Duration;

use anchor_defence_core::{BaseSnapshot, PlayerNumber, PlayerSnapshot, Vec3};

#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub(crate) number: PlayerNumber,
    pub(crate) money: f64,
    pub(crate) income: f64,
}

impl Player {
    pub(crate) fn new(number: PlayerNumber, money: f64, income: f64) -> Self {
        Self {
            number,
            money,
            income,
        }
    }

    /// Credits `amount`, never exceeding `ceiling`.
    pub(crate) fn earn(&mut self, amount: f64, ceiling: f64) {
        self.money = (self.money + amount).min(ceiling);
    }

    pub(crate) fn earn_income(&mut self, elapsed: Duration, ceiling: f64) {
        self.earn(self.income * elapsed.as_secs_f64(), ceiling);
    }

    pub(crate) fn can_afford(&self, cost: f64) -> bool {
        self.money >= cost
    }

    pub(crate) fn spend(&mut self, cost: f64) {
        self.money -= cost;
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            number: self.number,
            money: self.money,
            income: self.income,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Base {
    pub(crate) owner: PlayerNumber,
    pub(crate) position: Vec3,
    pub(crate) health: i32,
}

impl Base {
    /// Subtracts `damage`; returns `true` when this hit destroyed the base.
    pub(crate) fn take_damage(&mut self, damage: i32) -> bool {
        let was_standing = self.health > 0;
        self.health = self.health.saturating_sub(damage);
        was_standing && self.health <= 0
    }

    pub(crate) fn snapshot(&self) -> BaseSnapshot {
        BaseSnapshot {
            owner: self.owner,
            position: self.position,
            health: self.health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_is_prorated_and_clamped() {
        let mut player = Player::new(PlayerNumber::new(1), 0.0, 100.0);
        player.earn_income(Duration::from_millis(500), 99_999.0);
        assert!((player.money - 50.0).abs() < 1e-9);

        player.money = 99_990.0;
        player.earn_income(Duration::from_secs(1), 99_999.0);
        assert!((player.money - 99_999.0).abs() < 1e-9);
    }

    #[test]
    fn base_reports_destruction_once() {
        let mut base = Base {
            owner: PlayerNumber::new(1),
            position: Vec3::ZERO,
            health: 3,
        };
        assert!(!base.take_damage(2));
        assert!(base.take_damage(2));
        assert!(!base.take_damage(2));
        assert_eq!(base.health, -3);
    }
}
