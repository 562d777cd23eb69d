#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure target selection for towers.
//!
//! A tower prefers the enemy that is closest to the base, measured as the
//! distance still to travel along the enemy's own path, rather than the enemy
//! closest to the tower.

use anchor_defence_core::{planar_distance, EnemySlot, EnemySnapshot, EnemyState, Vec3};

/// Selects the enemy a tower at `tower_position` with radius `range` should hit.
///
/// Candidates must lie strictly inside the radius on the horizontal plane and
/// must be neither dead nor stuck. Among them the smallest remaining path
/// distance wins; on equal distances the first slot encountered is kept.
#[must_use]
pub fn select_target<'a, I>(tower_position: Vec3, range: f32, enemies: I) -> Option<EnemySlot>
where
    I: IntoIterator<Item = &'a EnemySnapshot>,
{
    let mut best: Option<Candidate> = None;

    for enemy in enemies {
        if !is_targetable(enemy.state) {
            continue;
        }

        if planar_distance(enemy.position, tower_position) >= range {
            continue;
        }

        let current = Candidate {
            slot: enemy.slot,
            remaining: enemy.remaining_distance,
        };

        match &mut best {
            Some(existing) => {
                if current.precedes(existing) {
                    *existing = current;
                }
            }
            None => best = Some(current),
        }
    }

    best.map(|candidate| candidate.slot)
}

fn is_targetable(state: EnemyState) -> bool {
    !matches!(state, EnemyState::Dead | EnemyState::Stuck)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    slot: EnemySlot,
    remaining: f32,
}

impl Candidate {
    fn precedes(&self, other: &Self) -> bool {
        self.remaining < other.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_defence_core::PlayerNumber;

    fn enemy(slot: u32, x: f32, remaining: f32, state: EnemyState) -> EnemySnapshot {
        EnemySnapshot {
            slot: EnemySlot::new(slot),
            state,
            health: 10,
            damage: 1,
            position: Vec3::new(x, 0.0, 0.0),
            remaining_distance: remaining,
            target_player: PlayerNumber::new(1),
        }
    }

    #[test]
    fn prefers_enemy_nearest_to_base() {
        let enemies = [
            enemy(0, 0.05, 5.0, EnemyState::Running),
            enemy(1, 0.10, 3.0, EnemyState::Running),
        ];

        let target = select_target(Vec3::ZERO, 0.5, &enemies);

        assert_eq!(target, Some(EnemySlot::new(1)));
    }

    #[test]
    fn closeness_to_tower_does_not_matter() {
        let enemies = [
            enemy(0, 0.01, 9.0, EnemyState::Running),
            enemy(1, 0.40, 1.0, EnemyState::Running),
        ];

        let target = select_target(Vec3::ZERO, 0.5, &enemies);

        assert_eq!(target, Some(EnemySlot::new(1)));
    }

    #[test]
    fn dead_and_stuck_enemies_are_ignored() {
        let enemies = [
            enemy(0, 0.0, 1.0, EnemyState::Dead),
            enemy(1, 0.0, 2.0, EnemyState::Stuck),
            enemy(2, 0.0, 7.0, EnemyState::Idle),
        ];

        let target = select_target(Vec3::ZERO, 0.5, &enemies);

        assert_eq!(target, Some(EnemySlot::new(2)));
    }

    #[test]
    fn range_boundary_is_exclusive() {
        let enemies = [enemy(0, 0.5, 1.0, EnemyState::Running)];

        assert_eq!(select_target(Vec3::ZERO, 0.5, &enemies), None);
        assert_eq!(
            select_target(Vec3::ZERO, 0.51, &enemies),
            Some(EnemySlot::new(0))
        );
    }

    #[test]
    fn equal_distances_keep_first_slot() {
        let enemies = [
            enemy(3, 0.1, 2.0, EnemyState::Running),
            enemy(4, 0.2, 2.0, EnemyState::Running),
        ];

        assert_eq!(
            select_target(Vec3::ZERO, 1.0, &enemies),
            Some(EnemySlot::new(3))
        );
    }

    #[test]
    fn no_candidates_yields_none() {
        let enemies: [EnemySnapshot; 0] = [];
        assert_eq!(select_target(Vec3::ZERO, 1.0, &enemies), None);
    }
}
