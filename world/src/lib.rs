#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Anchor Defence.
//!
//! The world owns the cell grid, every tracked object, the entity registries
//! and the simulated clock. It is mutated exclusively through [`apply`], which
//! executes one [`Command`] to completion and reports what happened as a batch
//! of [`Event`] values. Read-only access goes through the [`query`] module.

mod enemies;
mod grid;
mod objects;
mod players;
mod towers;

use std::time::Duration;

use anchor_defence_core::{
    CellCoord, Command, EnemySlot, EnemyState, Event, FieldCorner, FieldError, GameRules,
    ObjectKind, PlayerNumber, SpawnError, TowerId, UpgradeAxis, UpgradeError, Vec3,
};
use anchor_defence_system_pathfinding::PathFinder;
use anchor_defence_system_tower_targeting::select_target;
use tracing::{debug, info, warn};

use crate::{
    enemies::{Enemy, EnemySlots, StepOutcome},
    objects::ObjectTracker,
    players::{Base, Player},
    towers::TowerRegistry,
};

pub use grid::{Cell, GridField};

/// Converts a collection index into a 32-bit identifier, saturating on overflow.
pub(crate) fn ordinal(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Represents the authoritative Anchor Defence world state.
#[derive(Debug)]
pub struct World {
    rules: GameRules,
    origin_corner: Option<Vec3>,
    far_corner: Option<Vec3>,
    field: Option<GridField>,
    objects: ObjectTracker,
    players: Vec<Player>,
    bases: Vec<Base>,
    towers: TowerRegistry,
    enemies: EnemySlots,
    path_finder: PathFinder,
    current_path: Vec<Vec3>,
    clock: Duration,
}

impl World {
    /// Creates a world governed by the default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(GameRules::default())
    }

    /// Creates a world governed by `rules`, with the first player already joined.
    #[must_use]
    pub fn with_rules(rules: GameRules) -> Self {
        let mut world = Self {
            rules,
            origin_corner: None,
            far_corner: None,
            field: None,
            objects: ObjectTracker::default(),
            players: Vec::new(),
            bases: Vec::new(),
            towers: TowerRegistry::default(),
            enemies: EnemySlots::default(),
            path_finder: PathFinder::new(),
            current_path: Vec::new(),
            clock: Duration::ZERO,
        };
        let _ = world.add_player();
        world
    }

    fn add_player(&mut self) -> PlayerNumber {
        let number = PlayerNumber::new(ordinal(self.players.len()).saturating_add(1));
        self.players.push(Player::new(
            number,
            self.rules.starting_money,
            self.rules.income_per_second,
        ));
        number
    }

    fn build_field(&mut self) -> Result<(u32, u32), FieldError> {
        let (Some(origin), Some(far)) = (self.origin_corner, self.far_corner) else {
            return Err(FieldError::MissingCorner);
        };
        let field = GridField::build(origin, far, self.rules.cell_spacing)?;
        let dimensions = field.dimensions();

        self.field = Some(field);
        self.current_path.clear();
        self.objects.forget_observations();
        for (_, enemy) in self.enemies.iter_mut() {
            enemy.discard_path();
        }
        Ok(dimensions)
    }

    fn place_object(&mut self, kind: ObjectKind, position: Vec3, out_events: &mut Vec<Event>) {
        let object = self.objects.track(kind, position);
        out_events.push(Event::ObjectPlaced { object, kind });

        match kind {
            ObjectKind::Tower => {
                let tower = self.towers.place(position, &self.rules, self.clock);
                debug!(tower = tower.get(), "tower placed");
                out_events.push(Event::TowerPlaced { tower, position });
            }
            ObjectKind::Base => {
                let owner = PlayerNumber::new(ordinal(self.bases.len()).saturating_add(1));
                self.bases.push(Base {
                    owner,
                    position,
                    health: self.rules.base_health,
                });
                debug!(owner = owner.get(), "base placed");
                out_events.push(Event::BasePlaced { owner });
            }
            ObjectKind::Spawn | ObjectKind::Wall => {}
        }
    }

    fn refresh_field(&mut self, out_events: &mut Vec<Event>) {
        let Some(field) = self.field.as_mut() else {
            debug!("refresh skipped, field not built");
            return;
        };

        self.objects.link_orientations();
        field.classify(self.objects.placements());
        self.objects.observe_all();

        let base = field.base_position();
        let mut rerouted = 0;
        for (slot, enemy) in self.enemies.iter_mut() {
            if enemy.is_dead() {
                continue;
            }
            enemy.target = base;

            let start = if enemy.is_stuck() {
                field.nearest_cell(enemy.last_cell())
            } else {
                enemy
                    .heading()
                    .and_then(|heading| field.nearest_cell(heading))
            };
            let path = path_positions(field, &mut self.path_finder, start);
            debug!(slot = slot.get(), steps = path.len(), "enemy rerouted");
            enemy.assign_path(path);
            rerouted += 1;
        }

        self.current_path = path_positions(field, &mut self.path_finder, None);
        debug!(
            path_len = self.current_path.len(),
            rerouted, "field refreshed"
        );
        out_events.push(Event::FieldRefreshed {
            path_len: self.current_path.len(),
            rerouted,
        });
    }

    fn spawn_enemy(
        &mut self,
        health: i32,
        damage: i32,
        speed: f64,
        target_player: PlayerNumber,
    ) -> Result<(EnemySlot, bool), SpawnError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(SpawnError::InvalidSpeed);
        }
        let field = self.field.as_ref().ok_or(SpawnError::NoSpawnPoint)?;
        let spawn = field.spawn_position().ok_or(SpawnError::NoSpawnPoint)?;
        let enemy = Enemy::new(
            health,
            damage,
            speed,
            spawn,
            field.base_position(),
            target_player,
        );
        let (slot, reused) = self.enemies.insert(enemy);
        debug!(slot = slot.get(), reused, "enemy spawned");
        Ok((slot, reused))
    }

    fn send_enemies(&mut self, out_events: &mut Vec<Event>) {
        let mut count = 0;
        for (slot, enemy) in self.enemies.iter_mut() {
            if enemy.is_dead() || enemy.is_launched() {
                continue;
            }
            let path = match self.field.as_ref() {
                Some(field) => path_positions(field, &mut self.path_finder, None),
                None => Vec::new(),
            };
            enemy.assign_path(path);
            enemy.start_running();
            count += 1;
            if enemy.is_stuck() {
                out_events.push(Event::EnemyStuck { slot });
            }
        }
        info!(count, "enemies sent");
        out_events.push(Event::EnemiesSent { count });
    }

    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut arrivals = false;
        for (slot, enemy) in self.enemies.iter_mut() {
            match enemy.advance(dt) {
                StepOutcome::Moving => {}
                StepOutcome::Stuck => {
                    debug!(slot = slot.get(), "enemy stuck");
                    out_events.push(Event::EnemyStuck { slot });
                }
                StepOutcome::Arrived => arrivals = true,
            }
        }
        if arrivals {
            self.resolve_arrivals(out_events);
        }
    }

    fn resolve_arrivals(&mut self, out_events: &mut Vec<Event>) {
        for (slot, enemy) in self.enemies.iter_mut() {
            if enemy.state() != EnemyState::Finished {
                continue;
            }
            let player = enemy.target_player;
            match self.bases.iter_mut().find(|base| base.owner == player) {
                Some(base) => {
                    let destroyed = base.take_damage(enemy.damage);
                    info!(
                        slot = slot.get(),
                        player = player.get(),
                        damage = enemy.damage,
                        health = base.health,
                        "enemy reached base"
                    );
                    out_events.push(Event::EnemyReachedBase {
                        slot,
                        player,
                        damage: enemy.damage,
                    });
                    if destroyed {
                        info!(owner = player.get(), "base destroyed");
                        out_events.push(Event::BaseDestroyed { owner: player });
                    }
                }
                None => {
                    warn!(
                        slot = slot.get(),
                        player = player.get(),
                        "no base owned by target player, damage dropped"
                    );
                    out_events.push(Event::OrphanDamageDropped { slot, player });
                }
            }
            enemy.kill();
        }
    }

    fn fire_tower(&mut self, id: TowerId, out_events: &mut Vec<Event>) {
        let now = self.clock;
        let Some(tower) = self.towers.get_mut(id) else {
            return;
        };
        if !tower.is_ready(now) {
            return;
        }
        tower.rearm();

        let snapshots = self.enemies.snapshots();
        let Some(target) = select_target(tower.position, tower.range(), &snapshots) else {
            return;
        };
        let damage = tower.damage;
        let Some(enemy) = self.enemies.get_mut(target) else {
            return;
        };

        let killed = enemy.hit(damage);
        out_events.push(Event::TowerFired {
            tower: id,
            target,
            damage,
        });
        if killed {
            debug!(slot = target.get(), tower = id.get(), "enemy killed");
            out_events.push(Event::EnemyKilled { slot: target });
        }
    }

    fn upgrade_tower(
        &mut self,
        player: PlayerNumber,
        tower: TowerId,
        axis: UpgradeAxis,
    ) -> Result<f64, UpgradeError> {
        let buyer = self
            .players
            .iter_mut()
            .find(|candidate| candidate.number == player)
            .ok_or(UpgradeError::UnknownPlayer)?;
        let target = self
            .towers
            .get_mut(tower)
            .ok_or(UpgradeError::UnknownTower)?;

        target.check_upgrade(axis, &self.rules)?;
        let cost = target.costs(&self.rules).for_axis(axis);
        if !buyer.can_afford(cost) {
            return Err(UpgradeError::InsufficientFunds);
        }

        buyer.spend(cost);
        target.upgrade(axis, &self.rules);
        Ok(cost)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn path_positions(
    field: &GridField,
    path_finder: &mut PathFinder,
    start: Option<CellCoord>,
) -> Vec<Vec3> {
    path_finder
        .shortest_path(field.view(), start)
        .into_iter()
        .filter_map(|cell| field.cell_position(cell))
        .collect()
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetCorner { corner, position } => match corner {
            FieldCorner::Origin => world.origin_corner = Some(position),
            FieldCorner::Far => world.far_corner = Some(position),
        },
        Command::BuildField => match world.build_field() {
            Ok((columns, rows)) => {
                info!(columns, rows, "field built");
                out_events.push(Event::FieldBuilt { columns, rows });
            }
            Err(reason) => {
                warn!(%reason, "field rejected");
                out_events.push(Event::FieldRejected { reason });
            }
        },
        Command::PlaceObject { kind, position } => world.place_object(kind, position, out_events),
        Command::MoveObject { object, position } => {
            if !world.objects.move_to(object, position) {
                warn!(object = object.get(), "move ignored for unknown object");
            }
        }
        Command::OrientObjects { yaw } => world.objects.set_orientation(yaw),
        Command::RefreshField => world.refresh_field(out_events),
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_enemies(dt, out_events);
        }
        Command::FireTower { tower } => world.fire_tower(tower, out_events),
        Command::SpawnEnemy {
            health,
            damage,
            speed,
            target_player,
        } => match world.spawn_enemy(health, damage, speed, target_player) {
            Ok((slot, reused)) => out_events.push(Event::EnemySpawned { slot, reused }),
            Err(reason) => {
                warn!(%reason, "enemy spawn rejected");
                out_events.push(Event::EnemySpawnRejected { reason });
            }
        },
        Command::SendEnemies => world.send_enemies(out_events),
        Command::ApplyIncome { elapsed } => {
            let ceiling = world.rules.money_ceiling;
            for player in &mut world.players {
                player.earn_income(elapsed, ceiling);
            }
            out_events.push(Event::IncomeApplied { elapsed });
        }
        Command::AddPlayer => {
            let player = world.add_player();
            info!(player = player.get(), "player joined");
            out_events.push(Event::PlayerAdded { player });
        }
        Command::UpgradeTower {
            player,
            tower,
            axis,
        } => match world.upgrade_tower(player, tower, axis) {
            Ok(cost) => {
                debug!(tower = tower.get(), ?axis, cost, "tower upgraded");
                out_events.push(Event::TowerUpgraded { tower, axis, cost });
            }
            Err(reason) => {
                debug!(tower = tower.get(), ?axis, %reason, "upgrade rejected");
                out_events.push(Event::TowerUpgradeRejected {
                    tower,
                    axis,
                    reason,
                });
            }
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use anchor_defence_core::{
        BaseSnapshot, CellCoord, EnemyView, FieldView, GameRules, ObjectId, ObjectKind,
        PlayerNumber, PlayerSnapshot, TowerCooldownView, TowerId, TowerSnapshot, TowerView, Vec3,
    };
    use anchor_defence_system_pathfinding::PathFinder;

    use super::{path_positions, GridField, World};

    /// Rules the world was created with.
    #[must_use]
    pub fn rules(world: &World) -> &GameRules {
        &world.rules
    }

    /// Simulated time accumulated from every tick.
    #[must_use]
    pub fn simulation_time(world: &World) -> Duration {
        world.clock
    }

    /// Reports whether the cell grid has been built.
    #[must_use]
    pub fn field_ready(world: &World) -> bool {
        world.field.is_some()
    }

    /// Provides read-only access to the cell grid, once built.
    #[must_use]
    pub fn field(world: &World) -> Option<&GridField> {
        world.field.as_ref()
    }

    /// Number of columns and rows of the built grid.
    #[must_use]
    pub fn dimensions(world: &World) -> Option<(u32, u32)> {
        world.field.as_ref().map(GridField::dimensions)
    }

    /// Captures the cell classes of the built grid.
    #[must_use]
    pub fn field_view(world: &World) -> Option<FieldView<'_>> {
        world.field.as_ref().map(GridField::view)
    }

    /// Cell matching a world position under the grid's tolerance rules.
    #[must_use]
    pub fn nearest_cell(world: &World, position: Vec3) -> Option<CellCoord> {
        world
            .field
            .as_ref()
            .and_then(|field| field.nearest_cell(position))
    }

    /// World position of a cell.
    #[must_use]
    pub fn cell_position(world: &World, cell: CellCoord) -> Option<Vec3> {
        world
            .field
            .as_ref()
            .and_then(|field| field.cell_position(cell))
    }

    /// World position of the spawn cell, if one is classified.
    #[must_use]
    pub fn spawn_position(world: &World) -> Option<Vec3> {
        world.field.as_ref().and_then(GridField::spawn_position)
    }

    /// World position of the base cell, if one is classified.
    #[must_use]
    pub fn base_position(world: &World) -> Option<Vec3> {
        world.field.as_ref().and_then(GridField::base_position)
    }

    /// Spawn-to-base path computed by the most recent refresh, endpoints included.
    #[must_use]
    pub fn current_path(world: &World) -> &[Vec3] {
        &world.current_path
    }

    /// Cells of the current path that adapters highlight; spawn and base are
    /// already marked by their anchors and are left out.
    #[must_use]
    pub fn display_path(world: &World) -> &[Vec3] {
        let path = &world.current_path;
        if path.len() < 2 {
            return &[];
        }
        &path[1..path.len() - 1]
    }

    /// Computes a fresh path to the base from `start`, or from the spawn cell.
    #[must_use]
    pub fn shortest_path_from(world: &World, start: Option<CellCoord>) -> Vec<Vec3> {
        match world.field.as_ref() {
            Some(field) => path_positions(field, &mut PathFinder::new(), start),
            None => Vec::new(),
        }
    }

    /// Captures the state of every tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.snapshot(&world.rules))
                .collect(),
        )
    }

    /// Captures the state of a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world
            .towers
            .get(tower)
            .map(|state| state.snapshot(&world.rules))
    }

    /// Time remaining until each tower may fire again.
    #[must_use]
    pub fn tower_cooldowns(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.cooldown(world.clock))
                .collect(),
        )
    }

    /// First tower closer than one cell spacing to `position`.
    #[must_use]
    pub fn tower_near(world: &World, position: Vec3) -> Option<TowerId> {
        world.towers.near(position, world.rules.cell_spacing)
    }

    /// Captures every enemy slot, dead ones included.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.snapshots())
    }

    /// Captures every player's economy in joining order.
    #[must_use]
    pub fn players(world: &World) -> Vec<PlayerSnapshot> {
        world.players.iter().map(|player| player.snapshot()).collect()
    }

    /// Captures a single player's economy.
    #[must_use]
    pub fn player(world: &World, number: PlayerNumber) -> Option<PlayerSnapshot> {
        world
            .players
            .iter()
            .find(|player| player.number == number)
            .map(|player| player.snapshot())
    }

    /// Captures every base in placement order.
    #[must_use]
    pub fn bases(world: &World) -> Vec<BaseSnapshot> {
        world.bases.iter().map(|base| base.snapshot()).collect()
    }

    /// Captures every tracked object in placement order.
    #[must_use]
    pub fn objects(world: &World) -> Vec<ObjectSnapshot> {
        world
            .objects
            .iter()
            .map(|object| ObjectSnapshot {
                id: object.id,
                kind: object.kind,
                position: object.position,
                yaw: object.yaw,
            })
            .collect()
    }

    /// Reports whether any tracked object moved since the last refresh.
    #[must_use]
    pub fn objects_changed(world: &World) -> bool {
        world.objects.changed()
    }

    /// Immutable representation of a tracked object.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ObjectSnapshot {
        /// Identifier allocated to the object.
        pub id: ObjectId,
        /// Classification of the object.
        pub kind: ObjectKind,
        /// Most recently reported world position.
        pub position: Vec3,
        /// Orientation linked during the last refresh.
        pub yaw: f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_without_field_is_ignored() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::RefreshField, &mut events);

        assert!(events.is_empty());
        assert!(query::display_path(&world).is_empty());
    }

    #[test]
    fn display_path_trims_spawn_and_base() {
        let mut world = World::new();
        world.current_path = vec![Vec3::ZERO, Vec3::X, Vec3::Z];
        assert_eq!(query::display_path(&world), &[Vec3::X]);

        world.current_path = vec![Vec3::ZERO];
        assert!(query::display_path(&world).is_empty());
    }

    #[test]
    fn rebuilding_the_field_requests_a_refresh() {
        let mut world = World::new();
        let mut events = Vec::new();
        for command in [
            Command::SetCorner {
                corner: FieldCorner::Origin,
                position: Vec3::ZERO,
            },
            Command::SetCorner {
                corner: FieldCorner::Far,
                position: Vec3::new(0.2, 0.0, 0.2),
            },
            Command::PlaceObject {
                kind: ObjectKind::Wall,
                position: Vec3::ZERO,
            },
            Command::BuildField,
            Command::RefreshField,
        ] {
            apply(&mut world, command, &mut events);
        }
        assert!(!query::objects_changed(&world));

        apply(&mut world, Command::BuildField, &mut events);

        assert!(query::objects_changed(&world));
        assert!(query::current_path(&world).is_empty());
    }

    #[test]
    fn failed_rebuild_keeps_the_previous_field() {
        let mut world = World::new();
        let mut events = Vec::new();
        world.origin_corner = Some(Vec3::ZERO);
        world.far_corner = Some(Vec3::new(0.1, 0.0, 0.1));
        apply(&mut world, Command::BuildField, &mut events);

        world.far_corner = Some(Vec3::new(-1.0, 0.0, 0.0));
        apply(&mut world, Command::BuildField, &mut events);

        assert_eq!(
            events.last(),
            Some(&Event::FieldRejected {
                reason: FieldError::NegativeExtent,
            })
        );
        assert_eq!(query::dimensions(&world), Some((2, 2)));
    }
}
