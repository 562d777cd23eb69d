#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Anchor Defence engine.
//!
//! This crate defines the message surface that connects the presentation
//! adapter, the authoritative world, and pure systems. Adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use std::{fmt, str::FromStr, time::Duration};

pub use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distance between two positions measured on the horizontal (x, z) plane.
///
/// Height differences are ignored so that anchors lying slightly above or
/// below the play surface still compare as expected.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Tunable rules that parameterise a game session.
///
/// Every field falls back to its default when omitted from a configuration
/// file, so partial overrides are valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Distance between neighbouring grid cells in world units.
    pub cell_spacing: f32,
    /// Upper bound applied to every player's money.
    pub money_ceiling: f64,
    /// Money granted to a player when they join.
    pub starting_money: f64,
    /// Money earned per second by every player.
    pub income_per_second: f64,
    /// Health assigned to a freshly placed base.
    pub base_health: i32,
    /// Damage dealt by an unupgraded tower.
    pub tower_damage: i32,
    /// Seconds between two shots of an unupgraded tower.
    pub tower_interval_secs: f64,
    /// Unupgraded tower range expressed in cell spacings.
    pub tower_range_cells: f32,
    /// Base price of a damage upgrade.
    pub damage_upgrade_price: f64,
    /// Base price of a speed upgrade.
    pub speed_upgrade_price: f64,
    /// Base price of a range upgrade.
    pub range_upgrade_price: f64,
    /// Shortest attack interval a speed upgrade may produce.
    pub min_tower_interval_secs: f64,
    /// Interval of the periodic refresh/income tick.
    pub clock_interval_secs: f64,
}

impl GameRules {
    /// Base range of a tower in world units.
    #[must_use]
    pub fn tower_base_range(&self) -> f32 {
        self.cell_spacing * self.tower_range_cells
    }

    /// Interval of the periodic clock as a [`Duration`].
    ///
    /// Non-positive or non-finite values collapse to zero, which disables the
    /// clock rather than panicking.
    #[must_use]
    pub fn clock_interval(&self) -> Duration {
        seconds_to_duration(self.clock_interval_secs)
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            cell_spacing: 0.1,
            money_ceiling: 99_999.0,
            starting_money: 0.0,
            income_per_second: 100.0,
            base_health: 20,
            tower_damage: 3,
            tower_interval_secs: 1.5,
            tower_range_cells: 1.5,
            damage_upgrade_price: 20.0,
            speed_upgrade_price: 50.0,
            range_upgrade_price: 50.0,
            min_tower_interval_secs: 0.1,
            clock_interval_secs: 0.5,
        }
    }
}

/// Converts fractional seconds into a [`Duration`], clamping invalid input to zero.
#[must_use]
pub fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f64(seconds)
    } else {
        Duration::ZERO
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Records the observed position of one of the two field corner anchors.
    SetCorner {
        /// Which corner anchor was observed.
        corner: FieldCorner,
        /// World position of the anchor.
        position: Vec3,
    },
    /// Builds (or rebuilds) the cell grid spanned by the two corners.
    BuildField,
    /// Registers a classified game object reported by the presentation layer.
    PlaceObject {
        /// Classification of the object.
        kind: ObjectKind,
        /// World position of the object.
        position: Vec3,
    },
    /// Reports that a tracked object was observed at a new position.
    MoveObject {
        /// Identifier of the moved object.
        object: ObjectId,
        /// Newly observed world position.
        position: Vec3,
    },
    /// Records the orientation that tracked objects should be linked to.
    OrientObjects {
        /// Rotation around the vertical axis in radians.
        yaw: f32,
    },
    /// Reclassifies the grid from the tracked objects and reroutes enemies.
    RefreshField,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a tower fire at its preferred target.
    FireTower {
        /// Identifier of the firing tower.
        tower: TowerId,
    },
    /// Requests a new enemy at the spawn cell.
    SpawnEnemy {
        /// Starting health of the enemy.
        health: i32,
        /// Damage inflicted on the base when the enemy arrives.
        damage: i32,
        /// Seconds the enemy needs to traverse one grid step.
        speed: f64,
        /// Player whose base the enemy attacks.
        target_player: PlayerNumber,
    },
    /// Launches every enemy that has not started running yet.
    SendEnemies,
    /// Credits income for the provided elapsed interval to every player.
    ApplyIncome {
        /// Simulated time covered by the income payment.
        elapsed: Duration,
    },
    /// Adds a new player to the session.
    AddPlayer,
    /// Purchases a tower upgrade on behalf of a player.
    UpgradeTower {
        /// Player paying for the upgrade.
        player: PlayerNumber,
        /// Tower receiving the upgrade.
        tower: TowerId,
        /// Attribute being upgraded.
        axis: UpgradeAxis,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the cell grid was built.
    FieldBuilt {
        /// Number of cell columns.
        columns: u32,
        /// Number of cell rows.
        rows: u32,
    },
    /// Reports that the grid could not be built.
    FieldRejected {
        /// Specific reason the build failed.
        reason: FieldError,
    },
    /// Confirms that an object is now tracked.
    ObjectPlaced {
        /// Identifier allocated to the object.
        object: ObjectId,
        /// Classification of the object.
        kind: ObjectKind,
    },
    /// Confirms that a tower entity was created.
    TowerPlaced {
        /// Identifier allocated to the tower.
        tower: TowerId,
        /// World position of the tower.
        position: Vec3,
    },
    /// Confirms that a base entity was created.
    BasePlaced {
        /// Player owning the base.
        owner: PlayerNumber,
    },
    /// Confirms that the grid was reclassified and enemies rerouted.
    FieldRefreshed {
        /// Number of cells on the current spawn-to-base path.
        path_len: usize,
        /// Number of enemies that received a new path.
        rerouted: usize,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy was created.
    EnemySpawned {
        /// Slot holding the enemy.
        slot: EnemySlot,
        /// Whether a dead enemy's slot was overwritten.
        reused: bool,
    },
    /// Reports that a spawn request was dropped.
    EnemySpawnRejected {
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that idle enemies were launched.
    EnemiesSent {
        /// Number of enemies launched.
        count: usize,
    },
    /// Reports that an enemy ran out of path before reaching its target.
    EnemyStuck {
        /// Slot of the stuck enemy.
        slot: EnemySlot,
    },
    /// Reports a tower shot.
    TowerFired {
        /// Tower that fired.
        tower: TowerId,
        /// Slot of the enemy that was hit.
        target: EnemySlot,
        /// Damage dealt by the shot.
        damage: i32,
    },
    /// Reports that an enemy's health dropped to zero or below.
    EnemyKilled {
        /// Slot of the dead enemy.
        slot: EnemySlot,
    },
    /// Reports that an enemy reached its base and dealt damage.
    EnemyReachedBase {
        /// Slot of the arriving enemy.
        slot: EnemySlot,
        /// Owner of the damaged base.
        player: PlayerNumber,
        /// Damage applied to the base.
        damage: i32,
    },
    /// Reports that an arriving enemy found no base owned by its target player.
    OrphanDamageDropped {
        /// Slot of the arriving enemy.
        slot: EnemySlot,
        /// Player the enemy was sent against.
        player: PlayerNumber,
    },
    /// Reports that a base's health dropped to zero or below.
    BaseDestroyed {
        /// Owner of the destroyed base.
        owner: PlayerNumber,
    },
    /// Confirms that income was credited.
    IncomeApplied {
        /// Simulated time covered by the payment.
        elapsed: Duration,
    },
    /// Confirms that a player joined.
    PlayerAdded {
        /// Number assigned to the player.
        player: PlayerNumber,
    },
    /// Confirms a purchased tower upgrade.
    TowerUpgraded {
        /// Upgraded tower.
        tower: TowerId,
        /// Upgraded attribute.
        axis: UpgradeAxis,
        /// Money deducted from the buyer.
        cost: f64,
    },
    /// Reports that an upgrade purchase was refused without changing state.
    TowerUpgradeRejected {
        /// Tower targeted by the purchase.
        tower: TowerId,
        /// Attribute targeted by the purchase.
        axis: UpgradeAxis,
        /// Specific reason the purchase failed.
        reason: UpgradeError,
    },
}

/// The two anchors that span the play field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCorner {
    /// Top-left corner; doubles as the grid's root position.
    Origin,
    /// Bottom-right corner bounding the grid extent.
    Far,
}

/// Classification reported by the presentation layer for a tracked object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Enemy spawn point.
    Spawn,
    /// Player base.
    Base,
    /// Obstacle without behaviour.
    Wall,
    /// Defensive tower; also blocks its cell.
    Tower,
}

impl ObjectKind {
    /// Cell classification produced when an object of this kind covers a cell.
    #[must_use]
    pub const fn cell_class(self) -> CellClass {
        match self {
            Self::Spawn => CellClass::Spawn,
            Self::Base => CellClass::Base,
            Self::Wall | Self::Tower => CellClass::Blocked,
        }
    }

    /// Lowercase label used by the presentation layer.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Base => "base",
            Self::Wall => "wall",
            Self::Tower => "tower",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when an anchor label does not name a known object kind.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown object kind `{0}`")]
pub struct UnknownObjectKind(pub String);

impl FromStr for ObjectKind {
    type Err = UnknownObjectKind;

    /// Parses an anchor label. Labels containing `wall` or `tower` map to those
    /// kinds so numbered anchors such as `wall3` are accepted.
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "spawn" => Ok(Self::Spawn),
            "base" => Ok(Self::Base),
            other if other.contains("tower") => Ok(Self::Tower),
            other if other.contains("wall") => Ok(Self::Wall),
            other => Err(UnknownObjectKind(other.to_owned())),
        }
    }
}

/// Classification of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellClass {
    /// Walkable cell.
    #[default]
    Free,
    /// Cell covered by a wall or tower.
    Blocked,
    /// Cell where enemies enter the field.
    Spawn,
    /// Cell holding the base enemies walk towards.
    Base,
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Identifier assigned to a tracked object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a tower; towers are never removed, so it doubles as an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a reusable enemy slot.
///
/// A slot names storage, not an enemy: once the occupant dies the slot may be
/// overwritten by the next spawn, so holders must revalidate it before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemySlot(u32);

impl EnemySlot {
    /// Creates a slot handle from its numeric index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the slot.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Stable player number; the first player is number one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerNumber(u32);

impl PlayerNumber {
    /// Creates a new player number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the player number.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Lifecycle state of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Spawned but not yet sent.
    Idle,
    /// Consuming path steps.
    Running,
    /// Out of path without having reached its target.
    Stuck,
    /// Reached its target; awaiting arrival resolution.
    Finished,
    /// Killed or resolved. The slot may be reused.
    Dead,
}

/// Tower attribute that can be purchased as an upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeAxis {
    /// Increases the damage per shot by one.
    Damage,
    /// Shortens the attack interval by a tenth of a second.
    Speed,
    /// Widens the targeting radius by a fifth of the base range.
    Range,
}

/// Reasons the cell grid cannot be built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum FieldError {
    /// The cell spacing is zero, negative, or not finite.
    #[error("cell spacing must be a positive finite number")]
    InvalidSpacing,
    /// The far corner lies before the origin corner on some axis.
    #[error("far corner lies before the origin corner")]
    NegativeExtent,
    /// One or both corner anchors have not been observed yet.
    #[error("both field corners must be observed before building the field")]
    MissingCorner,
    /// The corners span more cells than the engine is willing to allocate.
    #[error("field spans too many cells")]
    TooLarge,
}

/// Reasons an enemy spawn request is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SpawnError {
    /// No cell is currently classified as the spawn point.
    #[error("no spawn point is classified on the field")]
    NoSpawnPoint,
    /// The requested step duration is not a positive finite number.
    #[error("enemy speed must be a positive number of seconds per step")]
    InvalidSpeed,
}

/// Reasons an upgrade purchase is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// The player cannot afford the upgrade.
    #[error("insufficient funds for upgrade")]
    InsufficientFunds,
    /// The tower already fires at the fastest permitted interval.
    #[error("attack interval already at its floor")]
    SpeedFloor,
    /// No tower with the provided identifier exists.
    #[error("unknown tower")]
    UnknownTower,
    /// No player with the provided number exists.
    #[error("unknown player")]
    UnknownPlayer,
}

/// Read-only view into the classified cell grid.
#[derive(Clone, Copy, Debug)]
pub struct FieldView<'a> {
    cells: &'a [CellClass],
    columns: u32,
    rows: u32,
}

impl<'a> FieldView<'a> {
    /// Captures a new field view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(cells: &'a [CellClass], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Returns the classification of the provided cell, if it lies within the grid.
    #[must_use]
    pub fn class(&self, cell: CellCoord) -> Option<CellClass> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Returns the first cell, in row-major order, carrying the provided class.
    #[must_use]
    pub fn find(&self, class: CellClass) -> Option<CellCoord> {
        let width = usize::try_from(self.columns).ok()?;
        if width == 0 {
            return None;
        }
        let index = self.cells.iter().position(|cell| *cell == class)?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Returns an iterator over all cell classes in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = CellClass> + 'a {
        self.cells.iter().copied()
    }

    /// Provides the dimensions of the underlying grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Purchase prices of the three upgrade axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct UpgradeCosts {
    /// Price of the next damage upgrade.
    pub damage: f64,
    /// Price of the next speed upgrade.
    pub speed: f64,
    /// Price of the next range upgrade.
    pub range: f64,
}

impl UpgradeCosts {
    /// Price for the provided axis.
    #[must_use]
    pub const fn for_axis(&self, axis: UpgradeAxis) -> f64 {
        match axis {
            UpgradeAxis::Damage => self.damage,
            UpgradeAxis::Speed => self.speed,
            UpgradeAxis::Range => self.range,
        }
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// World position of the tower.
    pub position: Vec3,
    /// Damage dealt per shot.
    pub damage: i32,
    /// Seconds between two shots.
    pub interval_secs: f64,
    /// Targeting radius in world units.
    pub range: f32,
    /// Number of purchased damage upgrades.
    pub damage_upgrades: u32,
    /// Number of purchased speed upgrades.
    pub speed_upgrades: u32,
    /// Number of purchased range upgrades.
    pub range_upgrades: u32,
    /// Prices of the next upgrade on each axis.
    pub costs: UpgradeCosts,
}

/// Read-only snapshot describing all towers on the field.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Time remaining until a tower may fire again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Tower the cooldown belongs to.
    pub tower: TowerId,
    /// Simulated time left before the next shot; zero means ready.
    pub ready_in: Duration,
}

/// Read-only snapshot of every tower's firing cooldown.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over the captured cooldowns in tower order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy slot used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnemySnapshot {
    /// Slot holding the enemy.
    pub slot: EnemySlot,
    /// Lifecycle state of the enemy.
    pub state: EnemyState,
    /// Remaining health.
    pub health: i32,
    /// Damage dealt on arrival.
    pub damage: i32,
    /// Current, possibly interpolated, world position.
    pub position: Vec3,
    /// Distance left along the enemy's path.
    pub remaining_distance: f32,
    /// Player whose base the enemy attacks.
    pub target_player: PlayerNumber,
}

/// Read-only snapshot describing every enemy slot.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.slot);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of slots captured, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a player's economy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    /// Stable player number.
    pub number: PlayerNumber,
    /// Current money.
    pub money: f64,
    /// Income per second.
    pub income: f64,
}

/// Immutable representation of a base.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BaseSnapshot {
    /// Player owning the base.
    pub owner: PlayerNumber,
    /// World position of the base anchor.
    pub position: Vec3,
    /// Remaining health; non-positive values signal a lost base.
    pub health: i32,
}

#[cfg(test)]
mod tests {
    use super::{
        planar_distance, CellClass, CellCoord, FieldView, GameRules, ObjectKind, UpgradeError,
        Vec3,
    };

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 5.0, 0.0);
        let b = Vec3::new(3.0, -2.0, 4.0);
        assert!((planar_distance(a, b) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn anchor_labels_parse_into_kinds() {
        assert_eq!("spawn".parse::<ObjectKind>(), Ok(ObjectKind::Spawn));
        assert_eq!("base".parse::<ObjectKind>(), Ok(ObjectKind::Base));
        assert_eq!("wall7".parse::<ObjectKind>(), Ok(ObjectKind::Wall));
        assert_eq!("tower_2".parse::<ObjectKind>(), Ok(ObjectKind::Tower));
        assert!("TopLeft".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn towers_and_walls_both_block() {
        assert_eq!(ObjectKind::Wall.cell_class(), CellClass::Blocked);
        assert_eq!(ObjectKind::Tower.cell_class(), CellClass::Blocked);
        assert_eq!(ObjectKind::Spawn.cell_class(), CellClass::Spawn);
        assert_eq!(ObjectKind::Base.cell_class(), CellClass::Base);
    }

    #[test]
    fn field_view_finds_first_matching_cell() {
        let cells = [
            CellClass::Free,
            CellClass::Spawn,
            CellClass::Free,
            CellClass::Base,
            CellClass::Free,
            CellClass::Base,
        ];
        let view = FieldView::new(&cells, 3, 2);
        assert_eq!(view.find(CellClass::Spawn), Some(CellCoord::new(1, 0)));
        assert_eq!(view.find(CellClass::Base), Some(CellCoord::new(0, 1)));
        assert_eq!(view.find(CellClass::Blocked), None);
        assert_eq!(view.class(CellCoord::new(3, 0)), None);
    }

    #[test]
    fn default_rules_derive_tower_range_from_spacing() {
        let rules = GameRules::default();
        assert!((rules.tower_base_range() - 0.15).abs() < 1e-6);
        assert_eq!(rules.clock_interval().as_millis(), 500);
    }

    #[test]
    fn rules_round_trip_through_bincode() {
        let encoded = bincode::serialize(&GameRules {
            income_per_second: 40.0,
            ..GameRules::default()
        })
        .expect("serialize");
        let restored: GameRules = bincode::deserialize(&encoded).expect("deserialize");
        assert!((restored.income_per_second - 40.0).abs() < f64::EPSILON);
        assert_eq!(restored.base_health, GameRules::default().base_health);
    }

    #[test]
    fn upgrade_errors_render_readable_messages() {
        assert_eq!(
            UpgradeError::InsufficientFunds.to_string(),
            "insufficient funds for upgrade"
        );
    }
}
