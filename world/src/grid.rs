//! Cell grid spanned by the two field corner anchors.

use anchor_defence_core::{CellClass, CellCoord, FieldError, FieldView, ObjectKind, Vec3};

use crate::ordinal;

/// Largest number of cells a field may hold.
const MAX_CELLS: u64 = 1 << 20;

/// A single grid cell together with its world placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    /// Column and row of the cell.
    pub coord: CellCoord,
    /// World position of the cell centre.
    pub position: Vec3,
    /// Current classification of the cell.
    pub class: CellClass,
}

/// Rectangular lattice of classified cells laid out on the play surface.
#[derive(Clone, Debug)]
pub struct GridField {
    root: Vec3,
    spacing: f32,
    columns: u32,
    rows: u32,
    classes: Vec<CellClass>,
}

impl GridField {
    /// Builds a grid rooted at `root` that extends towards `corner`.
    ///
    /// Cell `(column, row)` sits at `root + (column * spacing, 0, row * spacing)`.
    /// The far corner is rounded to the nearest cell, so it is always covered.
    pub fn build(root: Vec3, corner: Vec3, spacing: f32) -> Result<Self, FieldError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(FieldError::InvalidSpacing);
        }

        let half = spacing / 2.0;
        let last_column = ((corner.x + half - root.x) / spacing).floor();
        let last_row = ((corner.z + half - root.z) / spacing).floor();
        if !last_column.is_finite() || !last_row.is_finite() {
            return Err(FieldError::NegativeExtent);
        }
        if last_column < 0.0 || last_row < 0.0 {
            return Err(FieldError::NegativeExtent);
        }

        let columns = extent(last_column)?;
        let rows = extent(last_row)?;
        let cell_count = u64::from(columns) * u64::from(rows);
        if cell_count > MAX_CELLS {
            return Err(FieldError::TooLarge);
        }
        let cell_count = usize::try_from(cell_count).map_err(|_| FieldError::TooLarge)?;

        Ok(Self {
            root,
            spacing,
            columns,
            rows,
            classes: vec![CellClass::Free; cell_count],
        })
    }

    /// Number of columns and rows as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Distance between neighbouring cells.
    #[must_use]
    pub const fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Read-only view of the cell classes for path searches.
    #[must_use]
    pub fn view(&self) -> FieldView<'_> {
        FieldView::new(&self.classes, self.columns, self.rows)
    }

    /// World position of the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn cell_position(&self, cell: CellCoord) -> Option<Vec3> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        Some(
            self.root
                + Vec3::new(
                    cell.column() as f32 * self.spacing,
                    0.0,
                    cell.row() as f32 * self.spacing,
                ),
        )
    }

    /// Cell whose centre lies within half a spacing of `position` horizontally
    /// and within a full spacing vertically.
    ///
    /// Tolerance windows of adjacent cells touch, so a position on a boundary
    /// matches two cells; the later one in row-major order is returned.
    #[must_use]
    pub fn nearest_cell(&self, position: Vec3) -> Option<CellCoord> {
        let half = self.spacing / 2.0;
        self.cells()
            .filter(|cell| {
                let offset = cell.position - position;
                offset.x.abs() <= half && offset.y.abs() <= self.spacing && offset.z.abs() <= half
            })
            .last()
            .map(|cell| cell.coord)
    }

    /// Iterates every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let columns = self.columns.max(1);
        self.classes.iter().enumerate().map(move |(index, class)| {
            let column = ordinal(index) % columns;
            let row = ordinal(index) / columns;
            let coord = CellCoord::new(column, row);
            Cell {
                coord,
                position: self.root
                    + Vec3::new(
                        column as f32 * self.spacing,
                        0.0,
                        row as f32 * self.spacing,
                    ),
                class: *class,
            }
        })
    }

    /// Resets every cell to free and reclassifies it from the tracked objects.
    ///
    /// Objects outside the grid are ignored. Walls and towers block whatever
    /// they cover. A spawn never replaces a base and vice versa, and a later
    /// spawn or base moves the earlier one so at most one of each exists.
    pub fn classify<I>(&mut self, objects: I)
    where
        I: IntoIterator<Item = (ObjectKind, Vec3)>,
    {
        self.classes.fill(CellClass::Free);

        for (kind, position) in objects {
            let Some(cell) = self.nearest_cell(position) else {
                continue;
            };
            let Some(index) = self.index(cell) else {
                continue;
            };

            match kind.cell_class() {
                CellClass::Blocked => self.classes[index] = CellClass::Blocked,
                CellClass::Spawn => self.claim(index, CellClass::Spawn, CellClass::Base),
                CellClass::Base => self.claim(index, CellClass::Base, CellClass::Spawn),
                CellClass::Free => {}
            }
        }
    }

    /// Classification of a single cell.
    #[must_use]
    pub fn class(&self, cell: CellCoord) -> Option<CellClass> {
        self.index(cell).map(|index| self.classes[index])
    }

    /// First cell classified as the spawn point.
    #[must_use]
    pub fn spawn_cell(&self) -> Option<CellCoord> {
        self.view().find(CellClass::Spawn)
    }

    /// First cell classified as the base.
    #[must_use]
    pub fn base_cell(&self) -> Option<CellCoord> {
        self.view().find(CellClass::Base)
    }

    /// World position of the spawn cell.
    #[must_use]
    pub fn spawn_position(&self) -> Option<Vec3> {
        self.spawn_cell().and_then(|cell| self.cell_position(cell))
    }

    /// World position of the base cell.
    #[must_use]
    pub fn base_position(&self) -> Option<Vec3> {
        self.base_cell().and_then(|cell| self.cell_position(cell))
    }

    fn claim(&mut self, index: usize, class: CellClass, protected: CellClass) {
        if self.classes[index] == protected {
            return;
        }
        for existing in self.classes.iter_mut() {
            if *existing == class {
                *existing = CellClass::Free;
            }
        }
        self.classes[index] = class;
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let columns = usize::try_from(self.columns).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(columns)?.checked_add(column)
    }
}

fn extent(last_index: f32) -> Result<u32, FieldError> {
    if last_index >= MAX_CELLS as f32 {
        return Err(FieldError::TooLarge);
    }
    Ok(last_index as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(columns: u32, rows: u32) -> GridField {
        let spacing = 0.1;
        let corner = Vec3::new(
            (columns - 1) as f32 * spacing,
            0.0,
            (rows - 1) as f32 * spacing,
        );
        GridField::build(Vec3::ZERO, corner, spacing).expect("valid field")
    }

    #[test]
    fn build_rounds_far_corner_to_nearest_cell() {
        let grid = GridField::build(Vec3::ZERO, Vec3::new(0.43, 0.0, 0.27), 0.1)
            .expect("valid field");
        assert_eq!(grid.dimensions(), (5, 4));
    }

    #[test]
    fn build_rejects_bad_input() {
        assert_eq!(
            GridField::build(Vec3::ZERO, Vec3::ONE, 0.0).unwrap_err(),
            FieldError::InvalidSpacing
        );
        assert_eq!(
            GridField::build(Vec3::ZERO, Vec3::new(-1.0, 0.0, 1.0), 0.1).unwrap_err(),
            FieldError::NegativeExtent
        );
        assert_eq!(
            GridField::build(Vec3::ZERO, Vec3::new(1.0e6, 0.0, 1.0e6), 0.1).unwrap_err(),
            FieldError::TooLarge
        );
    }

    #[test]
    fn single_point_field_has_one_cell() {
        let grid = GridField::build(Vec3::ONE, Vec3::ONE, 0.1).expect("valid field");
        assert_eq!(grid.dimensions(), (1, 1));
        assert_eq!(grid.cell_position(CellCoord::new(0, 0)), Some(Vec3::ONE));
    }

    #[test]
    fn cell_positions_follow_root_and_spacing() {
        let grid = GridField::build(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.5, 2.0, 3.5), 0.25)
            .expect("valid field");
        assert_eq!(
            grid.cell_position(CellCoord::new(2, 1)),
            Some(Vec3::new(1.5, 2.0, 3.25))
        );
        assert_eq!(grid.cell_position(CellCoord::new(3, 0)), None);
    }

    #[test]
    fn nearest_cell_prefers_later_match_on_boundaries() {
        let grid = GridField::build(Vec3::ZERO, Vec3::new(0.5, 0.0, 0.5), 1.0)
            .expect("valid field");
        assert_eq!(grid.dimensions(), (2, 2));
        assert_eq!(
            grid.nearest_cell(Vec3::new(0.5, 0.0, 0.0)),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(
            grid.nearest_cell(Vec3::new(0.2, 0.9, 0.2)),
            Some(CellCoord::new(0, 0))
        );
        assert_eq!(grid.nearest_cell(Vec3::new(0.2, 1.5, 0.2)), None);
    }

    #[test]
    fn classify_is_idempotent() {
        let mut grid = field(5, 5);
        let objects = [
            (ObjectKind::Spawn, Vec3::ZERO),
            (ObjectKind::Base, Vec3::new(0.4, 0.0, 0.4)),
            (ObjectKind::Wall, Vec3::new(0.2, 0.0, 0.2)),
        ];

        grid.classify(objects);
        let first: Vec<CellClass> = grid.view().iter().collect();
        grid.classify(objects);
        let second: Vec<CellClass> = grid.view().iter().collect();

        assert_eq!(first, second);
        assert_eq!(grid.class(CellCoord::new(2, 2)), Some(CellClass::Blocked));
    }

    #[test]
    fn classify_drops_cells_of_removed_objects() {
        let mut grid = field(3, 3);
        grid.classify([(ObjectKind::Wall, Vec3::new(0.1, 0.0, 0.1))]);
        grid.classify([]);
        assert!(grid.view().iter().all(|class| class == CellClass::Free));
    }

    #[test]
    fn spawn_never_replaces_base() {
        let mut grid = field(3, 3);
        grid.classify([
            (ObjectKind::Base, Vec3::ZERO),
            (ObjectKind::Spawn, Vec3::ZERO),
        ]);
        assert_eq!(grid.class(CellCoord::new(0, 0)), Some(CellClass::Base));
        assert_eq!(grid.spawn_cell(), None);
    }

    #[test]
    fn later_spawn_moves_the_earlier_one() {
        let mut grid = field(3, 3);
        grid.classify([
            (ObjectKind::Spawn, Vec3::ZERO),
            (ObjectKind::Spawn, Vec3::new(0.2, 0.0, 0.2)),
        ]);
        assert_eq!(grid.spawn_cell(), Some(CellCoord::new(2, 2)));
        assert_eq!(grid.class(CellCoord::new(0, 0)), Some(CellClass::Free));
    }

    #[test]
    fn wall_overrides_spawn() {
        let mut grid = field(3, 3);
        grid.classify([
            (ObjectKind::Spawn, Vec3::ZERO),
            (ObjectKind::Tower, Vec3::ZERO),
        ]);
        assert_eq!(grid.class(CellCoord::new(0, 0)), Some(CellClass::Blocked));
        assert_eq!(grid.spawn_position(), None);
    }

    #[test]
    fn objects_outside_the_grid_are_ignored() {
        let mut grid = field(2, 2);
        grid.classify([(ObjectKind::Wall, Vec3::new(5.0, 0.0, 5.0))]);
        assert!(grid.view().iter().all(|class| class == CellClass::Free));
    }
}
