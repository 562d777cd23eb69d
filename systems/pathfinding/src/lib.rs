#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first shortest path search from a start cell to the base.
//!
//! The search walks the four cardinal neighbours in a fixed order (up, right,
//! down, left), so ties between equally short routes always resolve the same
//! way. Only free cells and the base are entered; blocked cells and spawn
//! cells are never traversed. Visited state lives in a scratch buffer owned by
//! the finder, separate from the cell classes, so the field itself is never
//! mutated by a search.

use std::collections::VecDeque;

use anchor_defence_core::{CellClass, CellCoord, FieldView};

const UNVISITED: usize = usize::MAX;

/// Shortest path finder that reuses scratch buffers between searches.
///
/// The finder carries no state that influences results: two searches over the
/// same field from the same start always return identical paths.
#[derive(Debug, Default)]
pub struct PathFinder {
    parents: Vec<usize>,
    frontier: VecDeque<usize>,
}

impl PathFinder {
    /// Creates a new path finder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the shortest walkable path from `start` to the base cell.
    ///
    /// When `start` is `None` the search begins at the field's spawn cell. The
    /// returned path includes the start cell and ends on the base cell; callers
    /// decide whether to drop either end. An empty path means there is no
    /// base, no spawn to start from, or no connecting route.
    #[must_use]
    pub fn shortest_path(&mut self, field: FieldView<'_>, start: Option<CellCoord>) -> Vec<CellCoord> {
        let (columns, rows) = field.dimensions();
        let Some(width) = usize::try_from(columns).ok().filter(|width| *width > 0) else {
            return Vec::new();
        };
        let Some(cell_count) = usize::try_from(rows)
            .ok()
            .and_then(|height| height.checked_mul(width))
        else {
            return Vec::new();
        };

        let Some(start) = start.or_else(|| field.find(CellClass::Spawn)) else {
            return Vec::new();
        };
        let Some(start_index) = index(width, start).filter(|index| *index < cell_count) else {
            return Vec::new();
        };

        self.parents.clear();
        self.parents.resize(cell_count, UNVISITED);
        self.frontier.clear();

        self.parents[start_index] = start_index;
        self.frontier.push_back(start_index);

        while let Some(current) = self.frontier.pop_front() {
            let cell = coord(width, current);
            for neighbor in neighbors(cell, columns, rows) {
                let Some(neighbor_index) = index(width, neighbor) else {
                    continue;
                };
                if self.parents[neighbor_index] != UNVISITED {
                    continue;
                }

                match field.class(neighbor) {
                    Some(CellClass::Free) => {
                        self.parents[neighbor_index] = current;
                        self.frontier.push_back(neighbor_index);
                    }
                    Some(CellClass::Base) => {
                        self.parents[neighbor_index] = current;
                        return self.trace_back(width, start_index, neighbor_index);
                    }
                    _ => {}
                }
            }
        }

        Vec::new()
    }

    fn trace_back(&self, width: usize, start: usize, goal: usize) -> Vec<CellCoord> {
        let mut path = vec![coord(width, goal)];
        let mut current = goal;
        while current != start {
            current = self.parents[current];
            path.push(coord(width, current));
        }
        path.reverse();
        path
    }
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    if column >= width {
        return None;
    }
    row.checked_mul(width)?.checked_add(column)
}

fn coord(width: usize, index: usize) -> CellCoord {
    // Indices originate from `u32` coordinates, so both halves fit.
    CellCoord::new((index % width) as u32, (index / width) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(columns: u32, rows: u32, marks: &[(u32, u32, CellClass)]) -> Vec<CellClass> {
        let mut cells = vec![CellClass::Free; (columns * rows) as usize];
        for &(column, row, class) in marks {
            cells[(row * columns + column) as usize] = class;
        }
        cells
    }

    #[test]
    fn neighbors_follow_up_right_down_left_order() {
        let order: Vec<_> = neighbors(CellCoord::new(1, 1), 3, 3).collect();
        assert_eq!(
            order,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(2, 1),
                CellCoord::new(1, 2),
                CellCoord::new(0, 1),
            ]
        );
    }

    #[test]
    fn neighbors_skip_out_of_bounds_cells() {
        let order: Vec<_> = neighbors(CellCoord::new(0, 0), 1, 1).collect();
        assert!(order.is_empty());
    }

    #[test]
    fn adjacent_base_yields_two_cell_path() {
        let cells = field(
            2,
            1,
            &[(0, 0, CellClass::Spawn), (1, 0, CellClass::Base)],
        );
        let path = PathFinder::new().shortest_path(FieldView::new(&cells, 2, 1), None);
        assert_eq!(path, vec![CellCoord::new(0, 0), CellCoord::new(1, 0)]);
    }

    #[test]
    fn tie_break_prefers_earlier_neighbor_direction() {
        // Both the right-then-down and down-then-right routes take two steps.
        let cells = field(
            2,
            2,
            &[(0, 0, CellClass::Spawn), (1, 1, CellClass::Base)],
        );
        let path = PathFinder::new().shortest_path(FieldView::new(&cells, 2, 2), None);
        assert_eq!(
            path,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(1, 1),
            ]
        );
    }

    #[test]
    fn spawn_cells_are_not_traversed_when_rerouting() {
        // The only route from (0, 1) to the base passes through the spawn.
        let cells = field(
            3,
            2,
            &[
                (1, 0, CellClass::Spawn),
                (2, 0, CellClass::Base),
                (1, 1, CellClass::Blocked),
            ],
        );
        let path = PathFinder::new()
            .shortest_path(FieldView::new(&cells, 3, 2), Some(CellCoord::new(0, 1)));
        assert!(path.is_empty());
    }

    #[test]
    fn start_on_base_finds_nothing() {
        let cells = field(
            2,
            1,
            &[(0, 0, CellClass::Spawn), (1, 0, CellClass::Base)],
        );
        let path = PathFinder::new()
            .shortest_path(FieldView::new(&cells, 2, 1), Some(CellCoord::new(1, 0)));
        assert!(path.is_empty());
    }

    #[test]
    fn missing_spawn_without_start_finds_nothing() {
        let cells = field(3, 1, &[(2, 0, CellClass::Base)]);
        let path = PathFinder::new().shortest_path(FieldView::new(&cells, 3, 1), None);
        assert!(path.is_empty());
    }

    #[test]
    fn out_of_bounds_start_finds_nothing() {
        let cells = field(2, 1, &[(1, 0, CellClass::Base)]);
        let path = PathFinder::new()
            .shortest_path(FieldView::new(&cells, 2, 1), Some(CellCoord::new(5, 0)));
        assert!(path.is_empty());
    }

    #[test]
    fn empty_field_finds_nothing() {
        let path = PathFinder::new().shortest_path(FieldView::new(&[], 0, 0), None);
        assert!(path.is_empty());
    }
}
