#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid pathfinder that turns a tile layout into the routes enemies walk.
//!
//! Routes are derived once per level with a breadth-first search over the
//! 4-connected walkable tiles. Every start tile yields its own route. When no
//! walkable connection exists the route degrades to the straight segment
//! between the best known anchors and is flagged as degraded.

mod grid;
pub mod maps;

use std::collections::VecDeque;

use tower_siege_core::{CellCoord, PathNotFound, Vec2};

pub use grid::{CellKind, GridError, TileGrid};

/// Ordered waypoints an enemy follows from its spawn to the base.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    waypoints: Vec<Vec2>,
    degraded: bool,
}

impl Route {
    fn walkable(waypoints: Vec<Vec2>) -> Self {
        Self {
            waypoints,
            degraded: false,
        }
    }

    fn fallback(start: Vec2, end: Vec2) -> Self {
        Self {
            waypoints: vec![start, end],
            degraded: true,
        }
    }

    /// Waypoints in travel order; always at least two.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Spawn position.
    #[must_use]
    pub fn start(&self) -> Vec2 {
        self.waypoints.first().copied().unwrap_or(Vec2::ZERO)
    }

    /// Base position.
    #[must_use]
    pub fn end(&self) -> Vec2 {
        self.waypoints.last().copied().unwrap_or(Vec2::ZERO)
    }

    /// Reports whether the route is the straight fallback segment.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }
}

/// Finds the shortest 4-connected walkable cell sequence from `start` to `end`.
///
/// Neighbours are explored east, west, south, north, so among equally short
/// routes the first one found in that order wins.
///
/// # Errors
///
/// Returns [`PathNotFound`] if either endpoint is not walkable or no
/// connection exists.
pub fn compute_path(
    grid: &TileGrid,
    start: CellCoord,
    end: CellCoord,
) -> Result<Vec<CellCoord>, PathNotFound> {
    let not_found = PathNotFound { start, end };
    if !grid.is_walkable(start) || !grid.is_walkable(end) {
        return Err(not_found);
    }

    let mut predecessors: Vec<Option<CellCoord>> = vec![None; grid.cell_count()];
    let mut visited = vec![false; grid.cell_count()];
    let mut queue = VecDeque::new();

    let start_index = grid.index(start).ok_or(not_found)?;
    visited[start_index] = true;
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        if cell == end {
            return Ok(unwind(grid, &predecessors, start, end));
        }

        for neighbor in neighbors(cell, grid.columns(), grid.rows()) {
            if !grid.is_walkable(neighbor) {
                continue;
            }
            let Some(index) = grid.index(neighbor) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;
            predecessors[index] = Some(cell);
            queue.push_back(neighbor);
        }
    }

    Err(not_found)
}

/// Derives one route per start tile, in row-major start order.
///
/// Layouts without a start or end tile, and starts that cannot reach the
/// end, produce a degraded straight route instead of failing.
#[must_use]
pub fn derive_routes(grid: &TileGrid) -> Vec<Route> {
    let starts = grid.starts();
    let end = grid.end();

    let end_anchor = end.map_or_else(|| fallback_end_anchor(grid), |cell| grid.cell_center(cell));
    if starts.is_empty() {
        log::warn!("layout has no start tile; using a straight fallback route");
        return vec![Route::fallback(fallback_start_anchor(grid), end_anchor)];
    }

    starts
        .into_iter()
        .map(|start| {
            let start_anchor = grid.cell_center(start);
            let Some(end) = end else {
                log::warn!("layout has no end tile; using a straight fallback route");
                return Route::fallback(start_anchor, end_anchor);
            };
            match compute_path(grid, start, end) {
                Ok(cells) => Route::walkable(
                    cells
                        .into_iter()
                        .map(|cell| grid.cell_center(cell))
                        .collect(),
                ),
                Err(error) => {
                    log::warn!("{error}; using a straight fallback route");
                    Route::fallback(start_anchor, end_anchor)
                }
            }
        })
        .collect()
}

fn fallback_start_anchor(grid: &TileGrid) -> Vec2 {
    let tile = grid.tile_length();
    let row = grid.rows().saturating_sub(2);
    Vec2::new(2.0_f32.min(grid.columns() as f32) * tile, row as f32 * tile)
}

fn fallback_end_anchor(grid: &TileGrid) -> Vec2 {
    let tile = grid.tile_length();
    let column = grid.columns().saturating_sub(1);
    Vec2::new(column as f32 * tile, 2.0_f32.min(grid.rows() as f32) * tile)
}

fn unwind(
    grid: &TileGrid,
    predecessors: &[Option<CellCoord>],
    start: CellCoord,
    end: CellCoord,
) -> Vec<CellCoord> {
    let mut cells = vec![end];
    let mut current = end;
    while current != start {
        let Some(previous) = grid
            .index(current)
            .and_then(|index| predecessors.get(index).copied().flatten())
        else {
            break;
        };
        cells.push(previous);
        current = previous;
    }
    cells.reverse();
    cells
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}
