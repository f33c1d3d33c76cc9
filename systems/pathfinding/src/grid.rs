//! Tile grid parsed from a textual level description.

use tower_siege_core::{CellCoord, Vec2};

/// Classification of a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Buildable tower spot (`T`).
    TowerSpot,
    /// Walkable path tile (`#`).
    Path,
    /// Route origin (`S`).
    Start,
    /// Route destination (`E`).
    End,
    /// Neither buildable nor walkable (`.`).
    Blocked,
}

impl CellKind {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "T" => Some(Self::TowerSpot),
            "#" => Some(Self::Path),
            "S" => Some(Self::Start),
            "E" => Some(Self::End),
            "." => Some(Self::Blocked),
            _ => None,
        }
    }

    /// Reports whether enemies may walk across the tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Path | Self::Start | Self::End)
    }
}

/// Errors raised while parsing a level description.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The layout contains no tiles.
    #[error("layout is empty")]
    Empty,
    /// A row has a different number of tiles than the first row.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: u32,
        /// Tiles found in the row.
        found: u32,
        /// Tiles found in the first row.
        expected: u32,
    },
    /// A token is not one of `T # S E .`.
    #[error("unknown tile `{token}` at column {column}, row {row}")]
    UnknownTile {
        /// Offending token.
        token: String,
        /// Zero-based column index.
        column: u32,
        /// Zero-based row index.
        row: u32,
    },
    /// The layout has more than one end tile.
    #[error("layout has {0} end tiles, at most one is allowed")]
    MultipleEnds(usize),
}

/// Immutable tile grid with row zero at the top of the field.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_length: f32,
    cells: Vec<CellKind>,
}

impl TileGrid {
    /// Parses whitespace separated tokens, one text line per row.
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] if the text is empty, ragged, contains an
    /// unknown token or declares more than one end tile.
    pub fn parse(layout: &str, tile_length: f32) -> Result<Self, GridError> {
        let mut cells = Vec::new();
        let mut columns = None;
        let mut rows = 0_u32;

        for line in layout.lines().filter(|line| !line.trim().is_empty()) {
            let mut found = 0_u32;
            for token in line.split_whitespace() {
                let kind = CellKind::from_token(token).ok_or_else(|| GridError::UnknownTile {
                    token: token.to_owned(),
                    column: found,
                    row: rows,
                })?;
                cells.push(kind);
                found += 1;
            }

            let expected = *columns.get_or_insert(found);
            if found != expected {
                return Err(GridError::RaggedRow {
                    row: rows,
                    found,
                    expected,
                });
            }
            rows += 1;
        }

        let columns = columns.unwrap_or(0);
        if columns == 0 || rows == 0 {
            return Err(GridError::Empty);
        }

        let ends = cells.iter().filter(|kind| **kind == CellKind::End).count();
        if ends > 1 {
            return Err(GridError::MultipleEnds(ends));
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            cells,
        })
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a tile in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Field width in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Field height in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Tile classification, `None` outside the grid.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> Option<CellKind> {
        self.index(cell).and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether `cell` lies inside the grid and is walkable.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.kind(cell).is_some_and(CellKind::is_walkable)
    }

    /// Start tiles in row-major order.
    #[must_use]
    pub fn starts(&self) -> Vec<CellCoord> {
        self.cells_of(CellKind::Start).collect()
    }

    /// The end tile, if present.
    #[must_use]
    pub fn end(&self) -> Option<CellCoord> {
        self.cells_of(CellKind::End).next()
    }

    /// Buildable tiles in row-major order.
    #[must_use]
    pub fn tower_spots(&self) -> Vec<CellCoord> {
        self.cells_of(CellKind::TowerSpot).collect()
    }

    /// World-space centre of a tile.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        let half = self.tile_length / 2.0;
        Vec2::new(
            cell.column() as f32 * self.tile_length + half,
            cell.row() as f32 * self.tile_length + half,
        )
    }

    /// Tile containing a world position, `None` outside the grid.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        if self.tile_length <= 0.0 || position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let column = (position.x / self.tile_length).floor() as u32;
        let row = (position.y / self.tile_length).floor() as u32;
        (column < self.columns && row < self.rows).then(|| CellCoord::new(column, row))
    }

    /// Reports whether a position lies within the field grown by `margin`.
    #[must_use]
    pub fn contains_with_margin(&self, position: Vec2, margin: f32) -> bool {
        position.x >= -margin
            && position.y >= -margin
            && position.x <= self.width() + margin
            && position.y <= self.height() + margin
    }

    fn cells_of(&self, wanted: CellKind) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, kind)| **kind == wanted)
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(CellCoord::new(index % columns, index / columns))
            })
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
