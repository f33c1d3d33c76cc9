//! Built-in battlefield layouts.

use tower_siege_core::MapKind;

use crate::grid::{GridError, TileGrid};

/// Side length of a tile in the built-in layouts.
pub const TILE_LENGTH: f32 = 64.0;

const FOREST: &str = "
T T T T T T T T T T T T T T T T T T T T
T T T T T T T T T T T T T T T T T T T T
T # # # # # # # # # # # # # # # # # # E
T # T T T T T T T T T T T T T T T T T T
T # T T T T T T T T T T T T T T T T T T
T # T T T T T T T T T T T T T T T T T T
T # # # # T T T T # # # # # T T T T T T
T T T T # T T T T # T T T # T T T T T T
T T T T # T T T T # T T T # T T T T T T
T T T T # T T T T # T T T # T T T T T T
T T T T # # # # # # T T T # # # # # # T
T T T T T T T T T T T T T T T T T T # T
T # # # # # # # # # # # # # # # # # # T
T # T T T T T T T T T T T T T T T T T T
T # # # # # # # # # # # # # # # # # # S
";

const CITY: &str = "
T T T E T T T T T T T T T T T T T T T T
T T T # # # # # # # # # # # # # # # T T
T T T T T T T T T T T T T T T T T # T T
T T T T T T T T T T T T T T T T T # T T
T T T T T T T T T T T T T T T T T # T T
T T T T T T T T T T T T T T T T T # T T
T T T T T T T T T T T T # # # # # # T T
T T T T T T # # # # # # # T T T T T T T
T T T T T T # T T T T T T T T T T T T T
T T # # # # # T T T T T T T T T T T T T
T T # T T T T T T T T T T T T T T T T T
T T # T T T # # # # # # # # # # # T T T
T T # T T T # T T T T T T T T T # # T T
T T # # # # # T T T T T T T T T T # T T
T T T T T T T T T T T T T T T T T # # S
";

const HELL: &str = "
T T T E T T T T T T T T T T T T T T T T
T T T # T T T T T T T T T T T T T T T T
T T T # T T T T T T T T T T T T T T T T
T T T # T T T T T T T T T T T T T T T T
T T T # # # # # # # # # # T T T T T T T
T T T T T T T T T T T T # T T T T T T T
T T T T T T T T T T T T # T T T T T T T
T T T T T T # # # # # # # T T T T T T T
T T T T T T # T # T T T T T T T T T T T
T T # # # # # T # T T T T T T T T T T T
T T # T T T T T # T T T T T T T T T T T
T T # T T T T T # # # # # # # # # T T T
T T # T T T T T T T T T T T T T # # T T
T T # T T T T T T T T T T T T T T # T T
T T S T T T T T T T T T T T T T T # # S
";

const CYBER: &str = "
T T T E T T T T T T T T T T T T T T T T
T T T # T T T T T T T T T T T T T T T T
T T T # T T T T T T T T T T T T T T T T
T T T # # # # # # # T T T T T T T T T T
T T T T T T T T T # T T T T T T T T T T
T T T T T T # # # # # # # T T T T T T T
T T T T T T # T T T T T # T T T T T T T
T T # # # # # T T T T T # T T T T T T T
T T # T T T T T T T T T # T T T T T T T
T T # T T T T T T T T T # # # # # T T T
T T # T T T T T T T T T T T T T # T T T
T T # # # # # # # T T T T T T T # T T T
T T T T T T T T # T T T T T T T # T T T
T T T T T T T T # # # # # # # # # # T T
T T T T T T T T T T T T T T T T T # # S
";

/// Text of a built-in layout.
#[must_use]
pub const fn layout(map: MapKind) -> &'static str {
    match map {
        MapKind::Forest => FOREST,
        MapKind::City => CITY,
        MapKind::Hell => HELL,
        MapKind::Cyber => CYBER,
    }
}

/// Parses a built-in layout at the canonical tile length.
///
/// # Errors
///
/// Propagates [`GridError`] from [`TileGrid::parse`].
pub fn builtin(map: MapKind) -> Result<TileGrid, GridError> {
    TileGrid::parse(layout(map), TILE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_layout_is_twenty_by_fifteen() {
        for map in MapKind::ALL {
            let grid = builtin(map).expect("built-in layout parses");
            assert_eq!((grid.columns(), grid.rows()), (20, 15), "{map}");
            assert!(grid.end().is_some(), "{map}");
        }
    }

    #[test]
    fn only_hell_has_two_entrances() {
        for map in MapKind::ALL {
            let grid = builtin(map).expect("built-in layout parses");
            let expected = if map == MapKind::Hell { 2 } else { 1 };
            assert_eq!(grid.starts().len(), expected, "{map}");
        }
    }
}
