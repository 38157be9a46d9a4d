//! Integer grid geometry: cells, bounds, line rasterization, and tri-state
//! neighbour matching.

use serde::{Deserialize, Serialize};

use crate::rng::Roll;
use crate::surface::ChunkSurface;

/// Integer tile coordinate inside a chunk surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn up(self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    #[must_use]
    pub const fn down(self) -> Self {
        Self::new(self.x, self.y - 1)
    }
}

/// World-space position of a spawned instance (chunk origin applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: i32,
    pub y: i32,
}

/// Axis-aligned cell bounds; `x_max` and `y_max` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellBounds {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl CellBounds {
    #[must_use]
    pub const fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    #[must_use]
    pub const fn size_x(self) -> i32 {
        if self.x_max > self.x_min {
            self.x_max - self.x_min
        } else {
            0
        }
    }

    #[must_use]
    pub const fn size_y(self) -> i32 {
        if self.y_max > self.y_min {
            self.y_max - self.y_min
        } else {
            0
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.size_x() == 0 || self.size_y() == 0
    }

    #[must_use]
    pub const fn contains(self, cell: Cell) -> bool {
        cell.x >= self.x_min && cell.x < self.x_max && cell.y >= self.y_min && cell.y < self.y_max
    }

    /// Smallest bounds covering both `self` and `cell`.
    #[must_use]
    pub const fn including(self, cell: Cell) -> Self {
        if self.is_empty() {
            return Self::new(cell.x, cell.y, cell.x + 1, cell.y + 1);
        }
        Self {
            x_min: if cell.x < self.x_min { cell.x } else { self.x_min },
            y_min: if cell.y < self.y_min { cell.y } else { self.y_min },
            x_max: if cell.x + 1 > self.x_max { cell.x + 1 } else { self.x_max },
            y_max: if cell.y + 1 > self.y_max { cell.y + 1 } else { self.y_max },
        }
    }

    /// Bounds with `rows` of headroom added above and below.
    #[must_use]
    pub const fn grown_vertically(self, rows: i32) -> Self {
        if self.is_empty() {
            return self;
        }
        Self::new(self.x_min, self.y_min - rows, self.x_max, self.y_max + rows)
    }
}

/// Bresenham rasterization of the segment `start..=end`.
///
/// Yields both endpoints; once exhausted it stays exhausted.
#[must_use]
pub fn rasterize_line(start: Cell, end: Cell) -> LineIter {
    let dx = (end.x - start.x).abs();
    let dy = -(end.y - start.y).abs();
    LineIter {
        cursor: start,
        end,
        dx,
        dy,
        step_x: if start.x < end.x { 1 } else { -1 },
        step_y: if start.y < end.y { 1 } else { -1 },
        err: dx + dy,
        done: false,
    }
}

#[derive(Debug, Clone)]
pub struct LineIter {
    cursor: Cell,
    end: Cell,
    dx: i32,
    dy: i32,
    step_x: i32,
    step_y: i32,
    err: i32,
    done: bool,
}

impl Iterator for LineIter {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.done {
            return None;
        }
        let current = self.cursor;
        if current == self.end {
            self.done = true;
            return Some(current);
        }
        let doubled = 2 * self.err;
        if doubled >= self.dy {
            self.err += self.dy;
            self.cursor.x += self.step_x;
        }
        if doubled <= self.dx {
            self.err += self.dx;
            self.cursor.y += self.step_y;
        }
        Some(current)
    }
}

impl std::iter::FusedIterator for LineIter {}

/// Integer linear map from `0..=run` onto `0..=rise`, rounding half up.
///
/// Used to spread a set of heights proportionally without floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiseRun {
    rise: i64,
    run: i64,
}

impl RiseRun {
    #[must_use]
    pub const fn new(rise: i32, run: i32) -> Self {
        Self {
            rise: rise as i64,
            run: run as i64,
        }
    }

    /// Rise reached at horizontal offset `x`.
    #[must_use]
    pub fn rise_at(self, x: i32) -> i32 {
        if self.run == 0 {
            return i32::try_from(self.rise).unwrap_or(0);
        }
        let numerator = 2 * self.rise * i64::from(x) + self.run;
        let value = numerator.div_euclid(2 * self.run);
        i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
    }
}

/// Tri-state constraint on a neighbouring cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Want {
    /// Don't care.
    #[default]
    Any,
    /// Cell must hold a tile.
    Present,
    /// Cell must be empty.
    Absent,
}

impl Want {
    #[must_use]
    pub const fn accepts(self, occupied: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Present => occupied,
            Self::Absent => !occupied,
        }
    }
}

/// Occupancy requirements for a cell and its vertical neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellPattern {
    pub ceiling: Want,
    pub own: Want,
    pub floor: Want,
}

impl CellPattern {
    #[must_use]
    pub const fn new(ceiling: Want, own: Want, floor: Want) -> Self {
        Self {
            ceiling,
            own,
            floor,
        }
    }

    /// Open cell standing on a tile.
    #[must_use]
    pub const fn standing() -> Self {
        Self::new(Want::Any, Want::Absent, Want::Present)
    }

    /// Open cell hanging under a tile.
    #[must_use]
    pub const fn hanging() -> Self {
        Self::new(Want::Present, Want::Absent, Want::Any)
    }
}

/// Whether `cell` and its up/down neighbours satisfy `pattern`.
pub fn neighbor_matches<S: ChunkSurface + ?Sized>(
    surface: &S,
    cell: Cell,
    pattern: CellPattern,
) -> bool {
    pattern.ceiling.accepts(surface.tile(cell.up()).is_some())
        && pattern.own.accepts(surface.tile(cell).is_some())
        && pattern.floor.accepts(surface.tile(cell.down()).is_some())
}

/// Random column, random starting row, then a wrapping scan of that column.
///
/// Terminates after `bounds.size_y()` row checks; `None` means nothing matched.
pub fn find_matching_cell<S, R>(
    surface: &S,
    bounds: CellBounds,
    pattern: CellPattern,
    rng: &mut R,
) -> Option<Cell>
where
    S: ChunkSurface + ?Sized,
    R: Roll + ?Sized,
{
    if bounds.is_empty() {
        return None;
    }
    let x = rng.range(bounds.x_min, bounds.x_max);
    let height = bounds.size_y();
    let start_row = rng.range(0, height);
    (0..height)
        .map(|step| Cell::new(x, bounds.y_min + (start_row + step) % height))
        .find(|cell| neighbor_matches(surface, *cell, pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::TileId;
    use crate::surface::TileGrid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn collect(start: (i32, i32), end: (i32, i32)) -> Vec<(i32, i32)> {
        rasterize_line(Cell::new(start.0, start.1), Cell::new(end.0, end.1))
            .map(|cell| (cell.x, cell.y))
            .collect()
    }

    #[test]
    fn line_covers_shallow_and_steep_segments() {
        assert_eq!(
            collect((0, 0), (4, 2)),
            vec![(0, 0), (1, 1), (2, 1), (3, 2), (4, 2)]
        );
        let steep = collect((0, 0), (1, 4));
        assert_eq!(steep.first(), Some(&(0, 0)));
        assert_eq!(steep.last(), Some(&(1, 4)));
        assert_eq!(steep.len(), 5);
    }

    #[test]
    fn line_handles_degenerate_and_reverse() {
        assert_eq!(collect((3, 3), (3, 3)), vec![(3, 3)]);
        assert_eq!(collect((2, 0), (0, 0)), vec![(2, 0), (1, 0), (0, 0)]);
        let mut line = rasterize_line(Cell::new(0, 0), Cell::new(1, 0));
        assert!(line.by_ref().count() == 2);
        assert!(line.next().is_none());
    }

    #[test]
    fn rise_run_hits_endpoints_and_rounds() {
        let map = RiseRun::new(10, 4);
        assert_eq!(map.rise_at(0), 0);
        assert_eq!(map.rise_at(4), 10);
        assert_eq!(map.rise_at(1), 3);
        assert_eq!(RiseRun::new(-6, 3).rise_at(3), -6);
        assert_eq!(RiseRun::new(5, 0).rise_at(0), 5);
    }

    #[test]
    fn tri_state_matching() {
        let mut grid = TileGrid::new();
        let tile = TileId::new("stone");
        grid.set_tile(Cell::new(0, 0), Some(tile.clone()));
        let above = Cell::new(0, 1);
        assert!(neighbor_matches(&grid, above, CellPattern::standing()));
        assert!(!neighbor_matches(&grid, above, CellPattern::hanging()));
        assert!(neighbor_matches(&grid, Cell::new(0, -1), CellPattern::hanging()));
        assert!(neighbor_matches(
            &grid,
            Cell::new(0, 0),
            CellPattern::new(Want::Any, Want::Present, Want::Any)
        ));
    }

    #[test]
    fn find_matching_cell_wraps_and_reports_no_match() {
        let mut grid = TileGrid::new();
        let tile = TileId::new("stone");
        grid.set_tile(Cell::new(0, 2), Some(tile));
        let bounds = CellBounds::new(0, 0, 1, 5);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..16 {
            assert_eq!(
                find_matching_cell(&grid, bounds, CellPattern::standing(), &mut rng),
                Some(Cell::new(0, 3))
            );
        }
        let impossible = CellPattern::new(Want::Present, Want::Present, Want::Present);
        assert_eq!(find_matching_cell(&grid, bounds, impossible, &mut rng), None);
        assert_eq!(
            find_matching_cell(&grid, CellBounds::default(), CellPattern::standing(), &mut rng),
            None
        );
    }

    #[test]
    fn bounds_grow_and_include() {
        let bounds = CellBounds::default().including(Cell::new(2, 3));
        assert_eq!(bounds, CellBounds::new(2, 3, 3, 4));
        let bounds = bounds.including(Cell::new(-1, 5));
        assert_eq!(bounds, CellBounds::new(-1, 3, 3, 6));
        assert_eq!(bounds.grown_vertically(1), CellBounds::new(-1, 2, 3, 7));
        assert!(bounds.contains(Cell::new(0, 4)));
        assert!(!bounds.contains(Cell::new(3, 4)));
    }
}
