//! ASCII rendering of a generated level.
//!
//! Tiles print as the lowercase first letter of their id, spawned instances
//! as the uppercase first letter of their prototype. Row 0 is the bottom.
use ledgeline_gen::{ChunkPool, ChunkSurface, SpawnedInstance};
use std::collections::BTreeMap;

fn glyph(name: &str, upper: bool) -> char {
    let first = name.chars().next().unwrap_or('?');
    if upper {
        first.to_ascii_uppercase()
    } else {
        first.to_ascii_lowercase()
    }
}

/// Render columns `0..max_columns` of every placed chunk plus spawned instances.
pub fn render_level(pool: &ChunkPool, spawned: &[SpawnedInstance], max_columns: i32) -> String {
    let mut cells: BTreeMap<(i32, i32), char> = BTreeMap::new();
    for chunk in pool.placed() {
        let origin = chunk.placement.origin_x;
        for (cell, tile) in chunk.grid.painted_cells() {
            cells.insert((cell.y, origin + cell.x), glyph(tile.as_str(), false));
        }
    }
    for instance in spawned {
        cells.insert((instance.at.y, instance.at.x), glyph(&instance.prototype, true));
    }
    let visible: Vec<(&(i32, i32), &char)> = cells
        .iter()
        .filter(|((_, x), _)| *x >= 0 && *x < max_columns)
        .collect();
    let (Some(min_y), Some(max_y)) = (
        visible.iter().map(|((y, _), _)| *y).min(),
        visible.iter().map(|((y, _), _)| *y).max(),
    ) else {
        return String::new();
    };
    let width = visible.iter().map(|((_, x), _)| *x).max().unwrap_or(0) + 1;

    let mut out = String::new();
    for y in (min_y..=max_y).rev() {
        let row: String = (0..width)
            .map(|x| cells.get(&(y, x)).copied().unwrap_or(' '))
            .collect();
        out.push_str(&format!("{y:>4} |{}\n", row.trim_end()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgeline_gen::{Cell, ChunkPlacement, ChunkProvider, InstanceHandle, TileId, WorldPos};

    #[test]
    fn renders_tiles_and_instances_top_down() {
        let mut pool = ChunkPool::new("chunk");
        let mut grid = pool.acquire_chunk("chunk").expect("grid");
        grid.set_tile(Cell::new(0, 0), Some(TileId::new("stone")));
        grid.set_tile(Cell::new(1, 0), Some(TileId::new("stone")));
        grid.set_tile(Cell::new(1, 2), Some(TileId::new("grass")));
        pool.place_chunk(
            grid,
            ChunkPlacement {
                origin_x: 0,
                name: "Extrude -> 0".into(),
            },
        );
        let spawned = vec![SpawnedInstance {
            handle: InstanceHandle(0),
            prototype: "slime".into(),
            at: WorldPos { x: 0, y: 1 },
        }];
        let map = render_level(&pool, &spawned, 10);
        let lines: Vec<&str> = map.lines().collect();
        assert_eq!(lines, vec!["   2 | g", "   1 |S", "   0 |ss"]);
    }

    #[test]
    fn empty_level_renders_nothing() {
        assert!(render_level(&ChunkPool::new("chunk"), &[], 10).is_empty());
    }
}
