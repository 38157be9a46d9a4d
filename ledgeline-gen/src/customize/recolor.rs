use serde::{Deserialize, Serialize};

use super::Customize;
use crate::generator::GenerationState;
use crate::interval::IntervalInt;
use crate::phase::{ConfigError, validate_catalogue, validate_odds};
use crate::platform::TileId;
use crate::rng::Roll;
use crate::surface::ChunkSurface;

/// Re-tiles and nudges a random subset of platforms.
///
/// Each chosen platform finishes a partial run with its old tile, then
/// continues with a new tile at a clearance-clamped height offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recolor {
    pub odds: f32,
    pub tiles: Vec<TileId>,
    pub width: IntervalInt,
    /// Height offset applied after the switch.
    #[serde(default)]
    pub height: IntervalInt,
}

impl Customize for Recolor {
    const NAME: &'static str = "Recolor";

    fn customize(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool {
        let (registry, rng, vclear) = state.layout_parts();
        if registry.is_empty() {
            return false;
        }
        registry.prepare_continue_x();
        let mut touched = false;
        for index in 0..registry.len() {
            if !rng.odds(self.odds) {
                continue;
            }
            let switch_x = rng.range_in(self.width);
            if let Some(platform) = registry.get(index) {
                platform.extrude(surface, 0, switch_x);
            }
            registry.set_continue_x(index, switch_x);
            if let Some(tile) = rng.pick(&self.tiles) {
                registry.set_tile(index, tile.clone());
            }
            let delta = rng.range_in(self.height);
            registry.clamp_height(index, delta, vclear);
            touched = true;
        }
        if !touched {
            return false;
        }
        let end_x = registry.max_continue_x();
        registry.extrude_all_to(surface, end_x)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_odds("recolor.odds", self.odds)?;
        validate_catalogue("recolor.tiles", &self.tiles)?;
        self.width.validate_non_negative("recolor.width")?;
        self.height.validate("recolor.height")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customize::test_support::{state_with, tiles};
    use crate::geometry::Cell;
    use crate::surface::TileGrid;

    fn recolor(odds: f32, height: i32) -> Recolor {
        Recolor {
            odds,
            tiles: tiles(&["moss"]),
            width: IntervalInt::exactly(4),
            height: IntervalInt::exactly(height),
        }
    }

    #[test]
    fn switches_tile_after_partial_run() {
        let mut state = state_with(&[0, 10]);
        let mut grid = TileGrid::new();
        assert!(recolor(1.0, 0).customize(&mut state, &mut grid));
        assert_eq!(grid.tile(Cell::new(3, 0)).map(TileId::as_str), Some("stone"));
        assert_eq!(grid.tile(Cell::new(4, 0)).map(TileId::as_str), Some("moss"));
        assert!(
            state
                .registry()
                .platforms()
                .iter()
                .all(|platform| platform.tile.as_ref().map(TileId::as_str) == Some("moss"))
        );
    }

    #[test]
    fn height_offset_is_clamped_by_neighbours() {
        let mut state = state_with(&[0, 10]);
        let mut grid = TileGrid::new();
        assert!(recolor(1.0, 9).customize(&mut state, &mut grid));
        state.registry().check_invariants(2).expect("clearance kept");
        assert_eq!(state.registry().heights(), vec![8, 19]);
    }

    #[test]
    fn zero_odds_touches_nothing() {
        let mut state = state_with(&[0, 10]);
        let mut grid = TileGrid::new();
        assert!(!recolor(0.0, 2).customize(&mut state, &mut grid));
        assert!(grid.is_empty());
        assert_eq!(state.registry().heights(), vec![0, 10]);
    }
}
