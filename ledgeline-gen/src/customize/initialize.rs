use serde::{Deserialize, Serialize};

use super::Customize;
use crate::constants::DEFAULT_INIT_ATTEMPTS;
use crate::generator::GenerationState;
use crate::interval::IntervalInt;
use crate::phase::{ConfigError, validate_catalogue, validate_min};
use crate::platform::{Platform, TileId};
use crate::rng::Roll;
use crate::surface::ChunkSurface;

/// Width and height of the seeding area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InitArea {
    pub width: i32,
    pub height: i32,
}

/// Seeds an empty registry with randomly placed platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initialize {
    pub area: InitArea,
    pub count: IntervalInt,
    pub tiles: Vec<TileId>,
    /// Re-rolls allowed per candidate after a duplicate or clearance rejection.
    #[serde(default = "Initialize::default_attempts")]
    pub attempts: u32,
    /// Start each platform at a random column instead of x = 0.
    #[serde(default)]
    pub stagger: bool,
}

impl Initialize {
    #[must_use]
    pub const fn default_attempts() -> u32 {
        DEFAULT_INIT_ATTEMPTS
    }
}

impl Customize for Initialize {
    const NAME: &'static str = "Initialize";

    fn customize(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool {
        let (registry, rng, vclear) = state.layout_parts();
        if !registry.is_empty() {
            return false;
        }
        registry.prepare_continue_x();
        let count = rng.range_in(self.count).max(0);
        for _ in 0..count {
            for _ in 0..=self.attempts {
                let height = rng.range(0, self.area.height);
                let Some(tile) = rng.pick(&self.tiles).cloned() else {
                    return false;
                };
                let candidate = Platform::new(height, tile);
                let Err(index) = registry.search(height) else {
                    continue;
                };
                if !registry.clearance_ok(&candidate, index, vclear) {
                    continue;
                }
                let start_x = if self.stagger {
                    rng.range(0, self.area.width)
                } else {
                    0
                };
                registry.insert_at(index, candidate, start_x);
                break;
            }
        }
        registry.extrude_all_to(surface, self.area.width)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_min("initialize.area.width", 0, i64::from(self.area.width))?;
        validate_min("initialize.area.height", 1, i64::from(self.area.height))?;
        self.count.validate_non_negative("initialize.count")?;
        validate_catalogue("initialize.tiles", &self.tiles)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customize::test_support::{SEED, state_with, tiles};
    use crate::geometry::Cell;
    use crate::surface::TileGrid;

    fn seeding(count: i32) -> Initialize {
        Initialize {
            area: InitArea {
                width: 10,
                height: 20,
            },
            count: IntervalInt::exactly(count),
            tiles: tiles(&["grass", "stone"]),
            attempts: Initialize::default_attempts(),
            stagger: false,
        }
    }

    #[test]
    fn seeds_requested_count_with_clearance() {
        let mut state = GenerationState::new(SEED, 2);
        let mut grid = TileGrid::new();
        assert!(seeding(3).customize(&mut state, &mut grid));
        let registry = state.registry();
        assert_eq!(registry.len(), 3);
        registry.check_invariants(2).expect("sorted with clearance");
        for platform in registry.platforms() {
            for x in 0..=10 {
                assert!(grid.tile(Cell::new(x, platform.height)).is_some());
            }
            assert!((0..20).contains(&platform.height));
        }
        assert_eq!(grid.len(), 3 * 11);
    }

    #[test]
    fn refuses_non_empty_registry() {
        let mut state = state_with(&[4]);
        let mut grid = TileGrid::new();
        assert!(!seeding(3).customize(&mut state, &mut grid));
        assert_eq!(state.registry().len(), 1);
        assert!(grid.is_empty());
    }

    #[test]
    fn stagger_starts_inside_area() {
        let mut init = seeding(4);
        init.stagger = true;
        let mut state = GenerationState::new(SEED, 2);
        let mut grid = TileGrid::new();
        assert!(init.customize(&mut state, &mut grid));
        for platform in state.registry().platforms() {
            assert!(grid.tile(Cell::new(10, platform.height)).is_some());
        }
    }

    #[test]
    fn crowded_area_keeps_clearance() {
        let mut init = seeding(50);
        init.area.height = 8;
        let mut state = GenerationState::new(SEED, 2);
        let mut grid = TileGrid::new();
        assert!(init.customize(&mut state, &mut grid));
        assert!(state.registry().len() <= 4);
        state.registry().check_invariants(2).expect("clearance held");
    }

    #[test]
    fn validation_requires_tiles() {
        let mut init = seeding(3);
        init.tiles.clear();
        assert_eq!(
            init.validate(),
            Err(ConfigError::EmptyCatalogue {
                field: "initialize.tiles"
            })
        );
    }
}
