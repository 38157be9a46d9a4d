use serde::{Deserialize, Serialize};

use super::Customize;
use crate::generator::GenerationState;
use crate::interval::IntervalInt;
use crate::numbers::fraction_of;
use crate::phase::{ConfigError, validate_odds};
use crate::rng::Roll;
use crate::surface::ChunkSurface;

/// Ends a dealt subset of platforms partway through the chunk.
///
/// At least one platform always survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminate {
    pub odds: f32,
    pub width: IntervalInt,
}

impl Customize for Terminate {
    const NAME: &'static str = "Terminate";

    fn customize(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool {
        let (registry, rng, _) = state.layout_parts();
        let count = registry.len();
        if count < 2 || self.odds <= 0.0 {
            return false;
        }
        let width = rng.range_in(self.width);
        registry.prepare_continue_x();
        let mut doomed = rng.deal(count, fraction_of(count, self.odds).min(count - 1));
        // Highest index first so earlier removals never shift later ones.
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        for index in doomed {
            let remaining = rng.range(0, width);
            if let Some(platform) = registry.get(index) {
                platform.extrude(surface, 0, remaining);
            }
            registry.remove(index);
        }
        registry.extrude_all_to(surface, width);
        true
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_odds("terminate.odds", self.odds)?;
        self.width.validate_non_negative("terminate.width")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customize::test_support::state_with;
    use crate::surface::TileGrid;

    fn terminate(odds: f32) -> Terminate {
        Terminate {
            odds,
            width: IntervalInt::exactly(8),
        }
    }

    #[test]
    fn removes_rounded_up_share() {
        let mut state = state_with(&[0, 3, 6, 9, 12]);
        let mut grid = TileGrid::new();
        assert!(terminate(0.5).customize(&mut state, &mut grid));
        assert_eq!(state.registry().len(), 2);
        state.registry().check_invariants(2).expect("still ordered");
    }

    #[test]
    fn always_keeps_one_platform() {
        let mut state = state_with(&[0, 3, 6]);
        let mut grid = TileGrid::new();
        assert!(terminate(1.0).customize(&mut state, &mut grid));
        assert_eq!(state.registry().len(), 1);
        let survivor = state.registry().heights()[0];
        assert!(grid.tile(crate::geometry::Cell::new(8, survivor)).is_some());
    }

    #[test]
    fn needs_two_platforms_and_positive_odds() {
        let mut grid = TileGrid::new();
        assert!(!terminate(1.0).customize(&mut state_with(&[4]), &mut grid));
        assert!(!terminate(0.0).customize(&mut state_with(&[0, 4]), &mut grid));
        assert!(grid.is_empty());
    }
}
