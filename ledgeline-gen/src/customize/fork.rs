use serde::{Deserialize, Serialize};

use super::Customize;
use crate::generator::GenerationState;
use crate::interval::IntervalInt;
use crate::numbers::i32_to_usize;
use crate::phase::{ConfigError, validate_min, validate_odds};
use crate::platform::TileId;
use crate::rng::Roll;
use crate::surface::ChunkSurface;

/// Splits platforms into an upper and a lower branch.
///
/// A platform forking for the first time in the chunk runs a solid stub and
/// a horizontal gap before the branches start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fork {
    /// Fork only while the registry holds at most this many platforms.
    pub max_platforms: usize,
    #[serde(default = "Fork::default_splits")]
    pub splits: IntervalInt,
    pub width: IntervalInt,
    pub hgap: IntervalInt,
    pub up: IntervalInt,
    pub down: IntervalInt,
    #[serde(default)]
    pub tiles: Vec<TileId>,
    #[serde(default)]
    pub tile_odds: f32,
}

impl Fork {
    #[must_use]
    pub const fn default_splits() -> IntervalInt {
        IntervalInt::exactly(1)
    }

    fn reroll<R: Roll + ?Sized>(&self, rng: &mut R) -> Option<TileId> {
        if self.tiles.is_empty() || !rng.odds(self.tile_odds) {
            return None;
        }
        rng.pick(&self.tiles).cloned()
    }
}

impl Customize for Fork {
    const NAME: &'static str = "Fork";

    fn customize(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool {
        let (registry, rng, vclear) = state.layout_parts();
        let count = registry.len();
        if count == 0 || count > self.max_platforms {
            return false;
        }
        let width = rng.range_in(self.width);
        registry.prepare_continue_x();
        let splits = i32_to_usize(rng.range_in(self.splits));
        let mut chosen = rng.deal(count, splits);
        chosen.sort_unstable_by(|a, b| b.cmp(a));

        for index in chosen {
            let Some(original) = registry.get(index).cloned() else {
                continue;
            };
            let mut up = original.height + rng.range_in(self.up);
            let mut down = up - rng.range_in(self.down);
            let (below, above) = registry.neighbors(index);
            let (below, above) = (below.map(|p| p.height), above.map(|p| p.height));
            if let Some(above) = above {
                let limit = above - vclear;
                if up > limit {
                    down -= up - limit;
                    up = limit;
                }
            }
            if let Some(below) = below {
                down = down.max(below + vclear);
            }
            if up - down < vclear {
                continue;
            }

            if registry.continue_x(index) <= 0 {
                let hgap = rng.range_in(self.hgap).min(width - 2).max(0);
                let stub = rng.range(1, width - hgap);
                original.extrude(surface, 0, stub - 1);
                registry.set_continue_x(index, stub + hgap);
            }
            let resume = registry.continue_x(index);

            registry.set_height(index, up);
            if let Some(tile) = self.reroll(rng) {
                registry.set_tile(index, tile);
            }
            let mut lower = original;
            lower.height = down;
            if let Some(tile) = self.reroll(rng) {
                lower.tile = Some(tile);
            }
            registry.insert_at(index, lower, resume);
        }
        registry.extrude_all_to(surface, width);
        true
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_min(
            "fork.max_platforms",
            1,
            i64::try_from(self.max_platforms).unwrap_or(i64::MAX),
        )?;
        self.splits.validate_non_negative("fork.splits")?;
        self.width.validate_non_negative("fork.width")?;
        self.hgap.validate_non_negative("fork.hgap")?;
        self.up.validate_non_negative("fork.up")?;
        self.down.validate_non_negative("fork.down")?;
        validate_odds("fork.tile_odds", self.tile_odds)
    }
}
