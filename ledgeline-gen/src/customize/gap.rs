use serde::{Deserialize, Serialize};

use super::Customize;
use crate::generator::GenerationState;
use crate::interval::IntervalInt;
use crate::phase::{ConfigError, validate_odds};
use crate::platform::TileId;
use crate::rng::Roll;
use crate::surface::ChunkSurface;

/// Punches holes into a dealt subset of platforms.
///
/// A holed platform runs `before` columns, skips `gap` columns, then resumes
/// `drop` rows lower (clamped against its neighbours). Every platform is then
/// carried to the furthest resume column plus `after`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrudeGap {
    pub before: IntervalInt,
    pub gap: IntervalInt,
    pub after: IntervalInt,
    #[serde(default)]
    pub drop: IntervalInt,
    /// Share of platforms that get a hole, rounded up.
    pub odds: f32,
    #[serde(default)]
    pub tiles: Vec<TileId>,
    /// Chance a holed platform resumes with a new tile.
    #[serde(default)]
    pub tile_odds: f32,
}

impl Customize for ExtrudeGap {
    const NAME: &'static str = "ExtrudeGap";

    fn customize(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool {
        let (registry, rng, vclear) = state.layout_parts();
        if registry.is_empty() || self.odds <= 0.0 {
            return false;
        }
        registry.prepare_continue_x();
        for index in rng.deal_fraction(registry.len(), self.odds) {
            let before = rng.range_in(self.before);
            if let Some(platform) = registry.get(index) {
                platform.extrude(surface, 0, before);
            }
            let resume = before + 1 + rng.range_in(self.gap);
            registry.set_continue_x(index, resume);
            let drop = rng.range_in(self.drop);
            registry.clamp_height(index, -drop, vclear);
            if !self.tiles.is_empty()
                && rng.odds(self.tile_odds)
                && let Some(tile) = rng.pick(&self.tiles)
            {
                registry.set_tile(index, tile.clone());
            }
        }
        let furthest = registry.max_continue_x();
        if furthest <= 0 {
            return false;
        }
        let end_x = furthest + rng.range_in(self.after);
        registry.extrude_all_to(surface, end_x)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.before.validate_non_negative("extrude_gap.before")?;
        self.gap.validate_non_negative("extrude_gap.gap")?;
        self.after.validate_non_negative("extrude_gap.after")?;
        self.drop.validate_non_negative("extrude_gap.drop")?;
        validate_odds("extrude_gap.odds", self.odds)?;
        validate_odds("extrude_gap.tile_odds", self.tile_odds)
    }
}
