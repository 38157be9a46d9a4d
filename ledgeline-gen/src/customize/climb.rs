use serde::{Deserialize, Serialize};

use super::Customize;
use crate::generator::GenerationState;
use crate::interval::IntervalInt;
use crate::phase::{ConfigError, validate_odds};
use crate::rng::Roll;
use crate::surface::ChunkSurface;

/// Slopes every platform by one shared rise over one shared run.
///
/// The same delta lands on every platform, so relative clearance is untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Climb {
    /// Chance the slope goes down instead of up.
    #[serde(default)]
    pub fall_odds: f32,
    pub rise: IntervalInt,
    pub run: IntervalInt,
}

impl Customize for Climb {
    const NAME: &'static str = "Climb";

    fn customize(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool {
        let (registry, rng, _) = state.layout_parts();
        if registry.is_empty() {
            return false;
        }
        let sign = if rng.odds(self.fall_odds) { -1 } else { 1 };
        let rise = sign * rng.range_in(self.rise);
        let run = rng.range_in(self.run);
        for index in 0..registry.len() {
            if let Some(platform) = registry.platform_mut(index) {
                platform.draw_line(surface, rise, 0, run);
            }
        }
        true
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_odds("climb.fall_odds", self.fall_odds)?;
        self.rise.validate_non_negative("climb.rise")?;
        self.run.validate_non_negative("climb.run")
    }
}
