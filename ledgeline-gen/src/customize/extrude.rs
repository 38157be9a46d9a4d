use serde::{Deserialize, Serialize};

use super::Customize;
use crate::generator::GenerationState;
use crate::interval::IntervalInt;
use crate::phase::ConfigError;
use crate::rng::Roll;
use crate::surface::ChunkSurface;

/// Continues every platform a random width without changing its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extrude {
    pub width: IntervalInt,
}

impl Customize for Extrude {
    const NAME: &'static str = "Extrude";

    fn customize(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool {
        let (registry, rng, _) = state.layout_parts();
        if registry.is_empty() {
            return false;
        }
        registry.prepare_continue_x();
        let width = rng.range_in(self.width);
        registry.extrude_all_to(surface, width)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.width.validate_non_negative("extrude.width")
    }
}
