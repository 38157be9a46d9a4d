use num_traits::cast::cast;
use serde::{Deserialize, Serialize};

use super::Customize;
use crate::generator::GenerationState;
use crate::geometry::RiseRun;
use crate::interval::{Interval, IntervalInt, Valence};
use crate::phase::ConfigError;
use crate::rng::Roll;
use crate::surface::ChunkSurface;

/// Spreads or gathers the stack around a preferred median height.
///
/// A median above `set_point` pushes the low edge down, one below pushes the
/// high edge up, and one inside pushes both outwards. Every platform keeps its
/// proportional position between the two edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Splay {
    pub set_point: Interval,
    pub delta_height: IntervalInt,
    pub width: IntervalInt,
}

fn median(heights: &[i32]) -> f32 {
    if heights.is_empty() {
        return 0.0;
    }
    let mid = heights.len() / 2;
    let at = |index: usize| {
        heights
            .get(index)
            .and_then(|height| cast::<i32, f32>(*height))
            .unwrap_or(0.0)
    };
    if heights.len() % 2 == 0 {
        (at(mid - 1) + at(mid)) / 2.0
    } else {
        at(mid)
    }
}

impl Splay {
    fn targets(&self, heights: &[i32], delta: i32) -> Option<Vec<i32>> {
        let (&low, &high) = (heights.first()?, heights.last()?);
        let half = delta.div_euclid(2);
        let rest = delta.rem_euclid(2);
        let (new_low, new_high) = match self.set_point.valence(median(heights)) {
            Valence::Above => (low - (2 * half + rest), high),
            Valence::Inside => (low - half, high + half + rest),
            Valence::Below => (low, high + 2 * half + rest),
        };
        let spread = RiseRun::new(new_high - new_low, high - low);
        Some(
            heights
                .iter()
                .map(|height| new_low + spread.rise_at(height - low))
                .collect(),
        )
    }
}

impl Customize for Splay {
    const NAME: &'static str = "Splay";

    fn customize(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool {
        let (registry, rng, vclear) = state.layout_parts();
        if registry.len() < 2 {
            return false;
        }
        let heights = registry.heights();
        let delta = rng.range_in(self.delta_height);
        let Some(targets) = self.targets(&heights, delta) else {
            return false;
        };
        if targets.windows(2).any(|pair| pair[1] - pair[0] < vclear) {
            return false;
        }
        let width = rng.range_in(self.width);
        for (index, target) in targets.into_iter().enumerate() {
            if let Some(platform) = registry.platform_mut(index) {
                let rise = target - platform.height;
                platform.draw_line(surface, rise, 0, width);
            }
        }
        true
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.set_point.validate("splay.set_point")?;
        self.delta_height.validate("splay.delta_height")?;
        self.width.validate_non_negative("splay.width")
    }
}
