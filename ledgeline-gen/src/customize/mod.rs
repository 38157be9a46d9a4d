//! Customizer catalogue: the registry mutations that shape each chunk.
//!
//! Every strategy reads and writes the [`PlatformRegistry`](crate::PlatformRegistry)
//! held by [`GenerationState`] and paints the chunk surface it is handed.
//! `false` means the strategy could not apply to the current state; the
//! orchestrator then tries the next candidate.
use serde::{Deserialize, Serialize};

use crate::generator::GenerationState;
use crate::phase::ConfigError;
use crate::surface::ChunkSurface;

mod climb;
mod extrude;
mod fork;
mod gap;
mod initialize;
mod recolor;
mod splay;
mod terminate;

pub use climb::Climb;
pub use extrude::Extrude;
pub use fork::Fork;
pub use gap::ExtrudeGap;
pub use initialize::{InitArea, Initialize};
pub use recolor::Recolor;
pub use splay::Splay;
pub use terminate::Terminate;

/// A single registry mutation strategy.
pub trait Customize {
    /// Display name used in chunk names and diagnostics.
    const NAME: &'static str;

    /// Mutate the registry and paint `surface`; `false` when preconditions are unmet.
    fn customize(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool;

    /// # Errors
    ///
    /// Returns `ConfigError` when a parameter is out of bounds.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Configured customizer, selected by its `kind` tag in level files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Customizer {
    Initialize(Initialize),
    Extrude(Extrude),
    Climb(Climb),
    Splay(Splay),
    Recolor(Recolor),
    ExtrudeGap(ExtrudeGap),
    Terminate(Terminate),
    Fork(Fork),
}

macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Customizer::Initialize($inner) => $body,
            Customizer::Extrude($inner) => $body,
            Customizer::Climb($inner) => $body,
            Customizer::Splay($inner) => $body,
            Customizer::Recolor($inner) => $body,
            Customizer::ExtrudeGap($inner) => $body,
            Customizer::Terminate($inner) => $body,
            Customizer::Fork($inner) => $body,
        }
    };
}

fn name_of<C: Customize>(_: &C) -> &'static str {
    C::NAME
}

impl Customizer {
    #[must_use]
    pub fn name(&self) -> &'static str {
        dispatch!(self, inner => name_of(inner))
    }

    /// Apply the wrapped strategy.
    pub fn apply(&self, state: &mut GenerationState, surface: &mut dyn ChunkSurface) -> bool {
        dispatch!(self, inner => inner.customize(state, surface))
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        dispatch!(self, inner => inner.validate())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::state_with;
    use super::*;
    use crate::interval::IntervalInt;
    use crate::surface::TileGrid;

    #[test]
    fn tagged_json_selects_variant() {
        let parsed: Customizer =
            serde_json::from_str(r#"{"kind":"extrude_gap","before":{"min":1,"max":2},"gap":{"min":2,"max":3},"after":{"min":1,"max":4},"drop":{"min":0,"max":1},"odds":0.5}"#)
                .expect("deserialize");
        assert_eq!(parsed.name(), "ExtrudeGap");
        parsed.validate().expect("valid");
    }

    #[test]
    fn dispatch_reaches_strategy() {
        let extrude = Customizer::Extrude(Extrude {
            width: IntervalInt::exactly(3),
        });
        let mut state = state_with(&[0]);
        let mut grid = TileGrid::new();
        assert!(extrude.apply(&mut state, &mut grid));
        assert_eq!(grid.len(), 4);
        assert_eq!(extrude.name(), "Extrude");
    }
}
