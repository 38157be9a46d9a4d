//! Ledgeline layout generator
//!
//! Platform-agnostic engine that grows a side-scrolling level one chunk at a
//! time. A [`LevelGenerator`] walks configured [`CustomizerPhase`]s, lets a
//! customizer reshape the [`PlatformRegistry`] and paint a chunk surface, then
//! spends the accrued karma budget on hazards. Drawing tiles and spawning
//! objects are delegated to [`ChunkProvider`] and [`InstancePool`]
//! implementations supplied by the caller.

pub mod constants;
pub mod customize;
pub mod generator;
pub mod geometry;
pub mod interval;
pub mod karma;
pub mod numbers;
pub mod phase;
pub mod platform;
pub mod pool;
pub mod rng;
pub mod surface;

// Re-export commonly used types
pub use customize::{
    Climb, Customize, Customizer, Extrude, ExtrudeGap, Fork, InitArea, Initialize, Recolor, Splay,
    Terminate,
};
pub use generator::{ChunkRecord, GenStatus, GenerationError, GenerationState, LevelGenerator};
pub use geometry::{
    Cell, CellBounds, CellPattern, LineIter, RiseRun, Want, WorldPos, find_matching_cell,
    neighbor_matches, rasterize_line,
};
pub use interval::{Interval, IntervalInt, Valence};
pub use karma::{EnemyProto, Karma, KarmaLedger, SpawnEnemy, SpawnSpikes, enemy_cost};
pub use phase::{ConfigError, CustomizerPhase, GeneratorConfig};
pub use platform::{InvariantViolation, Platform, PlatformRegistry, TileId};
pub use pool::{ChunkPool, InstanceLedger, PlacedChunk, SpawnedInstance};
pub use rng::{CountingRng, DealSet, RngBundle, Roll};
pub use surface::{
    ChunkPlacement, ChunkProvider, ChunkSurface, CollaboratorError, InstanceHandle, InstancePool,
    TileGrid,
};
