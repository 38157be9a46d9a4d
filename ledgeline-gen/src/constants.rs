//! Centralized defaults and tuning constants for the layout generator.
//!
//! Anything a level file may omit falls back to one of these values, so the
//! behaviour of a sparse configuration is pinned in version control.

// Configuration defaults ---------------------------------------------------
pub const DEFAULT_VCLEAR: i32 = 2;
pub const DEFAULT_CHUNK_PROTOTYPE: &str = "chunk";
pub const DEFAULT_INIT_ATTEMPTS: u32 = 16;
pub const DEFAULT_ENEMY_WEIGHT: u32 = 1;
pub const DEFAULT_TOP_SPIKE_ODDS: f32 = 0.5;

// RNG stream domain tags ---------------------------------------------------
pub(crate) const STREAM_LAYOUT: &[u8] = b"ledgeline.layout";
pub(crate) const STREAM_KARMA: &[u8] = b"ledgeline.karma";

// Preset level -------------------------------------------------------------
pub(crate) const PRESET_LEVEL_JSON: &str = include_str!("../assets/levels/default.json");
