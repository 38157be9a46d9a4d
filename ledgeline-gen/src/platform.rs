//! Platform records and the height-ordered registry the customizers mutate.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Cell, rasterize_line};
use crate::surface::ChunkSurface;

/// Opaque surface-material identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(String);

impl TileId {
    /// Construct a tile id, trimming whitespace.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the id has no visible characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl AsRef<str> for TileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One contiguous walkable surface at a given row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub height: i32,
    #[serde(default)]
    pub tile: Option<TileId>,
}

impl Platform {
    #[must_use]
    pub const fn new(height: i32, tile: TileId) -> Self {
        Self {
            height,
            tile: Some(tile),
        }
    }

    /// True when the platform carries a surface material.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.tile.as_ref().is_some_and(|tile| !tile.is_empty())
    }

    /// Signed vertical gap from `other` up to `self`.
    #[must_use]
    pub const fn clearance(&self, other: &Self) -> i32 {
        self.height - other.height
    }

    /// Paint `start..=end` along this platform's row; true when anything was painted.
    pub fn extrude<S: ChunkSurface + ?Sized>(&self, surface: &mut S, start: i32, end: i32) -> bool {
        for x in start..=end {
            surface.set_tile(Cell::new(x, self.height), self.tile.clone());
        }
        end >= start
    }

    /// Paint a sloped run from `(start_run, height)` to `(end_run, height + rise)`
    /// and move the platform to the end height.
    pub fn draw_line<S: ChunkSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        rise: i32,
        start_run: i32,
        end_run: i32,
    ) {
        let start = Cell::new(start_run, self.height);
        let end = Cell::new(end_run, self.height + rise);
        for point in rasterize_line(start, end) {
            surface.set_tile(point, self.tile.clone());
        }
        self.height = end.y;
    }
}

/// Broken registry invariants, reported by [`PlatformRegistry::check_invariants`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("platforms {index} and {next} out of order ({below} >= {above})")]
    Unsorted {
        index: usize,
        next: usize,
        below: i32,
        above: i32,
    },
    #[error("platforms {index} and {next} only {gap} apart (clearance {vclear})")]
    Clearance {
        index: usize,
        next: usize,
        gap: i32,
        vclear: i32,
    },
    #[error("platform {index} has no tile")]
    MissingTile { index: usize },
    #[error("scratch column tracks {scratch} platforms but registry holds {platforms}")]
    ScratchMismatch { scratch: usize, platforms: usize },
}

/// Height-ordered platforms plus the per-pass `continue_x` scratch column.
///
/// `continue_x[i]` is the column platform `i` has already been painted up to
/// during the current customizer. It carries nothing between customizers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRegistry {
    platforms: Vec<Platform>,
    #[serde(skip)]
    continue_x: Vec<i32>,
}

impl PlatformRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            platforms: Vec::new(),
            continue_x: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    #[must_use]
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Platform> {
        self.platforms.get(index)
    }

    #[must_use]
    pub fn heights(&self) -> Vec<i32> {
        self.platforms.iter().map(|platform| platform.height).collect()
    }

    /// Platforms immediately below and above `index`.
    #[must_use]
    pub fn neighbors(&self, index: usize) -> (Option<&Platform>, Option<&Platform>) {
        let below = index.checked_sub(1).and_then(|i| self.platforms.get(i));
        let above = self.platforms.get(index + 1);
        (below, above)
    }

    /// Binary search by height: `Ok` on an exact match, `Err` with the insertion point otherwise.
    pub fn search(&self, height: i32) -> Result<usize, usize> {
        self.platforms
            .binary_search_by_key(&height, |platform| platform.height)
    }

    /// Whether `candidate`, inserted at `index`, keeps `vclear` to its would-be neighbours.
    #[must_use]
    pub fn clearance_ok(&self, candidate: &Platform, index: usize, vclear: i32) -> bool {
        let below_ok = index
            .checked_sub(1)
            .and_then(|i| self.platforms.get(i))
            .is_none_or(|below| candidate.clearance(below) >= vclear);
        let above_ok = self
            .platforms
            .get(index)
            .is_none_or(|above| above.clearance(candidate) >= vclear);
        below_ok && above_ok
    }

    /// Insert at the sorted position with a zeroed scratch entry.
    ///
    /// Returns the index, or `None` when a platform already sits at that height.
    /// Clearance is the caller's responsibility.
    pub fn insert_sorted(&mut self, platform: Platform) -> Option<usize> {
        let index = self.search(platform.height).err()?;
        self.insert_at(index, platform, 0);
        Some(index)
    }

    pub(crate) fn insert_at(&mut self, index: usize, platform: Platform, continue_x: i32) {
        self.platforms.insert(index, platform);
        if self.continue_x.len() + 1 == self.platforms.len() && index <= self.continue_x.len() {
            self.continue_x.insert(index, continue_x);
        } else {
            self.continue_x.resize(self.platforms.len(), 0);
        }
    }

    /// Remove the platform and its scratch entry.
    pub fn remove(&mut self, index: usize) -> Option<Platform> {
        if index >= self.platforms.len() {
            return None;
        }
        if index < self.continue_x.len() {
            self.continue_x.remove(index);
        }
        Some(self.platforms.remove(index))
    }

    pub(crate) fn platform_mut(&mut self, index: usize) -> Option<&mut Platform> {
        self.platforms.get_mut(index)
    }

    pub(crate) fn set_height(&mut self, index: usize, height: i32) {
        if let Some(platform) = self.platforms.get_mut(index) {
            platform.height = height;
        }
    }

    pub(crate) fn set_tile(&mut self, index: usize, tile: TileId) {
        if let Some(platform) = self.platforms.get_mut(index) {
            platform.tile = Some(tile);
        }
    }

    /// Move platform `index` by `delta`, clamped to keep `vclear` to both neighbours.
    ///
    /// When the neighbours leave no legal row the height is left unchanged.
    /// Returns the resulting height.
    pub fn clamp_height(&mut self, index: usize, delta: i32, vclear: i32) -> i32 {
        let Some(current) = self.platforms.get(index).map(|platform| platform.height) else {
            return 0;
        };
        let (below, above) = self.neighbors(index);
        let below = below.map(|platform| platform.height);
        let above = above.map(|platform| platform.height);
        let mut height = current.saturating_add(delta);
        if let Some(above) = above
            && above - height < vclear
        {
            height = above - vclear;
        }
        if let Some(below) = below
            && height - below < vclear
        {
            height = below + vclear;
        }
        let fits_above = above.is_none_or(|above| above - height >= vclear);
        if !fits_above {
            height = current;
        }
        self.set_height(index, height);
        height
    }

    /// Zero the scratch column for every registered platform.
    pub fn prepare_continue_x(&mut self) {
        self.continue_x.clear();
        self.continue_x.resize(self.platforms.len(), 0);
    }

    #[must_use]
    pub fn continue_x(&self, index: usize) -> i32 {
        self.continue_x.get(index).copied().unwrap_or(0)
    }

    pub fn set_continue_x(&mut self, index: usize, x: i32) {
        if index >= self.continue_x.len() {
            self.continue_x.resize(self.platforms.len().max(index + 1), 0);
        }
        if let Some(slot) = self.continue_x.get_mut(index) {
            *slot = x;
        }
    }

    /// Largest scratch column; zero when nothing has been painted.
    #[must_use]
    pub fn max_continue_x(&self) -> i32 {
        self.continue_x.iter().copied().fold(0, i32::max)
    }

    /// Paint every platform from its scratch column to `end_x` inclusive, then
    /// zero the scratch. True when at least one platform painted a cell.
    pub fn extrude_all_to<S: ChunkSurface + ?Sized>(&mut self, surface: &mut S, end_x: i32) -> bool {
        let mut any = false;
        for (index, platform) in self.platforms.iter().enumerate() {
            let start_x = self.continue_x.get(index).copied().unwrap_or(0);
            any |= platform.extrude(surface, start_x, end_x);
        }
        self.prepare_continue_x();
        any
    }

    /// Verify ordering, clearance, tile presence, and scratch alignment.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self, vclear: i32) -> Result<(), InvariantViolation> {
        if !self.continue_x.is_empty() && self.continue_x.len() != self.platforms.len() {
            return Err(InvariantViolation::ScratchMismatch {
                scratch: self.continue_x.len(),
                platforms: self.platforms.len(),
            });
        }
        for (index, platform) in self.platforms.iter().enumerate() {
            if !platform.is_valid() {
                return Err(InvariantViolation::MissingTile { index });
            }
        }
        for (index, pair) in self.platforms.windows(2).enumerate() {
            let (below, above) = (&pair[0], &pair[1]);
            if below.height >= above.height {
                return Err(InvariantViolation::Unsorted {
                    index,
                    next: index + 1,
                    below: below.height,
                    above: above.height,
                });
            }
            let gap = above.clearance(below);
            if gap < vclear {
                return Err(InvariantViolation::Clearance {
                    index,
                    next: index + 1,
                    gap,
                    vclear,
                });
            }
        }
        Ok(())
    }
}
