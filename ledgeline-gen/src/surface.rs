//! Seams to the tile-drawing and object-pooling collaborators.
//!
//! The engine never draws or instantiates anything itself. It paints into a
//! [`ChunkSurface`] obtained from a [`ChunkProvider`] and asks an
//! [`InstancePool`] for hazard/enemy instances. [`TileGrid`] is the
//! in-memory surface used by the bundled collaborators and the tests.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Cell, CellBounds, WorldPos};
use crate::platform::TileId;

/// Failures reported by external collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("no chunk surface available for prototype `{prototype}`")]
    SurfaceUnavailable { prototype: String },
    #[error("instance pool exhausted for prototype `{prototype}`")]
    PoolExhausted { prototype: String },
}

/// A paintable tile surface addressed by integer cells.
pub trait ChunkSurface {
    fn tile(&self, cell: Cell) -> Option<&TileId>;

    /// Paint `cell`; `None` erases it.
    fn set_tile(&mut self, cell: Cell, tile: Option<TileId>);

    fn clear(&mut self);

    /// Shrink the bounds to the painted extent.
    fn compress_bounds(&mut self);

    fn bounds(&self) -> CellBounds;

    /// Hook for surfaces that cache derived tile data.
    fn refresh(&mut self) {}

    /// Every painted cell in row-major order.
    fn painted_cells(&self) -> Vec<(Cell, TileId)>;
}

/// Where and under what name a finished chunk is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPlacement {
    pub origin_x: i32,
    pub name: String,
}

/// Source of chunk surfaces.
pub trait ChunkProvider {
    type Surface: ChunkSurface;

    /// # Errors
    ///
    /// Returns [`CollaboratorError::SurfaceUnavailable`] when no surface can be produced.
    fn acquire_chunk(&mut self, prototype: &str) -> Result<Self::Surface, CollaboratorError>;

    /// Hand back a surface that will not be placed.
    fn release_chunk(&mut self, surface: Self::Surface);

    /// Commit a finished chunk at its level offset.
    fn place_chunk(&mut self, surface: Self::Surface, placement: ChunkPlacement);
}

/// Handle to an instance acquired from an [`InstancePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceHandle(pub u64);

/// Source of hazard/enemy instances.
pub trait InstancePool {
    /// # Errors
    ///
    /// Returns [`CollaboratorError::PoolExhausted`] when no instance can be handed out.
    fn acquire(&mut self, prototype: &str, at: WorldPos) -> Result<InstanceHandle, CollaboratorError>;

    /// Return an instance whose chunk was never committed.
    fn release(&mut self, _handle: InstanceHandle) {}
}

/// Sparse in-memory tile surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    tiles: BTreeMap<Cell, TileId>,
    bounds: CellBounds,
}

impl TileGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl ChunkSurface for TileGrid {
    fn tile(&self, cell: Cell) -> Option<&TileId> {
        self.tiles.get(&cell)
    }

    fn set_tile(&mut self, cell: Cell, tile: Option<TileId>) {
        match tile {
            Some(tile) => {
                self.tiles.insert(cell, tile);
                self.bounds = self.bounds.including(cell);
            }
            None => {
                self.tiles.remove(&cell);
            }
        }
    }

    fn clear(&mut self) {
        self.tiles.clear();
        self.bounds = CellBounds::default();
    }

    fn compress_bounds(&mut self) {
        self.bounds = self
            .tiles
            .keys()
            .fold(CellBounds::default(), |bounds, cell| bounds.including(*cell));
    }

    fn bounds(&self) -> CellBounds {
        self.bounds
    }

    fn painted_cells(&self) -> Vec<(Cell, TileId)> {
        let mut cells: Vec<(Cell, TileId)> = self
            .tiles
            .iter()
            .map(|(cell, tile)| (*cell, tile.clone()))
            .collect();
        cells.sort_by_key(|(cell, _)| (cell.y, cell.x));
        cells
    }
}
