//! In-memory collaborators: a chunk pool backed by [`TileGrid`] and an
//! instance ledger that records every spawn.
use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::geometry::WorldPos;
use crate::surface::{
    ChunkPlacement, ChunkProvider, ChunkSurface, CollaboratorError, InstanceHandle, InstancePool,
    TileGrid,
};

/// A chunk committed to the level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedChunk {
    pub placement: ChunkPlacement,
    pub grid: TileGrid,
}

/// Chunk provider that recycles released grids and keeps placed ones.
#[derive(Debug, Clone, Default)]
pub struct ChunkPool {
    prototype: String,
    capacity: Option<usize>,
    outstanding: usize,
    free: Vec<TileGrid>,
    placed: Vec<PlacedChunk>,
}

impl ChunkPool {
    /// Unbounded pool serving `prototype`.
    #[must_use]
    pub fn new(prototype: &str) -> Self {
        Self {
            prototype: prototype.to_string(),
            ..Self::default()
        }
    }

    /// Pool that refuses to keep more than `capacity` chunks alive (outstanding plus placed).
    #[must_use]
    pub fn with_capacity(prototype: &str, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new(prototype)
        }
    }

    #[must_use]
    pub fn placed(&self) -> &[PlacedChunk] {
        &self.placed
    }

    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Stable hash of every placed tile, used to compare runs.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for chunk in &self.placed {
            hasher.write_i32(chunk.placement.origin_x);
            hasher.write(chunk.placement.name.as_bytes());
            for (cell, tile) in chunk.grid.painted_cells() {
                hasher.write_i32(cell.x);
                hasher.write_i32(cell.y);
                hasher.write(tile.as_str().as_bytes());
            }
        }
        hasher.finish()
    }
}

impl ChunkProvider for ChunkPool {
    type Surface = TileGrid;

    fn acquire_chunk(&mut self, prototype: &str) -> Result<TileGrid, CollaboratorError> {
        let unavailable = || CollaboratorError::SurfaceUnavailable {
            prototype: prototype.to_string(),
        };
        if prototype != self.prototype {
            return Err(unavailable());
        }
        if self
            .capacity
            .is_some_and(|capacity| self.outstanding + self.placed.len() >= capacity)
        {
            return Err(unavailable());
        }
        self.outstanding += 1;
        Ok(self.free.pop().unwrap_or_default())
    }

    fn release_chunk(&mut self, mut surface: TileGrid) {
        self.outstanding = self.outstanding.saturating_sub(1);
        surface.clear();
        self.free.push(surface);
    }

    fn place_chunk(&mut self, surface: TileGrid, placement: ChunkPlacement) {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.placed.push(PlacedChunk {
            placement,
            grid: surface,
        });
    }
}

/// One spawned hazard or enemy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedInstance {
    pub handle: InstanceHandle,
    pub prototype: String,
    pub at: WorldPos,
}

/// Instance pool that records every acquisition.
#[derive(Debug, Clone, Default)]
pub struct InstanceLedger {
    capacity: Option<usize>,
    spawned: Vec<SpawnedInstance>,
}

impl InstanceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            spawned: Vec::new(),
        }
    }

    #[must_use]
    pub fn spawned(&self) -> &[SpawnedInstance] {
        &self.spawned
    }
}

impl InstancePool for InstanceLedger {
    fn acquire(&mut self, prototype: &str, at: WorldPos) -> Result<InstanceHandle, CollaboratorError> {
        if self
            .capacity
            .is_some_and(|capacity| self.spawned.len() >= capacity)
        {
            return Err(CollaboratorError::PoolExhausted {
                prototype: prototype.to_string(),
            });
        }
        let handle = InstanceHandle(u64::try_from(self.spawned.len()).unwrap_or(u64::MAX));
        self.spawned.push(SpawnedInstance {
            handle,
            prototype: prototype.to_string(),
            at,
        });
        Ok(handle)
    }

    fn release(&mut self, handle: InstanceHandle) {
        self.spawned.retain(|instance| instance.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Cell;
    use crate::platform::TileId;

    #[test]
    fn pool_recycles_and_respects_capacity() {
        let mut pool = ChunkPool::with_capacity("chunk", 2);
        let mut first = pool.acquire_chunk("chunk").expect("first");
        first.set_tile(Cell::new(0, 0), Some(TileId::new("stone")));
        pool.release_chunk(first);
        let reused = pool.acquire_chunk("chunk").expect("reused");
        assert!(reused.is_empty());
        pool.place_chunk(
            reused,
            ChunkPlacement {
                origin_x: 0,
                name: "a".into(),
            },
        );
        let second = pool.acquire_chunk("chunk").expect("second");
        assert_eq!(pool.outstanding(), 1);
        assert!(matches!(
            pool.acquire_chunk("chunk"),
            Err(CollaboratorError::SurfaceUnavailable { .. })
        ));
        pool.release_chunk(second);
        assert!(matches!(
            pool.acquire_chunk("other"),
            Err(CollaboratorError::SurfaceUnavailable { prototype }) if prototype == "other"
        ));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let build = |tile: &str| {
            let mut pool = ChunkPool::new("chunk");
            let mut grid = pool.acquire_chunk("chunk").expect("grid");
            grid.set_tile(Cell::new(0, 0), Some(TileId::new(tile)));
            pool.place_chunk(
                grid,
                ChunkPlacement {
                    origin_x: 0,
                    name: "chunk".into(),
                },
            );
            pool.fingerprint()
        };
        assert_eq!(build("stone"), build("stone"));
        assert_ne!(build("stone"), build("grass"));
    }

    #[test]
    fn ledger_exhausts_at_capacity() {
        let mut ledger = InstanceLedger::with_capacity(1);
        let at = WorldPos { x: 1, y: 2 };
        assert_eq!(ledger.acquire("spike", at), Ok(InstanceHandle(0)));
        assert!(matches!(
            ledger.acquire("spike", at),
            Err(CollaboratorError::PoolExhausted { .. })
        ));
        assert_eq!(ledger.spawned().len(), 1);
    }

    #[test]
    fn released_instances_leave_the_ledger() {
        let mut ledger = InstanceLedger::new();
        let at = WorldPos { x: 0, y: 1 };
        let kept = ledger.acquire("bat", at).expect("kept");
        let dropped = ledger.acquire("slime", at).expect("dropped");
        ledger.release(dropped);
        assert_eq!(ledger.spawned().len(), 1);
        assert_eq!(ledger.spawned()[0].handle, kept);
    }
}
