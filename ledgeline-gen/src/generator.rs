//! Phase pipeline orchestrator.
//!
//! [`LevelGenerator`] owns the [`GenerationState`] for a whole run and turns
//! it into chunks: each `extend` acquires a surface, lets one customizer shape
//! it, accrues karma, lets one karma strategy spend it, and commits the chunk.
use log::{debug, info};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::customize::Customizer;
use crate::geometry::WorldPos;
use crate::karma::{Karma, KarmaLedger};
use crate::phase::{ConfigError, GeneratorConfig};
use crate::platform::{Platform, PlatformRegistry};
use crate::pool::{ChunkPool, InstanceLedger};
use crate::rng::{CountingRng, RngBundle, Roll};
use crate::surface::{
    ChunkPlacement, ChunkProvider, ChunkSurface, CollaboratorError, InstanceHandle, InstancePool,
};

/// Hard failures of an `extend` call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error(
        "phase {phase} is unsatisfiable at width {width}: none of [{candidates}] applies to {platforms} platforms"
    )]
    PhaseUnsatisfiable {
        phase: usize,
        width: i32,
        platforms: usize,
        candidates: String,
    },
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Mutable generation state owned by the orchestrator for one run.
#[derive(Debug, Clone)]
pub struct GenerationState {
    pub(crate) vclear: i32,
    pub(crate) phase: usize,
    pub(crate) width: i32,
    pub(crate) registry: PlatformRegistry,
    pub(crate) karma: KarmaLedger,
    pub(crate) rng: RngBundle,
}

impl GenerationState {
    #[must_use]
    pub fn new(seed: u64, vclear: i32) -> Self {
        Self {
            vclear,
            phase: 0,
            width: 0,
            registry: PlatformRegistry::new(),
            karma: KarmaLedger::default(),
            rng: RngBundle::from_user_seed(seed),
        }
    }

    #[must_use]
    pub const fn vclear(&self) -> i32 {
        self.vclear
    }

    #[must_use]
    pub const fn phase(&self) -> usize {
        self.phase
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub const fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    /// Direct registry access for seeding and tests; clearance is the caller's problem.
    pub fn registry_mut(&mut self) -> &mut PlatformRegistry {
        &mut self.registry
    }

    #[must_use]
    pub const fn karma(&self) -> KarmaLedger {
        self.karma
    }

    pub fn karma_mut(&mut self) -> &mut KarmaLedger {
        &mut self.karma
    }

    /// Draws taken from the layout and karma streams.
    #[must_use]
    pub const fn rng_draws(&self) -> (u64, u64) {
        self.rng.draws()
    }

    /// Split borrow used by customizers: registry, layout stream, clearance.
    pub(crate) fn layout_parts(
        &mut self,
    ) -> (&mut PlatformRegistry, &mut CountingRng<ChaCha20Rng>, i32) {
        (&mut self.registry, self.rng.layout(), self.vclear)
    }
}

/// Where the pipeline is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenStatus {
    Generating(usize),
    Done,
}

/// One committed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub index: usize,
    pub phase: usize,
    pub name: String,
    pub customizer: String,
    pub karma: Option<String>,
    pub origin_x: i32,
    /// Painted columns.
    pub width: i32,
    /// Columns the cumulative width advanced by.
    pub extent: i32,
    pub platforms: usize,
    pub karma_accrued: i64,
    pub karma_spent: i64,
}

/// Drives customizer phases chunk by chunk against the supplied collaborators.
#[derive(Debug)]
pub struct LevelGenerator<P, I> {
    config: GeneratorConfig,
    state: GenerationState,
    provider: P,
    pool: I,
    status: GenStatus,
    phase_start: i32,
    chunks: Vec<ChunkRecord>,
}

impl LevelGenerator<ChunkPool, InstanceLedger> {
    /// Generator backed by the in-memory reference collaborators.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn in_memory(config: GeneratorConfig) -> Result<Self, ConfigError> {
        let provider = ChunkPool::new(&config.chunk_prototype);
        Self::configure(config, provider, InstanceLedger::new())
    }
}

impl<P, I> LevelGenerator<P, I>
where
    P: ChunkProvider,
    I: InstancePool,
{
    /// Validate `config` and prepare a run at width zero in phase zero.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn configure(config: GeneratorConfig, provider: P, pool: I) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = GenerationState::new(config.seed, config.vclear);
        Ok(Self {
            config,
            state,
            provider,
            pool,
            status: GenStatus::Generating(0),
            phase_start: 0,
            chunks: Vec::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &GenerationState {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> GenStatus {
        self.status
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.status, GenStatus::Done)
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.state.width
    }

    /// Current phase; equals the phase count once done.
    #[must_use]
    pub const fn phase_index(&self) -> usize {
        self.state.phase
    }

    #[must_use]
    pub fn platforms(&self) -> &[Platform] {
        self.state.registry.platforms()
    }

    #[must_use]
    pub const fn karma(&self) -> KarmaLedger {
        self.state.karma
    }

    #[must_use]
    pub fn chunks(&self) -> &[ChunkRecord] {
        &self.chunks
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub const fn pool(&self) -> &I {
        &self.pool
    }

    /// Produce one chunk.
    ///
    /// Returns `Ok(false)` once generation is done, including when the final
    /// phase runs out of applicable customizers.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::PhaseUnsatisfiable`] when no customizer of a
    /// non-final phase applies, and propagates collaborator failures.
    pub fn extend(&mut self) -> Result<bool, GenerationError> {
        let GenStatus::Generating(phase_index) = self.status else {
            return Ok(false);
        };
        let phase_count = self.config.phases.len();
        let Some(phase) = self.config.phases.get(phase_index) else {
            self.finish();
            return Ok(false);
        };

        let mut surface = self.provider.acquire_chunk(&self.config.chunk_prototype)?;
        surface.clear();
        let checkpoint = self.state.clone();

        let Some(customizer) = apply_customizers(&mut self.state, &phase.customizers, &mut surface)
        else {
            self.provider.release_chunk(surface);
            if phase_index + 1 < phase_count {
                return Err(GenerationError::PhaseUnsatisfiable {
                    phase: phase_index,
                    width: self.state.width,
                    platforms: self.state.registry.len(),
                    candidates: phase
                        .customizers
                        .iter()
                        .map(Customizer::name)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
            info!(
                "final phase {phase_index} exhausted at width {}",
                self.state.width
            );
            self.finish();
            return Ok(false);
        };

        surface.refresh();
        let bounds = surface.bounds();
        let origin_x = self.state.width;
        let name = format!("{customizer} -> {origin_x}");
        let platforms = self.state.registry.len();
        let karma_accrued = self.state.karma.accrue(platforms, bounds.size_x());
        let bad_before = self.state.karma.bad;
        self.state.width += bounds.x_max;

        let karma = match apply_karmas(
            &mut self.state,
            &phase.karmas,
            &surface,
            origin_x,
            &mut self.pool,
        ) {
            Ok(karma) => karma,
            Err(err) => {
                self.provider.release_chunk(surface);
                self.state = checkpoint;
                return Err(err.into());
            }
        };
        let karma_spent = bad_before - self.state.karma.bad;

        debug!("chunk {name}: {platforms} platforms, {} columns", bounds.size_x());
        self.chunks.push(ChunkRecord {
            index: self.chunks.len(),
            phase: phase_index,
            name: name.clone(),
            customizer: customizer.to_string(),
            karma: karma.map(str::to_string),
            origin_x,
            width: bounds.size_x(),
            extent: bounds.x_max,
            platforms,
            karma_accrued,
            karma_spent,
        });
        self.provider
            .place_chunk(surface, ChunkPlacement { origin_x, name });

        let phase_end = self.phase_start.saturating_add(phase.width);
        if self.state.width >= phase_end {
            self.advance_phase(phase_index + 1, phase_count);
        }
        Ok(true)
    }

    /// Extend until the cumulative width reaches `target` or generation is done.
    ///
    /// # Errors
    ///
    /// Propagates the first failing `extend`.
    pub fn extend_to(&mut self, target: i32) -> Result<(), GenerationError> {
        while self.state.width < target {
            if !self.extend()? {
                break;
            }
        }
        Ok(())
    }

    /// Run every phase to completion.
    ///
    /// # Errors
    ///
    /// Propagates the first failing `extend`.
    pub fn generate(&mut self) -> Result<(), GenerationError> {
        while self.extend()? {}
        Ok(())
    }

    fn advance_phase(&mut self, next: usize, phase_count: usize) {
        self.phase_start = self.state.width;
        self.state.phase = next;
        if next < phase_count {
            info!("entering phase {next} at width {}", self.state.width);
            self.status = GenStatus::Generating(next);
        } else {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.state.phase = self.config.phases.len();
        if self.status != GenStatus::Done {
            info!(
                "generation done at width {} after {} chunks",
                self.state.width,
                self.chunks.len()
            );
        }
        self.status = GenStatus::Done;
    }
}

/// Round-robin from a random offset until a customizer paints something.
///
/// Declined attempts leave neither paint nor registry changes behind.
fn apply_customizers(
    state: &mut GenerationState,
    customizers: &[Customizer],
    surface: &mut dyn ChunkSurface,
) -> Option<&'static str> {
    let count = customizers.len();
    let offset = state.rng.layout().index(count);
    for step in 0..count {
        let Some(customizer) = customizers.get((offset + step) % count) else {
            continue;
        };
        let snapshot = state.registry.clone();
        if customizer.apply(state, surface) {
            surface.compress_bounds();
            if surface.bounds().x_max > 0 {
                return Some(customizer.name());
            }
        }
        state.registry = snapshot;
        surface.clear();
    }
    None
}

fn apply_karmas(
    state: &mut GenerationState,
    karmas: &[Karma],
    surface: &dyn ChunkSurface,
    origin_x: i32,
    pool: &mut dyn InstancePool,
) -> Result<Option<&'static str>, CollaboratorError> {
    let count = karmas.len();
    if count == 0 {
        return Ok(None);
    }
    let offset = state.rng.karma().index(count);
    let mut pool = Tracked {
        inner: pool,
        handles: Vec::new(),
    };
    for step in 0..count {
        let Some(karma) = karmas.get((offset + step) % count) else {
            continue;
        };
        match karma.apply(state, surface, origin_x, &mut pool) {
            Ok(true) => return Ok(Some(karma.name())),
            Ok(false) => {}
            Err(err) => {
                pool.release_all();
                return Err(err);
            }
        }
    }
    if state.karma.good != 0 && state.karma.bad != 0 {
        debug!(
            "karma unmatched at x {origin_x}: good {}, bad {}",
            state.karma.good, state.karma.bad
        );
    }
    Ok(None)
}

/// Remembers what one chunk acquired so a failed chunk can hand it back.
struct Tracked<'a> {
    inner: &'a mut dyn InstancePool,
    handles: Vec<InstanceHandle>,
}

impl Tracked<'_> {
    fn release_all(&mut self) {
        for handle in self.handles.drain(..).rev() {
            self.inner.release(handle);
        }
    }
}

impl InstancePool for Tracked<'_> {
    fn acquire(&mut self, prototype: &str, at: WorldPos) -> Result<InstanceHandle, CollaboratorError> {
        let handle = self.inner.acquire(prototype, at)?;
        self.handles.push(handle);
        Ok(handle)
    }

    fn release(&mut self, handle: InstanceHandle) {
        self.handles.retain(|held| *held != handle);
        self.inner.release(handle);
    }
}
