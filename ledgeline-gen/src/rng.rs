//! Deterministic random streams and the draw vocabulary used by strategies.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use smallvec::SmallVec;

use crate::constants::{STREAM_KARMA, STREAM_LAYOUT};
use crate::interval::IntervalInt;
use crate::numbers::fraction_of;

/// Indices produced by a deal; small selections stay inline.
pub type DealSet = SmallVec<[usize; 8]>;

/// Deterministic bundle of RNG streams segregated by generation domain.
///
/// Customizers and the orchestrator draw from `layout`; karma strategies draw
/// from `karma`. Hazard tuning therefore never shifts platform geometry for a
/// given seed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    layout: CountingRng<ChaCha20Rng>,
    karma: CountingRng<ChaCha20Rng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            layout: CountingRng::new(derive_stream_seed(seed, STREAM_LAYOUT)),
            karma: CountingRng::new(derive_stream_seed(seed, STREAM_KARMA)),
        }
    }

    /// Access the layout RNG stream.
    pub fn layout(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.layout
    }

    /// Access the karma RNG stream.
    pub fn karma(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.karma
    }

    /// Draw counts for the layout and karma streams.
    #[must_use]
    pub const fn draws(&self) -> (u64, u64) {
        (self.layout.draws, self.karma.draws)
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Draw vocabulary shared by every strategy.
pub trait Roll: Rng {
    /// True with probability `p` (clamped to `[0, 1]`).
    fn odds(&mut self, p: f32) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.gen_bool(f64::from(p))
    }

    /// Uniform integer in `[lo, hi)`; returns `lo` when the range is empty.
    fn range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.gen_range(lo..hi)
    }

    /// Uniform integer in the inclusive interval; returns `min` when inverted.
    fn range_in(&mut self, interval: IntervalInt) -> i32 {
        if interval.max <= interval.min {
            return interval.min;
        }
        self.gen_range(interval.min..=interval.max)
    }

    /// Uniform index in `[0, len)`; zero for empty collections.
    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.gen_range(0..len)
    }

    /// Uniformly pick an element.
    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.index(items.len());
        items.get(idx)
    }

    /// Deal `k` distinct indices out of `0..n`, in draw order.
    fn deal(&mut self, n: usize, k: usize) -> DealSet {
        let k = k.min(n);
        let mut deck: Vec<usize> = (0..n).collect();
        for slot in 0..k {
            let swap = slot + self.index(n - slot);
            deck.swap(slot, swap);
        }
        deck.truncate(k);
        DealSet::from_vec(deck)
    }

    /// Deal `ceil(fraction * n)` distinct indices out of `0..n`.
    fn deal_fraction(&mut self, n: usize, fraction: f32) -> DealSet {
        self.deal(n, fraction_of(n, fraction))
    }

    /// Pick an index proportionally to `weights`; `None` when every weight is zero.
    fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|weight| u64::from(*weight)).sum();
        if total == 0 {
            return None;
        }
        let roll = self.gen_range(0..total);
        let mut current = 0u64;
        for (idx, weight) in weights.iter().enumerate() {
            current += u64::from(*weight);
            if roll < current {
                return Some(idx);
            }
        }
        weights.iter().position(|weight| *weight > 0)
    }
}

impl<R: Rng + ?Sized> Roll for R {}
