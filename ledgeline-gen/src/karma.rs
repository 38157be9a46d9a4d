//! Karma budget and the hazard/enemy placement strategies it gates.
//!
//! Every committed chunk accrues `platforms × width` bad karma. Strategies
//! spend it one point per spike and `index / 2 + 1` per enemy, refunding half
//! of what they spend as good karma. Spending never exceeds the balance.
use log::trace;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ENEMY_WEIGHT, DEFAULT_TOP_SPIKE_ODDS};
use crate::generator::GenerationState;
use crate::geometry::{Cell, CellPattern, WorldPos, find_matching_cell, neighbor_matches};
use crate::interval::IntervalInt;
use crate::numbers::usize_to_i64;
use crate::phase::{ConfigError, validate_catalogue, validate_min, validate_odds};
use crate::rng::Roll;
use crate::surface::{ChunkSurface, CollaboratorError, InstancePool};

/// Running good/bad karma balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaLedger {
    pub good: i64,
    pub bad: i64,
}

impl KarmaLedger {
    /// Budget bought by a committed chunk.
    pub fn accrue(&mut self, platforms: usize, width: i32) -> i64 {
        let earned = usize_to_i64(platforms).saturating_mul(i64::from(width.max(0)));
        self.bad = self.bad.saturating_add(earned);
        earned
    }

    /// Bad karma that may still be spent.
    #[must_use]
    pub const fn available(&self) -> i64 {
        if self.bad > 0 { self.bad } else { 0 }
    }

    /// Deduct `cost`, refunding half of it as good karma.
    pub fn spend(&mut self, cost: i64) {
        let cost = cost.clamp(0, self.available());
        self.bad -= cost;
        self.good = self.good.saturating_add(cost / 2);
    }
}

/// Hazard run along a ceiling or a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSpikes {
    /// Prototypes that hang under a ceiling.
    #[serde(default)]
    pub hanging: Vec<String>,
    /// Prototypes that stand on a floor.
    #[serde(default)]
    pub standing: Vec<String>,
    /// Longest run placed in one application.
    pub width: IntervalInt,
    /// Chance of a hanging run when both kinds are configured.
    #[serde(default = "SpawnSpikes::default_hanging_odds")]
    pub hanging_odds: f32,
}

impl SpawnSpikes {
    #[must_use]
    pub const fn default_hanging_odds() -> f32 {
        DEFAULT_TOP_SPIKE_ODDS
    }

    fn spawn(
        &self,
        state: &mut GenerationState,
        surface: &dyn ChunkSurface,
        origin_x: i32,
        pool: &mut dyn InstancePool,
    ) -> Result<bool, CollaboratorError> {
        let budget = state.karma.available();
        let rng = state.rng.karma();
        let hanging = match (self.hanging.is_empty(), self.standing.is_empty()) {
            (true, true) => return Ok(false),
            (false, false) => rng.odds(self.hanging_odds),
            (false, true) => true,
            (true, false) => false,
        };
        let (catalogue, pattern) = if hanging {
            (&self.hanging, CellPattern::hanging())
        } else {
            (&self.standing, CellPattern::standing())
        };
        let Some(prototype) = rng.pick(catalogue) else {
            return Ok(false);
        };
        let step = if rng.odds(0.5) { 1 } else { -1 };
        let cap = i64::from(rng.range_in(self.width)).min(budget);
        let area = surface.bounds().grown_vertically(1);

        let mut placed = 0i64;
        let mut cursor = find_matching_cell(surface, area, pattern, rng);
        while let Some(cell) = cursor {
            if placed >= cap || !area.contains(cell) || !neighbor_matches(surface, cell, pattern) {
                break;
            }
            pool.acquire(prototype, world_pos(origin_x, cell))?;
            placed += 1;
            cursor = Some(Cell::new(cell.x + step, cell.y));
        }
        state.karma.spend(placed);
        trace!("spikes `{prototype}` placed {placed} (cap {cap})");
        Ok(placed > 0)
    }
}

/// Weighted enemy catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyProto {
    pub id: String,
    #[serde(default = "EnemyProto::default_weight")]
    pub weight: u32,
}

impl EnemyProto {
    #[must_use]
    pub const fn default_weight() -> u32 {
        DEFAULT_ENEMY_WEIGHT
    }

    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            weight: Self::default_weight(),
        }
    }
}

impl AsRef<str> for EnemyProto {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

/// Cost of the enemy at catalogue position `index`.
#[must_use]
pub fn enemy_cost(index: usize) -> i64 {
    usize_to_i64(index / 2 + 1)
}

/// Enemies dropped onto open floor cells until the chunk cap or budget runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEnemy {
    pub max_karma: i64,
    pub protos: Vec<EnemyProto>,
}

impl SpawnEnemy {
    fn spawn(
        &self,
        state: &mut GenerationState,
        surface: &dyn ChunkSurface,
        origin_x: i32,
        pool: &mut dyn InstancePool,
    ) -> Result<bool, CollaboratorError> {
        let limit = self.max_karma.min(state.karma.available());
        let weights: Vec<u32> = self.protos.iter().map(|proto| proto.weight).collect();
        let area = surface.bounds().grown_vertically(1);
        let rng = state.rng.karma();

        let mut spent = 0i64;
        loop {
            let Some(cell) = find_matching_cell(surface, area, CellPattern::standing(), rng) else {
                break;
            };
            let Some(index) = rng.weighted_index(&weights) else {
                break;
            };
            let cost = enemy_cost(index);
            if spent + cost > limit {
                break;
            }
            let Some(proto) = self.protos.get(index) else {
                break;
            };
            pool.acquire(&proto.id, world_pos(origin_x, cell))?;
            spent += cost;
        }
        state.karma.spend(spent);
        trace!("enemies spent {spent} of {limit}");
        Ok(spent > 0)
    }
}

fn world_pos(origin_x: i32, cell: Cell) -> WorldPos {
    WorldPos {
        x: origin_x + cell.x,
        y: cell.y,
    }
}

/// Configured karma strategy, selected by its `kind` tag in level files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Karma {
    /// Always succeeds without placing anything.
    NoOp,
    SpawnSpikes(SpawnSpikes),
    SpawnEnemy(SpawnEnemy),
}

impl Karma {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NoOp => "NoOp",
            Self::SpawnSpikes(_) => "SpawnSpikes",
            Self::SpawnEnemy(_) => "SpawnEnemy",
        }
    }

    /// Place hazards into the committed chunk at `origin_x`.
    ///
    /// # Errors
    ///
    /// Propagates instance pool failures.
    pub fn apply(
        &self,
        state: &mut GenerationState,
        surface: &dyn ChunkSurface,
        origin_x: i32,
        pool: &mut dyn InstancePool,
    ) -> Result<bool, CollaboratorError> {
        match self {
            Self::NoOp => Ok(true),
            Self::SpawnSpikes(spikes) => spikes.spawn(state, surface, origin_x, pool),
            Self::SpawnEnemy(enemies) => enemies.spawn(state, surface, origin_x, pool),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::NoOp => Ok(()),
            Self::SpawnSpikes(spikes) => {
                if spikes.hanging.is_empty() && spikes.standing.is_empty() {
                    return Err(ConfigError::EmptyCatalogue {
                        field: "spawn_spikes.prototypes",
                    });
                }
                if !spikes.hanging.is_empty() {
                    validate_catalogue("spawn_spikes.hanging", &spikes.hanging)?;
                }
                if !spikes.standing.is_empty() {
                    validate_catalogue("spawn_spikes.standing", &spikes.standing)?;
                }
                spikes.width.validate_non_negative("spawn_spikes.width")?;
                validate_odds("spawn_spikes.hanging_odds", spikes.hanging_odds)
            }
            Self::SpawnEnemy(enemies) => {
                validate_min("spawn_enemy.max_karma", 0, enemies.max_karma)?;
                validate_catalogue("spawn_enemy.protos", &enemies.protos)?;
                if enemies.protos.iter().all(|proto| proto.weight == 0) {
                    return Err(ConfigError::EmptyCatalogue {
                        field: "spawn_enemy.protos",
                    });
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customize::test_support::SEED;
    use crate::platform::TileId;
    use crate::pool::InstanceLedger;
    use crate::surface::TileGrid;

    fn floor(width: i32) -> TileGrid {
        let mut grid = TileGrid::new();
        for x in 0..width {
            grid.set_tile(Cell::new(x, 0), Some(TileId::new("stone")));
        }
        grid
    }

    fn funded(bad: i64) -> GenerationState {
        let mut state = GenerationState::new(SEED, 2);
        state.karma_mut().bad = bad;
        state
    }

    #[test]
    fn ledger_caps_spending_and_refunds_half() {
        let mut ledger = KarmaLedger::default();
        assert_eq!(ledger.accrue(3, 4), 12);
        ledger.spend(5);
        assert_eq!(ledger, KarmaLedger { good: 2, bad: 7 });
        ledger.spend(100);
        assert_eq!(ledger.bad, 0);
        assert_eq!(ledger.good, 5);
    }

    #[test]
    fn standing_spikes_walk_the_floor() {
        let spikes = Karma::SpawnSpikes(SpawnSpikes {
            hanging: Vec::new(),
            standing: vec!["spike_up".into()],
            width: IntervalInt::exactly(3),
            hanging_odds: 0.0,
        });
        let mut state = funded(100);
        let grid = floor(10);
        let mut pool = InstanceLedger::new();
        assert_eq!(spikes.apply(&mut state, &grid, 20, &mut pool), Ok(true));
        let spawned = pool.spawned();
        assert!(!spawned.is_empty() && spawned.len() <= 3);
        assert!(spawned.iter().all(|spawn| spawn.at.y == 1));
        assert!(spawned.iter().all(|spawn| (20..30).contains(&spawn.at.x)));
        let count = usize_to_i64(spawned.len());
        assert_eq!(state.karma().bad, 100 - count);
        assert_eq!(state.karma().good, count / 2);
    }

    #[test]
    fn hanging_spikes_need_a_ceiling() {
        let spikes = Karma::SpawnSpikes(SpawnSpikes {
            hanging: vec!["spike_down".into()],
            standing: Vec::new(),
            width: IntervalInt::exactly(4),
            hanging_odds: 1.0,
        });
        let mut state = funded(100);
        let grid = floor(6);
        let mut pool = InstanceLedger::new();
        assert_eq!(spikes.apply(&mut state, &grid, 0, &mut pool), Ok(true));
        assert!(pool.spawned().iter().all(|spawn| spawn.at.y == -1));
    }

    #[test]
    fn spikes_respect_budget() {
        let spikes = Karma::SpawnSpikes(SpawnSpikes {
            hanging: Vec::new(),
            standing: vec!["spike_up".into()],
            width: IntervalInt::exactly(8),
            hanging_odds: 0.0,
        });
        let mut state = funded(0);
        let mut pool = InstanceLedger::new();
        assert_eq!(spikes.apply(&mut state, &floor(10), 0, &mut pool), Ok(false));
        assert!(pool.spawned().is_empty());
        assert_eq!(state.karma().bad, 0);
    }

    #[test]
    fn enemies_stop_before_overspending() {
        let enemies = Karma::SpawnEnemy(SpawnEnemy {
            max_karma: 5,
            protos: vec![EnemyProto::new("slime"), EnemyProto::new("bat")],
        });
        let mut state = funded(100);
        let mut pool = InstanceLedger::new();
        assert_eq!(enemies.apply(&mut state, &floor(12), 0, &mut pool), Ok(true));
        assert_eq!(pool.spawned().len(), 5);
        assert_eq!(state.karma().bad, 95);
        assert_eq!(state.karma().good, 2);
    }

    #[test]
    fn enemy_cost_scales_with_index() {
        assert_eq!(enemy_cost(0), 1);
        assert_eq!(enemy_cost(1), 1);
        assert_eq!(enemy_cost(2), 2);
        assert_eq!(enemy_cost(5), 3);
    }

    #[test]
    fn enemies_without_floor_place_nothing() {
        let enemies = Karma::SpawnEnemy(SpawnEnemy {
            max_karma: 5,
            protos: vec![EnemyProto::new("slime")],
        });
        let mut state = funded(100);
        let mut pool = InstanceLedger::new();
        assert_eq!(
            enemies.apply(&mut state, &TileGrid::new(), 0, &mut pool),
            Ok(false)
        );
    }

    #[test]
    fn exhausted_pool_propagates() {
        let enemies = Karma::SpawnEnemy(SpawnEnemy {
            max_karma: 5,
            protos: vec![EnemyProto::new("slime")],
        });
        let mut state = funded(100);
        let mut pool = InstanceLedger::with_capacity(2);
        assert!(matches!(
            enemies.apply(&mut state, &floor(8), 0, &mut pool),
            Err(CollaboratorError::PoolExhausted { .. })
        ));
    }

    #[test]
    fn noop_always_succeeds() {
        let mut state = funded(10);
        let mut pool = InstanceLedger::new();
        assert_eq!(Karma::NoOp.apply(&mut state, &TileGrid::new(), 0, &mut pool), Ok(true));
        assert_eq!(state.karma().bad, 10);
    }

    #[test]
    fn validation_requires_some_prototype() {
        let spikes = Karma::SpawnSpikes(SpawnSpikes {
            hanging: Vec::new(),
            standing: Vec::new(),
            width: IntervalInt::exactly(2),
            hanging_odds: 0.5,
        });
        assert!(matches!(
            spikes.validate(),
            Err(ConfigError::EmptyCatalogue { .. })
        ));
    }
}
