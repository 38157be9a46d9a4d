use ledgeline_gen::{
    Cell, ChunkSurface, Climb, Customize, Fork, GenerationState, GeneratorConfig, InitArea,
    Initialize, IntervalInt, LevelGenerator, Platform, TileGrid, TileId,
};

const SEED: u64 = 0x5EED;

fn state_with(heights: &[i32]) -> GenerationState {
    let mut state = GenerationState::new(SEED, 2);
    for height in heights {
        state
            .registry_mut()
            .insert_sorted(Platform::new(*height, TileId::new("stone")))
            .unwrap();
    }
    state
}

#[test]
fn initialize_seeds_three_cleared_platforms() {
    let init = Initialize {
        area: InitArea {
            width: 10,
            height: 20,
        },
        count: IntervalInt::new(3, 3),
        tiles: vec![TileId::new("grass")],
        attempts: Initialize::default_attempts(),
        stagger: false,
    };
    let mut state = GenerationState::new(SEED, 2);
    let mut grid = TileGrid::new();
    assert!(init.customize(&mut state, &mut grid));

    let heights = state.registry().heights();
    assert_eq!(heights.len(), 3);
    assert!(heights.windows(2).all(|pair| pair[1] - pair[0] >= 2));
    for height in heights {
        for x in 0..=10 {
            assert!(grid.tile(Cell::new(x, height)).is_some());
        }
        assert!(grid.tile(Cell::new(11, height)).is_none());
    }
}

#[test]
fn climb_lifts_both_platforms_by_rise() {
    let climb = Climb {
        fall_odds: 0.0,
        rise: IntervalInt::new(4, 4),
        run: IntervalInt::new(5, 5),
    };
    let mut state = state_with(&[0, 5]);
    let mut grid = TileGrid::new();
    assert!(climb.customize(&mut state, &mut grid));
    assert_eq!(state.registry().heights(), vec![4, 9]);
}

#[test]
fn fork_splits_lone_platform() {
    let fork = Fork {
        max_platforms: 3,
        splits: IntervalInt::new(1, 1),
        width: IntervalInt::new(10, 10),
        hgap: IntervalInt::new(1, 2),
        up: IntervalInt::new(6, 6),
        down: IntervalInt::new(3, 3),
        tiles: Vec::new(),
        tile_odds: 0.0,
    };
    let mut state = state_with(&[10]);
    let mut grid = TileGrid::new();
    assert!(fork.customize(&mut state, &mut grid));
    assert_eq!(state.registry().heights(), vec![13, 16]);
    state.registry().check_invariants(2).unwrap();
}

#[test]
fn preset_level_runs_to_completion() {
    let config = GeneratorConfig::preset().unwrap();
    let vclear = config.vclear;
    let total = config.total_width();
    let mut generator = LevelGenerator::in_memory(config).unwrap();
    generator.generate().unwrap();

    assert!(generator.is_done());
    assert!(generator.width() >= total);
    generator
        .state()
        .registry()
        .check_invariants(vclear)
        .unwrap();
    let placed = generator.provider().placed();
    assert_eq!(placed.len(), generator.chunks().len());
    let mut origin = 0;
    for (chunk, record) in placed.iter().zip(generator.chunks()) {
        assert_eq!(chunk.placement.origin_x, origin);
        assert_eq!(chunk.placement.name, record.name);
        assert!(!chunk.grid.is_empty());
        origin += record.extent;
    }
    assert_eq!(origin, generator.width());
    assert!(!generator.pool().spawned().is_empty());
}
