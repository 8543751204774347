//! End-to-end simulation scenarios across both worlds.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use ral_core::{Bbox, EntityId};
use ral_simulation::{
    Action, Arena, AsciiCanvas, Decide, GridConfig, GridWorld, Perception, SimError, SimResult,
    World, WorldConfig,
};

fn live_ids(world: &World) -> BTreeSet<EntityId> {
    world
        .creatures()
        .keys()
        .chain(world.grass().keys())
        .copied()
        .collect()
}

#[derive(Debug)]
struct Broken;

impl Decide for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn decide(&mut self, perception: &Perception, _: &mut StdRng) -> SimResult<Action> {
        Err(SimError::Decision {
            creature: perception.creature,
            message: "policy not loaded".into(),
        })
    }
}

#[test]
fn default_world_runs_a_hundred_ticks() {
    let mut world = World::new(WorldConfig::default()).unwrap();
    let everything = Bbox::new([-1.0e9, -1.0e9], [1.0e9, 1.0e9]);
    for _ in 0..100 {
        let before = world.population();
        let alive = world.step().unwrap();
        let report = world.last_report();
        assert_eq!(before + report.born - report.died(), world.population());
        assert_eq!(world.index().query(everything), live_ids(&world));
        if !alive {
            break;
        }
    }
}

#[test]
fn decision_failure_reaches_the_caller() {
    let mut world = World::empty(WorldConfig::default()).unwrap();
    world.register_strategy("broken", Broken);
    let id = world.spawn_creature(0.0, 0.0, 300.0, "broken").unwrap();
    match world.step() {
        Err(SimError::Decision { creature, message }) => {
            assert_eq!(creature, id);
            assert_eq!(message, "policy not loaded");
        }
        other => panic!("expected a decision error, got {other:?}"),
    }
}

#[test]
fn arenas_are_interchangeable() {
    let mut arenas: Vec<Box<dyn Arena>> = vec![
        Box::new(World::new(WorldConfig::default().with_initial_grass(50)).unwrap()),
        Box::new(GridWorld::new(GridConfig::default()).unwrap()),
    ];
    for arena in &mut arenas {
        arena.enable_episode();
        for _ in 0..5 {
            if !arena.step().unwrap() {
                break;
            }
        }
        assert!(arena.tick() >= 1);
        assert!(arena.info().starts_with(&format!("tick {}", arena.tick())));
        let frames = arena.episode().map(|e| e.frames().len()).unwrap_or_default();
        assert_eq!(frames as u64, arena.tick());

        let mut canvas = AsciiCanvas::new(20, 10, arena.extent());
        arena.draw(&mut canvas);
        assert_eq!(canvas.render().lines().count(), 10);
    }
}

#[test]
fn grid_world_draws_every_creature() {
    let world = GridWorld::new(GridConfig::default().with_grass_fraction(0.0)).unwrap();
    let size = world.config().size;
    let mut canvas = AsciiCanvas::new(size, size, world.extent());
    world.draw(&mut canvas);
    let drawn = canvas.render().chars().filter(|c| *c == 'o').count();
    assert_eq!(drawn, world.population());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn index_matches_tables_for_any_seed(
        seed in any::<u64>(),
        creatures in 1usize..12,
        grass in 0usize..200,
    ) {
        let config = WorldConfig::default()
            .with_seed(seed)
            .with_size(120.0)
            .with_initial_creatures(creatures)
            .with_initial_grass(grass);
        let mut world = World::new(config).unwrap();
        let everything = Bbox::new([-1.0e9, -1.0e9], [1.0e9, 1.0e9]);
        for _ in 0..20 {
            let alive = world.step().unwrap();
            prop_assert_eq!(world.index().query(everything), live_ids(&world));
            if !alive {
                break;
            }
        }
    }
}
