//! The grid world: one entity per cell on a square board.
//!
//! Creatures see a small window of cells around them and move at most one
//! cell per tick along the dominant axis of their chosen heading. Walls,
//! rock, water and other creatures block movement; grass is eaten by stepping
//! onto it. Creatures of a predator species eat prey by stepping onto it.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ral_core::{Bbox, EntityId, IdGenerator, Mood, Rgb, geometry};
use tracing::{debug, trace, warn};

use crate::arena::{Arena, TickReport};
use crate::canvas::Canvas;
use crate::config::GridConfig;
use crate::decision::{Action, Decide, Greedy, Hunt, StrategyRegistry, Wander};
use crate::episode::Episode;
use crate::error::{SimError, SimResult};
use crate::event::{DeathCause, EventLog, SimEvent, SimEventKind};
use crate::perception::{Cell, CellWindow, Perception, View};

const EMPTY_CODE: i64 = 0;
const GRASS_CODE: i64 = 1;
const CREATURE_CODE: i64 = 2;
const ROCK_CODE: i64 = -2;
const WATER_CODE: i64 = -3;

const PREDATOR_COLOR: Rgb = Rgb(101, 67, 33);

/// Headings whose horizontal and vertical parts differ by less than this are diagonal.
const AXIS_TIE: f64 = 1e-9;

/// What fills a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occupant {
    /// Nothing.
    #[default]
    Empty,
    /// A grass instance.
    Grass(EntityId),
    /// A creature, or a cell reserved for a newborn.
    Creature(EntityId),
    /// Impassable rock.
    Rock,
    /// Impassable water.
    Water,
}

/// Impassable ground a grid cell can be covered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    /// Rock.
    Rock,
    /// Water.
    Water,
}

impl From<Terrain> for Occupant {
    fn from(terrain: Terrain) -> Self {
        match terrain {
            Terrain::Rock => Self::Rock,
            Terrain::Water => Self::Water,
        }
    }
}

/// A creature living on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCreature {
    /// Unique, non-negative id.
    pub id: EntityId,
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Stored energy.
    pub energy: f64,
    /// Body color.
    pub color: Rgb,
    /// Name of the decision strategy this creature follows.
    pub species: String,
    /// Whether the species hunts other creatures.
    pub predator: bool,
    /// What the creature did on its last turn.
    pub mood: Mood,
}

/// The discrete grid world.
pub struct GridWorld {
    config: GridConfig,
    cells: Vec<Occupant>,
    creatures: BTreeMap<EntityId, GridCreature>,
    grass: usize,
    ids: IdGenerator,
    rng: StdRng,
    strategies: StrategyRegistry,
    predators: BTreeSet<String>,
    events: EventLog,
    episode: Option<Episode>,
    tick: u64,
    last: TickReport,
}

impl std::fmt::Debug for GridWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridWorld")
            .field("tick", &self.tick)
            .field("size", &self.config.size)
            .field("creatures", &self.creatures.len())
            .field("grass", &self.grass)
            .finish()
    }
}

impl GridWorld {
    /// Create a grid and seed it with grass and creatures.
    pub fn new(config: GridConfig) -> SimResult<Self> {
        let mut world = Self::empty(config)?;
        world.populate()?;
        Ok(world)
    }

    /// Create an empty grid. The built-in strategies are registered.
    pub fn empty(config: GridConfig) -> SimResult<Self> {
        config.validate()?;
        let mut world = Self {
            cells: vec![Occupant::Empty; config.size * config.size],
            rng: StdRng::seed_from_u64(config.seed),
            events: EventLog::new(config.max_events),
            creatures: BTreeMap::new(),
            grass: 0,
            ids: IdGenerator::new(),
            strategies: StrategyRegistry::new(),
            predators: BTreeSet::new(),
            episode: None,
            tick: 0,
            last: TickReport::default(),
            config,
        };
        world.register_builtin_strategies();
        Ok(world)
    }

    fn register_builtin_strategies(&mut self) {
        let split = self.config.split_energy;
        self.register_strategy("wander", Wander::new(split));
        self.register_strategy("greedy", Greedy::new(split, 0.0));
        self.register_predator("hunt", Hunt::new(split, self.config.hunt_move_chance));
    }

    /// Clear the grid and seed it again from `config`. Ids keep counting.
    pub fn reset(&mut self, config: GridConfig) -> SimResult<()> {
        config.validate()?;
        self.cells = vec![Occupant::Empty; config.size * config.size];
        self.creatures.clear();
        self.grass = 0;
        self.rng = StdRng::seed_from_u64(config.seed);
        self.events = EventLog::new(config.max_events);
        self.tick = 0;
        self.last = TickReport::default();
        if self.episode.is_some() {
            self.episode = Some(Episode::new());
        }
        self.config = config;
        self.register_builtin_strategies();
        self.populate()
    }

    fn populate(&mut self) -> SimResult<()> {
        let size = self.config.size;
        let total = size * size;
        let grass = ((self.config.grass_fraction * total as f64) as usize).min(total);
        for i in rand::seq::index::sample(&mut self.rng, total, grass) {
            self.spawn_grass(i % size, i / size)?;
        }
        self.scatter(self.config.rock_fraction, Terrain::Rock);
        self.scatter(self.config.water_fraction, Terrain::Water);

        for i in 0..self.config.initial_creatures {
            let (species, hue) = if i % 2 == 0 {
                ("wander", 0.5)
            } else {
                ("greedy", 0.9)
            };
            let Some((x, y)) = self.random_empty_cell(total) else {
                warn!(placed = i, "grid full, stopped seeding creatures");
                break;
            };
            let energy = self.config.initial_energy;
            let id = self.spawn_creature(x, y, energy, species)?;
            if let Some(creature) = self.creatures.get_mut(&id) {
                creature.color = Rgb::from_hls(hue, 0.6, 0.8);
            }
        }

        for i in 0..self.config.initial_predators {
            let Some((x, y)) = self.random_empty_cell(total) else {
                warn!(placed = i, "grid full, stopped seeding predators");
                break;
            };
            let energy = self.config.initial_energy;
            let id = self.spawn_creature(x, y, energy, "hunt")?;
            if let Some(creature) = self.creatures.get_mut(&id) {
                creature.color = PREDATOR_COLOR;
            }
        }
        debug!(
            creatures = self.creatures.len(),
            grass = self.grass,
            "grid populated"
        );
        Ok(())
    }

    /// Cover `fraction` of all cells with terrain, picked among the empty ones.
    fn scatter(&mut self, fraction: f64, terrain: Terrain) {
        let size = self.config.size;
        let empty: Vec<usize> = (0..self.cells.len())
            .filter(|&i| self.cells[i] == Occupant::Empty)
            .collect();
        let count = ((fraction * self.cells.len() as f64) as usize).min(empty.len());
        for k in rand::seq::index::sample(&mut self.rng, empty.len(), count) {
            let i = empty[k];
            self.set_cell(i % size, i / size, terrain.into());
        }
    }

    fn random_empty_cell(&mut self, attempts: usize) -> Option<(usize, usize)> {
        let size = self.config.size;
        for _ in 0..attempts {
            let (x, y) = (self.rng.random_range(0..size), self.rng.random_range(0..size));
            if self.cells[y * size + x] == Occupant::Empty {
                return Some((x, y));
            }
        }
        None
    }

    /// Register a strategy for a species. Replaces any earlier registration.
    pub fn register_strategy<S: Decide + 'static>(&mut self, species: &str, strategy: S) {
        self.strategies.register(species, strategy);
        self.predators.remove(species);
    }

    /// Register a strategy for a species whose creatures eat other creatures.
    pub fn register_predator<S: Decide + 'static>(&mut self, species: &str, strategy: S) {
        self.strategies.register(species, strategy);
        self.predators.insert(species.to_string());
    }

    /// Put a creature on an empty cell.
    pub fn spawn_creature(
        &mut self,
        x: usize,
        y: usize,
        energy: f64,
        species: &str,
    ) -> SimResult<EntityId> {
        if !self.strategies.contains(species) {
            return Err(SimError::UnknownStrategy(species.to_string()));
        }
        let slot = self.empty_slot(x, y)?;
        let id = self.ids.next_creature();
        self.cells[slot] = Occupant::Creature(id);
        let color = Rgb::random_creature(&mut self.rng);
        self.creatures.insert(
            id,
            GridCreature {
                id,
                x,
                y,
                energy,
                color,
                species: species.to_string(),
                predator: self.predators.contains(species),
                mood: Mood::Idle,
            },
        );
        Ok(id)
    }

    /// Cover an empty cell with terrain.
    pub fn place_terrain(&mut self, x: usize, y: usize, terrain: Terrain) -> SimResult<()> {
        self.empty_slot(x, y)?;
        self.set_cell(x, y, terrain.into());
        Ok(())
    }

    /// Put grass on an empty cell.
    pub fn spawn_grass(&mut self, x: usize, y: usize) -> SimResult<EntityId> {
        let slot = self.empty_slot(x, y)?;
        let id = self.ids.next_grass();
        self.cells[slot] = Occupant::Grass(id);
        self.grass += 1;
        Ok(id)
    }

    fn empty_slot(&self, x: usize, y: usize) -> SimResult<usize> {
        match self.cell(x, y) {
            Some(Occupant::Empty) => Ok(y * self.config.size + x),
            _ => Err(SimError::CellUnavailable { x, y }),
        }
    }

    /// The configuration in effect.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Live creatures by id.
    pub fn creatures(&self) -> &BTreeMap<EntityId, GridCreature> {
        &self.creatures
    }

    /// Look up one creature.
    pub fn creature(&self, id: EntityId) -> Option<&GridCreature> {
        self.creatures.get(&id)
    }

    /// The content of a cell, or `None` outside the grid.
    pub fn cell(&self, x: usize, y: usize) -> Option<Occupant> {
        let size = self.config.size;
        (x < size && y < size).then(|| self.cells[y * size + x])
    }

    /// Number of grass cells.
    pub fn grass_count(&self) -> usize {
        self.grass
    }

    fn offset(&self, x: usize, y: usize, dx: i64, dy: i64) -> Option<(usize, usize)> {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        let size = self.config.size as i64;
        ((0..size).contains(&nx) && (0..size).contains(&ny)).then_some((nx as usize, ny as usize))
    }

    fn window(&self, x: usize, y: usize) -> CellWindow {
        CellWindow::sample(self.config.view_distance, |dx, dy| {
            match self.offset(x, y, dx, dy).and_then(|(cx, cy)| self.cell(cx, cy)) {
                None => Cell::Wall,
                Some(Occupant::Empty) => Cell::Empty,
                Some(Occupant::Grass(_)) => Cell::Grass,
                Some(Occupant::Creature(id)) => match self.creatures.get(&id) {
                    Some(other) if other.predator => Cell::Predator,
                    _ => Cell::Creature,
                },
                Some(Occupant::Rock) => Cell::Rock,
                Some(Occupant::Water) => Cell::Water,
            }
        })
    }

    fn set_cell(&mut self, x: usize, y: usize, occupant: Occupant) {
        let size = self.config.size;
        self.cells[y * size + x] = occupant;
        if let Some(episode) = &mut self.episode {
            let code = match occupant {
                Occupant::Empty => EMPTY_CODE,
                Occupant::Grass(_) => GRASS_CODE,
                Occupant::Creature(_) => CREATURE_CODE,
                Occupant::Rock => ROCK_CODE,
                Occupant::Water => WATER_CODE,
            };
            episode.grid_change(x as i64, y as i64, code);
        }
    }

    fn grow_grass(&mut self, report: &mut TickReport) {
        let size = self.config.size;
        for _ in 0..self.config.grass_growth {
            let (x, y) = (self.rng.random_range(0..size), self.rng.random_range(0..size));
            if self.cells[y * size + x] == Occupant::Empty {
                let id = self.ids.next_grass();
                self.set_cell(x, y, Occupant::Grass(id));
                self.grass += 1;
                report.grass_grown += 1;
            }
        }
    }

    /// Find a free cell for a newborn by a bounded random walk from `(x, y)`.
    fn place_child(&mut self, x: usize, y: usize) -> Option<(usize, usize)> {
        const STEPS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        let (mut cx, mut cy) = (x, y);
        for _ in 0..self.config.placement_attempts {
            let (dx, dy) = STEPS[self.rng.random_range(0..STEPS.len())];
            if let Some((nx, ny)) = self.offset(cx, cy, dx, dy) {
                (cx, cy) = (nx, ny);
                if self.cell(cx, cy) == Some(Occupant::Empty) {
                    return Some((cx, cy));
                }
            }
        }
        None
    }

    fn split(&mut self, creature: &mut GridCreature) -> Option<GridCreature> {
        let Some((x, y)) = self.place_child(creature.x, creature.y) else {
            warn!(creature = %creature.id, "no free cell for newborn, split skipped");
            self.events.push(SimEvent::new(
                self.tick,
                SimEventKind::PlacementSkipped {
                    entity: creature.id,
                },
                format!("creature {} found no room to split", creature.id),
            ));
            return None;
        };
        let id = self.ids.next_creature();
        self.set_cell(x, y, Occupant::Creature(id));
        let energy = creature.energy / 2.0;
        creature.energy -= energy;
        creature.mood = Mood::Splitting;
        Some(GridCreature {
            id,
            x,
            y,
            energy,
            color: creature.color,
            species: creature.species.clone(),
            predator: creature.predator,
            mood: Mood::Idle,
        })
    }

    /// Eat the creature on `victim` if `hunter` may. Returns `false` when the cell stays blocked.
    fn prey_on(
        &mut self,
        hunter: &mut GridCreature,
        victim: EntityId,
        report: &mut TickReport,
    ) -> bool {
        let edible = hunter.predator
            && self
                .creatures
                .get(&victim)
                .is_some_and(|other| !other.predator);
        if !edible {
            return false;
        }
        let Some(prey) = self.creatures.remove(&victim) else {
            return false;
        };
        hunter.energy += prey.energy * self.config.predator_efficiency;
        report.eaten += 1;
        trace!(eater = %hunter.id, victim = %victim, "ate creature");
        self.events.push(SimEvent::new(
            self.tick,
            SimEventKind::AteCreature {
                eater: hunter.id,
                victim,
            },
            format!("creature {} ate creature {victim}", hunter.id),
        ));
        self.events.push(SimEvent::new(
            self.tick,
            SimEventKind::Died {
                entity: victim,
                cause: DeathCause::Eaten { by: hunter.id },
            },
            format!("creature {victim} was eaten by {}", hunter.id),
        ));
        true
    }

    fn walk(&mut self, creature: &mut GridCreature, slice: usize, report: &mut TickReport) {
        let (dx, dy) = heading_step(slice, self.config.slices);
        let Some((nx, ny)) = self.offset(creature.x, creature.y, dx, dy) else {
            return;
        };
        match self.cell(nx, ny) {
            Some(Occupant::Rock | Occupant::Water) | None => return,
            Some(Occupant::Creature(other)) => {
                if !self.prey_on(creature, other, report) {
                    return;
                }
            }
            Some(Occupant::Grass(grass)) => {
                creature.energy += self.config.grass_energy;
                self.grass -= 1;
                report.grass_eaten += 1;
                trace!(eater = %creature.id, grass = %grass, "ate grass");
                self.events.push(SimEvent::new(
                    self.tick,
                    SimEventKind::AteGrass {
                        eater: creature.id,
                        grass,
                    },
                    format!("creature {} ate grass {grass}", creature.id),
                ));
            }
            Some(Occupant::Empty) => {}
        }
        self.set_cell(creature.x, creature.y, Occupant::Empty);
        self.set_cell(nx, ny, Occupant::Creature(creature.id));
        creature.x = nx;
        creature.y = ny;
    }

    /// Run one creature's turn. Returns the newborn, if any.
    fn take_turn(
        &mut self,
        creature: &mut GridCreature,
        report: &mut TickReport,
    ) -> SimResult<Option<GridCreature>> {
        let perception = Perception {
            creature: creature.id,
            energy: creature.energy,
            num_slices: self.config.slices,
            max_speed: self.config.max_speed,
            view: View::Window(self.window(creature.x, creature.y)),
        };
        let action = self
            .strategies
            .decide(&creature.species, &perception, &mut self.rng)?;

        let mut child = None;
        match action {
            Action::Reproduce => child = self.split(creature),
            Action::Move { slice, speed } => {
                creature.mood = perception.mood();
                if speed >= 0.5 {
                    self.walk(creature, slice, report);
                }
            }
        }
        creature.energy -= self.config.energy_loss;
        Ok(child)
    }
}

/// The single-cell step for a heading slice: one cell along its dominant axis.
///
/// Diagonal headings step horizontally.
fn heading_step(slice: usize, slices: usize) -> (i64, i64) {
    let (hx, hy) = geometry::from_slice(slice, slices, 1.0);
    if hx.abs() + AXIS_TIE >= hy.abs() {
        (hx.signum() as i64, 0)
    } else {
        (0, hy.signum() as i64)
    }
}

impl Arena for GridWorld {
    /// Advance one tick. Returns `false` once the episode is over.
    fn step(&mut self) -> SimResult<bool> {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };
        self.grow_grass(&mut report);

        let mut born: Vec<(EntityId, GridCreature)> = Vec::new();
        let order: Vec<EntityId> = self.creatures.keys().copied().collect();
        for id in order {
            let Some(mut creature) = self.creatures.remove(&id) else {
                continue;
            };
            let turn = self.take_turn(&mut creature, &mut report);
            if creature.energy < self.config.min_energy {
                self.set_cell(creature.x, creature.y, Occupant::Empty);
                report.starved += 1;
                self.events.push(SimEvent::new(
                    self.tick,
                    SimEventKind::Died {
                        entity: id,
                        cause: DeathCause::Starved,
                    },
                    format!("creature {id} starved"),
                ));
            } else {
                self.creatures.insert(id, creature);
            }
            if let Some(child) = turn? {
                born.push((id, child));
            }
        }

        for (parent, child) in born {
            let child_id = child.id;
            self.creatures.insert(child_id, child);
            report.born += 1;
            self.events.push(SimEvent::new(
                self.tick,
                SimEventKind::Born {
                    parent,
                    child: child_id,
                },
                format!("creature {parent} split off {child_id}"),
            ));
        }

        report.creatures = self.creatures.len();
        report.grass = self.grass;
        self.last = report;
        if let Some(episode) = &mut self.episode {
            for creature in self.creatures.values() {
                episode.creature_change(creature.id, creature.energy, Some(&creature.species));
            }
            episode.next_frame();
        }

        debug!(
            tick = report.tick,
            born = report.born,
            died = report.died(),
            grass_eaten = report.grass_eaten,
            creatures = report.creatures,
            "tick complete"
        );
        Ok(!self.creatures.is_empty())
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.clear();
        let size = self.config.size;
        for (i, occupant) in self.cells.iter().enumerate() {
            let color = match occupant {
                Occupant::Grass(_) => Rgb::GRASS,
                Occupant::Rock => Rgb::ROCK,
                Occupant::Water => Rgb::BLUE,
                Occupant::Empty | Occupant::Creature(_) => continue,
            };
            canvas.rect((i % size) as f64, (i / size) as f64, 0.5, color);
        }
        let full = self.config.split_energy.max(f64::EPSILON);
        for creature in self.creatures.values() {
            let (x, y) = (creature.x as f64, creature.y as f64);
            let radius = (2.0 * creature.energy / full).clamp(0.0, 0.64).sqrt();
            canvas.circle(x, y, radius, creature.color);
            canvas.marker(x, y, creature.mood.color());
        }
    }

    fn info(&self) -> String {
        format!(
            "tick {} | {} creatures | {} grass",
            self.tick,
            self.creatures.len(),
            self.grass
        )
    }

    fn tick(&self) -> u64 {
        self.tick
    }

    fn population(&self) -> usize {
        self.creatures.len()
    }

    fn last_report(&self) -> TickReport {
        self.last
    }

    fn events(&self) -> &EventLog {
        &self.events
    }

    fn episode(&self) -> Option<&Episode> {
        self.episode.as_ref()
    }

    fn enable_episode(&mut self) {
        self.episode.get_or_insert_with(Episode::new);
    }

    fn extent(&self) -> Bbox {
        let edge = self.config.size as f64 - 0.5;
        Bbox::new([-0.5, -0.5], [edge, edge])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always heads toward +x at full speed.
    #[derive(Debug)]
    struct East;

    impl Decide for East {
        fn name(&self) -> &str {
            "east"
        }

        fn decide(&mut self, perception: &Perception, _: &mut StdRng) -> SimResult<Action> {
            Ok(Action::Move {
                slice: geometry::to_slice(1.0, 0.0, perception.num_slices),
                speed: perception.max_speed,
            })
        }
    }

    fn bare(size: usize) -> GridWorld {
        let config = GridConfig {
            grass_growth: 0,
            ..GridConfig::default().with_size(size)
        };
        let mut world = GridWorld::empty(config).unwrap();
        world.register_strategy("east", East);
        world
    }

    fn occupied_cells(world: &GridWorld) -> usize {
        let size = world.config().size;
        (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .filter(|&(x, y)| matches!(world.cell(x, y), Some(Occupant::Creature(_))))
            .count()
    }

    fn count_cells(world: &GridWorld, wanted: Occupant) -> usize {
        let size = world.config().size;
        (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .filter(|&(x, y)| world.cell(x, y) == Some(wanted))
            .count()
    }

    #[test]
    fn seeded_grid_matches_config() {
        let world = GridWorld::new(GridConfig::default()).unwrap();
        assert_eq!(world.grass_count(), 80);
        assert_eq!(count_cells(&world, Occupant::Rock), 12);
        assert_eq!(count_cells(&world, Occupant::Water), 8);
        assert_eq!(world.creatures().len(), 9);
        assert_eq!(occupied_cells(&world), 9);
        for creature in world.creatures().values() {
            assert_eq!(
                world.cell(creature.x, creature.y),
                Some(Occupant::Creature(creature.id))
            );
        }
        let wanderers = world
            .creatures()
            .values()
            .filter(|c| c.species == "wander")
            .count();
        assert_eq!(wanderers, 4);
        let hunters: Vec<&GridCreature> =
            world.creatures().values().filter(|c| c.predator).collect();
        assert_eq!(hunters.len(), 1);
        assert_eq!(hunters[0].species, "hunt");
        assert_eq!(hunters[0].color, PREDATOR_COLOR);
    }

    #[test]
    fn rock_and_water_block_movement() {
        let mut world = bare(5);
        let a = world.spawn_creature(1, 2, 20.0, "east").unwrap();
        let b = world.spawn_creature(1, 0, 20.0, "east").unwrap();
        world.place_terrain(2, 2, Terrain::Rock).unwrap();
        world.place_terrain(2, 0, Terrain::Water).unwrap();
        assert_eq!(world.window(1, 2).get(1, 0), Cell::Rock);
        assert_eq!(world.window(1, 0).get(1, 0), Cell::Water);
        world.step().unwrap();

        assert_eq!(world.creature(a).map(|c| (c.x, c.y)), Some((1, 2)));
        assert_eq!(world.creature(b).map(|c| (c.x, c.y)), Some((1, 0)));
        assert_eq!(world.cell(2, 2), Some(Occupant::Rock));
        assert!(matches!(
            world.place_terrain(1, 2, Terrain::Water),
            Err(SimError::CellUnavailable { x: 1, y: 2 })
        ));
    }

    #[test]
    fn predator_eats_prey_it_steps_onto() {
        let mut world = bare(5);
        world.register_predator("stalker", East);
        let hunter = world.spawn_creature(1, 1, 20.0, "stalker").unwrap();
        let prey = world.spawn_creature(2, 1, 10.0, "east").unwrap();
        assert_eq!(world.window(1, 1).get(1, 0), Cell::Creature);
        assert_eq!(world.window(2, 1).get(-1, 0), Cell::Predator);
        world.step().unwrap();

        let hunter_now = world.creature(hunter).unwrap();
        assert_eq!((hunter_now.x, hunter_now.y), (2, 1));
        assert!((hunter_now.energy - (20.0 + 10.0 * 0.5 - 1.0)).abs() < 1e-9);
        assert!(world.creature(prey).is_none());
        assert_eq!(world.cell(2, 1), Some(Occupant::Creature(hunter)));
        assert_eq!(world.cell(1, 1), Some(Occupant::Empty));
        assert_eq!(occupied_cells(&world), 1);
        assert_eq!(world.last_report().eaten, 1);
        assert!(world.events().events_for_entity(prey).iter().any(|e| e.kind
            == SimEventKind::Died {
                entity: prey,
                cause: DeathCause::Eaten { by: hunter },
            }));
    }

    #[test]
    fn predators_do_not_eat_each_other() {
        let mut world = bare(5);
        world.register_predator("stalker", East);
        let a = world.spawn_creature(1, 1, 20.0, "stalker").unwrap();
        let b = world.spawn_creature(2, 1, 20.0, "stalker").unwrap();
        world.step().unwrap();

        assert_eq!(world.creature(a).map(|c| (c.x, c.y)), Some((1, 1)));
        assert_eq!(world.creature(b).map(|c| (c.x, c.y)), Some((3, 1)));
        assert_eq!(world.last_report().eaten, 0);
    }

    #[test]
    fn reregistering_a_predator_species_as_prey_clears_the_flag() {
        let mut world = bare(5);
        world.register_predator("stalker", East);
        world.register_strategy("stalker", East);
        let id = world.spawn_creature(0, 0, 20.0, "stalker").unwrap();
        assert!(!world.creature(id).unwrap().predator);
    }

    #[test]
    fn diagonal_headings_step_horizontally() {
        for slice in 0..4 {
            let (dx, dy) = heading_step(slice, 4);
            assert_eq!(dy, 0, "slice {slice}");
            assert_eq!(dx.abs(), 1, "slice {slice}");
        }
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let slice = geometry::to_slice(dx as f64, dy as f64, 8);
            assert_eq!(heading_step(slice, 8), (dx, dy));
        }

        let config = GridConfig {
            grass_growth: 0,
            slices: 4,
            ..GridConfig::default().with_size(5)
        };
        let mut world = GridWorld::empty(config).unwrap();
        world.register_strategy("east", East);
        let id = world.spawn_creature(2, 2, 20.0, "east").unwrap();
        world.step().unwrap();
        assert_eq!(world.creature(id).map(|c| (c.x, c.y)), Some((3, 2)));
    }

    #[test]
    fn greedy_steps_onto_grass_and_eats() {
        let mut world = bare(10);
        let id = world.spawn_creature(5, 5, 20.0, "greedy").unwrap();
        world.spawn_grass(6, 5).unwrap();
        world.step().unwrap();

        let creature = world.creature(id).unwrap();
        assert_eq!((creature.x, creature.y), (6, 5));
        assert!((creature.energy - 24.0).abs() < 1e-9);
        assert_eq!(creature.mood, Mood::Feeding);
        assert_eq!(world.grass_count(), 0);
        assert_eq!(world.cell(5, 5), Some(Occupant::Empty));
    }

    #[test]
    fn creatures_block_each_other_and_walls_stop_them() {
        let mut world = bare(8);
        let a = world.spawn_creature(5, 5, 20.0, "east").unwrap();
        let b = world.spawn_creature(6, 5, 20.0, "east").unwrap();
        let c = world.spawn_creature(7, 0, 20.0, "east").unwrap();
        world.step().unwrap();

        assert_eq!(world.creature(a).map(|c| (c.x, c.y)), Some((5, 5)));
        assert_eq!(world.creature(b).map(|c| (c.x, c.y)), Some((7, 5)));
        assert_eq!(world.creature(c).map(|c| (c.x, c.y)), Some((7, 0)));
        assert_eq!(occupied_cells(&world), 3);
    }

    #[test]
    fn split_places_child_on_free_cell() {
        let mut world = bare(5);
        let parent = world.spawn_creature(2, 2, 60.0, "greedy").unwrap();
        world.step().unwrap();

        assert_eq!(world.creatures().len(), 2);
        let child = world.creatures().values().find(|c| c.id != parent).unwrap();
        let parent = world.creature(parent).unwrap();
        assert_ne!((child.x, child.y), (parent.x, parent.y));
        assert!((parent.energy - 29.0).abs() < 1e-9);
        assert!((child.energy - 30.0).abs() < 1e-9);
        assert_eq!(occupied_cells(&world), 2);
    }

    #[test]
    fn split_without_room_is_skipped() {
        let mut world = bare(1);
        let id = world.spawn_creature(0, 0, 60.0, "wander").unwrap();
        world.step().unwrap();

        assert_eq!(world.creatures().len(), 1);
        assert!((world.creature(id).unwrap().energy - 59.0).abs() < 1e-9);
        assert_eq!(
            world
                .events()
                .count_at_tick(1, |k| matches!(k, SimEventKind::PlacementSkipped { .. })),
            1
        );
    }

    #[test]
    fn episode_ends_when_everyone_starves() {
        let mut world = bare(6);
        world.spawn_creature(1, 1, 7.0, "wander").unwrap();
        world.spawn_creature(4, 4, 6.0, "wander").unwrap();
        let mut ticks = 0;
        while world.step().unwrap() {
            ticks += 1;
            assert!(ticks < 10, "episode should have ended");
        }
        assert_eq!(world.population(), 0);
        assert_eq!(occupied_cells(&world), 0);
    }

    #[test]
    fn occupied_cells_are_rejected() {
        let mut world = bare(3);
        world.spawn_grass(1, 1).unwrap();
        assert!(matches!(
            world.spawn_creature(1, 1, 10.0, "east"),
            Err(SimError::CellUnavailable { x: 1, y: 1 })
        ));
        assert!(world.spawn_grass(3, 0).is_err());
    }

    #[test]
    fn episode_records_cell_changes() {
        let mut world = bare(4);
        world.enable_episode();
        world.spawn_creature(0, 0, 20.0, "east").unwrap();
        world.place_terrain(3, 3, Terrain::Water).unwrap();
        world.step().unwrap();
        let frame = &world.episode().unwrap().frames()[0];
        assert_eq!(frame.creatures.len(), 1);
        assert!(frame.grid.contains(&crate::episode::CellChange { x: 0, y: 0, value: 0 }));
        assert!(frame.grid.contains(&crate::episode::CellChange { x: 1, y: 0, value: 2 }));
        assert!(frame.grid.contains(&crate::episode::CellChange { x: 3, y: 3, value: -3 }));
    }

    #[test]
    fn reset_reseeds_the_grid() {
        let mut world = GridWorld::new(GridConfig::default()).unwrap();
        let first: Vec<EntityId> = world.creatures().keys().copied().collect();
        world.step().unwrap();
        world.reset(GridConfig::default().with_size(10)).unwrap();
        assert_eq!(world.tick(), 0);
        assert_eq!(world.grass_count(), 20);
        assert_eq!(world.creatures().len(), 9);
        assert!(world.creatures().keys().all(|id| !first.contains(id)));
        assert_eq!(occupied_cells(&world), 9);
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = GridWorld::new(GridConfig::default().with_seed(3)).unwrap();
        let mut b = GridWorld::new(GridConfig::default().with_seed(3)).unwrap();
        for _ in 0..40 {
            assert_eq!(a.step().unwrap(), b.step().unwrap());
        }
        assert_eq!(a.creatures(), b.creatures());
        assert_eq!(a.grass_count(), b.grass_count());
    }
}
