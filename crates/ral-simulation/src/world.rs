//! The continuous world: creatures and grass on an origin-centered plane.
//!
//! Every live entity has exactly one entry in the spatial index whose box
//! equals its current footprint. A creature's entry is deleted before it
//! perceives or changes, and reinserted once its turn is over unless it
//! starved. Eaten grass leaves the index immediately; eaten creatures stay
//! until the end-of-tick sweep but are hidden from every later query through
//! the pending-removal map. Children join the world after the sweep, so they
//! first act on the next tick.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ral_core::{
    Bbox, Body, CoreError, Creature, EntityId, Grass, IdGenerator, Mood, Rgb, SpatialIndex,
    geometry,
};
use tracing::{debug, trace};

use crate::arena::{Arena, TickReport};
use crate::canvas::Canvas;
use crate::config::WorldConfig;
use crate::decision::{Action, Decide, Greedy, StrategyRegistry, Wander};
use crate::episode::Episode;
use crate::error::{SimError, SimResult};
use crate::event::{DeathCause, EventLog, SimEvent, SimEventKind};
use crate::perception::{Perception, SliceVotes, View};

/// A perceived entity, relative to the perceiver.
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    id: EntityId,
    dx: f64,
    dy: f64,
    distance: f64,
    radius: f64,
    /// `None` for grass.
    energy: Option<f64>,
}

/// What came out of one creature's turn.
struct Turn {
    child: Option<Creature>,
    starved: bool,
}

/// The continuous-space world.
pub struct World {
    config: WorldConfig,
    creatures: BTreeMap<EntityId, Creature>,
    grass: BTreeMap<EntityId, Grass>,
    index: SpatialIndex,
    ids: IdGenerator,
    rng: StdRng,
    strategies: StrategyRegistry,
    events: EventLog,
    episode: Option<Episode>,
    tick: u64,
    last: TickReport,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick)
            .field("creatures", &self.creatures.len())
            .field("grass", &self.grass.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl World {
    /// Create a world and seed it with creatures and grass.
    pub fn new(config: WorldConfig) -> SimResult<Self> {
        let mut world = Self::empty(config)?;
        world.populate()?;
        Ok(world)
    }

    /// Create a world with no entities. The built-in strategies are registered.
    pub fn empty(config: WorldConfig) -> SimResult<Self> {
        config.validate()?;
        let mut world = Self {
            rng: StdRng::seed_from_u64(config.seed),
            events: EventLog::new(config.max_events),
            creatures: BTreeMap::new(),
            grass: BTreeMap::new(),
            index: SpatialIndex::new(),
            ids: IdGenerator::new(),
            strategies: StrategyRegistry::new(),
            episode: None,
            tick: 0,
            last: TickReport::default(),
            config,
        };
        world.register_builtin_strategies();
        Ok(world)
    }

    /// Drop every entity and seed the world again from `config`.
    ///
    /// The id generator keeps counting, so ids stay unique across resets.
    /// Built-in strategies are re-registered with the new thresholds; other
    /// registered strategies are kept.
    pub fn reset(&mut self, config: WorldConfig) -> SimResult<()> {
        config.validate()?;
        self.rng = StdRng::seed_from_u64(config.seed);
        self.events = EventLog::new(config.max_events);
        self.creatures.clear();
        self.grass.clear();
        self.index.clear();
        self.tick = 0;
        self.last = TickReport::default();
        if self.episode.is_some() {
            self.episode = Some(Episode::new());
        }
        self.config = config;
        self.register_builtin_strategies();
        self.populate()
    }

    fn register_builtin_strategies(&mut self) {
        let split = self.config.split_energy;
        self.strategies
            .register("greedy", Greedy::new(split, self.config.interesting));
        self.strategies.register("wander", Wander::new(split));
    }

    fn populate(&mut self) -> SimResult<()> {
        for _ in 0..self.config.initial_creatures {
            let (x, y) = self.random_position();
            let energy = self
                .rng
                .random_range(self.config.min_initial_energy..=self.config.max_initial_energy);
            let species = self.config.initial_species.clone();
            self.spawn_creature(x, y, energy, &species)?;
        }
        for _ in 0..self.config.initial_grass {
            self.grow_grass()?;
        }
        debug!(
            creatures = self.creatures.len(),
            grass = self.grass.len(),
            "world populated"
        );
        Ok(())
    }

    fn random_position(&mut self) -> (f64, f64) {
        let size = self.config.size;
        (
            self.rng.random_range(-1.0..=1.0) * size,
            self.rng.random_range(-1.0..=1.0) * size,
        )
    }

    /// Register a strategy for a species. Replaces any earlier registration.
    pub fn register_strategy<S: Decide + 'static>(&mut self, species: &str, strategy: S) {
        self.strategies.register(species, strategy);
    }

    /// Add a creature with a random color. Its species must have a strategy.
    pub fn spawn_creature(
        &mut self,
        x: f64,
        y: f64,
        energy: f64,
        species: &str,
    ) -> SimResult<EntityId> {
        if !self.strategies.contains(species) {
            return Err(SimError::UnknownStrategy(species.to_string()));
        }
        let color = Rgb::random_creature(&mut self.rng);
        let creature =
            Creature::new(self.ids.next_creature(), x, y, energy, species).with_color(color);
        let id = creature.id;
        self.index.insert(id, creature.bbox())?;
        self.creatures.insert(id, creature);
        Ok(id)
    }

    /// Add a grass instance.
    pub fn spawn_grass(&mut self, x: f64, y: f64) -> SimResult<EntityId> {
        let grass = Grass::new(self.ids.next_grass(), x, y, self.config.grass_size);
        let id = grass.id;
        self.index.insert(id, grass.bbox())?;
        self.grass.insert(id, grass);
        Ok(id)
    }

    fn grow_grass(&mut self) -> SimResult<EntityId> {
        let (x, y) = self.random_position();
        self.spawn_grass(x, y)
    }

    /// The configuration in effect.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Live creatures by id.
    pub fn creatures(&self) -> &BTreeMap<EntityId, Creature> {
        &self.creatures
    }

    /// Look up one creature.
    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    /// Live grass by id.
    pub fn grass(&self) -> &BTreeMap<EntityId, Grass> {
        &self.grass
    }

    /// The spatial index, for inspection.
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Entities within vision of `creature`, skipping pending removals.
    fn nearby(
        &self,
        creature: &Creature,
        eaten: &BTreeMap<EntityId, EntityId>,
    ) -> SimResult<Vec<Neighbor>> {
        let vision = self.config.vision;
        let mut found = Vec::new();
        for id in self.index.query(creature.bbox_with(vision)) {
            if eaten.contains_key(&id) {
                continue;
            }
            let (x, y, radius, energy) = if id.is_grass() {
                let grass = self.grass.get(&id).ok_or(CoreError::Orphaned { id })?;
                (grass.x, grass.y, grass.radius(), None)
            } else {
                let other = self.creatures.get(&id).ok_or(CoreError::Orphaned { id })?;
                (other.x, other.y, other.radius(), Some(other.energy))
            };
            let distance = creature.distance_to(x, y);
            if distance < vision {
                found.push(Neighbor {
                    id,
                    dx: x - creature.x,
                    dy: y - creature.y,
                    distance,
                    radius,
                    energy,
                });
            }
        }
        Ok(found)
    }

    /// Bucket neighbors into direction votes. Threats vote for the opposite slice.
    fn perceive(&self, creature: &Creature, neighbors: &[Neighbor]) -> SliceVotes {
        let n = self.config.slices;
        let mut votes = SliceVotes::new(n);
        for nb in neighbors {
            match nb.energy {
                Some(energy) if energy > creature.energy * self.config.eatable_fraction => {
                    votes.add_threat(
                        geometry::to_slice(-nb.dx, -nb.dy, n),
                        self.config.threat_weight,
                    );
                }
                _ => votes.add_food(geometry::to_slice(nb.dx, nb.dy, n), self.config.food_weight),
            }
        }
        votes
    }

    /// Eat every engulfed neighbor that qualifies.
    fn feed(
        &mut self,
        creature: &mut Creature,
        neighbors: &[Neighbor],
        eaten: &mut BTreeMap<EntityId, EntityId>,
        report: &mut TickReport,
    ) -> SimResult<()> {
        for nb in neighbors {
            if nb.distance >= creature.radius() - nb.radius {
                continue;
            }
            match nb.energy {
                None => {
                    let Some(grass) = self.grass.remove(&nb.id) else {
                        continue;
                    };
                    self.index.delete(nb.id, grass.bbox())?;
                    creature.energy += self.config.grass_energy;
                    report.grass_eaten += 1;
                    trace!(eater = %creature.id, grass = %nb.id, "ate grass");
                    self.events.push(SimEvent::new(
                        self.tick,
                        SimEventKind::AteGrass {
                            eater: creature.id,
                            grass: nb.id,
                        },
                        format!("creature {} ate grass {}", creature.id, nb.id),
                    ));
                }
                Some(energy) if energy < creature.energy * self.config.eatable_fraction => {
                    eaten.insert(nb.id, creature.id);
                    creature.energy += energy * self.config.eat_efficiency;
                    trace!(eater = %creature.id, victim = %nb.id, "ate creature");
                    self.events.push(SimEvent::new(
                        self.tick,
                        SimEventKind::AteCreature {
                            eater: creature.id,
                            victim: nb.id,
                        },
                        format!("creature {} ate creature {}", creature.id, nb.id),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Run one creature's turn. Its index entry must already be deleted.
    fn take_turn(
        &mut self,
        creature: &mut Creature,
        eaten: &mut BTreeMap<EntityId, EntityId>,
        report: &mut TickReport,
    ) -> SimResult<Turn> {
        let neighbors = self.nearby(creature, eaten)?;
        let votes = self.perceive(creature, &neighbors);
        self.feed(creature, &neighbors, eaten, report)?;

        let perception = Perception {
            creature: creature.id,
            energy: creature.energy,
            num_slices: self.config.slices,
            max_speed: self.config.max_speed,
            view: View::Slices(votes),
        };
        let action = self
            .strategies
            .decide(&creature.species, &perception, &mut self.rng)?;

        let mut child = None;
        match action {
            Action::Reproduce => {
                creature.mood = Mood::Splitting;
                child = Some(creature.split(&mut self.ids, &mut self.rng));
            }
            Action::Move { slice, speed } => {
                creature.mood = perception.mood();
                let (mut dx, mut dy) = geometry::from_slice(slice, self.config.slices, speed);
                let size = self.config.size;
                if creature.distance_to(0.0, 0.0) > size - creature.radius() {
                    dx -= self.config.boundary_push * creature.x / size;
                    dy -= self.config.boundary_push * creature.y / size;
                }
                creature.x += dx;
                creature.y += dy;
            }
        }

        creature.energy *= 1.0 - self.config.energy_loss;
        let starved = creature.energy < self.config.min_energy;
        if !starved {
            self.index.insert(creature.id, creature.bbox())?;
        }
        Ok(Turn { child, starved })
    }

    fn record_frame(&mut self) {
        if let Some(episode) = &mut self.episode {
            for creature in self.creatures.values() {
                episode.creature_change(creature.id, creature.energy, Some(&creature.species));
            }
            episode.next_frame();
        }
    }
}

impl Arena for World {
    /// Advance one tick. Returns `false` once every creature is gone.
    ///
    /// An `Err` leaves the world in an unspecified state.
    fn step(&mut self) -> SimResult<bool> {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        for _ in 0..self.config.grass_growth {
            self.grow_grass()?;
            report.grass_grown += 1;
        }

        // victim -> eater
        let mut eaten: BTreeMap<EntityId, EntityId> = BTreeMap::new();
        let mut starved: BTreeSet<EntityId> = BTreeSet::new();
        let mut born: Vec<(EntityId, Creature)> = Vec::new();

        let order: Vec<EntityId> = self.creatures.keys().copied().collect();
        for id in order {
            if eaten.contains_key(&id) {
                continue;
            }
            let Some(mut creature) = self.creatures.remove(&id) else {
                continue;
            };
            self.index.delete(id, creature.bbox())?;
            let turn = self.take_turn(&mut creature, &mut eaten, &mut report);
            self.creatures.insert(id, creature);
            let turn = turn?;
            if let Some(child) = turn.child {
                born.push((id, child));
            }
            if turn.starved {
                starved.insert(id);
            }
        }

        for (victim, eater) in &eaten {
            if let Some(dead) = self.creatures.remove(victim) {
                self.index.delete(*victim, dead.bbox())?;
                report.eaten += 1;
                self.events.push(SimEvent::new(
                    self.tick,
                    SimEventKind::Died {
                        entity: *victim,
                        cause: DeathCause::Eaten { by: *eater },
                    },
                    format!("creature {victim} was eaten by {eater}"),
                ));
            }
        }
        for id in &starved {
            if let Some(dead) = self.creatures.remove(id) {
                report.starved += 1;
                self.events.push(SimEvent::new(
                    self.tick,
                    SimEventKind::Died {
                        entity: *id,
                        cause: DeathCause::Starved,
                    },
                    format!("creature {id} starved at energy {:.2}", dead.energy),
                ));
            }
        }

        for (parent, child) in born {
            let child_id = child.id;
            self.index.insert(child_id, child.bbox())?;
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
        report.grass = self.grass.len();
        self.last = report;
        self.record_frame();

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
        for grass in self.grass.values() {
            canvas.rect(grass.x, grass.y, grass.size, Rgb::GRASS);
        }
        for creature in self.creatures.values() {
            canvas.circle(creature.x, creature.y, creature.radius(), creature.color);
            canvas.marker(creature.x, creature.y, creature.mood.color());
        }
    }

    fn info(&self) -> String {
        format!(
            "tick {} | {} creatures | {} grass",
            self.tick,
            self.creatures.len(),
            self.grass.len()
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
        let size = self.config.size;
        Bbox::new([-size, -size], [size, size])
    }
}
