//! The pluggable decision boundary.
//!
//! Worlds never look at what kind of strategy a creature follows. They look
//! up the [`Decide`] implementation registered for the creature's species,
//! hand it a [`Perception`], and validate the [`Action`] that comes back.

use std::collections::BTreeMap;

use rand::Rng;
use rand::rngs::StdRng;
use ral_core::{EntityId, geometry};
use tracing::trace;

use crate::error::{SimError, SimResult};
use crate::perception::{Cell, Perception, View};

/// What a creature does with its turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Split into two creatures of equal energy.
    Reproduce,
    /// Move along the central heading of `slice` at `speed`.
    Move {
        /// Heading slice in `0..num_slices`.
        slice: usize,
        /// Distance to travel this tick.
        speed: f64,
    },
}

impl Action {
    /// Check the action against the bounds the perception advertised.
    pub fn validate(self, creature: EntityId, num_slices: usize, max_speed: f64) -> SimResult<Self> {
        if let Self::Move { slice, speed } = self {
            if slice >= num_slices {
                return Err(SimError::InvalidAction {
                    creature,
                    reason: format!("slice {slice} outside 0..{num_slices}"),
                });
            }
            if !speed.is_finite() || speed < 0.0 || speed > max_speed {
                return Err(SimError::InvalidAction {
                    creature,
                    reason: format!("speed {speed} outside 0..={max_speed}"),
                });
            }
        }
        Ok(self)
    }
}

/// A decision strategy.
///
/// One instance serves every creature of the species it is registered for,
/// so any learned state it carries is shared across that species.
pub trait Decide: std::fmt::Debug {
    /// Human-readable name for this strategy.
    fn name(&self) -> &str;

    /// Choose an action for the perceiving creature.
    fn decide(&mut self, perception: &Perception, rng: &mut StdRng) -> SimResult<Action>;
}

/// Reproduces when rich, otherwise picks a random heading and speed.
#[derive(Debug, Clone)]
pub struct Wander {
    split_energy: f64,
}

impl Wander {
    /// Create a wanderer that splits above `split_energy`.
    pub fn new(split_energy: f64) -> Self {
        Self { split_energy }
    }
}

impl Decide for Wander {
    fn name(&self) -> &str {
        "wander"
    }

    fn decide(&mut self, perception: &Perception, rng: &mut StdRng) -> SimResult<Action> {
        if perception.energy > self.split_energy {
            return Ok(Action::Reproduce);
        }
        Ok(random_move(perception, rng))
    }
}

/// Follows the strongest combined food and flee signal.
///
/// In the continuous world it steers along the resultant of the slice votes,
/// falling back to a random move when the resultant is too weak. In the grid
/// world it steps onto adjacent grass when there is any.
#[derive(Debug, Clone)]
pub struct Greedy {
    split_energy: f64,
    interesting: f64,
}

impl Greedy {
    /// Create a greedy strategy.
    pub fn new(split_energy: f64, interesting: f64) -> Self {
        Self {
            split_energy,
            interesting,
        }
    }
}

impl Decide for Greedy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn decide(&mut self, perception: &Perception, rng: &mut StdRng) -> SimResult<Action> {
        if perception.energy > self.split_energy {
            return Ok(Action::Reproduce);
        }
        match &perception.view {
            View::Slices(votes) => {
                let (dx, dy) = votes.resultant();
                if dx.abs() + dy.abs() < self.interesting {
                    return Ok(random_move(perception, rng));
                }
                Ok(Action::Move {
                    slice: geometry::to_slice(dx, dy, perception.num_slices),
                    speed: dx.hypot(dy).min(perception.max_speed),
                })
            }
            View::Window(window) => {
                let grass = window.adjacent_grass();
                if grass.is_empty() {
                    return Ok(random_move(perception, rng));
                }
                let (dx, dy) = grass[rng.random_range(0..grass.len())];
                Ok(Action::Move {
                    slice: geometry::to_slice(dx as f64, dy as f64, perception.num_slices),
                    speed: perception.max_speed,
                })
            }
        }
    }
}

/// Stalks prey through the cell window.
///
/// Every cell within view distance (Manhattan) scores the axis steps that
/// lead toward it, scaled by the inverse square of its distance. Prey
/// attracts; other predators and water repel strongly, rock and walls
/// mildly. A little noise breaks ties. The hunter moves on only a fraction
/// of its turns and stays put on the rest.
#[derive(Debug, Clone)]
pub struct Hunt {
    split_energy: f64,
    move_chance: f64,
}

impl Hunt {
    /// Create a hunter that splits above `split_energy` and moves with probability `move_chance`.
    pub fn new(split_energy: f64, move_chance: f64) -> Self {
        Self {
            split_energy,
            move_chance: move_chance.clamp(0.0, 1.0),
        }
    }
}

impl Decide for Hunt {
    fn name(&self) -> &str {
        "hunt"
    }

    fn decide(&mut self, perception: &Perception, rng: &mut StdRng) -> SimResult<Action> {
        const STEPS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

        if perception.energy > self.split_energy {
            return Ok(Action::Reproduce);
        }
        let View::Window(window) = &perception.view else {
            return Ok(random_move(perception, rng));
        };
        if !rng.random_bool(self.move_chance) {
            return Ok(Action::Move {
                slice: 0,
                speed: 0.0,
            });
        }

        let mut scores: [f64; 4] = std::array::from_fn(|_| rng.random::<f64>() * 0.1);
        let r = window.radius() as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                let dist = dx.abs() + dy.abs();
                if dist == 0 || dist > r {
                    continue;
                }
                let reward = match window.get(dx, dy) {
                    Cell::Creature => 10.0,
                    Cell::Rock | Cell::Wall => -1.0,
                    Cell::Water | Cell::Predator => -100.0,
                    Cell::Empty | Cell::Grass => continue,
                };
                let weight = reward / (dist * dist) as f64;
                for (score, (sx, sy)) in scores.iter_mut().zip(STEPS) {
                    if (sx != 0 && sx == dx.signum()) || (sy != 0 && sy == dy.signum()) {
                        *score += weight;
                    }
                }
            }
        }

        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);
        let (dx, dy) = STEPS[best];
        Ok(Action::Move {
            slice: geometry::to_slice(dx as f64, dy as f64, perception.num_slices),
            speed: perception.max_speed,
        })
    }
}

fn random_move(perception: &Perception, rng: &mut StdRng) -> Action {
    Action::Move {
        slice: rng.random_range(0..perception.num_slices.max(1)),
        speed: rng.random_range(0.0..=perception.max_speed),
    }
}

/// Strategies keyed by species name.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Box<dyn Decide>>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `strategy` for `species`, replacing any previous one.
    pub fn register<S: Decide + 'static>(&mut self, species: impl Into<String>, strategy: S) {
        self.strategies.insert(species.into(), Box::new(strategy));
    }

    /// Return `true` if a strategy is registered for `species`.
    pub fn contains(&self, species: &str) -> bool {
        self.strategies.contains_key(species)
    }

    /// Registered species names, sorted.
    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    /// Ask the strategy for `species` to decide, and validate the result.
    pub fn decide(
        &mut self,
        species: &str,
        perception: &Perception,
        rng: &mut StdRng,
    ) -> SimResult<Action> {
        let strategy = self
            .strategies
            .get_mut(species)
            .ok_or_else(|| SimError::UnknownStrategy(species.to_string()))?;
        let action = strategy.decide(perception, rng)?;
        trace!(creature = %perception.creature, strategy = strategy.name(), ?action, "decided");
        action
            .validate(perception.creature, perception.num_slices, perception.max_speed)
            .map_err(|err| match err {
                SimError::InvalidAction { creature, reason } => SimError::InvalidAction {
                    creature,
                    reason: format!("{} strategy: {reason}", strategy.name()),
                },
                other => other,
            })
    }
}
