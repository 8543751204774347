use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Tunables for the continuous world.
///
/// Every field has a default, so a JSON file only needs to name the values
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Half-width of the arena, measured from the origin.
    pub size: f64,
    /// Number of creatures seeded at reset.
    pub initial_creatures: usize,
    /// Lower bound of a seed creature's energy.
    pub min_initial_energy: f64,
    /// Upper bound of a seed creature's energy.
    pub max_initial_energy: f64,
    /// Strategy given to seed creatures.
    pub initial_species: String,
    /// Number of grass instances seeded at reset.
    pub initial_grass: usize,
    /// Grass instances added every tick.
    pub grass_growth: usize,
    /// Energy gained by eating one grass.
    pub grass_energy: f64,
    /// Constant radius of a grass instance.
    pub grass_size: f64,
    /// Radius within which other entities are perceived.
    pub vision: f64,
    /// Fraction of energy lost every tick.
    pub energy_loss: f64,
    /// A creature can eat another whose energy is below this fraction of its own.
    pub eatable_fraction: f64,
    /// Fraction of a victim's energy gained by the eater.
    pub eat_efficiency: f64,
    /// Creatures with less energy than this die.
    pub min_energy: f64,
    /// Largest distance a creature may move in one tick.
    pub max_speed: f64,
    /// Number of perception and heading slices.
    pub slices: usize,
    /// Energy above which the built-in strategies reproduce.
    pub split_energy: f64,
    /// Vote magnitude below which the greedy strategy wanders instead.
    pub interesting: f64,
    /// Vote weight of an edible neighbor.
    pub food_weight: f64,
    /// Vote weight of a threatening neighbor.
    pub threat_weight: f64,
    /// Strength of the pull back toward the origin near the arena edge.
    pub boundary_push: f64,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            size: 500.0,
            initial_creatures: 4,
            min_initial_energy: 200.0,
            max_initial_energy: 600.0,
            initial_species: "greedy".into(),
            initial_grass: 1000,
            grass_growth: 5,
            grass_energy: 5.0,
            grass_size: 1.0,
            vision: 150.0,
            energy_loss: 0.001,
            eatable_fraction: 0.9,
            eat_efficiency: 0.9,
            min_energy: 100.0,
            max_speed: 7.0,
            slices: 12,
            split_energy: 500.0,
            interesting: 5.0,
            food_weight: 2.2,
            threat_weight: 2.0,
            boundary_push: 0.05,
            max_events: 0,
        }
    }
}

impl WorldConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the arena half-width.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Set the number of seed creatures.
    pub fn with_initial_creatures(mut self, count: usize) -> Self {
        self.initial_creatures = count;
        self
    }

    /// Set the number of seed grass instances.
    pub fn with_initial_grass(mut self, count: usize) -> Self {
        self.initial_grass = count;
        self
    }

    /// Set the number of grass instances added per tick.
    pub fn with_grass_growth(mut self, count: usize) -> Self {
        self.grass_growth = count;
        self
    }

    /// Set the vision distance.
    pub fn with_vision(mut self, vision: f64) -> Self {
        self.vision = vision;
        self
    }

    /// Set the per-tick energy loss fraction.
    pub fn with_energy_loss(mut self, fraction: f64) -> Self {
        self.energy_loss = fraction;
        self
    }

    /// Set the minimum survival energy.
    pub fn with_min_energy(mut self, energy: f64) -> Self {
        self.min_energy = energy;
        self
    }

    /// Set the number of slices.
    pub fn with_slices(mut self, slices: usize) -> Self {
        self.slices = slices;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Load a config from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the tick algorithm cannot work with.
    pub fn validate(&self) -> SimResult<()> {
        if self.size.is_nan() || self.size <= 0.0 {
            return Err(SimError::Config("size must be positive".into()));
        }
        if self.slices == 0 {
            return Err(SimError::Config("slices must be at least 1".into()));
        }
        if self.min_initial_energy > self.max_initial_energy {
            return Err(SimError::Config(
                "min_initial_energy must not exceed max_initial_energy".into(),
            ));
        }
        check_fraction("eatable_fraction", self.eatable_fraction, false)?;
        check_fraction("eat_efficiency", self.eat_efficiency, true)?;
        check_fraction("energy_loss", self.energy_loss, true)?;
        for (name, value) in [
            ("vision", self.vision),
            ("max_speed", self.max_speed),
            ("grass_size", self.grass_size),
            ("grass_energy", self.grass_energy),
            ("boundary_push", self.boundary_push),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(SimError::Config(format!("{name} must not be negative")));
            }
        }
        Ok(())
    }
}

/// Tunables for the grid world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Number of cells along each side.
    pub size: usize,
    /// Number of creatures seeded at reset, split evenly between wanderers and greedy ones.
    pub initial_creatures: usize,
    /// Energy of a seed creature.
    pub initial_energy: f64,
    /// Fraction of cells seeded with grass.
    pub grass_fraction: f64,
    /// Fraction of cells covered with rock at reset.
    pub rock_fraction: f64,
    /// Fraction of cells covered with water at reset.
    pub water_fraction: f64,
    /// Number of predators seeded at reset.
    pub initial_predators: usize,
    /// Share of a victim's energy a predator gains by eating it.
    pub predator_efficiency: f64,
    /// Chance that a hunting predator moves on a given turn.
    pub hunt_move_chance: f64,
    /// Grass placement attempts per tick; occupied cells are skipped.
    pub grass_growth: usize,
    /// Energy gained by eating one grass.
    pub grass_energy: f64,
    /// Flat energy lost every tick.
    pub energy_loss: f64,
    /// Creatures with less energy than this die.
    pub min_energy: f64,
    /// Energy above which the built-in strategies reproduce.
    pub split_energy: f64,
    /// Radius of the perception window, in cells.
    pub view_distance: usize,
    /// Number of heading slices.
    pub slices: usize,
    /// Largest speed a strategy may request.
    pub max_speed: f64,
    /// Random-walk steps tried when placing a newborn.
    pub placement_attempts: usize,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            size: 20,
            initial_creatures: 8,
            initial_energy: 20.0,
            grass_fraction: 0.2,
            rock_fraction: 0.03,
            water_fraction: 0.02,
            initial_predators: 1,
            predator_efficiency: 0.5,
            hunt_move_chance: 0.5,
            grass_growth: 3,
            grass_energy: 5.0,
            energy_loss: 1.0,
            min_energy: 5.0,
            split_energy: 50.0,
            view_distance: 1,
            slices: 8,
            max_speed: 1.0,
            placement_attempts: 16,
            max_events: 0,
        }
    }
}

impl GridConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of cells along each side.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the number of seed creatures.
    pub fn with_initial_creatures(mut self, count: usize) -> Self {
        self.initial_creatures = count;
        self
    }

    /// Set the fraction of cells seeded with grass.
    pub fn with_grass_fraction(mut self, fraction: f64) -> Self {
        self.grass_fraction = fraction;
        self
    }

    /// Load a config from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the tick algorithm cannot work with.
    pub fn validate(&self) -> SimResult<()> {
        if self.size == 0 {
            return Err(SimError::Config("size must be at least 1".into()));
        }
        if self.slices == 0 {
            return Err(SimError::Config("slices must be at least 1".into()));
        }
        check_fraction("grass_fraction", self.grass_fraction, true)?;
        check_fraction("rock_fraction", self.rock_fraction, true)?;
        check_fraction("water_fraction", self.water_fraction, true)?;
        check_fraction("hunt_move_chance", self.hunt_move_chance, true)?;
        if [self.energy_loss, self.max_speed, self.predator_efficiency]
            .iter()
            .any(|v| v.is_nan() || *v < 0.0)
        {
            return Err(SimError::Config(
                "energy_loss, max_speed and predator_efficiency must not be negative".into(),
            ));
        }
        Ok(())
    }
}

fn check_fraction(name: &str, value: f64, allow_zero: bool) -> SimResult<()> {
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if lower_ok && value <= 1.0 {
        Ok(())
    } else {
        Err(SimError::Config(format!("{name} must lie in the unit interval")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = WorldConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.slices, 12);
        assert!((config.vision - 150.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
        assert!(GridConfig::default().validate().is_ok());
    }

    #[test]
    fn config_builder_pattern() {
        let config = WorldConfig::default()
            .with_seed(99)
            .with_size(100.0)
            .with_initial_grass(10)
            .with_slices(8)
            .with_max_events(50);
        assert_eq!(config.seed, 99);
        assert_eq!(config.initial_grass, 10);
        assert_eq!(config.slices, 8);
        assert_eq!(config.max_events, 50);
        assert!((config.size - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: WorldConfig = serde_json::from_str(r#"{"size": 250.0, "slices": 6}"#).unwrap();
        assert!((config.size - 250.0).abs() < f64::EPSILON);
        assert_eq!(config.slices, 6);
        assert_eq!(config.initial_grass, 1000);
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(WorldConfig::default().with_slices(0).validate().is_err());
        assert!(WorldConfig::default().with_size(-1.0).validate().is_err());
        assert!(WorldConfig::default().with_energy_loss(1.5).validate().is_err());
        let config = WorldConfig {
            eatable_fraction: 0.0,
            ..WorldConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(GridConfig::default().with_size(0).validate().is_err());
        assert!(GridConfig::default().with_grass_fraction(2.0).validate().is_err());
        let config = GridConfig {
            hunt_move_chance: 1.5,
            ..GridConfig::default()
        };
        assert!(config.validate().is_err());
        let config = GridConfig {
            rock_fraction: -0.1,
            ..GridConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
