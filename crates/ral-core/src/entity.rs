use std::fmt;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::spatial::Bbox;

/// Identifier shared by every entity in a world.
///
/// Creatures get non-negative ids and grass gets negative ids, so the sign
/// alone tells which table an index hit belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(pub i64);

impl EntityId {
    /// The kind of entity this id refers to.
    pub fn kind(self) -> EntityKind {
        if self.0 < 0 {
            EntityKind::Grass
        } else {
            EntityKind::Creature
        }
    }

    /// Return `true` if this id belongs to a grass instance.
    pub fn is_grass(self) -> bool {
        self.kind() == EntityKind::Grass
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two kinds of entity living in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An autonomous agent that perceives, moves, eats, and splits.
    Creature,
    /// A passive food resource.
    Grass,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creature => write!(f, "creature"),
            Self::Grass => write!(f, "grass"),
        }
    }
}

/// Hands out entity ids for one world.
///
/// Creature ids count up from 0 and grass ids count down from -1. Ids are
/// never reused for the lifetime of the generator.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next_creature: i64,
    next_grass: i64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Create a generator starting at creature id 0 and grass id -1.
    pub fn new() -> Self {
        Self {
            next_creature: 0,
            next_grass: -1,
        }
    }

    /// Allocate the next creature id.
    pub fn next_creature(&mut self) -> EntityId {
        let id = EntityId(self.next_creature);
        self.next_creature += 1;
        id
    }

    /// Allocate the next grass id.
    pub fn next_grass(&mut self) -> EntityId {
        let id = EntityId(self.next_grass);
        self.next_grass -= 1;
        id
    }
}

/// An RGB color used by the draw adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Black.
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    /// Pure red.
    pub const RED: Rgb = Rgb(255, 0, 0);
    /// Pure green.
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    /// Pure blue.
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    /// Yellow.
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    /// The color grass is drawn in.
    pub const GRASS: Rgb = Rgb(50, 200, 50);
    /// The color rock is drawn in.
    pub const ROCK: Rgb = Rgb(128, 128, 128);

    /// Convert hue/lightness/saturation (each in `0..=1`, hue wrapping) to RGB.
    pub fn from_hls(hue: f64, lightness: f64, saturation: f64) -> Self {
        let to_byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0) as u8;
        if saturation == 0.0 {
            let v = to_byte(lightness);
            return Rgb(v, v, v);
        }
        let m2 = if lightness <= 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let m1 = 2.0 * lightness - m2;
        Rgb(
            to_byte(hls_channel(m1, m2, hue + 1.0 / 3.0)),
            to_byte(hls_channel(m1, m2, hue)),
            to_byte(hls_channel(m1, m2, hue - 1.0 / 3.0)),
        )
    }

    /// A random blue-to-red creature color.
    pub fn random_creature(rng: &mut StdRng) -> Self {
        let hue = rng.random_range(0.5..1.1);
        let lightness = rng.random_range(0.5..0.8);
        let saturation = rng.random_range(0.7..0.9);
        Self::from_hls(hue, lightness, saturation)
    }
}

fn hls_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

/// What a creature did on its last turn. Drawn as a small colored marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Has not acted yet.
    #[default]
    Idle,
    /// Reproduced this turn.
    Splitting,
    /// Saw nothing worth reacting to.
    Wandering,
    /// Perceived more threat than food.
    Fleeing,
    /// Perceived more food than threat.
    Feeding,
}

impl Mood {
    /// The marker color for this mood.
    pub fn color(self) -> Rgb {
        match self {
            Self::Idle => Rgb::BLACK,
            Self::Splitting => Rgb::YELLOW,
            Self::Wandering => Rgb::BLUE,
            Self::Fleeing => Rgb::RED,
            Self::Feeding => Rgb::GREEN,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Splitting => write!(f, "splitting"),
            Self::Wandering => write!(f, "wandering"),
            Self::Fleeing => write!(f, "fleeing"),
            Self::Feeding => write!(f, "feeding"),
        }
    }
}

/// Anything that occupies space in a world and can be indexed.
pub trait Body {
    /// The entity's id.
    fn id(&self) -> EntityId;

    /// The entity's center.
    fn position(&self) -> (f64, f64);

    /// The entity's radius, used for its footprint and for size contests.
    fn radius(&self) -> f64;

    /// The footprint box registered in the spatial index.
    fn bbox(&self) -> Bbox {
        self.bbox_with(self.radius())
    }

    /// A box centered on the entity with the given half-width.
    fn bbox_with(&self, half_width: f64) -> Bbox {
        let (x, y) = self.position();
        Bbox::around(x, y, half_width)
    }

    /// Distance from this entity's center to a point.
    fn distance_to(&self, x: f64, y: f64) -> f64 {
        let (sx, sy) = self.position();
        geometry::distance(sx, sy, x, y)
    }
}

/// An autonomous agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    /// Unique, non-negative id.
    pub id: EntityId,
    /// Horizontal position in world coordinates.
    pub x: f64,
    /// Vertical position in world coordinates.
    pub y: f64,
    /// Stored energy. Drives radius and survival.
    pub energy: f64,
    /// Body color.
    pub color: Rgb,
    /// Name of the decision strategy this creature follows.
    pub species: String,
    /// What the creature did on its last turn.
    pub mood: Mood,
}

impl Creature {
    /// Create a black, idle creature.
    pub fn new(id: EntityId, x: f64, y: f64, energy: f64, species: impl Into<String>) -> Self {
        Self {
            id,
            x,
            y,
            energy,
            color: Rgb::BLACK,
            species: species.into(),
            mood: Mood::Idle,
        }
    }

    /// Set the body color.
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Split into two creatures of equal energy.
    ///
    /// The child is placed one radius away from the parent in a random
    /// direction and the parent steps back by the same offset. Energy is
    /// conserved: parent plus child equal the energy before the split.
    pub fn split(&mut self, ids: &mut IdGenerator, rng: &mut StdRng) -> Creature {
        let phi = rng.random_range(0.0..std::f64::consts::TAU);
        let r = self.radius();
        let (dx, dy) = (r * phi.cos(), r * phi.sin());

        let child_energy = self.energy / 2.0;
        self.energy -= child_energy;
        self.x -= dx;
        self.y -= dy;

        Creature {
            id: ids.next_creature(),
            x: self.x + 2.0 * dx,
            y: self.y + 2.0 * dy,
            energy: child_energy,
            color: self.color,
            species: self.species.clone(),
            mood: Mood::Idle,
        }
    }
}

impl Body for Creature {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    fn radius(&self) -> f64 {
        self.energy.max(0.0).sqrt()
    }
}

/// A passive food resource of constant size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grass {
    /// Unique, negative id.
    pub id: EntityId,
    /// Horizontal position in world coordinates.
    pub x: f64,
    /// Vertical position in world coordinates.
    pub y: f64,
    /// Constant footprint radius.
    pub size: f64,
}

impl Grass {
    /// Create a grass instance.
    pub fn new(id: EntityId, x: f64, y: f64, size: f64) -> Self {
        Self { id, x, y, size }
    }
}

impl Body for Grass {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    fn radius(&self) -> f64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn id_sign_selects_kind() {
        assert_eq!(EntityId(0).kind(), EntityKind::Creature);
        assert_eq!(EntityId(17).kind(), EntityKind::Creature);
        assert_eq!(EntityId(-1).kind(), EntityKind::Grass);
        assert!(EntityId(-3).is_grass());
    }

    #[test]
    fn generator_never_reuses_ids() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_creature(), EntityId(0));
        assert_eq!(ids.next_creature(), EntityId(1));
        assert_eq!(ids.next_grass(), EntityId(-1));
        assert_eq!(ids.next_grass(), EntityId(-2));
        assert_eq!(ids.next_creature(), EntityId(2));
    }

    #[test]
    fn separate_generators_are_independent() {
        let mut a = IdGenerator::new();
        let mut b = IdGenerator::new();
        a.next_creature();
        a.next_creature();
        assert_eq!(b.next_creature(), EntityId(0));
    }

    #[test]
    fn radius_is_sqrt_of_energy() {
        let c = Creature::new(EntityId(0), 0.0, 0.0, 400.0, "greedy");
        assert!((c.radius() - 20.0).abs() < f64::EPSILON);
        let starving = Creature::new(EntityId(1), 0.0, 0.0, -1.0, "greedy");
        assert_eq!(starving.radius(), 0.0);
    }

    #[test]
    fn bbox_is_centered_square() {
        let c = Creature::new(EntityId(0), 10.0, -5.0, 16.0, "greedy");
        let b = c.bbox();
        assert_eq!(b.min, [6.0, -9.0]);
        assert_eq!(b.max, [14.0, -1.0]);
        let vision = c.bbox_with(150.0);
        assert_eq!(vision.min, [-140.0, -155.0]);
    }

    #[test]
    fn split_conserves_energy() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ids = IdGenerator::new();
        let mut parent = Creature::new(ids.next_creature(), 3.0, 4.0, 601.0, "greedy")
            .with_color(Rgb::RED);
        let child = parent.split(&mut ids, &mut rng);

        assert!((parent.energy + child.energy - 601.0).abs() < 1e-9);
        assert_ne!(child.id, parent.id);
        assert_eq!(child.color, Rgb::RED);
        assert_eq!(child.species, "greedy");
    }

    #[test]
    fn split_places_child_near_parent() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut ids = IdGenerator::new();
        let mut parent = Creature::new(ids.next_creature(), 0.0, 0.0, 400.0, "greedy");
        let original_radius = parent.radius();
        let child = parent.split(&mut ids, &mut rng);

        let gap = parent.distance_to(child.x, child.y);
        assert!((gap - 2.0 * original_radius).abs() < 1e-9);
        // Parent and child stay symmetric around the original position.
        assert!((parent.x + child.x).abs() < 1e-9);
        assert!((parent.y + child.y).abs() < 1e-9);
    }

    #[test]
    fn hls_primaries() {
        assert_eq!(Rgb::from_hls(0.0, 0.5, 1.0), Rgb(255, 0, 0));
        assert_eq!(Rgb::from_hls(1.0 / 3.0, 0.5, 1.0), Rgb(0, 255, 0));
        assert_eq!(Rgb::from_hls(0.3, 0.4, 0.0), Rgb(102, 102, 102));
    }

    #[test]
    fn mood_colors() {
        assert_eq!(Mood::Splitting.color(), Rgb::YELLOW);
        assert_eq!(Mood::Fleeing.color(), Rgb::RED);
        assert_eq!(Mood::default(), Mood::Idle);
    }
}
