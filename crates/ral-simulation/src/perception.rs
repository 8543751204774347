//! What a creature knows about its surroundings when it decides.
//!
//! The continuous world buckets every visible neighbor into one of a fixed
//! number of direction slices. Food votes for the slice it lies in; a threat
//! votes for the opposite slice, so fleeing and feeding share one structure.
//! The grid world instead hands over a small window of cell contents.

use ral_core::geometry;
use ral_core::{EntityId, Mood};

/// Weighted direction votes, one entry per slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceVotes {
    votes: Vec<f64>,
    food: f64,
    threat: f64,
    seen: usize,
}

impl SliceVotes {
    /// Create an empty vote vector with `num_slices` entries.
    pub fn new(num_slices: usize) -> Self {
        Self {
            votes: vec![0.0; num_slices.max(1)],
            food: 0.0,
            threat: 0.0,
            seen: 0,
        }
    }

    /// Record an attraction toward `slice`.
    pub fn add_food(&mut self, slice: usize, weight: f64) {
        self.add(slice, weight);
        self.food += weight;
    }

    /// Record a flee signal. `slice` is already the direction away from the threat.
    pub fn add_threat(&mut self, slice: usize, weight: f64) {
        self.add(slice, weight);
        self.threat += weight;
    }

    fn add(&mut self, slice: usize, weight: f64) {
        let n = self.votes.len();
        self.votes[slice % n] += weight;
        self.seen += 1;
    }

    /// The raw vote vector.
    pub fn votes(&self) -> &[f64] {
        &self.votes
    }

    /// Number of slices.
    pub fn num_slices(&self) -> usize {
        self.votes.len()
    }

    /// Total weight of food votes.
    pub fn food(&self) -> f64 {
        self.food
    }

    /// Total weight of threat votes.
    pub fn threat(&self) -> f64 {
        self.threat
    }

    /// Number of neighbors that voted.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// The vector sum of every slice's central heading scaled by its vote.
    pub fn resultant(&self) -> (f64, f64) {
        let n = self.votes.len();
        self.votes
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .fold((0.0, 0.0), |(x, y), (slice, v)| {
                let (dx, dy) = geometry::from_slice(slice, n, *v);
                (x + dx, y + dy)
            })
    }
}

/// The content of one grid cell as seen by a creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Nothing there.
    Empty,
    /// A grass instance.
    Grass,
    /// Another creature, or the perceiver itself at the window center.
    Creature,
    /// A creature of a predator species.
    Predator,
    /// Impassable rock.
    Rock,
    /// Impassable water.
    Water,
    /// Outside the grid.
    Wall,
}

/// A square window of cells centered on the perceiver.
#[derive(Debug, Clone, PartialEq)]
pub struct CellWindow {
    radius: usize,
    cells: Vec<Cell>,
}

impl CellWindow {
    /// Build a window of the given radius by sampling `cell_at(dx, dy)` for every offset.
    pub fn sample(radius: usize, mut cell_at: impl FnMut(i64, i64) -> Cell) -> Self {
        let r = radius as i64;
        let mut cells = Vec::with_capacity((2 * radius + 1).pow(2));
        for dy in -r..=r {
            for dx in -r..=r {
                cells.push(cell_at(dx, dy));
            }
        }
        Self { radius, cells }
    }

    /// The window radius in cells.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// The cell at offset `(dx, dy)` from the center. Offsets outside the window read as walls.
    pub fn get(&self, dx: i64, dy: i64) -> Cell {
        let r = self.radius as i64;
        if dx.abs() > r || dy.abs() > r {
            return Cell::Wall;
        }
        let side = 2 * r + 1;
        self.cells[((dy + r) * side + (dx + r)) as usize]
    }

    /// The four orthogonal neighbor offsets holding grass.
    pub fn adjacent_grass(&self) -> Vec<(i64, i64)> {
        self.adjacent(Cell::Grass)
    }

    /// The four orthogonal neighbor offsets holding `cell`.
    pub fn adjacent(&self, cell: Cell) -> Vec<(i64, i64)> {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .into_iter()
            .filter(|(dx, dy)| self.get(*dx, *dy) == cell)
            .collect()
    }
}

/// The two shapes perception takes.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Direction votes from the continuous world.
    Slices(SliceVotes),
    /// Local cell contents from the grid world.
    Window(CellWindow),
}

/// Everything a strategy is told before it decides.
#[derive(Debug, Clone, PartialEq)]
pub struct Perception {
    /// The deciding creature.
    pub creature: EntityId,
    /// The creature's current energy.
    pub energy: f64,
    /// Number of heading slices a `Move` action may name.
    pub num_slices: usize,
    /// Largest speed a `Move` action may request.
    pub max_speed: f64,
    /// What the creature sees.
    pub view: View,
}

impl Perception {
    /// The mood a creature shows when it moves on this perception.
    pub fn mood(&self) -> Mood {
        match &self.view {
            View::Slices(votes) if votes.seen() == 0 => Mood::Wandering,
            View::Slices(votes) if votes.threat() > votes.food() => Mood::Fleeing,
            View::Slices(_) => Mood::Feeding,
            View::Window(window) if !window.adjacent(Cell::Predator).is_empty() => Mood::Fleeing,
            View::Window(window) if window.adjacent_grass().is_empty() => Mood::Wandering,
            View::Window(_) => Mood::Feeding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn votes_accumulate_per_slice() {
        let mut votes = SliceVotes::new(4);
        votes.add_food(1, 2.2);
        votes.add_food(1, 2.2);
        votes.add_threat(3, 2.0);
        assert!((votes.votes()[1] - 4.4).abs() < 1e-12);
        assert!((votes.votes()[3] - 2.0).abs() < 1e-12);
        assert_eq!(votes.seen(), 3);
        assert!((votes.food() - 4.4).abs() < 1e-12);
        assert!((votes.threat() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn resultant_points_at_the_vote() {
        let mut votes = SliceVotes::new(12);
        let slice = geometry::to_slice(10.0, 0.0, 12);
        votes.add_food(slice, 3.0);
        let (dx, dy) = votes.resultant();
        assert_eq!(geometry::to_slice(dx, dy, 12), slice);
        assert!((dx.hypot(dy) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn opposing_votes_cancel() {
        let mut votes = SliceVotes::new(4);
        votes.add_food(0, 2.0);
        votes.add_food(2, 2.0);
        let (dx, dy) = votes.resultant();
        assert!(dx.abs() < 1e-9 && dy.abs() < 1e-9);
    }

    #[test]
    fn window_indexing_and_walls() {
        let window = CellWindow::sample(1, |dx, dy| match (dx, dy) {
            (1, 0) => Cell::Grass,
            (0, -1) => Cell::Wall,
            (0, 0) => Cell::Creature,
            _ => Cell::Empty,
        });
        assert_eq!(window.get(1, 0), Cell::Grass);
        assert_eq!(window.get(0, 0), Cell::Creature);
        assert_eq!(window.get(0, -1), Cell::Wall);
        assert_eq!(window.get(2, 0), Cell::Wall);
        assert_eq!(window.adjacent_grass(), vec![(1, 0)]);
        assert!(window.adjacent(Cell::Predator).is_empty());
    }

    #[test]
    fn adjacent_predator_means_fleeing() {
        let window = CellWindow::sample(1, |dx, dy| match (dx, dy) {
            (-1, 0) => Cell::Predator,
            (1, 0) => Cell::Grass,
            _ => Cell::Empty,
        });
        let perception = Perception {
            creature: EntityId(0),
            energy: 10.0,
            num_slices: 8,
            max_speed: 1.0,
            view: View::Window(window),
        };
        assert_eq!(perception.mood(), Mood::Fleeing);
    }

    #[test]
    fn mood_follows_perception() {
        let mut votes = SliceVotes::new(4);
        let mut perception = Perception {
            creature: EntityId(0),
            energy: 300.0,
            num_slices: 4,
            max_speed: 7.0,
            view: View::Slices(votes.clone()),
        };
        assert_eq!(perception.mood(), Mood::Wandering);

        votes.add_threat(0, 2.0);
        perception.view = View::Slices(votes.clone());
        assert_eq!(perception.mood(), Mood::Fleeing);

        votes.add_food(1, 2.2);
        perception.view = View::Slices(votes);
        assert_eq!(perception.mood(), Mood::Feeding);
    }
}
