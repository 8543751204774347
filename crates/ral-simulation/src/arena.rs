use ral_core::Bbox;

use crate::canvas::Canvas;
use crate::episode::Episode;
use crate::error::SimResult;
use crate::event::EventLog;

/// Counts gathered while a tick runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The tick these counts belong to.
    pub tick: u64,
    /// Children added at the end of the tick.
    pub born: usize,
    /// Creatures that starved.
    pub starved: usize,
    /// Creatures eaten by other creatures.
    pub eaten: usize,
    /// Grass instances eaten.
    pub grass_eaten: usize,
    /// Grass instances added.
    pub grass_grown: usize,
    /// Live creatures after the tick.
    pub creatures: usize,
    /// Live grass after the tick.
    pub grass: usize,
}

impl TickReport {
    /// Creatures that left the world this tick.
    pub fn died(&self) -> usize {
        self.starved + self.eaten
    }
}

/// The surface a launcher drives, shared by both world variants.
pub trait Arena {
    /// Advance one tick. Returns `false` once the run should stop.
    fn step(&mut self) -> SimResult<bool>;

    /// Issue draw calls for the current state.
    fn draw(&self, canvas: &mut dyn Canvas);

    /// One-line population summary for a caption or status bar.
    fn info(&self) -> String;

    /// Ticks completed so far.
    fn tick(&self) -> u64;

    /// Live creature count.
    fn population(&self) -> usize;

    /// Counts from the most recent tick.
    fn last_report(&self) -> TickReport;

    /// Domain events recorded so far.
    fn events(&self) -> &EventLog;

    /// The episode being recorded, if recording is enabled.
    fn episode(&self) -> Option<&Episode>;

    /// Start recording an episode.
    fn enable_episode(&mut self);

    /// The region worth drawing.
    fn extent(&self) -> Bbox;
}
