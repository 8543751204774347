use ral_core::EntityId;

/// Why a creature left the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Energy fell below the survival threshold.
    Starved,
    /// Engulfed by a larger creature.
    Eaten {
        /// The creature that ate it.
        by: EntityId,
    },
}

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEventKind {
    // Lifecycle
    /// A creature split and a child joined the world.
    Born {
        /// The creature that split.
        parent: EntityId,
        /// The newborn.
        child: EntityId,
    },
    /// A creature was removed from the world.
    Died {
        /// The creature that died.
        entity: EntityId,
        /// The cause of death.
        cause: DeathCause,
    },

    // Feeding
    /// A creature ate a grass instance.
    AteGrass {
        /// The creature that ate.
        eater: EntityId,
        /// The grass that was eaten.
        grass: EntityId,
    },
    /// A creature ate another creature.
    AteCreature {
        /// The creature that ate.
        eater: EntityId,
        /// The creature that was eaten.
        victim: EntityId,
    },

    // Placement
    /// A split was skipped because no free cell was found for the child.
    PlacementSkipped {
        /// The creature that wanted to split.
        entity: EntityId,
    },
}

impl SimEventKind {
    /// Check whether a given entity is involved in this event.
    pub fn involves(&self, id: EntityId) -> bool {
        match self {
            Self::Born { parent, child } => *parent == id || *child == id,
            Self::Died { entity, cause } => {
                *entity == id || matches!(cause, DeathCause::Eaten { by } if *by == id)
            }
            Self::AteGrass { eater, grass } => *eater == id || *grass == id,
            Self::AteCreature { eater, victim } => *eater == id || *victim == id,
            Self::PlacementSkipped { entity } => *entity == id,
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    /// The simulation tick when this event occurred.
    pub tick: u64,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new simulation event with the given tick, kind, and description.
    pub fn new(tick: u64, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            tick,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let excess = self.events.len() - self.max_events;
            self.events.drain(..excess);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events involving the given entity.
    pub fn events_for_entity(&self, id: EntityId) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Count the events at `tick` matching a predicate.
    pub fn count_at_tick(&self, tick: u64, pred: impl Fn(&SimEventKind) -> bool) -> usize {
        self.events
            .iter()
            .filter(|e| e.tick == tick && pred(&e.kind))
            .count()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
