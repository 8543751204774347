//! Per-tick change recording, written as one JSON object per line.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use ral_core::EntityId;

use crate::error::SimResult;

/// A creature's state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureChange {
    /// The creature.
    pub id: EntityId,
    /// Its energy.
    pub energy: f64,
    /// Its species, when the world has more than one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creature_type: Option<String>,
}

/// A grid cell whose content changed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
    /// Cell code: 0 empty, 1 grass, 2 creature.
    pub value: i64,
}

/// All changes recorded during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Creature states.
    pub creatures: Vec<CreatureChange>,
    /// Cell changes.
    pub grid: Vec<CellChange>,
}

/// A recorded run: a list of closed frames plus the frame being filled.
#[derive(Debug, Clone, Default)]
pub struct Episode {
    frames: Vec<Frame>,
    current: Frame,
}

impl Episode {
    /// Create an empty episode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a creature state in the current frame.
    pub fn creature_change(&mut self, id: EntityId, energy: f64, creature_type: Option<&str>) {
        self.current.creatures.push(CreatureChange {
            id,
            energy,
            creature_type: creature_type.map(str::to_string),
        });
    }

    /// Record a cell change in the current frame.
    pub fn grid_change(&mut self, x: i64, y: i64, value: i64) {
        self.current.grid.push(CellChange { x, y, value });
    }

    /// Close the current frame and start a new one.
    pub fn next_frame(&mut self) {
        self.frames.push(std::mem::take(&mut self.current));
    }

    /// The closed frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Write every closed frame as one JSON line.
    pub fn write_jsonl<W: Write>(&self, mut out: W) -> SimResult<()> {
        for frame in &self.frames {
            serde_json::to_writer(&mut out, frame)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write the episode to a JSONL file.
    pub fn save(&self, path: &Path) -> SimResult<()> {
        let file = File::create(path)?;
        self.write_jsonl(BufWriter::new(file))
    }

    /// Read an episode back from a JSONL file. Blank lines are skipped.
    pub fn load(path: &Path) -> SimResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut frames = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            frames.push(serde_json::from_str(&line)?);
        }
        Ok(Self {
            frames,
            current: Frame::default(),
        })
    }
}
