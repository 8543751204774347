pub mod config;
pub mod run;

use std::fmt;

use clap::ValueEnum;

/// The two world variants the launcher can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorldKind {
    /// Continuous plane with an R*-tree index
    Ball,
    /// Square grid, one entity per cell
    Grid,
}

impl fmt::Display for WorldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ball => write!(f, "ball"),
            Self::Grid => write!(f, "grid"),
        }
    }
}
