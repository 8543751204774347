use ral_core::{CoreError, EntityId};

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors that abort a simulation tick.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The spatial index fell out of sync with the entity tables.
    #[error("spatial index out of sync: {0}")]
    Index(#[from] CoreError),

    /// A creature belongs to a species with no registered strategy.
    #[error("no decision strategy registered for species \"{0}\"")]
    UnknownStrategy(String),

    /// A strategy returned an action outside the allowed range.
    #[error("creature {creature} chose an invalid action: {reason}")]
    InvalidAction {
        /// The creature the action was chosen for.
        creature: EntityId,
        /// What was wrong with the action.
        reason: String,
    },

    /// A strategy failed to produce a decision.
    #[error("decision for creature {creature} failed: {message}")]
    Decision {
        /// The creature the decision was requested for.
        creature: EntityId,
        /// The strategy's description of the failure.
        message: String,
    },

    /// A grid cell is outside the grid or already taken.
    #[error("cell ({x}, {y}) is not available")]
    CellUnavailable {
        /// Column.
        x: usize,
        /// Row.
        y: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
