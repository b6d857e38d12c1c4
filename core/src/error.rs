use thiserror::Error;

/// Faults the core cannot turn into an action result.
///
/// Gameplay failures (wrong location, depleted node, ...) are never
/// reported here; they travel as a `FailureKind` on the result record.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tick: expected {expected}, got {actual}")]
    TickMismatch { expected: u64, actual: u64 },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Area '{area_id}' not found")]
    UnknownArea { area_id: String },

    #[error("Stale action run: began after {began_after} resolved actions, now {resolved}")]
    StaleRun { began_after: u64, resolved: u64 },

    #[error("Action run already finished")]
    RunFinished,

    #[error("Unsupported save format version {found} (expected {expected})")]
    UnsupportedSaveVersion { found: u32, expected: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
