use thiserror::Error;

/// Error types for help-desk engine operations
///
/// Covers the failure modes of ticket assignment, workload bookkeeping, and the
/// backing store. Assignment and update failures are local: they bubble to the
/// immediate caller and never terminate the workload monitor loop or other
/// in-flight assignments.
///
/// # Examples
///
/// ```
/// use helpdesk_engine::{HelpdeskError, Result};
///
/// fn pick() -> Result<()> {
///     Err(HelpdeskError::no_candidate("pool empty after filtering"))
/// }
///
/// match pick() {
///     Ok(_) => println!("assigned"),
///     Err(HelpdeskError::NoCandidate(msg)) => println!("unassigned: {}", msg),
///     Err(e) => println!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum HelpdeskError {
    /// No eligible technician for a ticket
    ///
    /// Raised when the candidate pool is empty after availability, capacity,
    /// and skill filtering. The ticket stays unassigned; it is never
    /// force-assigned to an ineligible technician.
    #[error("No eligible technician: {0}")]
    NoCandidate(String),

    /// Backing store operation exceeded its bounded timeout
    ///
    /// The assignment attempt fails rather than hanging the caller. Callers
    /// may retry with backoff up to the configured retry count.
    #[error("Store operation timed out: {0}")]
    StoreTimeout(String),

    /// Backing store unreachable
    ///
    /// Connection failures and I/O errors during read or write. Treated as
    /// potentially fatal only if they persist across all retries.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Database query or transaction error
    ///
    /// SQL errors, constraint violations, and data consistency problems that
    /// are not connectivity related.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration validation error
    ///
    /// Invalid thresholds, zero intervals, missing settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input validation error
    ///
    /// Ticket or technician data failed validation (missing required fields,
    /// malformed values).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested technician or ticket does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for HelpdeskError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::StoreTimeout(err.to_string()),
            sqlx::Error::Io(_) | sqlx::Error::Configuration(_) | sqlx::Error::PoolClosed => {
                Self::StoreUnavailable(err.to_string())
            }
            sqlx::Error::RowNotFound => Self::NotFound(err.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for HelpdeskError {
    fn from(err: anyhow::Error) -> Self {
        // Unexpected errors from lower-level components map to Internal.
        Self::Internal(err.to_string())
    }
}

impl HelpdeskError {
    /// Create a new NoCandidate error with the provided message
    pub fn no_candidate<S: Into<String>>(msg: S) -> Self {
        Self::NoCandidate(msg.into())
    }

    /// Create a new StoreTimeout error with the provided message
    pub fn store_timeout<S: Into<String>>(msg: S) -> Self {
        Self::StoreTimeout(msg.into())
    }

    /// Create a new StoreUnavailable error with the provided message
    pub fn store_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a new Database error with the provided message
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Configuration error with the provided message
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new InvalidInput error with the provided message
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new NotFound error with the provided message
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Internal error with the provided message
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a failed store operation is worth retrying
    ///
    /// Timeouts and connectivity failures are transient; everything else is
    /// surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreTimeout(_) | Self::StoreUnavailable(_))
    }
}

/// Result type for help-desk engine operations
pub type Result<T> = std::result::Result<T, HelpdeskError>;
