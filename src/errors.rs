//! Error handling for the ballot ledger

/// Result type alias for the ballot ledger
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ballot ledger
///
/// Business rejections (closed poll, repeated voter) are not represented
/// here; they travel as successful [`crate::voting::VoteOutcome`] values.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Wrong number of invocation arguments
    #[error("Incorrect number of arguments for {operation}: expected {expected}, got {got}")]
    InvalidArgumentCount {
        operation: String,
        expected: String,
        got: usize,
    },

    /// Non-integer where an integer was expected
    #[error("{} argument must be a numeric string", ordinal(.position))]
    InvalidArgumentType { position: usize },

    /// Empty string where a non-empty one was expected
    #[error("{} argument must be a non-empty string", ordinal(.position))]
    InvalidArgumentValue { position: usize },

    /// No poll with the requested id
    #[error("Voting not found: {id}")]
    PollNotFound { id: String },

    /// Storage key was never written
    #[error("Failed to get state for {key}")]
    KeyNotFound { key: String },

    /// Option id does not belong to the targeted poll
    #[error("Option {option_id} not found in voting {poll_id}")]
    OptionNotFound { poll_id: String, option_id: i64 },

    /// Poll id already present in the index
    #[error("Voting {id} already exists")]
    DuplicatePoll { id: String },

    /// Index key already holds data
    #[error("Ledger already initialized: {key} is present")]
    AlreadyInitialized { key: String },

    /// Dispatcher received a function name it does not route
    #[error("Received unknown function invocation: {name}")]
    UnknownOperation { name: String },

    /// Backing key-value store failure
    #[error("Store error: {message}")]
    Store { message: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Coarse classification of [`Error`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgumentCount,
    InvalidArgumentType,
    InvalidArgumentValue,
    PollNotFound,
    KeyNotFound,
    OptionNotFound,
    DuplicatePoll,
    AlreadyInitialized,
    UnknownOperation,
    Store,
    Internal,
}

impl Error {
    /// Create a new argument count error
    pub fn argument_count(
        operation: impl Into<String>,
        expected: impl Into<String>,
        got: usize,
    ) -> Self {
        Self::InvalidArgumentCount {
            operation: operation.into(),
            expected: expected.into(),
            got,
        }
    }

    /// Create a new store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgumentCount { .. } => ErrorKind::InvalidArgumentCount,
            Self::InvalidArgumentType { .. } => ErrorKind::InvalidArgumentType,
            Self::InvalidArgumentValue { .. } => ErrorKind::InvalidArgumentValue,
            Self::PollNotFound { .. } => ErrorKind::PollNotFound,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::OptionNotFound { .. } => ErrorKind::OptionNotFound,
            Self::DuplicatePoll { .. } => ErrorKind::DuplicatePoll,
            Self::AlreadyInitialized { .. } => ErrorKind::AlreadyInitialized,
            Self::UnknownOperation { .. } => ErrorKind::UnknownOperation,
            Self::Store { .. } => ErrorKind::Store,
            Self::Serialization(_) | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the error was caused by malformed invocation arguments
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidArgumentCount
                | ErrorKind::InvalidArgumentType
                | ErrorKind::InvalidArgumentValue
        )
    }
}

/// English ordinal for a 1-based argument position
fn ordinal(position: &usize) -> String {
    let position = *position;
    let suffix = match (position % 10, position % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}

/// Convenience macros for creating specific error types
#[macro_export]
macro_rules! store_error {
    ($msg:expr) => {
        $crate::Error::store($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::store(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::Error::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::internal(format!($fmt, $($arg)*))
    };
}
