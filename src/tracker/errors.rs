use thiserror::Error;

/// Errors that can arise while interacting with the tracker stores.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around JSON serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A stored index entry or meta value has an unreadable shape.
    #[error("corrupt store data: {0}")]
    Corrupt(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Email and password did not match a stored account.
    #[error("invalid email or password")]
    Authentication,

    /// Registration attempted with an email that already has an account.
    #[error("an account already exists for {0}")]
    DuplicateAccount(String),

    /// A required field was empty or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Not enough gold for a purchase.
    #[error("insufficient funds: need {needed} gold, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// One-time store item already bought.
    #[error("already owned: {0}")]
    AlreadyOwned(String),

    /// Password hashing or hash parsing failure.
    #[error("password hash error: {0}")]
    PasswordHash(String),
}

impl TrackerError {
    /// True for the errors a user can recover from by changing their input
    /// (as opposed to storage faults).
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TrackerError::Authentication
                | TrackerError::DuplicateAccount(_)
                | TrackerError::Validation(_)
                | TrackerError::InsufficientFunds { .. }
                | TrackerError::AlreadyOwned(_)
                | TrackerError::NotFound(_)
        )
    }
}

impl From<crate::validation::FieldError> for TrackerError {
    fn from(err: crate::validation::FieldError) -> Self {
        TrackerError::Validation(err.to_string())
    }
}
