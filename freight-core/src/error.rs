use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// A field value that cannot be written to storage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} exceeds NUMERIC({precision},{scale})")]
    PrecisionExceeded {
        field: &'static str,
        precision: u32,
        scale: i64,
    },

    #[error("photo url must not contain ',': {0}")]
    PhotoContainsDelimiter(String),

    #[error("rating score {0} is outside 1.0..=5.0")]
    RatingOutOfRange(f64),

    #[error("rating count {0} is negative")]
    NegativeRatingCount(i32),

    #[error("unknown {kind} code {code}")]
    UnknownCode { kind: &'static str, code: i32 },

    #[error("unknown {kind} '{name}'")]
    UnknownName { kind: &'static str, name: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unique constraint violated{}", constraint_suffix(.constraint))]
    Duplicate { constraint: Option<String> },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("failed to acquire database connection: {0}")]
    Pool(String),

    #[error("stored {entity} row is invalid: {source}")]
    Corrupt {
        entity: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("database error: {0}")]
    Database(DieselError),
}

fn constraint_suffix(constraint: &Option<String>) -> String {
    constraint
        .as_deref()
        .map(|c| format!(": {c}"))
        .unwrap_or_default()
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Duplicate {
                    constraint: info.constraint_name().map(str::to_owned),
                }
            }
            other => StoreError::Database(other),
        }
    }
}
