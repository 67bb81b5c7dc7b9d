//! # Row Operation Results
//!
//! Every read, write and navigation call against a row returns [`RowResult`].
//! Success is `Ok`; the failure kinds below are the complete set a caller has
//! to handle. None of them leave the row in an inconsistent state.
//!
//! | Error | Raised when |
//! |-------|-------------|
//! | `NotFound` | the field, element or schema does not exist |
//! | `TypeMismatch` | the stored type code differs from the requested type |
//! | `TypeConstraint` | the value's type arguments violate the scope's declared types |
//! | `InsufficientPermissions` | the scope is immutable, or a unique scope is written directly |
//! | `Exists` | an insert targets a value that is already present |
//! | `TooBig` | a value exceeds the declared column length |
//! | `InvalidRow` | the bytes are structurally malformed |
//! | `Failure` | the operation is not supported by the type |

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RowError {
    #[error("value not found")]
    NotFound,

    #[error("stored type does not match the requested type")]
    TypeMismatch,

    #[error("type arguments violate the declared scope constraints")]
    TypeConstraint,

    #[error("insufficient permissions to modify the scope")]
    InsufficientPermissions,

    #[error("value already exists")]
    Exists,

    #[error("value exceeds the declared maximum length")]
    TooBig,

    #[error("row is structurally invalid")]
    InvalidRow,

    #[error("operation failed")]
    Failure,
}

pub type RowResult<T> = std::result::Result<T, RowError>;

/// Options that control how a sparse write treats an existing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateOptions {
    /// Overwrite an existing value; fail with `NotFound` otherwise.
    Update,
    /// Write a new value; fail with `Exists` if one is present.
    Insert,
    /// Overwrite an existing value or write a new one.
    #[default]
    Upsert,
    /// Insert before the current element of an indexed scope, never overwriting.
    InsertAt,
}

/// Internal superset of [`UpdateOptions`] that adds deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowOptions {
    Update,
    Insert,
    Upsert,
    InsertAt,
    Delete,
}

impl From<UpdateOptions> for RowOptions {
    fn from(options: UpdateOptions) -> Self {
        match options {
            UpdateOptions::Update => RowOptions::Update,
            UpdateOptions::Insert => RowOptions::Insert,
            UpdateOptions::Upsert => RowOptions::Upsert,
            UpdateOptions::InsertAt => RowOptions::InsertAt,
        }
    }
}
