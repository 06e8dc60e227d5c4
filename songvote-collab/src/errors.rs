use crate::DatabaseError;

/// The kind of a failure, so callers can tell the user what to do about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input had the wrong shape
    Validation,
    /// The operation needs a resolved user
    AuthRequired,
    /// A name or phone is already taken
    Conflict,
    /// Something that was referenced doesn't exist
    NotFound,
    /// The storage backend failed
    Storage,
}

impl From<&DatabaseError> for ErrorKind {
    fn from(error: &DatabaseError) -> Self {
        match error {
            DatabaseError::Internal(_) => Self::Storage,
            DatabaseError::Conflict { .. } => Self::Conflict,
            DatabaseError::NotFound { .. } => Self::NotFound,
        }
    }
}
