use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use songvote_collab::{DatabaseError, ErrorKind, IdentityError, LookupError, SongError, VoteError};
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Invalid(String),
    #[error("Request body is invalid: {0}")]
    InvalidBody(String),
    #[error("{0}")]
    AuthRequired(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AuthRequired(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::Validation => Self::Invalid(message),
            ErrorKind::AuthRequired => Self::AuthRequired(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Storage => Self::Unavailable(message),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, self.to_string()).into_response()
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        Self::from_kind((&value).into(), value.to_string())
    }
}

impl From<IdentityError> for ServerError {
    fn from(value: IdentityError) -> Self {
        Self::from_kind(value.kind(), value.to_string())
    }
}

impl From<SongError> for ServerError {
    fn from(value: SongError) -> Self {
        Self::from_kind(value.kind(), value.to_string())
    }
}

impl From<VoteError> for ServerError {
    fn from(value: VoteError) -> Self {
        Self::from_kind(value.kind(), value.to_string())
    }
}

impl From<LookupError> for ServerError {
    fn from(value: LookupError) -> Self {
        Self::from_kind(value.kind(), value.to_string())
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;

    #[test]
    fn test_status_codes() {
        let status = |e: ServerError| e.into_response().status();

        assert_eq!(status(VoteError::AuthRequired.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(
                VoteError::NotFound {
                    resource: "song",
                    identifier: "id"
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(
                VoteError::Storage {
                    attempts: 3,
                    source: DatabaseError::Internal(Box::new(io::Error::other("down")))
                }
                .into()
            ),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(
                IdentityError::Conflict {
                    field: "name",
                    value: "Maria".to_string()
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(SongError::AuthRequired.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(ServerError::InvalidBody("title".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(LookupError::NotConfigured.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
