use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts},
    routing::{get, post},
    Json,
};
use songvote_collab::DatabaseError;
use songvote_core::{User as CoreUser, UserId};

use crate::{
    errors::{ServerError, ServerResult},
    schemas::{IdentifySchema, ValidatedJson},
    serialized::{ToSerialized, User},
    Router, ServerContext,
};

/// The user identified by the `Authorization: Bearer <user id>` header.
/// This only identifies, it does not authenticate.
pub struct Session(CoreUser);

impl Session {
    /// Returns the user of the session
    pub fn user(&self) -> &CoreUser {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    ServerContext: FromRef<S>,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .ok_or(ServerError::AuthRequired("Missing authorization".to_string()))?;

        let parts: Vec<_> = token.split_ascii_whitespace().collect();

        if parts.first() != Some(&"Bearer") {
            return Err(ServerError::Invalid(
                "Authorization must be Bearer".to_string(),
            ));
        }

        let user_id = parts
            .last()
            .and_then(|token| UserId::parse(token).ok())
            .ok_or(ServerError::AuthRequired("Malformed user id".to_string()))?;

        let user = context
            .collab
            .identity
            .user(user_id)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => {
                    ServerError::AuthRequired("User does not exist".to_string())
                }
                e => e.into(),
            })?;

        Ok(Self(user))
    }
}

#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "users",
    request_body = IdentifySchema,
    responses(
        (status = 200, description = "The existing or newly created user", body = User),
        (status = 409, description = "The name or phone number belongs to someone else", body = String),
        (status = 422, description = "Request body is invalid", body = String)
    )
)]
pub(crate) async fn identify(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<IdentifySchema>,
) -> ServerResult<Json<User>> {
    let user = context.collab.identity.resolve_or_create(body.into()).await?;

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "users",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User),
        (status = 401, description = "Request refused because of missing identification", body = String)
    )
)]
pub(crate) async fn me(session: Session) -> Json<User> {
    Json(session.user().to_serialized())
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(identify))
        .route("/me", get(me))
}
