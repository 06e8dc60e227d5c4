use std::sync::Arc;

use log::info;
use songvote_core::{normalize_phone, required_text, User, UserId, ValidationError};
use thiserror::Error;

use crate::{Database, DatabaseError, ErrorKind, NewUser};

/// Resolves names and phone numbers to users. This identifies people, it does not secure anything.
pub struct Identity {
    db: Arc<dyn Database>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The name or phone number belongs to someone else
    #[error("The {field} \"{value}\" is already taken by someone else")]
    Conflict { field: &'static str, value: String },
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
}

/// What a person identifies themselves with
#[derive(Debug, Clone, Default)]
pub struct Identification {
    pub display_name: String,
    pub phone: Option<String>,
}

impl Identity {
    pub fn new(db: &Arc<dyn Database>) -> Self {
        Self { db: db.clone() }
    }

    /// Returns the user matching the identification, creating one if nobody matches.
    ///
    /// Fails with [IdentityError::Conflict] if the name is bound to a different phone number,
    /// or the phone number is bound to a different name.
    pub async fn resolve_or_create(
        &self,
        identification: Identification,
    ) -> Result<User, IdentityError> {
        let display_name = required_text("display name", &identification.display_name)?;
        let phone = normalize_phone(identification.phone.as_deref())?;

        if let Some(user) = self.resolve_existing(&display_name, phone.as_deref()).await? {
            return Ok(user);
        }

        let created = self
            .db
            .create_user(NewUser {
                display_name: display_name.clone(),
                phone: phone.clone(),
            })
            .await;

        match created {
            Ok(user) => {
                info!("New user {} ({})", user.display_name, user.id);
                Ok(user)
            }
            // Someone registered the same name or phone in the meantime
            Err(DatabaseError::Conflict { .. }) => self
                .resolve_existing(&display_name, phone.as_deref())
                .await?
                .ok_or(IdentityError::Conflict {
                    field: "name",
                    value: display_name,
                }),
            Err(e) => Err(IdentityError::Db(e)),
        }
    }

    /// Returns a user by id, if it exists
    pub async fn user(&self, user_id: UserId) -> Result<User, DatabaseError> {
        self.db.user_by_id(user_id).await
    }

    async fn resolve_existing(
        &self,
        display_name: &str,
        phone: Option<&str>,
    ) -> Result<Option<User>, IdentityError> {
        let by_name = self.db.user_by_name(display_name).await;

        match by_name {
            Ok(user) => match (&user.phone, phone) {
                (Some(stored), Some(given)) if stored != given => Err(IdentityError::Conflict {
                    field: "name",
                    value: display_name.to_string(),
                }),
                (None, Some(given)) => {
                    self.ensure_phone_unbound(given, Some(user.id)).await?;
                    Ok(Some(user))
                }
                _ => Ok(Some(user)),
            },
            Err(DatabaseError::NotFound { .. }) => {
                if let Some(given) = phone {
                    self.ensure_phone_unbound(given, None).await?;
                }

                Ok(None)
            }
            Err(e) => Err(IdentityError::Db(e)),
        }
    }

    /// Fails if the phone number belongs to anyone other than `owner`
    async fn ensure_phone_unbound(
        &self,
        phone: &str,
        owner: Option<UserId>,
    ) -> Result<(), IdentityError> {
        match self.db.user_by_phone(phone).await {
            Ok(user) if Some(user.id) != owner => Err(IdentityError::Conflict {
                field: "phone number",
                value: phone.to_string(),
            }),
            Ok(_) | Err(DatabaseError::NotFound { .. }) => Ok(()),
            Err(e) => Err(IdentityError::Db(e)),
        }
    }
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Db(e) => e.into(),
        }
    }
}
