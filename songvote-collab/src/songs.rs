use std::sync::Arc;

use log::info;
use songvote_core::{Song, SongInput, User, ValidationError};
use thiserror::Error;

use crate::{CollabContext, CollabEvent, Database, DatabaseError, ErrorKind};

/// Validates and stores new song suggestions
pub struct SongSubmission {
    context: CollabContext,
    db: Arc<dyn Database>,
}

#[derive(Debug, Error)]
pub enum SongError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("You need to identify yourself before suggesting songs")]
    AuthRequired,
    #[error(transparent)]
    Db(DatabaseError),
}

impl SongSubmission {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
            db: context.database.clone(),
        }
    }

    /// Stores a new suggestion by the acting user.
    ///
    /// Nothing is written if the input is invalid. Storage failures are not retried,
    /// since a blind retry could store the same suggestion twice.
    pub async fn submit(
        &self,
        input: SongInput,
        acting_user: Option<&User>,
    ) -> Result<Song, SongError> {
        let user = acting_user.ok_or(SongError::AuthRequired)?;
        let new_song = input.validate()?;

        let song = self
            .db
            .insert_song(new_song.into_song(user.id))
            .await
            .map_err(SongError::Db)?;

        info!(
            "{} suggested \"{}\" by {} ({})",
            user.display_name, song.title, song.artist, song.id
        );

        self.context.emit(CollabEvent::SongSubmitted { song: song.clone() });
        Ok(song)
    }
}

impl SongError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::AuthRequired => ErrorKind::AuthRequired,
            Self::Db(e) => e.into(),
        }
    }
}
