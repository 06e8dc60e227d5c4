use std::sync::Arc;

use log::{info, warn};
use songvote_core::{SongId, User, ValidationError, VoteOutcome};
use thiserror::Error;

use crate::{CollabContext, CollabEvent, Database, DatabaseError, ErrorKind};

/// Casts votes, at most once per user and song
pub struct VoteSubmission {
    context: CollabContext,
    db: Arc<dyn Database>,
}

#[derive(Debug, Error)]
pub enum VoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("You need to identify yourself before voting")]
    AuthRequired,
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("Could not store vote after {attempts} attempts: {source}")]
    Storage {
        attempts: u32,
        source: DatabaseError,
    },
}

impl VoteSubmission {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
            db: context.database.clone(),
        }
    }

    /// Makes sure the acting user's vote for the song is stored.
    ///
    /// Voting again is not an error and returns [VoteOutcome::AlreadyVoted], so the call
    /// is safe to repeat. Transient storage faults are retried with a fixed backoff.
    pub async fn cast(
        &self,
        song_id: &str,
        acting_user: Option<&User>,
    ) -> Result<VoteOutcome, VoteError> {
        let user = acting_user.ok_or(VoteError::AuthRequired)?;
        let song_id = SongId::parse(song_id)?;

        if user.id.is_none() {
            return Err(ValidationError::MalformedId(user.id.to_string()).into());
        }

        let attempts = self.context.config.vote_attempts.max(1);
        let mut attempt = 1;

        let outcome = loop {
            match self.db.insert_vote_if_absent(song_id, user.id).await {
                Ok(outcome) => break outcome,
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(
                        "Vote attempt {}/{} for song {} failed: {}",
                        attempt, attempts, song_id, e
                    );

                    attempt += 1;
                    tokio::time::sleep(self.context.config.vote_backoff()).await;
                }
                Err(e) => return Err(VoteError::from_database(e, attempt)),
            }
        };

        if !outcome.inserted {
            return Ok(VoteOutcome::AlreadyVoted);
        }

        info!("{} voted for song {}", user.display_name, song_id);

        self.context.emit(CollabEvent::VoteCast {
            song_id,
            user_id: user.id,
        });

        Ok(VoteOutcome::Recorded)
    }
}

impl VoteError {
    fn from_database(error: DatabaseError, attempts: u32) -> Self {
        match error {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            source => Self::Storage { attempts, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::AuthRequired => ErrorKind::AuthRequired,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage { .. } => ErrorKind::Storage,
        }
    }
}
