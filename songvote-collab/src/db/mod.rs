use async_trait::async_trait;
use songvote_core::{ChangeEvent, Song, SongId, User, UserId, Vote};
use thiserror::Error;
use tokio::sync::broadcast;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

pub type ChangeSender = broadcast::Sender<ChangeEvent>;
pub type ChangeReceiver = broadcast::Receiver<ChangeEvent>;

/// How many change events can be buffered for a slow subscriber
pub(crate) const CHANGE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

impl DatabaseError {
    /// Internal errors are infrastructure faults, so trying again may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// The result of an insert that is skipped when the row already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: bool,
}

/// Represents a type that stores users, the song catalog, and the vote ledger.
///
/// Implementations must enforce that only one vote exists per song and user,
/// atomically, without relying on callers to check first.
#[async_trait]
pub trait Database: Send + Sync {
    async fn user_by_id(&self, user_id: UserId) -> Result<User>;
    /// Names are matched case-insensitively
    async fn user_by_name(&self, name: &str) -> Result<User>;
    async fn user_by_phone(&self, phone: &str) -> Result<User>;
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    async fn insert_song(&self, song: Song) -> Result<Song>;
    async fn song_by_id(&self, song_id: SongId) -> Result<Song>;
    async fn list_songs(&self) -> Result<Vec<Song>>;

    /// Stores a vote unless one already exists for the pair.
    /// Fails with [DatabaseError::NotFound] if the song doesn't exist.
    async fn insert_vote_if_absent(
        &self,
        song_id: SongId,
        user_id: UserId,
    ) -> Result<InsertOutcome>;
    async fn list_votes_for_song(&self, song_id: SongId) -> Result<Vec<Vote>>;
    async fn list_votes(&self) -> Result<Vec<Vote>>;

    /// Subscribes to changes made to the stored data, by anyone
    fn subscribe(&self) -> ChangeReceiver;
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub display_name: String,
    pub phone: Option<String>,
}
