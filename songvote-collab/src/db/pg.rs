use std::time::Duration;

use async_trait::async_trait;
use log::{error, info, warn};
use songvote_core::{ChangeEvent, ChangeKind, ChangeTable, Song, SongId, User, UserId, Vote};
use sqlx::{
    postgres::{PgListener, PgPoolOptions},
    query, query_as, Error as SqlxError, PgPool,
};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    songs_from_rows, ChangeReceiver, ChangeSender, Database, DatabaseError, DatabaseResult,
    InsertOutcome, IntoDatabaseError, NewUser, Result, SongRow, UserRow, VoteRow,
    CHANGE_CAPACITY,
};

/// The channel the schema's triggers notify on
const CHANGE_CHANNEL: &str = "songvote_changes";
/// How long to wait before listening again after the listener fails
const LISTEN_RETRY_DELAY: Duration = Duration::from_secs(1);

const VOTES_SONG_FKEY: &str = "votes_song_id_fkey";
const VOTES_USER_FKEY: &str = "votes_user_id_fkey";

/// A postgres database implementation for songvote
pub struct PgDatabase {
    pool: PgPool,
    changes: ChangeSender,
}

impl PgDatabase {
    /// Connects, applies migrations, and starts listening for changes.
    /// Must be called from within a tokio runtime.
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| e.any())?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        tokio::spawn(listen_for_changes(pool.clone(), changes.clone()));

        Ok(Self { pool, changes })
    }

    async fn user_by_phone_or_name(&self, new_user: &NewUser) -> Result<()> {
        self.user_by_name(&new_user.display_name)
            .await
            .conflict_or_ok("user", "name", &new_user.display_name)?;

        if let Some(phone) = &new_user.phone {
            self.user_by_phone(phone)
                .await
                .conflict_or_ok("user", "phone", phone)?;
        }

        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn user_by_id(&self, user_id: UserId) -> Result<User> {
        query_as::<_, UserRow>("SELECT id, name, phone_number FROM users WHERE id = $1")
            .bind(user_id.value())
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("user", "id"))
    }

    async fn user_by_name(&self, name: &str) -> Result<User> {
        query_as::<_, UserRow>(
            "SELECT id, name, phone_number FROM users WHERE lower(name) = lower($1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("user", "name"))
    }

    async fn user_by_phone(&self, phone: &str) -> Result<User> {
        query_as::<_, UserRow>("SELECT id, name, phone_number FROM users WHERE phone_number = $1")
            .bind(phone)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("user", "phone"))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.user_by_phone_or_name(&new_user).await?;

        query_as::<_, UserRow>(
            "INSERT INTO users (id, name, phone_number) VALUES ($1, $2, $3)
            RETURNING id, name, phone_number",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.display_name)
        .bind(&new_user.phone)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| match e.constraint_violation() {
            // Someone else got there between the check and the insert
            Some(Violation::Unique) => DatabaseError::Conflict {
                resource: "user",
                field: "name or phone",
                value: new_user.display_name.clone(),
            },
            _ => e.any(),
        })
    }

    async fn insert_song(&self, song: Song) -> Result<Song> {
        let (video_id, video_title) = match &song.video {
            Some(video) => (
                Some(video.video_id.as_str().to_string()),
                Some(video.title.clone()),
            ),
            None => (None, None),
        };

        let row = query_as::<_, SongRow>(
            "
            INSERT INTO songs
                (id, title, artist, notes, youtube_video_id, youtube_title, suggested_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *",
        )
        .bind(song.id.value())
        .bind(&song.title)
        .bind(&song.artist)
        .bind(&song.notes)
        .bind(video_id)
        .bind(video_title)
        .bind(song.suggested_by.value())
        .bind(song.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.constraint_violation() {
            Some(Violation::ForeignKey) => DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            },
            Some(Violation::Unique) => DatabaseError::Conflict {
                resource: "song",
                field: "id",
                value: song.id.to_string(),
            },
            _ => e.any(),
        })?;

        row.try_into()
    }

    async fn song_by_id(&self, song_id: SongId) -> Result<Song> {
        query_as::<_, SongRow>("SELECT * FROM songs WHERE id = $1")
            .bind(song_id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("song", "id"))?
            .try_into()
    }

    async fn list_songs(&self) -> Result<Vec<Song>> {
        let rows = query_as::<_, SongRow>("SELECT * FROM songs ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        songs_from_rows(rows)
    }

    async fn insert_vote_if_absent(
        &self,
        song_id: SongId,
        user_id: UserId,
    ) -> Result<InsertOutcome> {
        // A single statement, so the unique constraint settles any race
        let inserted = query(
            "
            INSERT INTO votes (song_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (song_id, user_id) DO NOTHING
            RETURNING song_id",
        )
        .bind(song_id.value())
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            match e.foreign_key_constraint().as_deref().and_then(missing_vote_reference) {
                Some(error) => error,
                None => e.any(),
            }
        })?
        .is_some();

        Ok(InsertOutcome { inserted })
    }

    async fn list_votes_for_song(&self, song_id: SongId) -> Result<Vec<Vote>> {
        let rows = query_as::<_, VoteRow>(
            "SELECT song_id, user_id, created_at FROM votes WHERE song_id = $1 ORDER BY created_at",
        )
        .bind(song_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_votes(&self) -> Result<Vec<Vote>> {
        let rows = query_as::<_, VoteRow>("SELECT song_id, user_id, created_at FROM votes")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn subscribe(&self) -> ChangeReceiver {
        self.changes.subscribe()
    }
}

/// Forwards notifications from the schema's triggers to subscribers, until the pool closes.
async fn listen_for_changes(pool: PgPool, changes: ChangeSender) {
    while !pool.is_closed() {
        let mut listener = match PgListener::connect_with(&pool).await {
            Ok(listener) => listener,
            Err(e) => {
                warn!("Could not connect change listener: {}", e);
                tokio::time::sleep(LISTEN_RETRY_DELAY).await;
                continue;
            }
        };

        if let Err(e) = listener.listen(CHANGE_CHANNEL).await {
            warn!("Could not listen on {}: {}", CHANGE_CHANNEL, e);
            tokio::time::sleep(LISTEN_RETRY_DELAY).await;
            continue;
        }

        info!("Listening for changes on {}", CHANGE_CHANNEL);

        loop {
            match listener.recv().await {
                Ok(notification) => match ChangeEvent::from_payload(notification.payload()) {
                    Ok(event) => {
                        changes.send(event).ok();
                    }
                    Err(e) => warn!("Ignoring malformed change notification: {}", e),
                },
                Err(e) => {
                    error!("Change listener failed: {}", e);
                    break;
                }
            }
        }

        // Notifications may have been missed while disconnected
        changes
            .send(ChangeEvent::new(ChangeTable::Votes, ChangeKind::Update))
            .ok();
        tokio::time::sleep(LISTEN_RETRY_DELAY).await;
    }
}

/// Maps a violated foreign key of the votes table to what is missing
fn missing_vote_reference(constraint: &str) -> Option<DatabaseError> {
    let resource = match constraint {
        VOTES_SONG_FKEY => "song",
        VOTES_USER_FKEY => "user",
        _ => return None,
    };

    Some(DatabaseError::NotFound {
        resource,
        identifier: "id",
    })
}

/// Constraint violations that carry meaning for callers
enum Violation {
    Unique,
    ForeignKey,
}

trait ConstraintExt {
    fn constraint_violation(&self) -> Option<Violation>;
    /// Returns the name of the violated foreign key constraint, if that's what happened
    fn foreign_key_constraint(&self) -> Option<String>;
}

impl ConstraintExt for SqlxError {
    fn constraint_violation(&self) -> Option<Violation> {
        let error = self.as_database_error()?;

        if error.is_unique_violation() {
            Some(Violation::Unique)
        } else if error.is_foreign_key_violation() {
            Some(Violation::ForeignKey)
        } else {
            None
        }
    }

    fn foreign_key_constraint(&self) -> Option<String> {
        let error = self.as_database_error()?;

        if error.is_foreign_key_violation() {
            Some(error.constraint().unwrap_or_default().to_string())
        } else {
            None
        }
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_vote_reference() {
        assert!(matches!(
            missing_vote_reference("votes_song_id_fkey"),
            Some(DatabaseError::NotFound { resource: "song", .. })
        ));
        assert!(matches!(
            missing_vote_reference("votes_user_id_fkey"),
            Some(DatabaseError::NotFound { resource: "user", .. })
        ));
        assert!(missing_vote_reference("songs_suggested_by_fkey").is_none());
    }

    #[test]
    fn test_constraint_names_match_migration() {
        let migration = include_str!("../../migrations/20240301000000_initial.sql");

        assert!(migration.contains(VOTES_SONG_FKEY));
        assert!(migration.contains(VOTES_USER_FKEY));
    }
}
