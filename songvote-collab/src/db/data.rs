//! Row types as stored in the database, and their conversion into domain types.
//! Rows are normalized here once, so nothing else has to deal with storage quirks.

use chrono::{DateTime, Utc};
use songvote_core::{Song, SongId, User, UserId, VideoId, VideoRef, Vote};
use sqlx::FromRow;
use uuid::Uuid;

use super::DatabaseError;

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct SongRow {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub notes: Option<String>,
    pub youtube_video_id: Option<String>,
    pub youtube_title: Option<String>,
    pub suggested_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct VoteRow {
    pub song_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            display_name: row.name,
            phone: row.phone_number,
        }
    }
}

impl TryFrom<SongRow> for Song {
    type Error = DatabaseError;

    fn try_from(row: SongRow) -> Result<Self, Self::Error> {
        let video = match row.youtube_video_id {
            Some(video_id) => Some(VideoRef {
                video_id: VideoId::parse(&video_id)
                    .map_err(|e| DatabaseError::Internal(Box::new(e)))?,
                title: row.youtube_title.unwrap_or_else(|| row.title.clone()),
            }),
            None => None,
        };

        Ok(Song {
            id: SongId::from_uuid(row.id),
            title: row.title,
            artist: row.artist,
            notes: row.notes,
            video,
            suggested_by: UserId::from_uuid(row.suggested_by),
            created_at: row.created_at,
        })
    }
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Vote {
            song_id: SongId::from_uuid(row.song_id),
            user_id: UserId::from_uuid(row.user_id),
            created_at: row.created_at,
        }
    }
}

/// Converts a list of song rows, failing on the first malformed one
pub fn songs_from_rows(rows: Vec<SongRow>) -> Result<Vec<Song>, DatabaseError> {
    rows.into_iter().map(Song::try_from).collect()
}
