use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SongId, UserId};

/// A single vote. Only one can exist for each song and user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub song_id: SongId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// The successful result of casting a vote.
///
/// Both variants mean the user's vote is recorded, so callers should treat them the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoteOutcome {
    /// A new vote was stored
    Recorded,
    /// The vote already existed
    AlreadyVoted,
}

impl VoteOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Recorded)
    }
}
