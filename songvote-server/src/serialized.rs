//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use serde::Serialize;
use songvote_collab::VideoCandidate as CollabVideoCandidate;
use songvote_core::{
    RankedSong as CoreRankedSong, Song as CoreSong, User as CoreUser, VoteOutcome,
};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Also the bearer token that identifies the user
    id: String,
    display_name: String,
    phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    id: String,
    title: String,
    artist: String,
    notes: Option<String>,
    video: Option<Video>,
    suggested_by: String,
    /// RFC 3339 timestamp
    created_at: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    video_id: String,
    title: String,
    url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedSong {
    song: Song,
    vote_count: usize,
    voter_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    outcome: Outcome,
}

/// Both outcomes mean the vote is recorded
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Recorded,
    AlreadyVoted,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoCandidate {
    id: String,
    title: String,
    channel_title: String,
    thumbnail_url: Option<String>,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for CoreUser {
    fn to_serialized(&self) -> User {
        User {
            id: self.id.to_string(),
            display_name: self.display_name.clone(),
            phone: self.phone.clone(),
        }
    }
}

impl ToSerialized<Song> for CoreSong {
    fn to_serialized(&self) -> Song {
        Song {
            id: self.id.to_string(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            notes: self.notes.clone(),
            video: self.video.as_ref().map(|v| Video {
                video_id: v.video_id.to_string(),
                title: v.title.clone(),
                url: v.video_id.url(),
            }),
            suggested_by: self.suggested_by.to_string(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

impl ToSerialized<RankedSong> for CoreRankedSong {
    fn to_serialized(&self) -> RankedSong {
        RankedSong {
            song: self.song.to_serialized(),
            vote_count: self.vote_count,
            voter_ids: self.voter_ids.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ToSerialized<VoteResult> for VoteOutcome {
    fn to_serialized(&self) -> VoteResult {
        let outcome = match self {
            VoteOutcome::Recorded => Outcome::Recorded,
            VoteOutcome::AlreadyVoted => Outcome::AlreadyVoted,
        };

        VoteResult { outcome }
    }
}

impl ToSerialized<VideoCandidate> for CollabVideoCandidate {
    fn to_serialized(&self) -> VideoCandidate {
        VideoCandidate {
            id: self.id.clone(),
            title: self.title.clone(),
            channel_title: self.channel_title.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
        }
    }
}
