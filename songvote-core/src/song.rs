use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    optional_text, required_text, Id, UserId, ValidationError, VIDEO_ID_REGEX,
};

pub type SongId = Id<Song>;

/// A song suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub notes: Option<String>,
    /// A video the suggester picked to go along with the song
    pub video: Option<VideoRef>,
    /// The user that suggested the song
    pub suggested_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// A reference to a video on the external video platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    pub video_id: VideoId,
    pub title: String,
}

/// A video id that is known to have the right shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

/// Song content as submitted by a user, before any validation.
#[derive(Debug, Clone, Default)]
pub struct SongInput {
    pub title: String,
    pub artist: String,
    pub notes: Option<String>,
    pub video: Option<VideoInput>,
}

#[derive(Debug, Clone, Default)]
pub struct VideoInput {
    pub video_id: String,
    pub title: String,
}

/// Validated song content, ready to become a [Song].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub notes: Option<String>,
    pub video: Option<VideoRef>,
}

impl VideoId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();

        if VIDEO_ID_REGEX.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ValidationError::MalformedVideoId(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical watch url of the video
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(value: VideoId) -> Self {
        value.0
    }
}

impl SongInput {
    /// Validates and normalizes the input.
    ///
    /// Title and artist are trimmed and must not be empty, blank notes are dropped,
    /// and the video id must match the platform's id shape.
    pub fn validate(&self) -> Result<NewSong, ValidationError> {
        let title = required_text("title", &self.title)?;
        let artist = required_text("artist", &self.artist)?;
        let notes = optional_text(self.notes.as_deref());

        let video = match &self.video {
            Some(input) => Some(VideoRef {
                video_id: VideoId::parse(&input.video_id)?,
                title: optional_text(Some(&input.title)).unwrap_or_else(|| title.clone()),
            }),
            None => None,
        };

        Ok(NewSong {
            title,
            artist,
            notes,
            video,
        })
    }
}

impl NewSong {
    /// Assigns an id and creation time, producing the record to store.
    pub fn into_song(self, suggested_by: UserId) -> Song {
        Song {
            id: SongId::new(),
            title: self.title,
            artist: self.artist,
            notes: self.notes,
            video: self.video,
            suggested_by,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn input(title: &str, artist: &str) -> SongInput {
        SongInput {
            title: title.to_string(),
            artist: artist.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_video_id() {
        assert!(VideoId::parse("dQw4w9WgXcQ").is_ok());
        assert!(VideoId::parse("-t-75CCdM2o").is_ok());
        assert!(VideoId::parse("z09GolEk_Uw").is_ok());

        assert!(VideoId::parse("dQw4w9WgXc").is_err(), "too short");
        assert!(VideoId::parse("dQw4w9WgXcQQ").is_err(), "too long");
        assert!(VideoId::parse("dQw4w9WgX!Q").is_err(), "bad character");
        assert!(VideoId::parse("").is_err());
    }

    #[test]
    fn test_validate() {
        let valid = input("  Amazing Grace ", " Traditional")
            .validate()
            .expect("is valid");

        assert_eq!(valid.title, "Amazing Grace");
        assert_eq!(valid.artist, "Traditional");
        assert_eq!(valid.notes, None);

        assert_eq!(
            input("", "X").validate(),
            Err(ValidationError::EmptyField("title"))
        );
        assert_eq!(
            input("Oceans", "   ").validate(),
            Err(ValidationError::EmptyField("artist"))
        );
    }

    #[test]
    fn test_validate_video() {
        let mut with_video = input("Oceans", "Hillsong");
        with_video.video = Some(VideoInput {
            video_id: "dy9nwe9_xzw".to_string(),
            title: "  ".to_string(),
        });

        let valid = with_video.validate().expect("is valid");
        let video = valid.video.expect("has video");

        assert_eq!(video.video_id.as_str(), "dy9nwe9_xzw");
        assert_eq!(video.title, "Oceans", "blank video titles fall back to the song title");

        with_video.video = Some(VideoInput {
            video_id: "not a video".to_string(),
            title: "Oceans (Live)".to_string(),
        });

        assert_eq!(
            with_video.validate(),
            Err(ValidationError::MalformedVideoId("not a video".to_string()))
        );
    }

    #[test]
    fn test_video_id_deserialize_is_validated() {
        let ok: Result<VideoRef, _> =
            serde_json::from_str(r#"{"videoId":"dQw4w9WgXcQ","title":"x"}"#);
        let bad: Result<VideoRef, _> = serde_json::from_str(r#"{"videoId":"nope","title":"x"}"#);

        assert!(ok.is_ok());
        assert!(bad.is_err());
    }
}
