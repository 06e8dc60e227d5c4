use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use songvote_collab::Identification;
use songvote_core::{SongInput, VideoInput};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdentifySchema {
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSongSchema {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub artist: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(nested)]
    pub video: Option<VideoSchema>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VideoSchema {
    /// The 11 character id of the video
    #[validate(length(equal = 11))]
    pub video_id: String,
    /// Falls back to the song title if absent
    #[validate(length(max = 200))]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VideoSearchQuery {
    /// Keywords, or a link to a YouTube video
    pub query: String,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ServerError::Invalid(format!("JSON parse failed: {}", e.body_text())))?;

        extracted_json
            .0
            .validate()
            .map_err(|e| ServerError::InvalidBody(e.to_string()))?;

        Ok(Self(extracted_json.0))
    }
}

impl From<IdentifySchema> for Identification {
    fn from(value: IdentifySchema) -> Self {
        Self {
            display_name: value.display_name,
            phone: value.phone,
        }
    }
}

impl From<NewSongSchema> for SongInput {
    fn from(value: NewSongSchema) -> Self {
        Self {
            title: value.title,
            artist: value.artist,
            notes: value.notes,
            video: value.video.map(|v| VideoInput {
                video_id: v.video_id,
                title: v.title.unwrap_or_default(),
            }),
        }
    }
}
