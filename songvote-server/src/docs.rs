use std::borrow::BorrowMut;

use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{auth, schemas, serialized, songs, sse, videos};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::identify,
        auth::me,
        songs::list_songs,
        songs::song,
        songs::submit_song,
        songs::cast_vote,
        videos::search_videos,
        sse::event_stream,
    ),
    components(schemas(
        schemas::IdentifySchema,
        schemas::NewSongSchema,
        schemas::VideoSchema,
        serialized::User,
        serialized::Song,
        serialized::Video,
        serialized::RankedSong,
        serialized::VoteResult,
        serialized::Outcome,
        serialized::VideoCandidate,
        sse::ServerEvent,
    )),
    modifiers(&Security),
    info(
        description = "songvote-server exposes endpoints to suggest songs, vote for them, and follow the rankings"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.borrow_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <user id>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
