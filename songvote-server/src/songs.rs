use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json,
};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{NewSongSchema, ValidatedJson},
    serialized::{RankedSong, Song, ToSerialized, VoteResult},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/songs",
    tag = "songs",
    responses(
        (status = 200, description = "All songs, ranked by votes", body = Vec<RankedSong>)
    )
)]
pub(crate) async fn list_songs(
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<RankedSong>>> {
    let rankings = context.collab.rankings().await?;

    Ok(Json(rankings.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/songs/{id}",
    tag = "songs",
    params(
        ("id" = String, Path, description = "Id of the song")
    ),
    responses(
        (status = 200, body = RankedSong),
        (status = 404, body = String)
    )
)]
pub(crate) async fn song(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<RankedSong>> {
    let song = context.collab.ranked_song(&id).await?;

    Ok(Json(song.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/songs",
    tag = "songs",
    request_body = NewSongSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The stored suggestion", body = Song),
        (status = 400, description = "The suggestion is invalid", body = String)
    )
)]
pub(crate) async fn submit_song(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewSongSchema>,
) -> ServerResult<Json<Song>> {
    let song = context
        .collab
        .songs
        .submit(body.into(), Some(session.user()))
        .await?;

    Ok(Json(song.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/songs/{id}/votes",
    tag = "songs",
    params(
        ("id" = String, Path, description = "Id of the song to vote for")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The vote is recorded, now or earlier", body = VoteResult),
        (status = 404, description = "The song does not exist", body = String),
        (status = 503, description = "The vote could not be stored", body = String)
    )
)]
pub(crate) async fn cast_vote(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<VoteResult>> {
    let outcome = context.collab.votes.cast(&id, Some(session.user())).await?;

    Ok(Json(outcome.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_songs).post(submit_song))
        .route("/:id", get(song))
        .route("/:id/votes", post(cast_vote))
}
