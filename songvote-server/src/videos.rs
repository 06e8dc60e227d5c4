use axum::{
    extract::{Query, State},
    routing::get,
    Json,
};

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::VideoSearchQuery,
    serialized::{ToSerialized, VideoCandidate},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/videos",
    tag = "videos",
    params(VideoSearchQuery),
    responses(
        (status = 200, description = "Videos matching the query", body = Vec<VideoCandidate>),
        (status = 503, description = "Video search is unavailable", body = String)
    )
)]
pub(crate) async fn search_videos(
    State(context): State<ServerContext>,
    Query(params): Query<VideoSearchQuery>,
) -> ServerResult<Json<Vec<VideoCandidate>>> {
    let candidates = context.collab.videos.search(&params.query).await?;

    Ok(Json(candidates.to_serialized()))
}

pub fn router() -> Router {
    Router::new().route("/", get(search_videos))
}
