mod auth;
mod context;
mod docs;
mod errors;
mod schemas;
mod serialized;
mod songs;
mod sse;
mod videos;

use std::{
    env, io,
    net::{Ipv6Addr, SocketAddr},
    num::ParseIntError,
    sync::Arc,
};

use axum::routing::get;
use log::info;
use songvote_collab::Collab;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use context::ServerContext;
pub use errors::ServerError;
pub use sse::ServerEvent;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

pub type Router = axum::Router<ServerContext>;

/// Reads the port from `SONGVOTE_SERVER_PORT`, falling back to [DEFAULT_PORT]
pub fn server_port() -> Result<u16, ParseIntError> {
    env::var("SONGVOTE_SERVER_PORT")
        .map(|x| x.parse::<u16>())
        .unwrap_or(Ok(DEFAULT_PORT))
}

/// Builds the whole application, with all routes and layers
pub fn app(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let version_one_router = Router::new()
        .nest("/users", auth::router())
        .nest("/songs", songs::router())
        .nest("/videos", videos::router())
        .nest("/events", sse::router());

    Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context)
}

/// Starts the songvote server
pub async fn run_server(collab: Arc<Collab>, port: u16) -> io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();
    let context = ServerContext::new(collab);

    tokio::spawn(sse::forward_events(context.clone()));

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app(context).into_make_service()).await
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use songvote_collab::{Collab, MemoryDatabase, NoVideoLookup};
    use songvote_core::Config;
    use tower::ServiceExt;

    use super::*;

    fn test_app() -> axum::Router {
        let collab = Collab::with_video_lookup(
            Config::default(),
            Arc::new(MemoryDatabase::new()),
            Arc::new(NoVideoLookup),
        );

        app(ServerContext::new(Arc::new(collab)))
    }

    async fn send(
        app: &axum::Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }

    async fn identify(app: &axum::Router, name: &str) -> String {
        let (status, user) = send(
            app,
            Method::POST,
            "/v1/users",
            None,
            Some(json!({ "displayName": name })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        user["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_suggest_and_vote() {
        let app = test_app();
        let a = identify(&app, "A").await;
        let b = identify(&app, "B").await;

        let (status, song) = send(
            &app,
            Method::POST,
            "/v1/songs",
            Some(&a),
            Some(json!({
                "title": "Amazing Grace",
                "artist": "Traditional",
                "video": { "videoId": "dQw4w9WgXcQ" }
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(song["video"]["title"], "Amazing Grace");

        let votes_uri = format!("/v1/songs/{}/votes", song["id"].as_str().unwrap());

        let (status, first) = send(&app, Method::POST, &votes_uri, Some(&b), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["outcome"], "recorded");

        let (status, second) = send(&app, Method::POST, &votes_uri, Some(&b), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["outcome"], "already-voted");

        let (status, rankings) = send(&app, Method::GET, "/v1/songs", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rankings[0]["voteCount"], 1);
        assert_eq!(rankings[0]["voterIds"][0], b.as_str());

        let (status, me) = send(&app, Method::GET, "/v1/users/me", Some(&b), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["displayName"], "B");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = test_app();
        let a = identify(&app, "A").await;

        let new_song = json!({ "title": "Amazing Grace", "artist": "Traditional" });

        let (anonymous, _) = send(&app, Method::POST, "/v1/songs", None, Some(new_song.clone())).await;
        let (unknown_user, _) = send(
            &app,
            Method::POST,
            "/v1/songs",
            Some("6f1c7c1e-3d5b-4bb1-9f3e-0f4f4b1f2a10"),
            Some(new_song),
        )
        .await;
        let (blank, _) = send(
            &app,
            Method::POST,
            "/v1/songs",
            Some(&a),
            Some(json!({ "title": " ", "artist": "Traditional" })),
        )
        .await;
        let (bad_video, _) = send(
            &app,
            Method::POST,
            "/v1/songs",
            Some(&a),
            Some(json!({ "title": "X", "artist": "Y", "video": { "videoId": "short" } })),
        )
        .await;
        let (malformed_song, _) = send(&app, Method::POST, "/v1/songs/nope/votes", Some(&a), None).await;
        let (missing_song, _) = send(
            &app,
            Method::POST,
            "/v1/songs/6f1c7c1e-3d5b-4bb1-9f3e-0f4f4b1f2a10/votes",
            Some(&a),
            None,
        )
        .await;
        let (no_search, _) = send(&app, Method::GET, "/v1/videos?query=hymns", None, None).await;

        assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user, StatusCode::UNAUTHORIZED);
        assert_eq!(blank, StatusCode::BAD_REQUEST);
        assert_eq!(bad_video, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(malformed_song, StatusCode::BAD_REQUEST);
        assert_eq!(missing_song, StatusCode::NOT_FOUND);
        assert_eq!(no_search, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            send(&app, Method::GET, "/v1/songs", None, None).await.1,
            json!([])
        );
    }

    #[tokio::test]
    async fn test_identity_conflict() {
        let app = test_app();

        let body = |phone: &str| Some(json!({ "displayName": "Maria", "phone": phone }));

        let (first, _) = send(&app, Method::POST, "/v1/users", None, body("5551234567")).await;
        let (again, _) = send(&app, Method::POST, "/v1/users", None, body("555-123-4567")).await;
        let (other, _) = send(&app, Method::POST, "/v1/users", None, body("5559999999")).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(again, StatusCode::OK);
        assert_eq!(other, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_api_document() {
        let app = test_app();
        let (status, doc) = send(&app, Method::GET, "/api.json", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/v1/songs/{id}/votes"]["post"].is_object());
    }
}
