use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    routing::get,
};
use futures_util::Stream;
use log::{error, info};
use parking_lot::Mutex;
use serde::Serialize;
use songvote_collab::CollabEvent;
use songvote_core::Id;
use std::{
    collections::VecDeque,
    convert::Infallible,
    pin::Pin,
    sync::{Arc, Weak},
    task::{Context, Poll, Waker},
};
use utoipa::ToSchema;

use crate::{
    context::ServerContext,
    serialized::{RankedSong, Song, ToSerialized},
    Router,
};

type ConnectionId = Id<Connection>;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ServerEvent {
    /// A new song was suggested
    SongSubmitted { song: Song },
    /// A user voted for a song
    VoteCast {
        #[serde(rename = "songId")]
        song_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// The rankings changed
    RankingsUpdate { rankings: Vec<RankedSong> },
}

impl From<CollabEvent> for ServerEvent {
    fn from(value: CollabEvent) -> Self {
        match value {
            CollabEvent::SongSubmitted { song } => Self::SongSubmitted {
                song: song.to_serialized(),
            },
            CollabEvent::VoteCast { song_id, user_id } => Self::VoteCast {
                song_id: song_id.to_string(),
                user_id: user_id.to_string(),
            },
            CollabEvent::RankingsUpdate { rankings } => Self::RankingsUpdate {
                rankings: rankings.to_serialized(),
            },
        }
    }
}

/// Manages server sent event connections
pub struct ServerSentEvents {
    me: Weak<Self>,
    connections: Mutex<Vec<Connection>>,
}

struct Connection {
    id: ConnectionId,
    pending_messages: Arc<Mutex<VecDeque<ServerEvent>>>,
    waker: Arc<Mutex<Option<Waker>>>,
}

pub struct ConnectionHandle {
    id: ConnectionId,
    /// A reference to [Connection]'s pending messages
    pending_messages: Arc<Mutex<VecDeque<ServerEvent>>>,
    /// A reference to [Connection]'s stored [Waker]
    waker: Arc<Mutex<Option<Waker>>>,
    /// Required to remove connection when dropped
    manager: Weak<ServerSentEvents>,
}

impl ServerSentEvents {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            connections: Default::default(),
        })
    }

    pub fn broadcast(&self, event: ServerEvent) {
        let connections = self.connections.lock();

        for connection in connections.iter() {
            connection.send(event.clone())
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    fn connect(&self) -> ConnectionHandle {
        let connection = Connection::new();
        let handle = connection.handle(self.me.clone());

        self.connections.lock().push(connection);
        handle
    }

    fn disconnect(&self, id: ConnectionId) {
        self.connections.lock().retain(|c| c.id != id)
    }
}

impl Connection {
    fn new() -> Self {
        Self {
            id: ConnectionId::new(),
            pending_messages: Default::default(),
            waker: Default::default(),
        }
    }

    fn send(&self, message: ServerEvent) {
        self.pending_messages.lock().push_back(message);

        if let Some(waker) = self.waker.lock().take() {
            waker.wake()
        }
    }

    fn handle(&self, manager: Weak<ServerSentEvents>) -> ConnectionHandle {
        ConnectionHandle {
            id: self.id,
            pending_messages: self.pending_messages.clone(),
            waker: self.waker.clone(),
            manager,
        }
    }
}

impl Stream for ConnectionHandle {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut pending_messages = self.pending_messages.lock();

        while let Some(message) = pending_messages.pop_front() {
            match Event::default().json_data(&message) {
                Ok(event) => return Poll::Ready(Some(Ok(event))),
                Err(e) => error!("Could not serialize event: {}", e),
            }
        }

        // Stored before unlocking, so a send in between still wakes this stream
        *self.waker.lock() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.disconnect(self.id)
        }
    }
}

/// Forwards collab events to all connections, until no more events can arrive
pub async fn forward_events(context: ServerContext) {
    while let Some(event) = context.collab.wait_for_event().await {
        context.sse.broadcast(event.into());
    }

    info!("Event forwarding stopped");
}

#[utoipa::path(
    get,
    path = "/v1/events",
    tag = "events",
    responses(
        (
            status = 200,
            content_type = "text/event-stream",
            description = "A stream of song and ranking events",
            body = ServerEvent
        )
    )
)]
pub(crate) async fn event_stream(State(context): State<ServerContext>) -> Sse<ConnectionHandle> {
    Sse::new(context.sse.connect()).keep_alive(KeepAlive::default())
}

pub fn router() -> Router {
    Router::new().route("/", get(event_stream))
}

#[cfg(test)]
mod test {
    use futures_util::StreamExt;

    use super::*;

    fn vote(n: u8) -> ServerEvent {
        ServerEvent::VoteCast {
            song_id: format!("song-{}", n),
            user_id: "user".to_string(),
        }
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let sse = ServerSentEvents::new();
        let mut handle = sse.connect();

        sse.broadcast(vote(1));
        sse.broadcast(vote(2));

        let first = handle.pending_messages.lock().front().cloned().unwrap();
        assert_eq!(serde_json::to_value(first).unwrap()["songId"], "song-1");

        assert!(handle.next().await.is_some());
        assert!(handle.next().await.is_some());

        let pending = handle.pending_messages.lock().len();
        assert_eq!(pending, 0);
    }

    #[test]
    fn test_disconnects_on_drop() {
        let sse = ServerSentEvents::new();
        let handle = sse.connect();

        assert_eq!(sse.connection_count(), 1);
        drop(handle);
        assert_eq!(sse.connection_count(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(vote(1)).unwrap();

        assert_eq!(json["type"], "vote-cast");
        assert_eq!(json["songId"], "song-1");
    }
}
