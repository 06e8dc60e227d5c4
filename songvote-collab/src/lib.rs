mod db;
mod errors;
mod events;
mod identity;
mod lookup;
mod refresh;
mod songs;
mod util;
mod votes;

use std::sync::Arc;

use crossbeam::channel::unbounded;
pub use db::*;
pub use errors::*;
pub use events::*;
pub use identity::*;
pub use lookup::*;
pub use refresh::*;
pub use songs::*;
pub use votes::*;

use songvote_core::{compute_rankings, Config, RankedSong, SongId};
use tokio::task::{spawn_blocking, JoinHandle};

/// The songvote collab system, tying identity, songs, votes, and rankings together.
pub struct Collab {
    context: CollabContext,
    event_receiver: EventReceiver,

    pub identity: Identity,
    pub songs: SongSubmission,
    pub votes: VoteSubmission,
    pub videos: Arc<dyn VideoLookup>,
}

/// A type passed to various components of the collab system, to access state and emit events.
#[derive(Clone)]
pub struct CollabContext {
    pub config: Arc<Config>,
    pub database: Arc<dyn Database>,
    event_sender: EventSender,
}

impl Collab {
    /// Creates the collab system, searching videos on YouTube
    pub fn new(config: Config, database: Arc<dyn Database>) -> Self {
        let videos = Arc::new(YouTubeLookup::new(&config));
        Self::with_video_lookup(config, database, videos)
    }

    pub fn with_video_lookup(
        config: Config,
        database: Arc<dyn Database>,
        videos: Arc<dyn VideoLookup>,
    ) -> Self {
        let (event_sender, event_receiver) = unbounded();

        let context = CollabContext {
            config: Arc::new(config),
            database,
            event_sender,
        };

        Self {
            identity: Identity::new(&context.database),
            songs: SongSubmission::new(&context),
            votes: VoteSubmission::new(&context),
            videos,
            event_receiver,
            context,
        }
    }

    /// Reads all songs and votes and ranks them
    pub async fn rankings(&self) -> Result<Vec<RankedSong>> {
        self.context.rankings().await
    }

    /// Returns a single song with its votes
    pub async fn ranked_song(&self, song_id: &str) -> std::result::Result<RankedSong, SongError> {
        let song_id: SongId = song_id.parse()?;

        let (song, votes) = tokio::try_join!(
            self.context.database.song_by_id(song_id),
            self.context.database.list_votes_for_song(song_id)
        )
        .map_err(SongError::Db)?;

        compute_rankings(&[song], &votes)
            .into_iter()
            .next()
            .ok_or(SongError::Db(DatabaseError::NotFound {
                resource: "song",
                identifier: "id",
            }))
    }

    /// Starts refreshing rankings whenever the stored data changes.
    /// Must be called from within a tokio runtime.
    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        let receiver = self.context.database.subscribe();
        tokio::spawn(refresh_rankings(self.context.clone(), receiver))
    }

    /// Waits for the next event, returning [None] when no more can arrive
    pub async fn wait_for_event(&self) -> Option<CollabEvent> {
        let receiver = self.event_receiver.clone();

        spawn_blocking(move || receiver.recv().ok())
            .await
            .ok()
            .flatten()
    }
}

impl CollabContext {
    pub fn emit(&self, event: CollabEvent) {
        // Collab holds the receiver for as long as anything can emit
        self.event_sender.send(event).ok();
    }

    pub async fn rankings(&self) -> Result<Vec<RankedSong>> {
        let (songs, votes) =
            tokio::try_join!(self.database.list_songs(), self.database.list_votes())?;

        Ok(compute_rankings(&songs, &votes))
    }
}
