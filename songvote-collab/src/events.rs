use crossbeam::channel::{Receiver, Sender};
use songvote_core::{RankedSong, Song, SongId, UserId};

pub type EventSender = Sender<CollabEvent>;
pub type EventReceiver = Receiver<CollabEvent>;

/// Events emitted by the collab system, for the outside world to react to.
#[derive(Debug, Clone)]
pub enum CollabEvent {
    /// A new song was suggested
    SongSubmitted { song: Song },
    /// A user voted for a song for the first time
    VoteCast { song_id: SongId, user_id: UserId },
    /// Rankings were recomputed after the stored data changed
    RankingsUpdate { rankings: Vec<RankedSong> },
}
