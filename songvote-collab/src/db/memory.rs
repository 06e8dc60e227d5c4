use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::Mutex;
use songvote_core::{ChangeEvent, ChangeKind, ChangeTable, Song, SongId, User, UserId, Vote};
use tokio::sync::broadcast;

use crate::{
    ChangeReceiver, ChangeSender, Database, DatabaseError, DatabaseResult, InsertOutcome,
    NewUser, Result, CHANGE_CAPACITY,
};

/// A database that lives in memory, for tests and trying things out.
/// Constraints are enforced the same way the postgres schema does.
pub struct MemoryDatabase {
    users: DashMap<UserId, User>,
    songs: DashMap<SongId, Song>,
    votes: DashMap<(SongId, UserId), Vote>,
    /// Held while creating users, since name and phone must be unique together
    user_creation: Mutex<()>,
    changes: ChangeSender,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        Self {
            users: Default::default(),
            songs: Default::default(),
            votes: Default::default(),
            user_creation: Default::default(),
            changes,
        }
    }

    fn notify(&self, table: ChangeTable, kind: ChangeKind) {
        // Nobody listening is fine
        self.changes.send(ChangeEvent::new(table, kind)).ok();
    }

    fn find_user<F>(&self, predicate: F) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        self.users
            .iter()
            .find(|u| predicate(u.value()))
            .map(|u| u.value().clone())
    }

    fn by_name(&self, name: &str) -> Result<User> {
        let name = name.to_lowercase();

        self.find_user(|u| u.display_name.to_lowercase() == name)
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "name",
            })
    }

    fn by_phone(&self, phone: &str) -> Result<User> {
        self.find_user(|u| u.phone.as_deref() == Some(phone))
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "phone",
            })
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_by_id(&self, user_id: UserId) -> Result<User> {
        self.users
            .get(&user_id)
            .map(|u| u.value().clone())
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })
    }

    async fn user_by_name(&self, name: &str) -> Result<User> {
        self.by_name(name)
    }

    async fn user_by_phone(&self, phone: &str) -> Result<User> {
        self.by_phone(phone)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let _guard = self.user_creation.lock();

        self.by_name(&new_user.display_name)
            .conflict_or_ok("user", "name", &new_user.display_name)?;

        if let Some(phone) = &new_user.phone {
            self.by_phone(phone).conflict_or_ok("user", "phone", phone)?;
        }

        let user = User {
            id: UserId::new(),
            display_name: new_user.display_name,
            phone: new_user.phone,
        };

        self.users.insert(user.id, user.clone());
        self.notify(ChangeTable::Users, ChangeKind::Insert);

        Ok(user)
    }

    async fn insert_song(&self, song: Song) -> Result<Song> {
        match self.songs.entry(song.id) {
            Entry::Occupied(_) => {
                return Err(DatabaseError::Conflict {
                    resource: "song",
                    field: "id",
                    value: song.id.to_string(),
                })
            }
            Entry::Vacant(entry) => {
                entry.insert(song.clone());
            }
        }

        self.notify(ChangeTable::Songs, ChangeKind::Insert);
        Ok(song)
    }

    async fn song_by_id(&self, song_id: SongId) -> Result<Song> {
        self.songs
            .get(&song_id)
            .map(|s| s.value().clone())
            .ok_or(DatabaseError::NotFound {
                resource: "song",
                identifier: "id",
            })
    }

    async fn list_songs(&self) -> Result<Vec<Song>> {
        Ok(self.songs.iter().map(|s| s.value().clone()).collect())
    }

    async fn insert_vote_if_absent(
        &self,
        song_id: SongId,
        user_id: UserId,
    ) -> Result<InsertOutcome> {
        // Songs and users are never deleted, so checking first can't race with the insert
        if !self.songs.contains_key(&song_id) {
            return Err(DatabaseError::NotFound {
                resource: "song",
                identifier: "id",
            });
        }

        if !self.users.contains_key(&user_id) {
            return Err(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            });
        }

        let inserted = match self.votes.entry((song_id, user_id)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Vote {
                    song_id,
                    user_id,
                    created_at: Utc::now(),
                });
                true
            }
        };

        if inserted {
            self.notify(ChangeTable::Votes, ChangeKind::Insert);
        }

        Ok(InsertOutcome { inserted })
    }

    async fn list_votes_for_song(&self, song_id: SongId) -> Result<Vec<Vote>> {
        Ok(self
            .votes
            .iter()
            .filter(|v| v.key().0 == song_id)
            .map(|v| v.value().clone())
            .collect())
    }

    async fn list_votes(&self) -> Result<Vec<Vote>> {
        Ok(self.votes.iter().map(|v| v.value().clone()).collect())
    }

    fn subscribe(&self) -> ChangeReceiver {
        self.changes.subscribe()
    }
}
