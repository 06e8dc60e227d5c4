use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::{Song, SongId, UserId, Vote};

/// A song along with the votes it has received
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSong {
    pub song: Song,
    pub vote_count: usize,
    pub voter_ids: BTreeSet<UserId>,
}

impl RankedSong {
    pub fn has_voted(&self, user_id: UserId) -> bool {
        self.voter_ids.contains(&user_id)
    }
}

/// Ranks songs by their votes.
///
/// Songs with more votes come first. Ties go to the earliest suggestion, and then to the
/// lowest id so the order is stable even when timestamps coincide. Every song is included,
/// and votes for unknown songs are ignored.
pub fn compute_rankings(songs: &[Song], votes: &[Vote]) -> Vec<RankedSong> {
    let mut voters: HashMap<SongId, BTreeSet<UserId>> = HashMap::new();

    for vote in votes {
        voters.entry(vote.song_id).or_default().insert(vote.user_id);
    }

    let mut ranked: Vec<_> = songs
        .iter()
        .map(|song| {
            let voter_ids = voters.remove(&song.id).unwrap_or_default();

            RankedSong {
                song: song.clone(),
                vote_count: voter_ids.len(),
                voter_ids,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.vote_count
            .cmp(&a.vote_count)
            .then_with(|| a.song.created_at.cmp(&b.song.created_at))
            .then_with(|| a.song.id.cmp(&b.song.id))
    });

    ranked
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn song(title: &str, minute: i64) -> Song {
        Song {
            id: SongId::new(),
            title: title.to_string(),
            artist: "Someone".to_string(),
            notes: None,
            video: None,
            suggested_by: UserId::new(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minute),
        }
    }

    fn vote(song: &Song, user_id: UserId) -> Vote {
        Vote {
            song_id: song.id,
            user_id,
            created_at: Utc::now(),
        }
    }

    fn titles(ranked: &[RankedSong]) -> Vec<&str> {
        ranked.iter().map(|r| r.song.title.as_str()).collect()
    }

    #[test]
    fn test_empty() {
        assert!(compute_rankings(&[], &[]).is_empty());
    }

    #[test]
    fn test_basic_flow() {
        let a = song("Amazing Grace", 0);
        let b = song("Oceans", 1);
        let (u1, u2) = (UserId::new(), UserId::new());

        let votes = [vote(&a, u1), vote(&a, u2), vote(&b, u1)];
        let ranked = compute_rankings(&[b.clone(), a.clone()], &votes);

        assert_eq!(titles(&ranked), ["Amazing Grace", "Oceans"]);
        assert_eq!(ranked[0].vote_count, 2);
        assert_eq!(ranked[1].vote_count, 1);
        assert!(ranked[0].has_voted(u1) && ranked[0].has_voted(u2));
        assert!(!ranked[1].has_voted(u2));
    }

    #[test]
    fn test_zero_votes_are_last_in_creation_order() {
        let c = song("C", 0);
        let d = song("D", 1);
        let e = song("E", 2);

        let ranked = compute_rankings(&[e.clone(), d.clone(), c.clone()], &[vote(&e, UserId::new())]);

        assert_eq!(titles(&ranked), ["E", "C", "D"]);
        assert_eq!(ranked[1].vote_count, 0);
        assert_eq!(ranked[2].vote_count, 0);
        assert!(ranked[2].voter_ids.is_empty());
    }

    #[test]
    fn test_id_breaks_timestamp_ties() {
        let mut first = song("First", 0);
        let mut second = song("Second", 0);

        if first.id > second.id {
            std::mem::swap(&mut first.id, &mut second.id);
        }

        let ranked = compute_rankings(&[second, first], &[]);
        assert_eq!(titles(&ranked), ["First", "Second"]);
    }

    #[test]
    fn test_ignores_orphaned_and_repeated_votes() {
        let a = song("A", 0);
        let orphan = song("Gone", 1);
        let user = UserId::new();

        let votes = [vote(&a, user), vote(&a, user), vote(&orphan, user)];
        let ranked = compute_rankings(&[a], &votes);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].vote_count, 1);
    }

    #[test]
    fn test_is_deterministic() {
        let songs: Vec<_> = (0..6).map(|i| song(&format!("S{}", i), i % 3)).collect();
        let votes = [vote(&songs[4], UserId::new()), vote(&songs[1], UserId::new())];

        let mut reversed = songs.clone();
        reversed.reverse();

        assert_eq!(
            compute_rankings(&songs, &votes),
            compute_rankings(&reversed, &votes)
        );
    }
}
