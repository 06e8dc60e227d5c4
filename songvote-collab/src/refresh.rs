use std::time::Duration;

use log::{error, info, warn};
use tokio::{
    select,
    sync::broadcast::error::RecvError,
    time::{interval, timeout_at, Instant, MissedTickBehavior},
};

use crate::{ChangeReceiver, CollabContext, CollabEvent};

/// Waits for a change that affects rankings, then keeps collecting changes until the window
/// passes. Returns how many changes were coalesced, or [None] if no more changes can arrive.
pub async fn next_burst(receiver: &mut ChangeReceiver, window: Duration) -> Option<usize> {
    loop {
        match receiver.recv().await {
            Ok(event) if event.affects_rankings() => break,
            Ok(_) => continue,
            // Missed changes still mean something changed
            Err(RecvError::Lagged(_)) => break,
            Err(RecvError::Closed) => return None,
        }
    }

    let deadline = Instant::now() + window;
    let mut coalesced = 1;

    loop {
        match timeout_at(deadline, receiver.recv()).await {
            Ok(Ok(event)) if event.affects_rankings() => coalesced += 1,
            Ok(Ok(_)) => {}
            Ok(Err(RecvError::Lagged(missed))) => coalesced += missed as usize,
            Ok(Err(RecvError::Closed)) | Err(_) => break,
        }
    }

    Some(coalesced)
}

/// Recomputes rankings after each burst of changes, and on every poll tick if configured.
pub(crate) async fn refresh_rankings(context: CollabContext, mut receiver: ChangeReceiver) {
    let window = context.config.debounce_window();

    let mut poll = context.config.poll_interval().map(|period| {
        let mut poll = interval(period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        poll
    });

    loop {
        let changed = match &mut poll {
            Some(poll) => select! {
                burst = next_burst(&mut receiver, window) => burst,
                _ = poll.tick() => Some(0),
            },
            None => next_burst(&mut receiver, window).await,
        };

        let Some(coalesced) = changed else {
            warn!("Change feed closed, rankings will no longer refresh");
            break;
        };

        match context.rankings().await {
            Ok(rankings) => {
                info!(
                    "Refreshed rankings of {} songs after {} changes",
                    rankings.len(),
                    coalesced
                );
                context.emit(CollabEvent::RankingsUpdate { rankings });
            }
            Err(e) => error!("Could not refresh rankings: {}", e),
        }
    }
}
