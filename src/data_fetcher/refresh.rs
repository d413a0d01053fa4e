//! Background polling of the live scoreboard and the news feed.
//!
//! Each poller runs on its own tokio task and publishes [`RefreshMessage`]s over
//! an mpsc channel. [`PollerHandle::shutdown`] signals the task and waits for it
//! to exit, so once it returns nothing more is fetched or sent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::constants::polling;
use crate::data_fetcher::manager::ApiManager;
use crate::data_fetcher::models::{NewsItem, NewsQuery, Scoreboard};

const CHANNEL_CAPACITY: usize = 16;

pub const DEFAULT_SCOREBOARD_INTERVAL: Duration = Duration::from_secs(polling::LIVE_SCOREBOARD_SECONDS);
pub const DEFAULT_NEWS_INTERVAL: Duration = Duration::from_secs(polling::NEWS_SECONDS);

/// Messages sent from a poller to its consumer
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    ScoreboardUpdated(Scoreboard),
    NewsUpdated(Vec<NewsItem>),
    /// A poll failed; the poller keeps running
    RefreshError(String),
}

/// Handle for one running poller
pub struct PollerHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.recv().await
    }

    /// Returns a pending message without waiting
    pub fn try_recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.try_recv().ok()
    }

    /// Stops the poller and waits for its task to finish.
    /// An in-flight poll is abandoned rather than awaited.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("Poller task ended abnormally: {e}");
        }
    }
}

/// Polls the live scoreboard every `interval`, starting immediately
pub fn spawn_live_scoreboard_poller(manager: Arc<ApiManager>, interval: Duration) -> PollerHandle {
    info!("Starting live scoreboard poller every {interval:?}");
    spawn_poller(interval, move || {
        let manager = manager.clone();
        async move {
            match manager.get_nhl_live_scoreboard().await {
                Ok(scoreboard) => RefreshMessage::ScoreboardUpdated(scoreboard),
                Err(e) => RefreshMessage::RefreshError(e.to_string()),
            }
        }
    })
}

/// Polls the merged news feed for `query` every `interval`, starting immediately
pub fn spawn_news_poller(manager: Arc<ApiManager>, query: NewsQuery, interval: Duration) -> PollerHandle {
    info!("Starting news poller every {interval:?}");
    spawn_poller(interval, move || {
        let manager = manager.clone();
        let query = query.clone();
        async move {
            match manager.get_latest_news(&query).await {
                Ok(items) => RefreshMessage::NewsUpdated(items),
                Err(e) => RefreshMessage::RefreshError(e.to_string()),
            }
        }
    })
}

fn spawn_poller<F, Fut>(interval: Duration, poll: F) -> PollerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = RefreshMessage> + Send + 'static,
{
    let (msg_tx, msg_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_poller(interval, poll, msg_tx, shutdown_rx));

    PollerHandle {
        receiver: msg_rx,
        shutdown_tx,
        task,
    }
}

async fn run_poller<F, Fut>(
    period: Duration,
    mut poll: F,
    tx: mpsc::Sender<RefreshMessage>,
    mut shutdown: watch::Receiver<bool>,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = RefreshMessage>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // Shutdown wins every race so nothing is fetched or sent after it
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = interval.tick() => {}
        }

        let message = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            message = poll() => message,
        };
        if let RefreshMessage::RefreshError(e) = &message {
            warn!("Background refresh failed: {e}");
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            sent = tx.send(message) => {
                if sent.is_err() {
                    debug!("Poller receiver dropped, stopping");
                    break;
                }
            }
        }
    }
    debug!("Poller stopped");
}
