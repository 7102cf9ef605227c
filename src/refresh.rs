//! Background auto-refresh
//!
//! Periodically drops the cached responses for a location and fetches fresh
//! current conditions, reporting results to the main task over a tokio
//! channel.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::data::{CurrentConditions, Location, WeatherClient};

/// Messages sent from background refresh to main app
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// Refresh started
    RefreshStarted,
    /// Fresh conditions fetched for the watched location
    ConditionsUpdated {
        location: Location,
        conditions: CurrentConditions,
    },
    /// An error occurred during refresh
    RefreshError(String),
    /// Refresh completed
    RefreshCompleted,
}

/// Configuration for auto-refresh
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between refreshes
    pub interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Triggers an out-of-schedule refresh
    trigger_tx: mpsc::Sender<()>,
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the refresh task for `location`
    ///
    /// The first refresh happens one interval after spawning. With refresh
    /// disabled no task is spawned and no messages ever arrive.
    pub fn spawn(config: RefreshConfig, client: WeatherClient, location: Location) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {}
                        Some(()) = trigger_rx.recv() => {
                            interval.reset();
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }

                    if !refresh_once(&client, &location, &msg_tx).await {
                        break;
                    }
                }
                debug!("Auto-refresh stopped");
            });
        }

        Self {
            receiver: msg_rx,
            trigger_tx,
            shutdown_tx,
        }
    }

    /// Requests an immediate refresh; the schedule restarts from now
    pub async fn request_refresh(&self) {
        let _ = self.trigger_tx.send(()).await;
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// One refresh cycle. Returns `false` once nobody is listening any more.
async fn refresh_once(
    client: &WeatherClient,
    location: &Location,
    tx: &mpsc::Sender<RefreshMessage>,
) -> bool {
    if tx.send(RefreshMessage::RefreshStarted).await.is_err() {
        return false;
    }

    let message = match client.refresh(location).await {
        Ok(conditions) => RefreshMessage::ConditionsUpdated {
            location: location.clone(),
            conditions,
        },
        Err(e) => RefreshMessage::RefreshError(e.to_string()),
    };

    tx.send(message).await.is_ok() && tx.send(RefreshMessage::RefreshCompleted).await.is_ok()
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
