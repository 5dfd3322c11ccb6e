use crate::config::PlayerSettings;
use crate::room::RoomPlayer;
use crate::subscription::{EventReceiver, PlayerEvent};
use crate::transport::Transport;
use crate::types::RoomId;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 100;

/// Owner of every room player
///
/// Players are created lazily on first use and live until the room is
/// stopped or left. Lookups and creation happen under one lock, so a room
/// never ends up with two players.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use tunecast::{PlayerSettings, RoomRegistry, Transport};
/// # async fn demo(transport: Arc<dyn Transport>) {
/// let registry = RoomRegistry::new(transport, PlayerSettings::default());
/// let _events = registry.subscribe();
///
/// let player = registry.get_or_create(42);
/// assert_eq!(player.room(), 42);
///
/// registry.remove(42).await;
/// assert!(registry.get(42).is_none());
/// # }
/// ```
pub struct RoomRegistry {
    players: Mutex<BTreeMap<RoomId, Arc<RoomPlayer>>>,
    transport: Arc<dyn Transport>,
    settings: PlayerSettings,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl RoomRegistry {
    pub fn new(transport: Arc<dyn Transport>, settings: PlayerSettings) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            players: Mutex::new(BTreeMap::new()),
            transport,
            settings,
            event_tx,
        }
    }

    fn players(&self) -> MutexGuard<'_, BTreeMap<RoomId, Arc<RoomPlayer>>> {
        self.players.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribe to events from every room
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.event_tx.subscribe())
    }

    /// Get the player for `room`, creating and starting it if needed
    ///
    /// Must be called from within a tokio runtime.
    pub fn get_or_create(&self, room: RoomId) -> Arc<RoomPlayer> {
        let mut players = self.players();
        players
            .entry(room)
            .or_insert_with(|| {
                tracing::info!("Creating player for room {}", room);
                Arc::new(RoomPlayer::spawn(
                    room,
                    self.transport.clone(),
                    self.event_tx.clone(),
                    &self.settings,
                ))
            })
            .clone()
    }

    /// Get the player for `room` if one exists
    pub fn get(&self, room: RoomId) -> Option<Arc<RoomPlayer>> {
        self.players().get(&room).cloned()
    }

    /// Stop and forget the player for `room`
    ///
    /// Returns `false` if there was nothing to remove.
    pub async fn remove(&self, room: RoomId) -> bool {
        let player = self.players().remove(&room);

        match player {
            Some(player) => {
                tracing::info!("Removing player for room {}", room);
                player.shutdown().await;
                true
            }
            None => {
                tracing::debug!("No player to remove for room {}", room);
                false
            }
        }
    }

    /// Rooms that currently have a player
    pub fn rooms(&self) -> Vec<RoomId> {
        self.players().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.players().len()
    }

    pub fn is_empty(&self) -> bool {
        self.players().is_empty()
    }

    /// Stop every player
    pub async fn shutdown_all(&self) {
        let players: Vec<Arc<RoomPlayer>> = {
            let mut players = self.players();
            std::mem::take(&mut *players).into_values().collect()
        };

        tracing::info!("Shutting down {} player(s)", players.len());
        join_all(players.iter().map(|player| player.shutdown())).await;
    }
}
