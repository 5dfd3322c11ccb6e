use crate::error::{Result, TuneError};
use crate::transport::TrackEnd;
use crate::types::{ResolvedTrack, RoomId};
use tokio::sync::broadcast;

/// Playback event published by room players
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A track was handed to the transport
    NowPlaying {
        room: RoomId,
        track: Box<ResolvedTrack>,
    },

    /// The current track stopped
    TrackEnded {
        room: RoomId,
        track: Box<ResolvedTrack>,
        end: TrackEnd,
    },

    /// The transport refused to start a track; it was discarded
    TrackFailed {
        room: RoomId,
        track: Box<ResolvedTrack>,
        error: String,
    },

    /// The player loop exited
    PlayerStopped { room: RoomId },
}

impl PlayerEvent {
    /// Room the event belongs to
    pub fn room(&self) -> RoomId {
        match self {
            PlayerEvent::NowPlaying { room, .. }
            | PlayerEvent::TrackEnded { room, .. }
            | PlayerEvent::TrackFailed { room, .. }
            | PlayerEvent::PlayerStopped { room } => *room,
        }
    }

    /// Chat line announcing the event, if it is worth announcing
    pub fn announcement(&self) -> Option<String> {
        match self {
            PlayerEvent::NowPlaying { track, .. } => {
                Some(format!("🎵 Now playing: **{}**", track.title))
            }
            PlayerEvent::TrackFailed { track, error, .. } => {
                Some(format!("Could not play **{}**: {}", track.title, error))
            }
            _ => None,
        }
    }
}

/// Receiver for player events
///
/// A receiver that falls behind the channel capacity skips the events it
/// missed and keeps going; [`EventReceiver::missed`] counts them.
pub struct EventReceiver {
    rx: broadcast::Receiver<PlayerEvent>,
    room: Option<RoomId>,
    missed: u64,
}

impl EventReceiver {
    pub(crate) fn new(rx: broadcast::Receiver<PlayerEvent>) -> Self {
        Self {
            rx,
            room: None,
            missed: 0,
        }
    }

    /// Only yield events for `room`
    pub fn only_room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }

    /// Events dropped because this receiver lagged
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn wanted(&self, event: &PlayerEvent) -> bool {
        self.room.map_or(true, |room| event.room() == room)
    }

    fn note_lag(&mut self, n: u64) {
        self.missed += n;
        tracing::warn!("Event receiver lagged, skipped {} events", n);
    }

    /// Receive the next event
    ///
    /// Returns `ChannelClosed` once the registry has been dropped.
    pub async fn recv(&mut self) -> Result<PlayerEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wanted(&event) => return Ok(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => self.note_lag(n),
                Err(broadcast::error::RecvError::Closed) => return Err(TuneError::ChannelClosed),
            }
        }
    }

    /// Try to receive an event without blocking
    ///
    /// Returns `None` if no event is available.
    pub fn try_recv(&mut self) -> Result<Option<PlayerEvent>> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.wanted(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(n)) => self.note_lag(n),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(TuneError::ChannelClosed)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopped(room: RoomId) -> PlayerEvent {
        PlayerEvent::PlayerStopped { room }
    }

    #[tokio::test]
    async fn lagging_receiver_skips_missed_events() {
        let (tx, rx) = broadcast::channel(2);
        let mut events = EventReceiver::new(rx);

        for room in 1..=5 {
            tx.send(stopped(room)).unwrap();
        }

        assert_eq!(events.recv().await.unwrap().room(), 4);
        assert_eq!(events.missed(), 3);
        assert_eq!(events.recv().await.unwrap().room(), 5);

        drop(tx);
        assert!(matches!(events.recv().await, Err(TuneError::ChannelClosed)));
    }

    #[test]
    fn room_filter_drops_other_rooms() {
        let (tx, rx) = broadcast::channel(8);
        let mut events = EventReceiver::new(rx).only_room(2);

        tx.send(stopped(1)).unwrap();
        tx.send(stopped(2)).unwrap();
        tx.send(stopped(3)).unwrap();

        assert_eq!(events.try_recv().unwrap().map(|e| e.room()), Some(2));
        assert!(events.try_recv().unwrap().is_none());
    }
}
