use crate::error::Result;
use crate::types::{ChannelId, ResolvedTrack, RoomId, TrackId};
use futures_util::future::BoxFuture;
use tokio::sync::oneshot;

/// Why a stream stopped playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEnd {
    /// End of stream reached
    Finished,
    /// Stopped on request (skip/stop)
    Stopped,
    /// Decoder or stream failure mid-playback
    Errored(String),
}

/// Single-use completion signal for one playing track
///
/// The transport must call [`CompletionHandle::complete`] exactly once when
/// the stream stops for any reason. Dropping the handle without completing
/// is reported to the player as an errored track.
#[derive(Debug)]
pub struct CompletionHandle {
    track_id: TrackId,
    tx: oneshot::Sender<TrackEnd>,
}

impl CompletionHandle {
    pub(crate) fn new(track_id: TrackId) -> (Self, oneshot::Receiver<TrackEnd>) {
        let (tx, rx) = oneshot::channel();
        (Self { track_id, tx }, rx)
    }

    /// The track this handle belongs to
    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// Report that the stream has stopped
    pub fn complete(self, end: TrackEnd) {
        // The player may already have detached from this track
        let _ = self.tx.send(end);
    }
}

/// Audio transport for voice rooms
///
/// Implementations emit decoded audio into a room's voice channel. A room
/// has at most one active stream. The scheduler calls `play` only after the
/// previous stream completed its [`CompletionHandle`], with one exception: if
/// a skipped stream does not complete within the skip grace period after
/// `stop_current`, the scheduler stops waiting and starts the next track.
/// `play` must then replace whatever stream is still attached to the room.
///
/// Control methods are synchronous and must not block: they are called from
/// the room's player task and from command handlers.
pub trait Transport: Send + Sync + 'static {
    /// Join `channel` in `room`, or move there if already connected
    fn connect(&self, room: RoomId, channel: ChannelId) -> BoxFuture<'_, Result<()>>;

    /// Leave the voice channel in `room`
    fn disconnect(&self, room: RoomId) -> BoxFuture<'_, Result<()>>;

    /// Voice channel currently joined in `room`
    fn connected_channel(&self, room: RoomId) -> Option<ChannelId>;

    fn is_connected(&self, room: RoomId) -> bool {
        self.connected_channel(room).is_some()
    }

    /// Start streaming `track` at `volume` (0.0..=1.0)
    ///
    /// An `Err` means nothing started and `on_complete` was dropped.
    fn play(
        &self,
        room: RoomId,
        track: &ResolvedTrack,
        volume: f32,
        on_complete: CompletionHandle,
    ) -> Result<()>;

    /// Stop the active stream, if any; its completion reports `Stopped`
    fn stop_current(&self, room: RoomId);

    fn pause(&self, room: RoomId) -> Result<()>;

    fn resume(&self, room: RoomId) -> Result<()>;

    /// A stream is active and not paused
    fn is_playing(&self, room: RoomId) -> bool;

    fn is_paused(&self, room: RoomId) -> bool;

    /// Apply a volume scalar (0.0..=1.0) to the active stream
    fn set_volume(&self, room: RoomId, volume: f32) -> Result<()>;
}
