use crate::config::PlayerSettings;
use crate::error::{Result, TuneError};
use crate::queue::TrackQueue;
use crate::subscription::PlayerEvent;
use crate::transport::{CompletionHandle, TrackEnd, Transport};
use crate::types::{PlayerState, QueueSnapshot, ResolvedTrack, RoomId, TrackId};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);
const HANDLE_DROPPED: &str = "transport dropped the completion handle";

/// Scheduler for one room
///
/// A `RoomPlayer` owns the room's queue and drives a background task that
/// plays queued tracks one at a time through the [`Transport`]. The task is
/// the only writer of the current track; command handlers only append to
/// the queue and signal the task.
///
/// Players are created and destroyed by [`RoomRegistry`](crate::RoomRegistry).
pub struct RoomPlayer {
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    stop_tx: broadcast::Sender<()>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the player handle and its task
struct Shared {
    room: RoomId,
    inner: Mutex<Inner>,
    /// Signalled on append
    wake: Notify,
    /// Signalled on skip
    skip: Notify,
    idle_poll: Duration,
    skip_grace: Duration,
}

struct Inner {
    queue: TrackQueue,
    current: Option<ResolvedTrack>,
    state: PlayerState,
    volume: f32,
    /// Track a pending skip targets
    skip_requested: Option<TrackId>,
    stopped: bool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner holds no invariants a panicking writer could half-apply
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RoomPlayer {
    /// Create a player and start its task
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        room: RoomId,
        transport: Arc<dyn Transport>,
        events: broadcast::Sender<PlayerEvent>,
        settings: &PlayerSettings,
    ) -> Self {
        let shared = Arc::new(Shared {
            room,
            inner: Mutex::new(Inner {
                queue: TrackQueue::new(),
                current: None,
                state: PlayerState::Idle,
                volume: settings.default_volume,
                skip_requested: None,
                stopped: false,
            }),
            wake: Notify::new(),
            skip: Notify::new(),
            idle_poll: settings.idle_poll(),
            skip_grace: settings.skip_grace(),
        });

        let (stop_tx, stop_rx) = broadcast::channel(1);

        let handle = tokio::spawn(run_player(shared.clone(), transport.clone(), events, stop_rx));

        tracing::info!("Started player for room {}", room);

        Self {
            shared,
            transport,
            stop_tx,
            task_handle: Mutex::new(Some(handle)),
        }
    }

    /// Room this player belongs to
    pub fn room(&self) -> RoomId {
        self.shared.room
    }

    /// Append a track; returns its 1-based position among pending tracks
    pub fn enqueue(&self, track: ResolvedTrack) -> Result<usize> {
        let position = {
            let mut inner = self.shared.lock();
            if inner.stopped {
                return Err(TuneError::PlayerStopped(self.shared.room));
            }
            tracing::debug!("Queued '{}' in room {}", track.title, self.shared.room);
            inner.queue.append(track);
            inner.queue.len()
        };
        self.shared.wake.notify_one();
        Ok(position)
    }

    pub fn state(&self) -> PlayerState {
        self.shared.lock().state
    }

    /// Track currently handed to the transport
    pub fn current(&self) -> Option<ResolvedTrack> {
        self.shared.lock().current.clone()
    }

    /// Number of pending tracks (excluding the current one)
    pub fn pending_len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Volume scalar (0.0..=1.0)
    pub fn volume(&self) -> f32 {
        self.shared.lock().volume
    }

    /// Get a consistent copy of state, current track and pending tracks
    pub fn snapshot(&self) -> QueueSnapshot {
        let inner = self.shared.lock();
        QueueSnapshot {
            state: inner.state,
            current: inner.current.clone(),
            pending: inner.queue.peek_all(),
            volume: inner.volume,
        }
    }

    /// Skip the current track
    ///
    /// The player stops the stream and moves on to the next queued track. If
    /// the transport never reports completion, the player detaches after the
    /// skip grace period.
    pub fn skip(&self) -> Result<ResolvedTrack> {
        let skipped = {
            let mut inner = self.shared.lock();
            let current = match (&inner.current, inner.state) {
                (Some(current), PlayerState::Playing) => current.clone(),
                _ => return Err(TuneError::NothingPlaying),
            };
            inner.skip_requested = Some(current.id);
            current
        };

        tracing::info!("Skipping '{}' in room {}", skipped.title, self.shared.room);
        self.shared.skip.notify_one();
        Ok(skipped)
    }

    pub fn pause(&self) -> Result<()> {
        let room = self.shared.room;
        if self.transport.is_paused(room) {
            return Err(TuneError::AlreadyPaused);
        }
        if !self.transport.is_playing(room) {
            return Err(TuneError::NothingPlaying);
        }
        self.transport.pause(room)
    }

    pub fn resume(&self) -> Result<()> {
        let room = self.shared.room;
        if !self.transport.is_paused(room) {
            return Err(TuneError::NotPaused);
        }
        self.transport.resume(room)
    }

    /// Set the volume from a percentage
    ///
    /// Anything outside `0..=100` is rejected and leaves the volume unchanged.
    pub fn set_volume(&self, percent: i64) -> Result<f32> {
        if !(0..=100).contains(&percent) {
            return Err(TuneError::VolumeOutOfRange(percent));
        }
        let volume = percent as f32 / 100.0;

        let playing = {
            let mut inner = self.shared.lock();
            inner.volume = volume;
            inner.current.is_some()
        };

        if playing {
            // Stored volume still applies to the next track
            if let Err(e) = self.transport.set_volume(self.shared.room, volume) {
                tracing::warn!("Failed to apply volume in room {}: {}", self.shared.room, e);
            }
        }

        tracing::debug!("Volume for room {} set to {}", self.shared.room, volume);
        Ok(volume)
    }

    /// Stop playback, clear the queue and end the player task
    ///
    /// Idempotent. Does not wait for the transport to confirm the stop.
    pub async fn shutdown(&self) {
        {
            let mut inner = self.shared.lock();
            inner.stopped = true;
            inner.queue.clear();
        }

        let _ = self.stop_tx.send(());

        let handle = self
            .task_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(handle) = handle {
            let abort = handle.abort_handle();
            if timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Player for room {} did not stop in time, aborting", self.shared.room);
                abort.abort();
            }
            // Covers an aborted task that never reached its own cleanup
            let mut inner = self.shared.lock();
            inner.queue.clear();
            inner.current = None;
            inner.state = PlayerState::Idle;
        }
    }
}

impl Drop for RoomPlayer {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

/// The player task: dequeue, play, wait for completion, repeat
async fn run_player(
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    events: broadcast::Sender<PlayerEvent>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let room = shared.room;

    loop {
        let next = {
            let mut inner = shared.lock();
            if inner.stopped {
                break;
            }
            match inner.queue.pop_front() {
                Some(track) => {
                    inner.current = Some(track.clone());
                    inner.state = PlayerState::Playing;
                    inner.skip_requested = None;
                    Some((track, inner.volume))
                }
                None => {
                    inner.state = PlayerState::Idle;
                    None
                }
            }
        };

        let Some((track, volume)) = next else {
            tokio::select! {
                _ = stop_rx.recv() => break,
                _ = shared.wake.notified() => {}
                _ = sleep(shared.idle_poll) => {}
            }
            continue;
        };

        let (handle, done_rx) = CompletionHandle::new(track.id);

        if let Err(e) = transport.play(room, &track, volume, handle) {
            tracing::error!("Failed to start '{}' in room {}: {}", track.title, room, e);
            finish_track(&shared);
            let _ = events.send(PlayerEvent::TrackFailed {
                room,
                track: Box::new(track),
                error: e.to_string(),
            });
            continue;
        }

        tracing::info!("Now playing '{}' in room {}", track.title, room);
        let _ = events.send(PlayerEvent::NowPlaying {
            room,
            track: Box::new(track.clone()),
        });

        match await_completion(&shared, transport.as_ref(), &track, done_rx, &mut stop_rx).await {
            Some(end) => {
                match &end {
                    TrackEnd::Errored(reason) => tracing::warn!(
                        "Stream for '{}' in room {} failed: {}",
                        track.title,
                        room,
                        reason
                    ),
                    _ => tracing::debug!("'{}' in room {} ended: {:?}", track.title, room, end),
                }
                finish_track(&shared);
                let _ = events.send(PlayerEvent::TrackEnded {
                    room,
                    track: Box::new(track),
                    end,
                });
            }
            None => break,
        }
    }

    {
        let mut inner = shared.lock();
        inner.queue.clear();
        inner.current = None;
        inner.state = PlayerState::Idle;
    }

    tracing::info!("Player for room {} stopped", room);
    let _ = events.send(PlayerEvent::PlayerStopped { room });
}

/// Clear the current track after its stream ended
fn finish_track(shared: &Shared) {
    let mut inner = shared.lock();
    inner.current = None;
    inner.skip_requested = None;
    inner.state = PlayerState::Draining;
}

/// Wait until the current track ends
///
/// Returns `None` when the player was stopped; the stream is stopped without
/// waiting for the transport to confirm.
async fn await_completion(
    shared: &Shared,
    transport: &dyn Transport,
    track: &ResolvedTrack,
    mut done_rx: oneshot::Receiver<TrackEnd>,
    stop_rx: &mut broadcast::Receiver<()>,
) -> Option<TrackEnd> {
    let room = shared.room;

    loop {
        tokio::select! {
            end = &mut done_rx => {
                return Some(end.unwrap_or_else(|_| {
                    TrackEnd::Errored(HANDLE_DROPPED.to_string())
                }));
            }
            _ = stop_rx.recv() => {
                transport.stop_current(room);
                return None;
            }
            _ = shared.skip.notified() => {
                let requested = shared.lock().skip_requested.take();
                if requested != Some(track.id) {
                    // Stale skip aimed at an earlier track
                    continue;
                }

                transport.stop_current(room);

                tokio::select! {
                    end = timeout(shared.skip_grace, &mut done_rx) => {
                        return Some(match end {
                            Ok(Ok(end)) => end,
                            Ok(Err(_)) => TrackEnd::Stopped,
                            Err(_) => {
                                tracing::warn!(
                                    "Transport did not confirm skip of '{}' in room {}, detaching",
                                    track.title,
                                    room
                                );
                                TrackEnd::Stopped
                            }
                        });
                    }
                    _ = stop_rx.recv() => return None,
                }
            }
        }
    }
}
