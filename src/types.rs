use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Room identifier (one voice destination, e.g. a guild)
pub type RoomId = u64;

/// Voice channel identifier inside a room
pub type ChannelId = u64;

/// User identifier
pub type UserId = u64;

/// Track identifier, unique per resolution
pub type TrackId = Uuid;

/// Identity of whoever asked for a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: UserId,
    pub name: String,
}

impl Requester {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A query resolved into a playable stream plus display metadata
///
/// Immutable once created. Cloning is cheap enough for queue snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub id: TrackId,
    pub title: String,

    /// Opaque locator handed to the transport/decoder
    pub stream_locator: String,

    /// Length in seconds, when the extractor reports one
    #[serde(default)]
    pub duration_seconds: Option<f64>,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    /// Canonical page of the media (not the stream)
    #[serde(default)]
    pub webpage_url: Option<String>,

    pub requested_by: Requester,
}

impl ResolvedTrack {
    /// Create a track with a fresh id and no optional metadata
    pub fn new(
        title: impl Into<String>,
        stream_locator: impl Into<String>,
        requested_by: Requester,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            stream_locator: stream_locator.into(),
            duration_seconds: None,
            thumbnail_url: None,
            webpage_url: None,
            requested_by,
        }
    }

    /// Track length as a `Duration`
    pub fn duration(&self) -> Option<Duration> {
        self.duration_seconds
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Length formatted as `m:ss` (or `h:mm:ss`)
    pub fn display_duration(&self) -> Option<String> {
        let total = self.duration()?.as_secs();
        let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
        if hours > 0 {
            Some(format!("{}:{:02}:{:02}", hours, minutes, seconds))
        } else {
            Some(format!("{}:{:02}", minutes, seconds))
        }
    }
}

/// Scheduler state of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// No current track
    Idle,
    /// A track has been handed to the transport
    Playing,
    /// Completion received, about to re-check the queue
    Draining,
}

/// Point-in-time copy of a room's queue for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSnapshot {
    pub state: PlayerState,
    pub current: Option<ResolvedTrack>,
    pub pending: Vec<ResolvedTrack>,
    pub volume: f32,
}

impl QueueSnapshot {
    /// Snapshot of a room without a player
    pub fn empty(volume: f32) -> Self {
        Self {
            state: PlayerState::Idle,
            current: None,
            pending: Vec::new(),
            volume,
        }
    }

    /// True when nothing is playing and nothing is pending
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }
}

impl fmt::Display for QueueSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "The queue is empty.");
        }

        writeln!(f, "**Current Queue:**")?;

        if let Some(current) = &self.current {
            writeln!(f, "Currently Playing: {}", current.title)?;
            writeln!(f)?;
        }

        for (i, track) in self.pending.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, track.title)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str) -> ResolvedTrack {
        ResolvedTrack::new(title, format!("https://cdn.example/{}", title), Requester::new(1, "ana"))
    }

    #[test]
    fn empty_snapshot_renders_empty_message() {
        assert_eq!(QueueSnapshot::empty(0.5).to_string(), "The queue is empty.");
    }

    #[test]
    fn snapshot_lists_current_then_pending() {
        let snapshot = QueueSnapshot {
            state: PlayerState::Playing,
            current: Some(track("A")),
            pending: vec![track("B"), track("C")],
            volume: 0.5,
        };

        assert_eq!(
            snapshot.to_string(),
            "**Current Queue:**\nCurrently Playing: A\n\n1. B\n2. C\n"
        );
    }

    #[test]
    fn duration_formatting() {
        let mut t = track("A");
        assert_eq!(t.display_duration(), None);

        t.duration_seconds = Some(215.4);
        assert_eq!(t.display_duration().as_deref(), Some("3:35"));

        t.duration_seconds = Some(3725.0);
        assert_eq!(t.display_duration().as_deref(), Some("1:02:05"));

        t.duration_seconds = Some(-1.0);
        assert_eq!(t.duration(), None);
    }
}
