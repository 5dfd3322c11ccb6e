use crate::types::ResolvedTrack;
use std::collections::VecDeque;

/// FIFO of resolved tracks for one room
///
/// Holds ordering only; playback state lives in the room player. No
/// priorities, no deduplication, no reordering.
#[derive(Debug, Default, Clone)]
pub struct TrackQueue {
    tracks: VecDeque<ResolvedTrack>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track at the back
    pub fn append(&mut self, track: ResolvedTrack) {
        self.tracks.push_back(track);
    }

    /// Take the oldest track, or `None` when empty
    pub fn pop_front(&mut self) -> Option<ResolvedTrack> {
        self.tracks.pop_front()
    }

    /// Copy of the pending tracks in play order
    pub fn peek_all(&self) -> Vec<ResolvedTrack> {
        self.tracks.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drop every pending track
    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}
