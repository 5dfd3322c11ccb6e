//! Shared test doubles: a recording transport and a scripted extractor

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tunecast::{
    ChannelId, CompletionHandle, Config, ExtractInfo, Extractor, MusicService, PlayerSettings,
    ResolvedTrack, RoomId, TrackEnd, Transport, TuneError,
};

pub fn test_settings() -> PlayerSettings {
    PlayerSettings {
        default_volume: 0.5,
        idle_poll_ms: 50,
        skip_grace_ms: 200,
    }
}

pub fn test_config() -> Config {
    Config {
        player: test_settings(),
        ..Config::default()
    }
}

/// Config whose resolver gives up after one second
pub fn short_timeout_config() -> Config {
    let mut config = test_config();
    config.resolver.timeout_secs = 1;
    config
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[derive(Default)]
struct RoomAudio {
    channel: Option<ChannelId>,
    active: Option<(ResolvedTrack, CompletionHandle)>,
    paused: bool,
    volume: Option<f32>,
    started: Vec<String>,
    overlaps: usize,
}

/// Transport that records calls and lets tests end streams
#[derive(Default)]
pub struct MockTransport {
    rooms: Mutex<HashMap<RoomId, RoomAudio>>,
    failing_titles: Mutex<Vec<String>>,
    hang_on_stop: AtomicBool,
    leaked: Mutex<Vec<CompletionHandle>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_room<R>(&self, room: RoomId, f: impl FnOnce(&mut RoomAudio) -> R) -> R {
        let mut rooms = self.rooms.lock().unwrap();
        f(rooms.entry(room).or_default())
    }

    /// `play` fails for tracks with this title
    pub fn fail_title(&self, title: &str) {
        self.failing_titles.lock().unwrap().push(title.to_string());
    }

    /// `stop_current` silently keeps the stream's completion pending
    pub fn hang_on_stop(&self) {
        self.hang_on_stop.store(true, Ordering::SeqCst);
    }

    /// End the active stream naturally; returns its title
    pub fn finish(&self, room: RoomId) -> Option<String> {
        let active = self.with_room(room, |audio| {
            audio.paused = false;
            audio.active.take()
        });
        active.map(|(track, handle)| {
            handle.complete(TrackEnd::Finished);
            track.title
        })
    }

    /// End the active stream with a transport error
    pub fn fail_active(&self, room: RoomId, reason: &str) -> Option<String> {
        let active = self.with_room(room, |audio| audio.active.take());
        active.map(|(track, handle)| {
            handle.complete(TrackEnd::Errored(reason.to_string()));
            track.title
        })
    }

    /// Drop the active stream's completion handle without reporting an end
    pub fn drop_active(&self, room: RoomId) -> Option<String> {
        let active = self.with_room(room, |audio| audio.active.take());
        active.map(|(track, handle)| {
            drop(handle);
            track.title
        })
    }

    /// Title of the active stream
    pub fn playing_title(&self, room: RoomId) -> Option<String> {
        self.with_room(room, |audio| audio.active.as_ref().map(|(t, _)| t.title.clone()))
    }

    /// Titles passed to `play`, in order
    pub fn started(&self, room: RoomId) -> Vec<String> {
        self.with_room(room, |audio| audio.started.clone())
    }

    /// Times `play` was called while a stream was already active
    pub fn overlaps(&self, room: RoomId) -> usize {
        self.with_room(room, |audio| audio.overlaps)
    }

    pub fn volume(&self, room: RoomId) -> Option<f32> {
        self.with_room(room, |audio| audio.volume)
    }
}

impl Transport for MockTransport {
    fn connect(&self, room: RoomId, channel: ChannelId) -> BoxFuture<'_, tunecast::Result<()>> {
        self.with_room(room, |audio| audio.channel = Some(channel));
        Box::pin(std::future::ready(Ok(())))
    }

    fn disconnect(&self, room: RoomId) -> BoxFuture<'_, tunecast::Result<()>> {
        self.with_room(room, |audio| audio.channel = None);
        Box::pin(std::future::ready(Ok(())))
    }

    fn connected_channel(&self, room: RoomId) -> Option<ChannelId> {
        self.with_room(room, |audio| audio.channel)
    }

    fn play(
        &self,
        room: RoomId,
        track: &ResolvedTrack,
        volume: f32,
        on_complete: CompletionHandle,
    ) -> tunecast::Result<()> {
        if self.failing_titles.lock().unwrap().contains(&track.title) {
            return Err(TuneError::Transport(format!("stream expired: {}", track.title)));
        }

        self.with_room(room, |audio| {
            if audio.active.is_some() {
                audio.overlaps += 1;
            }
            audio.started.push(track.title.clone());
            audio.volume = Some(volume);
            audio.paused = false;
            audio.active = Some((track.clone(), on_complete));
        });
        Ok(())
    }

    fn stop_current(&self, room: RoomId) {
        let active = self.with_room(room, |audio| {
            audio.paused = false;
            audio.active.take()
        });
        if let Some((_, handle)) = active {
            if self.hang_on_stop.load(Ordering::SeqCst) {
                self.leaked.lock().unwrap().push(handle);
            } else {
                handle.complete(TrackEnd::Stopped);
            }
        }
    }

    fn pause(&self, room: RoomId) -> tunecast::Result<()> {
        self.with_room(room, |audio| audio.paused = true);
        Ok(())
    }

    fn resume(&self, room: RoomId) -> tunecast::Result<()> {
        self.with_room(room, |audio| audio.paused = false);
        Ok(())
    }

    fn is_playing(&self, room: RoomId) -> bool {
        self.with_room(room, |audio| audio.active.is_some() && !audio.paused)
    }

    fn is_paused(&self, room: RoomId) -> bool {
        self.with_room(room, |audio| audio.active.is_some() && audio.paused)
    }

    fn set_volume(&self, room: RoomId, volume: f32) -> tunecast::Result<()> {
        self.with_room(room, |audio| audio.volume = Some(volume));
        Ok(())
    }
}

/// Extractor answering from a fixed table of lookup terms
#[derive(Default)]
pub struct ScriptedExtractor {
    answers: Mutex<HashMap<String, ExtractInfo>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExtractor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `ytsearch:<query>` with a single playable entry titled `title`
    pub fn song(&self, query: &str, title: &str) {
        self.answer(&format!("ytsearch:{}", query), entry(title));
    }

    pub fn answer(&self, term: &str, info: ExtractInfo) {
        self.answers.lock().unwrap().insert(term.to_string(), info);
    }

    /// Hold the extraction of `term` for `delay`
    pub fn delay(&self, term: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(term.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Extractor for ScriptedExtractor {
    fn extract<'a>(&'a self, term: &'a str) -> BoxFuture<'a, tunecast::Result<ExtractInfo>> {
        self.calls.lock().unwrap().push(term.to_string());
        let delay = self.delays.lock().unwrap().get(term).copied();
        let answer = self.answers.lock().unwrap().get(term).cloned();

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            answer.ok_or_else(|| TuneError::Resolution {
                query: term.to_string(),
                reason: "HTTP Error 404: Not Found".to_string(),
            })
        })
    }
}

pub fn entry(title: &str) -> ExtractInfo {
    ExtractInfo {
        title: Some(title.to_string()),
        url: Some(format!("https://cdn.example/{}.webm", title.replace(' ', "_"))),
        duration: Some(180.0),
        thumbnail: None,
        webpage_url: None,
        entries: None,
    }
}

pub fn track(title: &str) -> ResolvedTrack {
    ResolvedTrack::new(
        title,
        format!("https://cdn.example/{}.webm", title),
        tunecast::Requester::new(1, "ana"),
    )
}

pub fn service(transport: Arc<MockTransport>, extractor: Arc<ScriptedExtractor>) -> MusicService {
    MusicService::new(test_config(), transport, extractor)
}
