//! Interactive console front-end
//!
//! Reads chat commands from stdin (`>play <song>`, `>queue`, `>skip`, ...)
//! for a single room, resolves tracks with `yt-dlp` and "plays" them through
//! a simulated transport that logs the decoder command it would run and
//! finishes each track after its duration (capped at 30 seconds).
//!
//! ```text
//! cargo run --example console -- [config.toml]
//! RUST_LOG=tunecast=debug cargo run --example console
//! ```

use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use tunecast::{
    ChannelId, CompletionHandle, Config, DecoderConfig, MusicService, Requester, ResolvedTrack,
    RoomId, TrackEnd, Transport, YtDlpExtractor,
};

const ROOM: RoomId = 1;
const VOICE_CHANNEL: ChannelId = 100;
const MAX_SIMULATED: Duration = Duration::from_secs(30);

type SharedCompletion = Arc<Mutex<Option<CompletionHandle>>>;

#[derive(Default)]
struct SimRoom {
    channel: Option<ChannelId>,
    stream: Option<(JoinHandle<()>, SharedCompletion)>,
    paused: bool,
}

/// Transport that pretends to stream audio
struct SimulatedTransport {
    decoder: DecoderConfig,
    rooms: Mutex<HashMap<RoomId, SimRoom>>,
}

impl SimulatedTransport {
    fn new(decoder: DecoderConfig) -> Self {
        Self {
            decoder,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    fn with_room<R>(&self, room: RoomId, f: impl FnOnce(&mut SimRoom) -> R) -> R {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        f(rooms.entry(room).or_default())
    }
}

fn complete(shared: &SharedCompletion, end: TrackEnd) {
    let handle = shared.lock().unwrap_or_else(|e| e.into_inner()).take();
    if let Some(handle) = handle {
        handle.complete(end);
    }
}

impl Transport for SimulatedTransport {
    fn connect(&self, room: RoomId, channel: ChannelId) -> BoxFuture<'_, tunecast::Result<()>> {
        Box::pin(async move {
            tracing::info!("Connecting room {} to voice channel {}", room, channel);
            self.with_room(room, |sim| sim.channel = Some(channel));
            Ok(())
        })
    }

    fn disconnect(&self, room: RoomId) -> BoxFuture<'_, tunecast::Result<()>> {
        Box::pin(async move {
            self.stop_current(room);
            self.with_room(room, |sim| sim.channel = None);
            Ok(())
        })
    }

    fn connected_channel(&self, room: RoomId) -> Option<ChannelId> {
        self.with_room(room, |sim| sim.channel)
    }

    fn play(
        &self,
        room: RoomId,
        track: &ResolvedTrack,
        volume: f32,
        on_complete: CompletionHandle,
    ) -> tunecast::Result<()> {
        let args = self.decoder.command_args(&track.stream_locator);
        tracing::debug!("Would run {} {}", self.decoder.executable.display(), args.join(" "));

        let length = track.duration().unwrap_or(MAX_SIMULATED).min(MAX_SIMULATED);
        println!(
            "[audio] streaming '{}' at {:.0}% for {:?}",
            track.title,
            volume * 100.0,
            length
        );

        let completion: SharedCompletion = Arc::new(Mutex::new(Some(on_complete)));
        let timer = {
            let completion = completion.clone();
            tokio::spawn(async move {
                tokio::time::sleep(length).await;
                complete(&completion, TrackEnd::Finished);
            })
        };

        self.with_room(room, |sim| {
            sim.paused = false;
            sim.stream = Some((timer, completion));
        });
        Ok(())
    }

    fn stop_current(&self, room: RoomId) {
        if let Some((timer, completion)) = self.with_room(room, |sim| sim.stream.take()) {
            timer.abort();
            complete(&completion, TrackEnd::Stopped);
        }
    }

    fn pause(&self, room: RoomId) -> tunecast::Result<()> {
        self.with_room(room, |sim| sim.paused = true);
        Ok(())
    }

    fn resume(&self, room: RoomId) -> tunecast::Result<()> {
        self.with_room(room, |sim| sim.paused = false);
        Ok(())
    }

    fn is_playing(&self, room: RoomId) -> bool {
        self.with_room(room, |sim| {
            !sim.paused && sim.stream.as_ref().is_some_and(|(timer, _)| !timer.is_finished())
        })
    }

    fn is_paused(&self, room: RoomId) -> bool {
        self.with_room(room, |sim| sim.paused && sim.stream.is_some())
    }

    fn set_volume(&self, _room: RoomId, volume: f32) -> tunecast::Result<()> {
        println!("[audio] volume now {:.0}%", volume * 100.0);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tunecast=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let transport = Arc::new(SimulatedTransport::new(config.decoder.clone()));
    let extractor = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
    let prefix = config.command_prefix.clone();
    let service = Arc::new(MusicService::new(config, transport, extractor));

    let mut events = service.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Some(line) = event.announcement() {
                println!("{}", line);
            }
        }
    });

    println!("TuneCast console. Type {}helpmusic for commands, Ctrl-D to quit.", prefix);

    let requester = Requester::new(1, "console");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        // Resolution can be slow; keep reading input meanwhile
        let service = service.clone();
        let requester = requester.clone();
        tokio::spawn(async move {
            if let Some(reply) = service
                .handle_message(ROOM, requester, Some(VOICE_CHANNEL), &line)
                .await
            {
                println!("{}", reply);
            }
        });
    }

    service.shutdown().await;
    Ok(())
}
