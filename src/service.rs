use crate::command::{help_text, Command, Invocation};
use crate::config::Config;
use crate::error::{Result, TuneError};
use crate::registry::RoomRegistry;
use crate::resolver::{Extractor, SourceResolver};
use crate::subscription::EventReceiver;
use crate::transport::Transport;
use crate::types::{ChannelId, QueueSnapshot, Requester, ResolvedTrack, RoomId};
use std::sync::Arc;

/// Entry point for front-ends
///
/// `MusicService` ties together the source resolver, the room registry and
/// the audio transport. Every method is scoped to one room; a failure in one
/// room never affects another.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use tunecast::{Config, MusicService, Requester, Transport, YtDlpExtractor};
/// # async fn demo(transport: Arc<dyn Transport>) -> tunecast::Result<()> {
/// let config = Config::default();
/// let extractor = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
/// let service = MusicService::new(config, transport, extractor);
///
/// let track = service
///     .play(1, Requester::new(7, "ana"), Some(100), "lofi hip hop")
///     .await?;
/// println!("Queued {}", track.title);
///
/// service.set_volume(1, 40)?;
/// service.skip(1)?;
/// service.stop(1).await?;
/// # Ok(())
/// # }
/// ```
pub struct MusicService {
    config: Config,
    registry: RoomRegistry,
    resolver: SourceResolver,
    transport: Arc<dyn Transport>,
}

impl MusicService {
    pub fn new(config: Config, transport: Arc<dyn Transport>, extractor: Arc<dyn Extractor>) -> Self {
        let resolver = SourceResolver::new(extractor, &config.resolver);
        let registry = RoomRegistry::new(transport.clone(), config.player.clone());
        Self {
            config,
            registry,
            resolver,
            transport,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Subscribe to player events from every room
    pub fn subscribe_events(&self) -> EventReceiver {
        self.registry.subscribe()
    }

    /// Join the requester's voice channel, moving if already connected
    pub async fn join(&self, room: RoomId, channel: Option<ChannelId>) -> Result<ChannelId> {
        let channel = channel.ok_or(TuneError::NotInVoiceChannel)?;
        self.transport.connect(room, channel).await?;
        tracing::info!("Joined channel {} in room {}", channel, room);
        Ok(channel)
    }

    /// Leave the voice channel and discard the room's player
    pub async fn leave(&self, room: RoomId) -> Result<()> {
        if !self.transport.is_connected(room) {
            return Err(TuneError::NotConnected);
        }
        self.registry.remove(room).await;
        self.transport.disconnect(room).await?;
        tracing::info!("Left room {}", room);
        Ok(())
    }

    /// Resolve `query` and append it to the room's queue
    ///
    /// Connects to the requester's channel first when the room has no voice
    /// connection. A failed resolution leaves the queue untouched.
    pub async fn play(
        &self,
        room: RoomId,
        requester: Requester,
        channel: Option<ChannelId>,
        query: &str,
    ) -> Result<ResolvedTrack> {
        let channel = channel.ok_or(TuneError::NotInVoiceChannel)?;
        if !self.transport.is_connected(room) {
            self.transport.connect(room, channel).await?;
        }

        let track = self.resolver.resolve(query, requester).await?;
        let player = self.registry.get_or_create(room);
        let position = player.enqueue(track.clone())?;
        tracing::info!("Added '{}' to room {} at position {}", track.title, room, position);
        Ok(track)
    }

    /// Current and pending tracks of a room
    pub fn queue(&self, room: RoomId) -> QueueSnapshot {
        match self.registry.get(room) {
            Some(player) => player.snapshot(),
            None => QueueSnapshot::empty(self.config.player.default_volume),
        }
    }

    /// Skip the current track
    pub fn skip(&self, room: RoomId) -> Result<ResolvedTrack> {
        self.registry
            .get(room)
            .ok_or(TuneError::NothingPlaying)?
            .skip()
    }

    pub fn pause(&self, room: RoomId) -> Result<()> {
        self.registry
            .get(room)
            .ok_or(TuneError::NothingPlaying)?
            .pause()
    }

    pub fn resume(&self, room: RoomId) -> Result<()> {
        self.registry.get(room).ok_or(TuneError::NotPaused)?.resume()
    }

    /// Stop the current track, clear the queue and drop the room's player
    ///
    /// The voice connection is kept.
    pub async fn stop(&self, room: RoomId) -> Result<()> {
        if !self.registry.remove(room).await {
            // No player, but the transport may still be streaming
            self.transport.stop_current(room);
        }
        Ok(())
    }

    /// Set the room's volume from a percentage
    ///
    /// Out-of-range values are rejected before anything is applied.
    pub fn set_volume(&self, room: RoomId, percent: i64) -> Result<f32> {
        if !(0..=100).contains(&percent) {
            return Err(TuneError::VolumeOutOfRange(percent));
        }
        self.registry
            .get(room)
            .ok_or(TuneError::RoomNotFound(room))?
            .set_volume(percent)
    }

    /// Execute an invocation and render the chat reply
    pub async fn dispatch(&self, invocation: &Invocation) -> String {
        let room = invocation.room;
        let connected = self.transport.is_connected(room);

        match &invocation.command {
            Command::Join => match self.join(room, invocation.voice_channel).await {
                Ok(channel) => format!("Joined channel {}", channel),
                Err(TuneError::NotInVoiceChannel) => {
                    "You are not connected to a voice channel.".to_string()
                }
                Err(e) => format!("An error occurred: {}", e),
            },
            Command::Leave => match self.leave(room).await {
                Ok(()) => "Left the voice channel and cleared the queue.".to_string(),
                Err(TuneError::NotConnected) => {
                    "I'm not connected to any voice channel.".to_string()
                }
                Err(e) => format!("An error occurred: {}", e),
            },
            Command::Play(query) => {
                match self
                    .play(room, invocation.requester.clone(), invocation.voice_channel, query)
                    .await
                {
                    Ok(track) => format!("Added **{}** to the queue.", track.title),
                    Err(TuneError::NotInVoiceChannel) => TuneError::NotInVoiceChannel.to_string(),
                    Err(e) => format!("An error occurred: {}", e),
                }
            }
            Command::Queue => self.queue(room).to_string(),
            Command::Skip => {
                if !connected {
                    return "I'm not playing any music.".to_string();
                }
                match self.skip(room) {
                    Ok(_) => "Skipped the current song.".to_string(),
                    Err(_) => "There is no song playing to skip.".to_string(),
                }
            }
            Command::Pause => {
                if !connected {
                    return "I'm not playing any music.".to_string();
                }
                match self.pause(room) {
                    Ok(()) => "Paused the music.".to_string(),
                    Err(e) => e.to_string(),
                }
            }
            Command::Resume => {
                if !connected {
                    return TuneError::NotConnected.to_string();
                }
                match self.resume(room) {
                    Ok(()) => "Resumed the music.".to_string(),
                    Err(e) => e.to_string(),
                }
            }
            Command::Stop => {
                if !connected {
                    return "I'm not playing any music.".to_string();
                }
                match self.stop(room).await {
                    Ok(()) => "Stopped playing and cleared the queue.".to_string(),
                    Err(e) => format!("An error occurred: {}", e),
                }
            }
            Command::Volume(percent) => {
                if !connected {
                    return TuneError::NotConnected.to_string();
                }
                match self.set_volume(room, *percent) {
                    Ok(_) => format!("Changed volume to {}%", percent),
                    Err(TuneError::RoomNotFound(_)) => "I'm not playing any music.".to_string(),
                    Err(e) => e.to_string(),
                }
            }
            Command::Help => help_text(&self.config.command_prefix),
        }
    }

    /// Parse a chat message and dispatch it
    ///
    /// Returns `None` for messages without the command prefix.
    pub async fn handle_message(
        &self,
        room: RoomId,
        requester: Requester,
        voice_channel: Option<ChannelId>,
        text: &str,
    ) -> Option<String> {
        let command = match Command::parse(&self.config.command_prefix, text)? {
            Ok(command) => command,
            Err(e) => return Some(e.to_string()),
        };

        let invocation = Invocation {
            room,
            requester,
            voice_channel,
            command,
        };
        Some(self.dispatch(&invocation).await)
    }

    /// Stop every room's player
    pub async fn shutdown(&self) {
        self.registry.shutdown_all().await;
    }
}
