//! Per-room audio queueing and sequential playback for voice chat bots
//!
//! TuneCast accepts playback requests (search terms or direct media URLs),
//! resolves each into a playable stream, queues it per room and plays the
//! queue one track at a time through an audio transport. It provides:
//!
//! - Source resolution via `yt-dlp` (or any [`Extractor`]), cancelled on timeout
//! - A FIFO queue and a single-flight player task per room
//! - Transport controls: skip, pause, resume, stop, volume
//! - Chat command parsing and reply rendering for text front-ends
//! - Playback event subscriptions ("now playing" announcements)
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tunecast::{Config, MusicService, Requester, Transport, YtDlpExtractor};
//!
//! # async fn run(transport: Arc<dyn Transport>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("tunecast.toml")?;
//! let extractor = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
//! let service = MusicService::new(config, transport, extractor);
//!
//! // Announce tracks as they start
//! let mut events = service.subscribe_events();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let Some(line) = event.announcement() {
//!             println!("[room {}] {}", event.room(), line);
//!         }
//!     }
//! });
//!
//! // Feed chat messages in
//! let reply = service
//!     .handle_message(1, Requester::new(7, "ana"), Some(100), ">play lofi hip hop")
//!     .await;
//! if let Some(reply) = reply {
//!     println!("{}", reply);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Resolver**: query → [`ResolvedTrack`] with a cancelling timeout
//! - **Queue**: per-room FIFO of resolved tracks
//! - **Room**: the player task that owns "now playing" for one room
//! - **Registry**: room → player map, lifecycle authority
//! - **Transport**: trait implemented by the voice backend
//! - **Service**: front-end facade and chat command dispatch

mod command;
mod config;
mod error;
mod queue;
mod registry;
mod resolver;
mod room;
mod service;
mod subscription;
mod transport;
mod types;

// Public exports
pub use command::{help_text, Command, Invocation};
pub use config::{Config, DecoderConfig, ExtractorConfig, PlayerSettings, ResolverSettings};
pub use error::{ErrorKind, Result, TuneError};
pub use queue::TrackQueue;
pub use registry::RoomRegistry;
pub use resolver::{ExtractInfo, Extractor, QueryKind, SourceResolver, YtDlpExtractor};
pub use room::RoomPlayer;
pub use service::MusicService;
pub use subscription::{EventReceiver, PlayerEvent};
pub use transport::{CompletionHandle, TrackEnd, Transport};
pub use types::{
    ChannelId, PlayerState, QueueSnapshot, Requester, ResolvedTrack, RoomId, TrackId, UserId,
};
