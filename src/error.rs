use crate::types::RoomId;
use thiserror::Error;

/// Result type for TuneCast operations
pub type Result<T> = std::result::Result<T, TuneError>;

/// Broad category of a [`TuneError`]
///
/// Front-ends use this to decide how a failure is reported. None of the
/// categories are fatal to the process; every failure is scoped to one room
/// or one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The query could not be turned into a playable stream
    Resolution,
    /// The request was rejected before any state changed
    Validation,
    /// The audio transport failed to start or keep a stream
    Transport,
    /// The room or player the request targets no longer exists
    Lifecycle,
    /// Configuration or I/O problems outside of a single request
    Internal,
}

/// Errors that can occur while resolving, queueing or playing tracks
#[derive(Error, Debug)]
pub enum TuneError {
    /// Extraction failed (network error, access block, malformed output)
    #[error("Could not resolve '{query}': {reason}")]
    Resolution {
        /// The query as submitted by the requester
        query: String,
        /// Short description of what went wrong
        reason: String,
    },

    /// Extraction succeeded but yielded no playable entry
    #[error("No results for '{0}'")]
    NoResults(String),

    /// Extraction did not finish in time
    #[error("Timed out resolving '{0}'")]
    ResolveTimeout(String),

    /// Play request without a query
    #[error("Nothing to play: the query is empty")]
    EmptyQuery,

    /// Volume percentage outside of 0..=100
    #[error("Volume must be between 0 and 100.")]
    VolumeOutOfRange(i64),

    /// Volume argument that is not a whole number
    #[error("Volume must be a whole number between 0 and 100, got '{0}'")]
    InvalidVolume(String),

    /// The requester is not in a voice channel
    #[error("You need to be in a voice channel to play music.")]
    NotInVoiceChannel,

    /// No voice connection for the room
    #[error("I'm not connected to a voice channel.")]
    NotConnected,

    /// Skip/pause requested while no stream is active
    #[error("There is no song playing.")]
    NothingPlaying,

    /// Pause requested while already paused
    #[error("The music is already paused.")]
    AlreadyPaused,

    /// Resume requested while not paused
    #[error("The music is not paused.")]
    NotPaused,

    /// Chat command name that is not recognised
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Chat command missing its argument
    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),

    /// Audio transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// No player registered for the room
    #[error("No player for room {0}")]
    RoomNotFound(RoomId),

    /// The player loop has already been shut down
    #[error("Player for room {0} has been stopped")]
    PlayerStopped(RoomId),

    /// Event channel closed (registry dropped)
    #[error("Channel closed")]
    ChannelClosed,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TuneError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TuneError::Resolution { .. } | TuneError::NoResults(_) | TuneError::ResolveTimeout(_) => {
                ErrorKind::Resolution
            }
            TuneError::EmptyQuery
            | TuneError::VolumeOutOfRange(_)
            | TuneError::InvalidVolume(_)
            | TuneError::NotInVoiceChannel
            | TuneError::NotConnected
            | TuneError::NothingPlaying
            | TuneError::AlreadyPaused
            | TuneError::NotPaused
            | TuneError::UnknownCommand(_)
            | TuneError::MissingArgument(_) => ErrorKind::Validation,
            TuneError::Transport(_) => ErrorKind::Transport,
            TuneError::RoomNotFound(_) | TuneError::PlayerStopped(_) => ErrorKind::Lifecycle,
            TuneError::ChannelClosed
            | TuneError::Config(_)
            | TuneError::Json(_)
            | TuneError::Toml(_)
            | TuneError::Io(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn resolution(query: &str, reason: impl Into<String>) -> Self {
        TuneError::Resolution {
            query: query.to_string(),
            reason: reason.into(),
        }
    }
}
