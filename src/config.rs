use crate::error::{Result, TuneError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
///
/// Every field has a default, so an empty TOML document is a valid config.
///
/// ```
/// use tunecast::Config;
///
/// let config = Config::from_toml_str(r#"
///     command_prefix = "!"
///
///     [player]
///     default_volume = 0.3
/// "#).unwrap();
///
/// assert_eq!(config.command_prefix, "!");
/// assert_eq!(config.player.idle_poll(), std::time::Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix that marks a chat message as a command
    pub command_prefix: String,
    pub player: PlayerSettings,
    pub resolver: ResolverSettings,
    pub extractor: ExtractorConfig,
    pub decoder: DecoderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_prefix: ">".to_string(),
            player: PlayerSettings::default(),
            resolver: ResolverSettings::default(),
            extractor: ExtractorConfig::default(),
            decoder: DecoderConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.command_prefix.is_empty() {
            return Err(TuneError::Config("command_prefix must not be empty".to_string()));
        }
        let volume = self.player.default_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(TuneError::Config(format!(
                "player.default_volume must be within 0.0..=1.0, got {}",
                volume
            )));
        }
        if self.player.idle_poll_ms == 0 {
            return Err(TuneError::Config("player.idle_poll_ms must be positive".to_string()));
        }
        if self.resolver.timeout_secs == 0 {
            return Err(TuneError::Config("resolver.timeout_secs must be positive".to_string()));
        }
        if self.extractor.binary.as_os_str().is_empty() {
            return Err(TuneError::Config("extractor.binary must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Room player tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Volume scalar for new rooms (0.0..=1.0)
    pub default_volume: f32,

    /// Upper bound on how long an idle loop sleeps before re-checking the queue
    pub idle_poll_ms: u64,

    /// How long a skip waits for the transport to report completion before
    /// the player detaches from the stream anyway
    pub skip_grace_ms: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            default_volume: 0.5,
            idle_poll_ms: 1000,
            skip_grace_ms: 5000,
        }
    }
}

impl PlayerSettings {
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn skip_grace(&self) -> Duration {
        Duration::from_millis(self.skip_grace_ms)
    }
}

/// Source resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub timeout_secs: u64,

    /// Prepended to queries that are not URLs
    pub search_prefix: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            search_prefix: "ytsearch:".to_string(),
        }
    }
}

impl ResolverSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Options for the `yt-dlp` extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub binary: PathBuf,

    /// Format selector, audio only by default
    pub format: String,

    /// Value for `--default-search`
    pub default_search: Option<String>,

    /// Local address to bind outgoing connections to
    pub source_address: Option<String>,

    /// Netscape cookie jar for sites that require sign-in
    pub cookies_file: Option<PathBuf>,

    /// Passed through verbatim before the query
    pub extra_args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            format: "bestaudio/best".to_string(),
            default_search: Some("auto".to_string()),
            source_address: Some("0.0.0.0".to_string()),
            cookies_file: None,
            extra_args: Vec::new(),
        }
    }
}

/// Options for the decoder process a transport spawns per stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub executable: PathBuf,

    /// Arguments placed before the input (reconnect behaviour)
    pub before_options: String,

    /// Arguments placed after the input
    pub options: String,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("ffmpeg"),
            before_options: "-reconnect 1 -reconnect_streamed 1 -reconnect_delay_max 5".to_string(),
            options: "-vn".to_string(),
        }
    }
}

impl DecoderConfig {
    /// Arguments for decoding `locator` into raw 48kHz stereo PCM on stdout
    pub fn command_args(&self, locator: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .before_options
            .split_whitespace()
            .map(str::to_string)
            .collect();

        args.push("-i".to_string());
        args.push(locator.to_string());
        args.extend(self.options.split_whitespace().map(str::to_string));
        args.extend(
            ["-f", "s16le", "-ar", "48000", "-ac", "2", "-loglevel", "warning", "pipe:1"]
                .iter()
                .map(|s| s.to_string()),
        );
        args
    }
}
