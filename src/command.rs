use crate::error::{Result, TuneError};
use crate::types::{ChannelId, Requester, RoomId};
use serde::{Deserialize, Serialize};

/// Typed request from the messaging front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "arg", rename_all = "lowercase")]
pub enum Command {
    Join,
    Leave,
    Play(String),
    Queue,
    Skip,
    Pause,
    Resume,
    Stop,
    Volume(i64),
    Help,
}

/// A command together with where and by whom it was issued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub room: RoomId,
    pub requester: Requester,

    /// Voice channel the requester is in, if any
    #[serde(default)]
    pub voice_channel: Option<ChannelId>,

    pub command: Command,
}

impl Invocation {
    pub fn new(room: RoomId, requester: Requester, command: Command) -> Self {
        Self {
            room,
            requester,
            voice_channel: None,
            command,
        }
    }

    /// Set the requester's voice channel
    pub fn in_channel(mut self, channel: ChannelId) -> Self {
        self.voice_channel = Some(channel);
        self
    }
}

impl Command {
    /// Parse a chat message
    ///
    /// Returns `None` when the message does not start with `prefix` and is
    /// therefore not meant for the bot.
    ///
    /// ```
    /// use tunecast::Command;
    ///
    /// let cmd = Command::parse(">", ">play never gonna give you up").unwrap().unwrap();
    /// assert_eq!(cmd, Command::Play("never gonna give you up".to_string()));
    /// assert!(Command::parse(">", "hello").is_none());
    /// ```
    pub fn parse(prefix: &str, text: &str) -> Option<Result<Command>> {
        let body = text.trim().strip_prefix(prefix)?;
        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };

        Some(Self::from_parts(&name.to_ascii_lowercase(), rest))
    }

    fn from_parts(name: &str, arg: &str) -> Result<Command> {
        let command = match name {
            "join" => Command::Join,
            "leave" => Command::Leave,
            "play" => {
                if arg.is_empty() {
                    return Err(TuneError::MissingArgument("play"));
                }
                Command::Play(arg.to_string())
            }
            "queue" => Command::Queue,
            "skip" => Command::Skip,
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "stop" => Command::Stop,
            "volume" => {
                if arg.is_empty() {
                    return Err(TuneError::MissingArgument("volume"));
                }
                let percent = arg
                    .trim_end_matches('%')
                    .parse::<i64>()
                    .map_err(|_| TuneError::InvalidVolume(arg.to_string()))?;
                Command::Volume(percent)
            }
            "helpmusic" | "help" => Command::Help,
            other => return Err(TuneError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// Help text listing every command with `prefix`
pub fn help_text(prefix: &str) -> String {
    let commands = [
        ("join", "Join your voice channel"),
        ("play <song>", "Play a song by URL or search term"),
        ("queue", "Show the current queue"),
        ("skip", "Skip the current song"),
        ("pause", "Pause the current song"),
        ("resume", "Resume the paused song"),
        ("stop", "Stop playing and clear the queue"),
        ("leave", "Leave the voice channel"),
        ("volume <0-100>", "Change the player volume"),
    ];

    let mut text = String::from("**TuneCast Bot Commands:**\n");
    for (usage, description) in commands {
        text.push_str(&format!("{}{} - {}\n", prefix, usage, description));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Command> {
        Command::parse(">", text).expect("prefixed message")
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse(">join").unwrap(), Command::Join);
        assert_eq!(parse(">SKIP").unwrap(), Command::Skip);
        assert_eq!(parse("  >queue  ").unwrap(), Command::Queue);
        assert_eq!(parse(">helpmusic").unwrap(), Command::Help);
    }

    #[test]
    fn play_keeps_whole_query() {
        assert_eq!(
            parse(">play  daft punk   around the world ").unwrap(),
            Command::Play("daft punk   around the world".to_string())
        );
        assert!(matches!(parse(">play"), Err(TuneError::MissingArgument("play"))));
    }

    #[test]
    fn volume_argument_is_parsed_not_validated() {
        assert_eq!(parse(">volume 40").unwrap(), Command::Volume(40));
        assert_eq!(parse(">volume 75%").unwrap(), Command::Volume(75));
        assert_eq!(parse(">volume 250").unwrap(), Command::Volume(250));
        assert!(matches!(parse(">volume loud"), Err(TuneError::InvalidVolume(_))));
    }

    #[test]
    fn ignores_unprefixed_messages() {
        assert!(Command::parse(">", "play something").is_none());
        assert!(Command::parse("!", ">play something").is_none());
    }

    #[test]
    fn unknown_commands_are_errors() {
        assert!(matches!(parse(">dance"), Err(TuneError::UnknownCommand(name)) if name == "dance"));
    }

    #[test]
    fn help_uses_prefix() {
        let text = help_text("!");
        assert!(text.contains("!play <song> - Play a song by URL or search term"));
        assert!(text.contains("!volume <0-100>"));
    }

    #[test]
    fn commands_serialize_tagged() {
        let json = serde_json::to_string(&Command::Volume(30)).unwrap();
        assert_eq!(json, r#"{"command":"volume","arg":30}"#);
        let back: Command = serde_json::from_str(r#"{"command":"skip"}"#).unwrap();
        assert_eq!(back, Command::Skip);
    }
}
