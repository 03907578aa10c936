// Console input adapter: classifies typed lines into client commands.

use crate::domain::Key;
use std::time::Instant;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

const CHAT_COMMAND: &str = "/say";
const QUIT_COMMAND: &str = "/quit";

/// What a single console line asks the client to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// One key-down event per character, in typing order.
    Keys(Vec<Key>),
    /// Fill the chat input with this text and submit the form.
    Chat(String),
    Quit,
    Nothing,
}

/// A raw console line stamped with the moment it was read.
#[derive(Debug, Clone)]
pub struct ConsoleLine {
    pub text: String,
    pub received_at: Instant,
}

/// Reads stdin line by line and forwards each line until stdin or the
/// receiver goes away.
pub fn spawn_console_reader(tx: mpsc::Sender<ConsoleLine>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(text)) => {
                    let line = ConsoleLine {
                        text,
                        received_at: Instant::now(),
                    };
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read console input");
                    break;
                }
            }
        }
    })
}

pub fn parse_line(line: &str) -> InputCommand {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return InputCommand::Nothing;
    }

    if line.trim() == QUIT_COMMAND {
        return InputCommand::Quit;
    }

    if let Some(rest) = line.strip_prefix(CHAT_COMMAND) {
        // "/say" alone submits an empty message; "/sayhi" is not a command.
        if rest.is_empty() {
            return InputCommand::Chat(String::new());
        }
        if let Some(text) = rest.strip_prefix(' ') {
            return InputCommand::Chat(text.to_string());
        }
    }

    InputCommand::Keys(line.chars().map(Key::from_char).collect())
}
