//! Command Shell
//!
//! Parses and executes the line commands accepted by the `ttl_cache` binary.
//!
//! # Commands
//! - `set <key> <value> [ttl_secs]` - Store a value (default TTL if omitted)
//! - `get <key>` - Retrieve a value
//! - `ttl <key>` - Remaining lifetime of a key
//! - `clear` - Remove every entry
//! - `stats` - Cache statistics as JSON
//! - `help` - List commands
//! - `quit` / `exit` - Leave the shell

use std::io::BufRead;
use std::thread;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::TtlCache;

/// Lines buffered between the reader thread and the shell loop.
const LINE_BUFFER: usize = 64;

pub const HELP: &str = "\
commands:
  set <key> <value> [ttl_secs]
  get <key>
  ttl <key>
  clear
  stats
  help
  quit";

// == Command ==
/// One parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set {
        key: String,
        value: String,
        ttl_secs: Option<f64>,
    },
    Get {
        key: String,
    },
    Ttl {
        key: String,
    },
    Clear,
    Stats,
    Help,
    Quit,
}

// == Command Error ==
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid TTL '{0}': expected a number of seconds")]
    InvalidTtl(String),
}

impl Command {
    // == Parse ==
    /// Parses one input line. Command names are case-insensitive.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        match (name.as_str(), args.as_slice()) {
            ("set", [key, value]) => Ok(Command::Set {
                key: key.to_string(),
                value: value.to_string(),
                ttl_secs: None,
            }),
            ("set", [key, value, ttl]) => {
                let ttl_secs = ttl
                    .parse::<f64>()
                    .map_err(|_| CommandError::InvalidTtl(ttl.to_string()))?;
                Ok(Command::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                    ttl_secs: Some(ttl_secs),
                })
            }
            ("set", _) => Err(CommandError::Usage("set <key> <value> [ttl_secs]")),
            ("get", [key]) => Ok(Command::Get {
                key: key.to_string(),
            }),
            ("get", _) => Err(CommandError::Usage("get <key>")),
            ("ttl", [key]) => Ok(Command::Ttl {
                key: key.to_string(),
            }),
            ("ttl", _) => Err(CommandError::Usage("ttl <key>")),
            ("clear", []) => Ok(Command::Clear),
            ("stats", []) => Ok(Command::Stats),
            ("help", []) => Ok(Command::Help),
            ("quit" | "exit", []) => Ok(Command::Quit),
            ("clear" | "stats" | "help" | "quit" | "exit", _) => {
                Err(CommandError::Usage("command takes no arguments"))
            }
            _ => Err(CommandError::Unknown(name)),
        }
    }
}

// == Reply ==
/// What the shell should do after a command.
#[derive(Debug, PartialEq)]
pub enum Reply {
    Output(String),
    Quit,
}

// == Execute ==
/// Runs a command against the cache and renders its result.
pub fn execute(cache: &TtlCache<String>, command: Command) -> Reply {
    let output = match command {
        Command::Set {
            key,
            value,
            ttl_secs,
        } => {
            let result = match ttl_secs {
                Some(ttl) => cache.set_secs(key, value, ttl),
                None => cache.set_default(key, value),
            };
            match result {
                Ok(()) => "OK".to_string(),
                Err(e) => {
                    warn!("Rejected set: {}", e);
                    format!("(error) {}", e)
                }
            }
        }
        Command::Get { key } => cache.get(&key).unwrap_or_else(|| "(nil)".to_string()),
        Command::Ttl { key } => match cache.ttl(&key) {
            Some(remaining) => format!("{:.3}", remaining.as_secs_f64()),
            None => "(nil)".to_string(),
        },
        Command::Clear => {
            cache.clear();
            "OK".to_string()
        }
        Command::Stats => serde_json::to_string_pretty(&cache.stats())
            .unwrap_or_else(|e| format!("(error) {}", e)),
        Command::Help => HELP.to_string(),
        Command::Quit => return Reply::Quit,
    };

    Reply::Output(output)
}

// == Line Reader ==
/// Reads lines from `input` on a dedicated OS thread.
///
/// The blocking read never runs on the tokio runtime, so shutting the
/// runtime down does not wait for the next line to arrive. The channel
/// closes on EOF, on a read error, or when the receiver is dropped.
pub fn spawn_line_reader<R>(input: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
        debug!("Line reader finished");
    });

    rx
}

// == Serve ==
/// Runs commands from `lines` until the channel closes or `quit`, writing
/// each reply to `out`.
pub async fn serve<W>(
    cache: &TtlCache<String>,
    lines: &mut mpsc::Receiver<String>,
    out: &mut W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match Command::parse(&line) {
            Ok(command) => execute(cache, command),
            Err(e) => {
                warn!("Bad command {:?}: {}", line, e);
                Reply::Output(format!("(error) {}", e))
            }
        };

        match reply {
            Reply::Output(text) => {
                out.write_all(text.as_bytes()).await?;
                out.write_all(b"\n").await?;
                out.flush().await?;
            }
            Reply::Quit => break,
        }
    }

    Ok(())
}
