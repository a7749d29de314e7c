//! Command parsing
//!
//! Turns a decoded RESP frame into a typed `Command`. Each command has a
//! fixed argument count; names are case-insensitive. Parse failures carry
//! the exact error text sent back to the client.

use logwire_protocol::Frame;
use thiserror::Error;

/// A client command with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `AUTH <username> <password>`
    Auth { username: String, password: String },
    /// `APP <app> <proc> <host>`
    App {
        app: String,
        process: String,
        host: String,
    },
    /// `PUB <nanos> <line>`
    Pub { timestamp: i64, line: String },
    /// `SUB <app glob> <proc glob> <host glob>`
    Sub {
        app_glob: String,
        proc_glob: String,
        host_glob: String,
    },
    /// `QUIT`
    Quit,
}

/// Why a frame could not be turned into a command
///
/// The display text is the error reply, without the leading `-`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("ERR all commands must be sent as arrays")]
    NotArray,

    #[error("ERR empty command")]
    Empty,

    #[error("ERR command arguments must be strings")]
    NonStringArgument,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    #[error("ERR unknown command '{0}'")]
    Unknown(String),

    #[error("ERR timestamp must be a nanosecond integer")]
    InvalidTimestamp,
}

impl CommandError {
    /// Error reply frame for this failure
    pub fn to_frame(&self) -> Frame {
        Frame::error(self.to_string())
    }
}

impl Command {
    /// Parse a command frame
    pub fn parse(frame: Frame) -> Result<Self, CommandError> {
        let Frame::Array(items) = frame else {
            return Err(CommandError::NotArray);
        };
        if items.is_empty() {
            return Err(CommandError::Empty);
        }

        let mut parts = items
            .into_iter()
            .map(argument_text)
            .collect::<Result<Vec<String>, CommandError>>()?;
        let name = parts.remove(0);
        let mut args = parts.into_iter();

        match name.to_ascii_uppercase().as_str() {
            "QUIT" => Ok(Command::Quit),
            "AUTH" => {
                let [username, password] = take_args(&mut args, "auth")?;
                Ok(Command::Auth { username, password })
            }
            "APP" => {
                let [app, process, host] = take_args(&mut args, "app")?;
                Ok(Command::App { app, process, host })
            }
            "PUB" => {
                let [timestamp, line] = take_args(&mut args, "pub")?;
                let timestamp = timestamp
                    .parse::<i64>()
                    .map_err(|_| CommandError::InvalidTimestamp)?;
                Ok(Command::Pub { timestamp, line })
            }
            "SUB" => {
                let [app_glob, proc_glob, host_glob] = take_args(&mut args, "sub")?;
                Ok(Command::Sub {
                    app_glob,
                    proc_glob,
                    host_glob,
                })
            }
            _ => Err(CommandError::Unknown(name)),
        }
    }

    /// Lowercase command name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Auth { .. } => "auth",
            Command::App { .. } => "app",
            Command::Pub { .. } => "pub",
            Command::Sub { .. } => "sub",
            Command::Quit => "quit",
        }
    }
}

fn argument_text(frame: Frame) -> Result<String, CommandError> {
    match frame {
        Frame::Bulk(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
        Frame::Simple(s) => Ok(s),
        _ => Err(CommandError::NonStringArgument),
    }
}

fn take_args<const N: usize>(
    args: &mut std::vec::IntoIter<String>,
    name: &'static str,
) -> Result<[String; N], CommandError> {
    let collected: Vec<String> = args.collect();
    collected
        .try_into()
        .map_err(|_| CommandError::WrongArity(name))
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
