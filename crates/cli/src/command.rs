//! Line commands read from stdin.

use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("INVALID_INPUT: empty command")]
    Empty,

    #[error("INVALID_INPUT: unknown command `{0}`")]
    Unknown(String),

    #[error("INVALID_INPUT: `{0}` takes a link href")]
    MissingHref(&'static str),

    #[error("INVALID_INPUT: `{0}` takes no arguments")]
    UnexpectedArgument(&'static str),
}

/// One host interaction, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Click the first link on the page whose href resolves to the argument.
    Click(String),
    /// Press on a link without releasing, which may issue a prefetch hint.
    Hover(String),
    Back,
    Forward,
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;
        let argument = words.next();

        let command = match name.to_ascii_lowercase().as_str() {
            "click" => Command::Click(argument.ok_or(CommandError::MissingHref("click"))?.to_string()),
            "hover" => Command::Hover(argument.ok_or(CommandError::MissingHref("hover"))?.to_string()),
            "back" => no_argument(Command::Back, "back", argument)?,
            "forward" => no_argument(Command::Forward, "forward", argument)?,
            "status" => no_argument(Command::Status, "status", argument)?,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}

fn no_argument(command: Command, name: &'static str, argument: Option<&str>) -> Result<Command, CommandError> {
    match argument {
        Some(_) => Err(CommandError::UnexpectedArgument(name)),
        None => Ok(command),
    }
}
