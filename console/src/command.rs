//! One line of console input.

use std::str::FromStr;

use thiserror::Error;
use user_admin_core::view::edit::EditField;
use user_admin_core::UserId;

pub const HELP: &str = "\
commands:
  next | prev | page N | size N      page controls (table)
  down [N] | up [N]                  scroll (stack)
  add                                create a placeholder user
  edit ID                            edit a row
  name|email|city|role VALUE         change the row being edited
  save | cancel                      finish editing
  delete ID                          delete a row
  search [TEXT]                      filter by name or email
  help | quit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    /// 0-based page index; typed as 1-based.
    Page(u32),
    Size(u32),
    Down(usize),
    Up(usize),
    Add,
    Edit(UserId),
    Set(EditField, String),
    Save,
    Cancel,
    Delete(UserId),
    Search(Option<String>),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command {0:?}, try `help`")]
    Unknown(String),

    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

fn number<T: FromStr>(arg: &str) -> Result<T, CommandError> {
    arg.parse()
        .map_err(|_| CommandError::InvalidNumber(arg.to_string()))
}

fn required<'a>(
    arg: Option<&'a str>,
    command: &'static str,
    expected: &'static str,
) -> Result<&'a str, CommandError> {
    arg.filter(|a| !a.is_empty())
        .ok_or(CommandError::MissingArgument { command, expected })
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, Some(rest.trim())),
            None => (line, None),
        };

        let command = match word {
            "" => return Err(CommandError::Empty),
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "page" => {
                let page: u32 = number(required(rest, "page", "a page number")?)?;
                Command::Page(page.saturating_sub(1))
            }
            "size" => Command::Size(number(required(rest, "size", "a page size")?)?),
            "down" | "j" => Command::Down(rest.map(number).transpose()?.unwrap_or(1)),
            "up" | "k" => Command::Up(rest.map(number).transpose()?.unwrap_or(1)),
            "add" => Command::Add,
            "edit" => Command::Edit(number(required(rest, "edit", "a user id")?)?),
            "name" | "email" | "city" | "role" => {
                let field = word.parse().map_err(CommandError::Unknown)?;
                let value = required(rest, "set", "a value")?;
                Command::Set(field, value.to_string())
            }
            "save" => Command::Save,
            "cancel" => Command::Cancel,
            "delete" => Command::Delete(number(required(rest, "delete", "a user id")?)?),
            "search" => Command::Search(rest.filter(|r| !r.is_empty()).map(str::to_string)),
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_typed_one_based() {
        assert_eq!("page 3".parse::<Command>(), Ok(Command::Page(2)));
        assert_eq!("page 0".parse::<Command>(), Ok(Command::Page(0)));
    }

    #[test]
    fn scroll_defaults_to_one_row() {
        assert_eq!("down".parse::<Command>(), Ok(Command::Down(1)));
        assert_eq!("up 5".parse::<Command>(), Ok(Command::Up(5)));
    }

    #[test]
    fn field_values_keep_spaces() {
        assert_eq!(
            "name  Nguyen Van A ".parse::<Command>(),
            Ok(Command::Set(EditField::Name, "Nguyen Van A".to_string()))
        );
    }

    #[test]
    fn search_without_text_clears() {
        assert_eq!("search".parse::<Command>(), Ok(Command::Search(None)));
        assert_eq!("search ann".parse::<Command>(), Ok(Command::Search(Some("ann".to_string()))));
    }

    #[test]
    fn bad_input() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "edit".parse::<Command>(),
            Err(CommandError::MissingArgument {
                command: "edit",
                expected: "a user id"
            })
        );
        assert_eq!(
            "delete x".parse::<Command>(),
            Err(CommandError::InvalidNumber("x".to_string()))
        );
        assert_eq!(
            "fly".parse::<Command>(),
            Err(CommandError::Unknown("fly".to_string()))
        );
    }
}
