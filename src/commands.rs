use combine::error::ParseError;
use combine::parser::char::{digit, space, spaces, string};
use combine::{
    any, attempt, choice, eof, many1, optional, skip_many1,
    stream::position, EasyParser, Parser, Stream,
};
use std::fmt::Display;

/// A line typed into the command bar. Positions are 1-based, as shown in
/// the list; `None` means the selected row.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Add { title: String, note: Option<String> },
    Done(Option<usize>),
    Undo(Option<usize>),
    Remove(Option<usize>),
    Reload,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CommandParseError {
    Empty,
    Invalid(String),
}

impl Display for CommandParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandParseError::Empty => write!(f, "Enter a command"),
            CommandParseError::Invalid(msg) => write!(f, "Unknown command: {msg}"),
        }
    }
}

fn keyword<Input>(long: &'static str, short: &'static str) -> impl Parser<Input, Output = ()>
where
    Input: Stream<Token = char>,
    Input::Error: ParseError<Input::Token, Input::Range, Input::Position>,
{
    attempt(string(long)).or(string(short)).map(|_| ())
}

fn position_arg<Input>() -> impl Parser<Input, Output = Option<usize>>
where
    Input: Stream<Token = char>,
    Input::Error: ParseError<Input::Token, Input::Range, Input::Position>,
{
    // Anything too large to be a position is out of range anyway.
    optional(attempt(
        skip_many1(space())
            .with(many1::<String, _, _>(digit()))
            .map(|digits| digits.parse::<usize>().unwrap_or(usize::MAX)),
    ))
}

fn split_note(text: String) -> (String, Option<String>) {
    match text.split_once('|') {
        Some((title, note)) => (title.trim().to_string(), Some(note.trim().to_string())),
        None => (text.trim().to_string(), None),
    }
}

fn command<Input>() -> impl Parser<Input, Output = Command>
where
    Input: Stream<Token = char>,
    Input::Error: ParseError<Input::Token, Input::Range, Input::Position>,
{
    let add = keyword("add", "a")
        .skip(skip_many1(space()))
        .with(many1::<String, _, _>(any()))
        .map(|text| {
            let (title, note) = split_note(text);
            Command::Add { title, note }
        });

    choice((
        add,
        keyword("done", "d").with(position_arg()).map(Command::Done),
        keyword("undo", "u").with(position_arg()).map(Command::Undo),
        choice((attempt(string("rm")), string("x")))
            .with(position_arg())
            .map(Command::Remove),
        keyword("reload", "r").map(|_| Command::Reload),
        keyword("quit", "q").map(|_| Command::Quit),
    ))
    .skip(spaces())
    .skip(eof())
}

pub(crate) fn parse_command(input: &str) -> Result<Command, CommandParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CommandParseError::Empty);
    }
    command()
        .easy_parse(position::Stream::new(input))
        .map(|(command, _)| command)
        .map_err(|_| CommandParseError::Invalid(input.to_string()))
}
