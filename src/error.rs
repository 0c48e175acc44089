use std::fmt::{Display, Formatter};
use std::io::Error as IOError;

#[derive(Debug)]
pub(crate) enum Error {
    Io(IOError),
    Config(String),
    Database(String),
    InvalidTitle(usize),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io: {err}"),
            Error::Config(msg) => write!(f, "config: {msg}"),
            Error::Database(msg) => write!(f, "{msg}"),
            Error::InvalidTitle(0) => write!(f, "Title can't be empty"),
            Error::InvalidTitle(len) => write!(
                f,
                "Title is {len} characters long, the limit is {}",
                crate::types::MAX_TITLE_LEN
            ),
        }
    }
}

impl std::error::Error for Error {}

impl From<IOError> for Error {
    fn from(value: IOError) -> Self {
        Error::Io(value)
    }
}

impl From<xdg::BaseDirectoriesError> for Error {
    fn from(value: xdg::BaseDirectoriesError) -> Self {
        Error::Config(format!("Couldn't resolve XDG directories: {value}"))
    }
}
