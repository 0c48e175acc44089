const APP_PREFIX: &str = "todo";
const DATABASE: &str = "todo.db";
const LOG: &str = "todo.log";
use crate::error::Result;
use std::{path::PathBuf, time::Duration};

pub(crate) struct Config {
    /// Single-file SQLite database holding every entry.
    pub(crate) database: PathBuf,
    /// How long a store call waits on a locked database file.
    pub(crate) busy_timeout: Duration,
    /// Upper bound on the height of the list, in rows.
    pub(crate) list_rows: u16,
    /// Ask before marking a done entry as not done.
    pub(crate) confirm_undone: bool,
    /// Two left clicks on the same row within this window toggle it.
    pub(crate) double_click: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from(DATABASE),
            busy_timeout: Duration::from_millis(500),
            list_rows: 10,
            confirm_undone: true,
            double_click: Duration::from_millis(400),
        }
    }
}

impl Config {
    /// Defaults, with the database placed in the XDG state directory.
    pub(crate) fn load() -> Result<Config> {
        Ok(Config {
            database: get_database_file()?,
            ..Config::default()
        })
    }
}

fn xdg_dirs() -> Result<xdg::BaseDirectories> {
    Ok(xdg::BaseDirectories::with_prefix(APP_PREFIX)?)
}

pub(crate) fn get_database_file() -> Result<PathBuf> {
    Ok(xdg_dirs()?.place_state_file(DATABASE)?)
}

pub(crate) fn get_log_file() -> Result<PathBuf> {
    Ok(xdg_dirs()?.place_state_file(LOG)?)
}
