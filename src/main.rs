mod app;
mod commands;
mod config;
mod db;
mod error;
mod types;
mod views;
use crate::app::{App, AppEvent};
use crate::error::Result;
use crate::views::home::{render_home, AppState};
use crate::{config::Config, db::Store};
use crossbeam::channel::{unbounded, Receiver};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use log::debug;
use ratatui::prelude::{Backend, CrosstermBackend, Terminal};
use std::{fs::OpenOptions, io::stdout};

/// Logs go to the state directory so they don't scribble over the screen.
fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    let log_file = config::get_log_file().and_then(|path| {
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    });
    if let Ok(file) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &Receiver<AppEvent>,
    config: &Config,
) -> Result<()> {
    let mut next = AppState::Home;
    loop {
        match next {
            AppState::Home => next = render_home(terminal, app, events, config)?,
            AppState::Exit => break,
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let config = Config::load()?;
    debug!("Using database {:?}", config.database);
    let (tx, rx) = unbounded();
    let mut app = App::new(Store::new(&config.database, config.busy_timeout), tx);

    stdout().execute(EnterAlternateScreen)?;
    enable_raw_mode()?;
    stdout().execute(EnableMouseCapture)?;

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let outcome = run(&mut terminal, &mut app, &rx, &config);

    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    outcome
}
