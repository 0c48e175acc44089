use crate::{
    app::{App, AppEvent},
    commands::{parse_command, Command},
    config::Config,
    error::Result,
    types::Entry,
    views::dialog::{draw_message, AddForm, FormOutcome},
};
use crossbeam::channel::Receiver;
use crossterm::event::{Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use log::debug;
use ratatui::{
    prelude::*,
    style::Style,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::{collections::VecDeque, ops::ControlFlow, time::Instant};
use tui_textarea::{Input, Key, TextArea};

const ACCENT: Color = Color::Rgb(0xff, 0xcc, 0x00);
const HINT: &str = "a add · enter done · d delete · : command · q quit";

pub(crate) enum AppState {
    Home,
    Exit,
}

/// Something waiting on a yes/no answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    Delete(usize),
    Undone(usize),
}

enum Mode {
    Browse,
    Command,
    Adding(AddForm),
    Confirm(Pending),
}

/// Screen regions from the last draw, for mouse hit testing.
#[derive(Default)]
struct Areas {
    close: Rect,
    list: Rect,
    add: Rect,
}

pub(crate) struct HomeView<'c> {
    config: &'c Config,
    mode: Mode,
    list: ListState,
    command: TextArea<'static>,
    status: Option<String>,
    errors: VecDeque<String>,
    areas: Areas,
    last_click: Option<(usize, Instant)>,
}

fn command_editor() -> TextArea<'static> {
    let mut editor = TextArea::default();
    editor.set_cursor_line_style(Style::default());
    editor.set_style(Style::default().fg(Color::White));
    editor.set_block(Block::default().borders(Borders::ALL).title("command"));
    editor
}

fn hit(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
}

/// Rows the list takes up: one per entry, at least one, at most `max`.
fn list_height(entries: usize, max: u16) -> u16 {
    u16::try_from(entries)
        .unwrap_or(u16::MAX)
        .clamp(1, max.max(1))
}

fn entry_item(position: usize, entry: &Entry) -> ListItem<'static> {
    let style = if entry.is_done() {
        Style::default().add_modifier(Modifier::CROSSED_OUT | Modifier::DIM)
    } else {
        Style::default()
    };
    let mut spans = vec![
        Span::styled(format!("{:>2} ", position + 1), Style::default().add_modifier(Modifier::DIM)),
        Span::styled(entry.title().to_string(), style),
    ];
    if let Some(note) = entry.note() {
        spans.push(Span::styled(
            format!("  {note}"),
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        ));
    }
    ListItem::new(Line::from(spans))
}

impl<'c> HomeView<'c> {
    pub(crate) fn new(config: &'c Config) -> Self {
        HomeView {
            config,
            mode: Mode::Browse,
            list: ListState::default(),
            command: command_editor(),
            status: None,
            errors: VecDeque::new(),
            areas: Areas::default(),
            last_click: None,
        }
    }

    /// Applies everything the controller reported since the last call.
    pub(crate) fn sync(&mut self, app: &App, events: &Receiver<AppEvent>) {
        for event in events.try_iter() {
            match event {
                AppEvent::Changed => {
                    let len = app.entries().len();
                    let selected = match self.list.selected() {
                        _ if len == 0 => None,
                        Some(i) => Some(i.min(len - 1)),
                        None => Some(0),
                    };
                    self.list.select(selected);
                }
                AppEvent::Failed(msg) => self.errors.push_back(msg),
            }
        }
    }

    fn select_next(&mut self, app: &App) {
        let len = app.entries().len();
        if len > 0 {
            let next = self.list.selected().map_or(0, |i| (i + 1).min(len - 1));
            self.list.select(Some(next));
        }
    }

    fn select_previous(&mut self, app: &App) {
        if !app.entries().is_empty() {
            let previous = self.list.selected().map_or(0, |i| i.saturating_sub(1));
            self.list.select(Some(previous));
        }
    }

    /// Done entries ask before being reopened.
    fn toggle(&self, index: usize, app: &mut App) -> Mode {
        match app.is_done(index) {
            Some(true) if self.config.confirm_undone => Mode::Confirm(Pending::Undone(index)),
            Some(done) => {
                app.set_status(index, !done);
                Mode::Browse
            }
            None => Mode::Browse,
        }
    }

    /// Turns a 1-based position from the command line into a list index,
    /// defaulting to the selected row.
    fn target(&mut self, position: Option<usize>) -> Option<usize> {
        let index = match position {
            Some(0) => None,
            Some(p) => Some(p - 1),
            None => self.list.selected(),
        };
        if index.is_none() {
            self.status = Some("Pick an entry first, positions start at 1".into());
        }
        index
    }

    pub(crate) fn handle_event(&mut self, event: Event, app: &mut App) -> Option<AppState> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_input(key.into(), app),
            Event::Mouse(mouse) => self.handle_mouse(mouse, app),
            _ => None,
        }
    }

    fn handle_input(&mut self, input: Input, app: &mut App) -> Option<AppState> {
        if self.errors.pop_front().is_some() {
            return None;
        }
        let mode = std::mem::replace(&mut self.mode, Mode::Browse);
        let next = match mode {
            Mode::Browse => self.browse(input, app),
            Mode::Command => self.command_line(input, app),
            Mode::Adding(mut form) => ControlFlow::Continue(match form.handle(input) {
                FormOutcome::Open => Mode::Adding(form),
                FormOutcome::Cancel => Mode::Browse,
                FormOutcome::Save { title, note } => {
                    app.add(&title, note.as_deref());
                    self.list.select(app.entries().len().checked_sub(1));
                    Mode::Browse
                }
            }),
            Mode::Confirm(pending) => ControlFlow::Continue(self.confirm(pending, input, app)),
        };
        match next {
            ControlFlow::Continue(mode) => {
                self.mode = mode;
                None
            }
            ControlFlow::Break(state) => Some(state),
        }
    }

    fn browse(&mut self, input: Input, app: &mut App) -> ControlFlow<AppState, Mode> {
        self.status = None;
        let selected = self.list.selected();
        let mode = match input {
            Input { key: Key::Esc, .. } | Input { key: Key::Char('q'), .. } => {
                return ControlFlow::Break(AppState::Exit)
            }
            Input { key: Key::Up, .. } | Input { key: Key::Char('k'), .. } => {
                self.select_previous(app);
                Mode::Browse
            }
            Input { key: Key::Down, .. } | Input { key: Key::Char('j'), .. } => {
                self.select_next(app);
                Mode::Browse
            }
            Input { key: Key::Enter, .. } | Input { key: Key::Char(' '), .. } => match selected {
                Some(index) => self.toggle(index, app),
                None => Mode::Browse,
            },
            Input { key: Key::Delete, .. } | Input { key: Key::Char('d'), .. } => match selected {
                Some(index) => Mode::Confirm(Pending::Delete(index)),
                None => Mode::Browse,
            },
            Input { key: Key::Char('a'), .. } | Input { key: Key::Char('+'), .. } => {
                Mode::Adding(AddForm::new())
            }
            Input { key: Key::Char(':'), .. } => Mode::Command,
            Input { key: Key::Char('r'), .. } => {
                app.refresh();
                Mode::Browse
            }
            _ => Mode::Browse,
        };
        ControlFlow::Continue(mode)
    }

    fn command_line(&mut self, input: Input, app: &mut App) -> ControlFlow<AppState, Mode> {
        match input {
            Input { key: Key::Esc, .. } => {
                self.command = command_editor();
                ControlFlow::Continue(Mode::Browse)
            }
            Input {
                key: Key::Enter, ..
            } => {
                let line = self.command.lines().join(" ");
                self.command = command_editor();
                match parse_command(&line) {
                    Ok(command) => self.run(command, app),
                    Err(err) => {
                        self.status = Some(err.to_string());
                        ControlFlow::Continue(Mode::Browse)
                    }
                }
            }
            input => {
                self.command.input(input);
                ControlFlow::Continue(Mode::Command)
            }
        }
    }

    fn run(&mut self, command: Command, app: &mut App) -> ControlFlow<AppState, Mode> {
        debug!("Running {command:?}");
        let mode = match command {
            Command::Add { title, note } => {
                app.add(&title, note.as_deref());
                Mode::Browse
            }
            Command::Done(position) => {
                if let Some(index) = self.target(position) {
                    app.set_status(index, true);
                }
                Mode::Browse
            }
            Command::Undo(position) => {
                if let Some(index) = self.target(position) {
                    app.set_status(index, false);
                }
                Mode::Browse
            }
            Command::Remove(position) => match self.target(position) {
                Some(index) => Mode::Confirm(Pending::Delete(index)),
                None => Mode::Browse,
            },
            Command::Reload => {
                app.refresh();
                Mode::Browse
            }
            Command::Quit => return ControlFlow::Break(AppState::Exit),
        };
        ControlFlow::Continue(mode)
    }

    fn confirm(&mut self, pending: Pending, input: Input, app: &mut App) -> Mode {
        match input {
            Input { key: Key::Char('y'), .. }
            | Input { key: Key::Char('Y'), .. }
            | Input { key: Key::Enter, .. } => {
                match pending {
                    Pending::Delete(index) => app.remove(index),
                    Pending::Undone(index) => app.set_status(index, false),
                }
                Mode::Browse
            }
            Input { key: Key::Char('n'), .. }
            | Input { key: Key::Char('N'), .. }
            | Input { key: Key::Esc, .. } => Mode::Browse,
            _ => Mode::Confirm(pending),
        }
    }

    fn row_at(&self, column: u16, row: u16, app: &App) -> Option<usize> {
        if !hit(self.areas.list, column, row) {
            return None;
        }
        let index = (row - self.areas.list.y) as usize + self.list.offset();
        (index < app.entries().len()).then_some(index)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, app: &mut App) -> Option<AppState> {
        // Dialogs are modal.
        if !self.errors.is_empty() || !matches!(self.mode, Mode::Browse) {
            return None;
        }
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if hit(self.areas.close, column, row) {
                    return Some(AppState::Exit);
                }
                if hit(self.areas.add, column, row) {
                    self.mode = Mode::Adding(AddForm::new());
                    return None;
                }
                let index = self.row_at(column, row, app)?;
                self.list.select(Some(index));
                let now = Instant::now();
                let double = matches!(self.last_click,
                    Some((last, at)) if last == index && now.duration_since(at) <= self.config.double_click);
                if double {
                    self.last_click = None;
                    self.mode = self.toggle(index, app);
                } else {
                    self.last_click = Some((index, now));
                }
            }
            MouseEventKind::Down(MouseButton::Right) => {
                let index = self.row_at(column, row, app)?;
                self.list.select(Some(index));
                self.mode = Mode::Confirm(Pending::Delete(index));
            }
            MouseEventKind::ScrollUp => self.select_previous(app),
            MouseEventKind::ScrollDown => self.select_next(app),
            _ => {}
        }
        None
    }

    pub(crate) fn draw(&mut self, frame: &mut Frame, app: &App) {
        let entries = app.entries();
        let rows = list_height(entries.len(), self.config.list_rows);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(rows + 2),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(frame.size());

        let bar = chunks[0];
        let bar_style = Style::default().bg(ACCENT).fg(Color::Black);
        self.areas.close = Rect {
            x: bar.right().saturating_sub(3),
            width: bar.width.min(3),
            ..bar
        };
        frame.render_widget(Paragraph::new(" ToDo List").style(bar_style), bar);
        frame.render_widget(
            Paragraph::new("[X]").style(bar_style.add_modifier(Modifier::BOLD)),
            self.areas.close,
        );

        let block = Block::default().borders(Borders::ALL).title("tasks");
        self.areas.list = block.inner(chunks[1]);
        let list = List::new(
            entries
                .iter()
                .enumerate()
                .map(|(i, e)| entry_item(i, e))
                .collect::<Vec<_>>(),
        )
        .block(block)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().bg(ACCENT).fg(Color::Black));
        frame.render_stateful_widget(list, chunks[1], &mut self.list);

        self.areas.add = chunks[2];
        frame.render_widget(
            Paragraph::new("[+]")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            chunks[2],
        );

        if let Some(entry) = self.list.selected().and_then(|i| entries.get(i)) {
            let created = entry.created().with_timezone(&chrono::Local);
            frame.render_widget(
                Paragraph::new(format!("created {}", created.format("%Y-%m-%d %H:%M")))
                    .style(Style::default().add_modifier(Modifier::DIM)),
                chunks[3],
            );
        }

        let in_command = matches!(self.mode, Mode::Command);
        self.command.set_cursor_style(if in_command {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        });
        self.command
            .set_placeholder_text(self.status.clone().unwrap_or_else(|| HINT.to_string()));
        frame.render_widget(self.command.widget(), chunks[4]);

        let screen = frame.size();
        match &self.mode {
            Mode::Adding(form) => form.draw(frame, screen),
            Mode::Confirm(Pending::Delete(index)) => {
                let shown = app
                    .display_strings()
                    .get(*index)
                    .cloned()
                    .unwrap_or_else(|| "this entry".to_string());
                draw_message(
                    frame,
                    "Delete",
                    &format!("Are you sure you want to delete {shown}?"),
                    "y yes · n no",
                );
            }
            Mode::Confirm(Pending::Undone(_)) => draw_message(
                frame,
                "Change",
                "Do you want to mark it as not done?",
                "y yes · n no",
            ),
            Mode::Browse | Mode::Command => {}
        }

        if let Some(error) = self.errors.front() {
            draw_message(frame, "Error!", error, "press any key");
        }
    }
}

pub(crate) fn render_home<B>(
    term: &mut Terminal<B>,
    app: &mut App,
    events: &Receiver<AppEvent>,
    config: &Config,
) -> Result<AppState>
where
    B: Backend,
{
    let mut view = HomeView::new(config);
    app.refresh();
    view.sync(app, events);
    loop {
        term.draw(|frame| view.draw(frame, app))?;
        if let Some(next) = view.handle_event(crossterm::event::read()?, app) {
            return Ok(next);
        }
        view.sync(app, events);
    }
}
