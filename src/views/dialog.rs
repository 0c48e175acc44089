use crate::types::validate_title;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tui_textarea::{Input, Key, TextArea};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Field {
    Title,
    Note,
}

pub(crate) enum FormOutcome {
    Open,
    Cancel,
    Save { title: String, note: Option<String> },
}

/// Modal form collecting a title and an optional note.
pub(crate) struct AddForm {
    title: TextArea<'static>,
    note: TextArea<'static>,
    focus: Field,
    error: Option<String>,
}

fn field(label: &'static str, placeholder: &'static str) -> TextArea<'static> {
    let mut area = TextArea::default();
    area.set_cursor_line_style(Style::default());
    area.set_placeholder_text(placeholder);
    area.set_block(Block::default().borders(Borders::ALL).title(label));
    area
}

impl AddForm {
    pub(crate) fn new() -> Self {
        let mut form = AddForm {
            title: field("Title", "What needs doing?"),
            note: field("Extra info", "Optional"),
            focus: Field::Title,
            error: None,
        };
        form.restyle();
        form
    }

    fn restyle(&mut self) {
        let (focused, blurred) = match self.focus {
            Field::Title => (&mut self.title, &mut self.note),
            Field::Note => (&mut self.note, &mut self.title),
        };
        focused.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
        blurred.set_cursor_style(Style::default());
    }

    pub(crate) fn handle(&mut self, input: Input) -> FormOutcome {
        match input {
            Input { key: Key::Esc, .. } => return FormOutcome::Cancel,
            Input { key: Key::Tab, .. } | Input { key: Key::Up, .. } | Input { key: Key::Down, .. } => {
                self.focus = match self.focus {
                    Field::Title => Field::Note,
                    Field::Note => Field::Title,
                };
                self.restyle();
            }
            Input {
                key: Key::Enter, ..
            } => {
                let title = self.title.lines().join(" ");
                match validate_title(&title) {
                    Ok(title) => {
                        let note = self.note.lines().join(" ");
                        return FormOutcome::Save {
                            title: title.to_string(),
                            note: Some(note).filter(|n| !n.trim().is_empty()),
                        };
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
            }
            input => {
                let changed = match self.focus {
                    Field::Title => self.title.input(input),
                    Field::Note => self.note.input(input),
                };
                if changed {
                    self.error = None;
                }
            }
        }
        FormOutcome::Open
    }

    pub(crate) fn draw(&self, frame: &mut Frame, area: Rect) {
        let popup = centered(area, 40, 10);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("New ToDo!")
            .title_alignment(Alignment::Center);
        let inner = block.inner(popup);
        frame.render_widget(Clear, popup);
        frame.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);
        frame.render_widget(self.title.widget(), chunks[0]);
        frame.render_widget(self.note.widget(), chunks[1]);
        if let Some(error) = &self.error {
            frame.render_widget(
                Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
                chunks[2],
            );
        }
        frame.render_widget(
            Paragraph::new("Enter save · Tab switch · Esc cancel")
                .style(Style::default().add_modifier(Modifier::DIM)),
            chunks[3],
        );
    }
}

/// Yes/no prompts and error boxes.
pub(crate) fn draw_message(frame: &mut Frame, title: &str, body: &str, hint: &str) {
    let popup = centered(frame.size(), 44, 7);
    frame.render_widget(Clear, popup);
    let text = vec![
        Line::from(body.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            hint.to_string(),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title.to_string()),
            ),
        popup,
    );
}

/// A `width` x `height` rectangle in the middle of `area`, clipped to it.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
