use std::fmt::Display;

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;

/// Longest title accepted for a new entry, in characters.
pub(crate) const MAX_TITLE_LEN: usize = 20;

/// Combining long stroke overlay, drawn through the preceding character.
const STRIKE: char = '\u{0336}';

pub(crate) type EntryId = i64;

/// A stored to-do item. Only the store hands these out, so `id` is always
/// one the database assigned.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Entry {
    id: EntryId,
    created: DateTime<Utc>,
    title: String,
    note: Option<String>,
    done: bool,
}

impl Entry {
    pub(crate) fn new(
        id: EntryId,
        created: DateTime<Utc>,
        title: String,
        note: Option<String>,
        done: bool,
    ) -> Self {
        Entry {
            id,
            created,
            title,
            note,
            done,
        }
    }

    pub(crate) fn id(&self) -> EntryId {
        self.id
    }

    pub(crate) fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.done {
            return write!(f, "{}", self.title);
        }
        for c in self.title.chars() {
            write!(f, "{c}{STRIKE}")?;
        }
        Ok(())
    }
}

/// Columns a client may write. `ID` only ever comes from the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Column {
    Created,
    Title,
    Note,
    Done,
}

impl Column {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Column::Created => "CREATED",
            Column::Title => "TITLE",
            Column::Note => "NOTE",
            Column::Done => "DONE",
        }
    }
}

/// An entry that hasn't been stored yet.
#[derive(Clone, Debug)]
pub(crate) struct NewEntry {
    title: String,
    note: Option<String>,
    created: DateTime<Utc>,
}

impl NewEntry {
    /// Validates the title and normalizes a blank note to `None`.
    pub(crate) fn new(title: &str, note: Option<&str>) -> Result<Self> {
        let title = validate_title(title)?;
        let note = note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from);
        Ok(NewEntry {
            title: title.to_string(),
            note,
            created: Utc::now(),
        })
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Column to value mapping for the insert statement. The note column
    /// is left out when there is no note.
    pub(crate) fn fields(&self) -> Vec<(Column, Value)> {
        let mut fields = vec![
            (
                Column::Created,
                // Same text form rusqlite uses for `DateTime<Utc>`.
                Value::Text(self.created.format("%F %T%.f%:z").to_string()),
            ),
            (Column::Title, Value::Text(self.title.clone())),
        ];
        if let Some(note) = &self.note {
            fields.push((Column::Note, Value::Text(note.clone())));
        }
        fields.push((Column::Done, Value::Integer(0)));
        fields
    }
}

/// Returns the trimmed title if it is between 1 and `MAX_TITLE_LEN`
/// characters long.
pub(crate) fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(Error::InvalidTitle(len));
    }
    Ok(title)
}
