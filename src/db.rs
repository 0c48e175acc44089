use crate::{
    error::{Error, Result},
    types::{Entry, EntryId, NewEntry},
};
use log::{debug, error, warn};
use rusqlite::{params_from_iter, Connection, Error as SQLiteError, Params, Result as SQLiteResult, Row};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

impl From<SQLiteError> for Error {
    fn from(value: SQLiteError) -> Self {
        Error::Database(format!("There was a database error: {value:?}"))
    }
}

const INITIALIZE: &str = "
CREATE TABLE IF NOT EXISTS 'ENTRY' (
	'ID'	INTEGER PRIMARY KEY,
	'CREATED'	TEXT NOT NULL,
	'TITLE'	TEXT NOT NULL,
	'NOTE'	TEXT,
	'DONE'	INTEGER NOT NULL DEFAULT 0
);
";

const SELECT_ALL: &str = "SELECT ID, CREATED, TITLE, NOTE, DONE FROM ENTRY ORDER BY ID";

/// Handle on the single-file entry database.
///
/// Every operation opens its own connection, runs one statement and closes
/// it again. None of the public operations fail outward: faults are logged
/// and reported as `false` or `None`.
pub(crate) struct Store {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Store {
    pub(crate) fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Store {
        Store {
            path: path.into(),
            busy_timeout,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Runs a parameterized statement, returning the number of affected rows.
    fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let conn = self.connect()?;
        debug!("Executing {sql}");
        let rows = conn.execute(sql, params)?;
        Ok(rows)
    }

    /// Runs a parameterized query, mapping every returned row with `f`.
    fn select<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> SQLiteResult<T>,
    {
        let conn = self.connect()?;
        debug!("Querying {sql}");
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, f)?.collect::<SQLiteResult<Vec<T>>>()?;
        Ok(rows)
    }

    /// Logs a failed write and flattens the outcome to "did it touch a row".
    fn report(&self, action: &str, outcome: Result<usize>) -> bool {
        match outcome {
            Ok(0) => {
                warn!("{action}: no matching entry in {:?}", self.path);
                false
            }
            Ok(_) => true,
            Err(err) => {
                error!("{action} failed: {err}");
                false
            }
        }
    }

    /// Creates the entry table if it's missing.
    pub(crate) fn ensure_schema(&self) -> bool {
        debug!("Initializing database at {:?}", self.path);
        match self.execute(INITIALIZE, ()) {
            Ok(_) => true,
            Err(err) => {
                error!("Database initialization failed: {err}");
                false
            }
        }
    }

    pub(crate) fn insert(&self, entry: &NewEntry) -> bool {
        let (columns, values): (Vec<_>, Vec<_>) = entry.fields().into_iter().unzip();
        let sql = format!(
            "INSERT INTO ENTRY({}) VALUES({})",
            columns
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; values.len()].join(", ")
        );
        self.report("Insert", self.execute(&sql, params_from_iter(values)))
    }

    pub(crate) fn delete(&self, id: EntryId) -> bool {
        self.report(
            &format!("Delete of entry {id}"),
            self.execute("DELETE FROM ENTRY WHERE ID = ?", (id,)),
        )
    }

    pub(crate) fn set_done(&self, id: EntryId, done: bool) -> bool {
        self.report(
            &format!("Status update of entry {id}"),
            self.execute("UPDATE ENTRY SET DONE = ? WHERE ID = ?", (done, id)),
        )
    }

    /// Every entry in insertion order, or `None` if they couldn't be read.
    pub(crate) fn list_all(&self) -> Option<Vec<Entry>> {
        let rows = self.select(SELECT_ALL, (), |row| {
            Ok(Entry::new(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        });
        match rows {
            Ok(entries) => {
                debug!("Read {} entries", entries.len());
                Some(entries)
            }
            Err(err) => {
                error!("Listing entries failed: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("todo.db"), Duration::from_millis(500));
        assert!(store.ensure_schema());
        (dir, store)
    }

    fn add(store: &Store, title: &str, note: Option<&str>) {
        assert!(store.insert(&NewEntry::new(title, note).unwrap()));
    }

    #[test]
    fn insert_then_list() {
        let (_dir, store) = store();
        add(&store, "milk", Some("2 litres"));
        let entries = store.list_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title(), "milk");
        assert_eq!(entries[0].note(), Some("2 litres"));
        assert!(!entries[0].is_done());
    }

    #[test]
    fn ids_come_from_the_store() {
        let (_dir, store) = store();
        add(&store, "one", None);
        add(&store, "two", None);
        let entries = store.list_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_ne!(entries[0].id(), entries[1].id());
        assert_eq!(entries[1].title(), "two");
        assert_eq!(entries[1].note(), None);
    }

    #[test]
    fn created_timestamp_survives() {
        let (_dir, store) = store();
        let entry = NewEntry::new("stamp", None).unwrap();
        assert!(store.insert(&entry));
        let read = &store.list_all().unwrap()[0];
        let drift = (read.created() - chrono::Utc::now()).num_seconds().abs();
        assert!(drift < 60);
    }

    #[test]
    fn schema_is_idempotent() {
        let (_dir, store) = store();
        assert!(store.ensure_schema());
        assert!(store.ensure_schema());

        let conn = Connection::open(store.path()).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'ENTRY'",
                (),
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('ENTRY')").unwrap();
        let columns: Vec<String> = stmt
            .query_map((), |row| row.get(0))
            .unwrap()
            .collect::<SQLiteResult<_>>()
            .unwrap();
        assert_eq!(columns, vec!["ID", "CREATED", "TITLE", "NOTE", "DONE"]);
    }

    #[test]
    fn deleting_missing_id_fails_and_keeps_entries() {
        let (_dir, store) = store();
        add(&store, "keep", None);
        let before = store.list_all().unwrap();
        assert!(!store.delete(before[0].id() + 100));
        assert_eq!(store.list_all().unwrap(), before);
    }

    #[test]
    fn delete_removes_only_that_entry() {
        let (_dir, store) = store();
        add(&store, "first", None);
        add(&store, "second", None);
        let id = store.list_all().unwrap()[0].id();
        assert!(store.delete(id));
        let entries = store.list_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title(), "second");
    }

    #[test]
    fn toggling_twice_restores_flag() {
        let (_dir, store) = store();
        add(&store, "flip", None);
        let id = store.list_all().unwrap()[0].id();
        assert!(store.set_done(id, true));
        assert!(store.list_all().unwrap()[0].is_done());
        assert!(store.set_done(id, false));
        assert!(!store.list_all().unwrap()[0].is_done());
    }

    #[test]
    fn updating_missing_id_fails() {
        let (_dir, store) = store();
        assert!(!store.set_done(42, true));
    }

    #[test]
    fn unreachable_database_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(
            dir.path().join("missing").join("todo.db"),
            Duration::from_millis(10),
        );
        assert!(!store.ensure_schema());
        assert!(store.list_all().is_none());
        assert!(!store.insert(&NewEntry::new("lost", None).unwrap()));
        assert!(!store.delete(1));
        assert!(!store.set_done(1, true));
    }

    #[test]
    fn listing_without_schema_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("todo.db"), Duration::from_millis(10));
        assert!(store.list_all().is_none());
    }
}
