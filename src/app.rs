use crate::{
    db::Store,
    types::{Entry, NewEntry},
};
use crossbeam::channel::Sender;
use log::{debug, warn};

/// What the view hears back from the controller.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AppEvent {
    /// The entry list was re-read and should be redrawn.
    Changed,
    /// Something went wrong; the message is meant for the user.
    Failed(String),
}

/// Owns the store handle and a cache of the last full read.
///
/// Positions passed in are indexes into that cache, not store ids. Every
/// mutation goes to the store, then the whole list is read back.
pub(crate) struct App {
    store: Store,
    entries: Vec<Entry>,
    events: Sender<AppEvent>,
}

impl App {
    pub(crate) fn new(store: Store, events: Sender<AppEvent>) -> App {
        debug!("Opening store at {:?}", store.path());
        let app = App {
            store,
            entries: Vec::new(),
            events,
        };
        if !app.store.ensure_schema() {
            app.emit(AppEvent::Failed("Database verification failed".into()));
        }
        app
    }

    fn emit(&self, event: AppEvent) {
        if let Err(err) = self.events.send(event) {
            warn!("Nobody is listening for {:?}", err.into_inner());
        }
    }

    fn fail(&self, msg: impl Into<String>) {
        self.emit(AppEvent::Failed(msg.into()));
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn display_strings(&self) -> Vec<String> {
        self.entries.iter().map(Entry::to_string).collect()
    }

    pub(crate) fn is_done(&self, index: usize) -> Option<bool> {
        self.entries.get(index).map(Entry::is_done)
    }

    fn entry_at(&self, index: usize) -> Option<&Entry> {
        let entry = self.entries.get(index);
        if entry.is_none() {
            self.fail(format!("No entry at position {}", index.saturating_add(1)));
        }
        entry
    }

    /// Validates and stores a new entry. An invalid title never reaches the
    /// store.
    pub(crate) fn add(&mut self, title: &str, note: Option<&str>) {
        let entry = match NewEntry::new(title, note) {
            Ok(entry) => entry,
            Err(err) => {
                self.fail(err.to_string());
                return;
            }
        };
        debug!("Adding {:?} ({:?})", entry.title(), entry.note());
        if !self.store.insert(&entry) {
            self.fail("Failed to add entry");
        }
        self.refresh();
    }

    pub(crate) fn remove(&mut self, index: usize) {
        let Some(id) = self.entry_at(index).map(Entry::id) else {
            return;
        };
        debug!("Removing entry {id}");
        if !self.store.delete(id) {
            self.fail("Failed to remove entry");
        }
        self.refresh();
    }

    pub(crate) fn set_status(&mut self, index: usize, done: bool) {
        let Some(id) = self.entry_at(index).map(Entry::id) else {
            return;
        };
        debug!("Marking entry {id} done={done}");
        if !self.store.set_done(id, done) {
            self.fail("Failed to update entry");
        }
        self.refresh();
    }

    /// Throws the cache away and reads every entry back from the store.
    pub(crate) fn refresh(&mut self) {
        self.entries.clear();
        match self.store.list_all() {
            Some(entries) => {
                self.entries = entries;
                self.emit(AppEvent::Changed);
            }
            None => self.fail("Failed to load entries"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::{unbounded, Receiver};
    use std::time::Duration;
    use tempfile::TempDir;

    fn app() -> (TempDir, App, Receiver<AppEvent>) {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = unbounded();
        let store = Store::new(dir.path().join("todo.db"), Duration::from_millis(500));
        let mut app = App::new(store, tx);
        app.refresh();
        assert_eq!(drain(&rx), vec![AppEvent::Changed]);
        (dir, app, rx)
    }

    fn drain(rx: &Receiver<AppEvent>) -> Vec<AppEvent> {
        rx.try_iter().collect()
    }

    fn side_store(dir: &TempDir) -> Store {
        Store::new(dir.path().join("todo.db"), Duration::from_millis(500))
    }

    #[test]
    fn add_refreshes_the_cache() {
        let (_dir, mut app, rx) = app();
        app.add("milk", Some("oat"));
        assert_eq!(drain(&rx), vec![AppEvent::Changed]);
        assert_eq!(app.entries().len(), 1);
        assert_eq!(app.entries()[0].title(), "milk");
        assert_eq!(app.entries()[0].note(), Some("oat"));
        assert_eq!(app.is_done(0), Some(false));
    }

    #[test]
    fn invalid_title_never_reaches_the_store() {
        let (dir, mut app, rx) = app();
        app.add("", None);
        app.add("this title is far too long", None);
        let events = drain(&rx);
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, AppEvent::Failed(_))));
        assert!(side_store(&dir).list_all().unwrap().is_empty());
    }

    #[test]
    fn titles_are_stored_verbatim_up_to_the_limit() {
        let (dir, mut app, rx) = app();
        app.add("'); DROP TABLE ENTRY;--", None);
        app.add("abcdefghijklmnopqrstu", None);
        assert_eq!(
            drain(&rx),
            vec![
                AppEvent::Failed("Title is 23 characters long, the limit is 20".into()),
                AppEvent::Failed("Title is 21 characters long, the limit is 20".into()),
            ]
        );
        assert!(side_store(&dir).list_all().unwrap().is_empty());

        app.add("'); DROP TABLE E;--", None);
        assert_eq!(drain(&rx), vec![AppEvent::Changed]);
        let stored = side_store(&dir).list_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title(), "'); DROP TABLE E;--");
        assert_eq!(stored[0].id(), app.entries()[0].id());

        app.remove(1);
        assert_eq!(
            drain(&rx),
            vec![AppEvent::Failed("No entry at position 2".into())]
        );
        assert_eq!(side_store(&dir).list_all().unwrap().len(), 1);
    }

    #[test]
    fn positions_map_to_store_ids() {
        let (dir, mut app, rx) = app();
        app.add("first", None);
        app.add("second", None);
        app.add("third", None);
        drain(&rx);

        app.remove(1);
        assert_eq!(drain(&rx), vec![AppEvent::Changed]);
        let titles: Vec<&str> = app.entries().iter().map(Entry::title).collect();
        assert_eq!(titles, vec!["first", "third"]);

        app.set_status(1, true);
        assert_eq!(drain(&rx), vec![AppEvent::Changed]);
        let stored = side_store(&dir).list_all().unwrap();
        assert!(!stored[0].is_done());
        assert!(stored[1].is_done());
        assert_eq!(stored[1].title(), "third");
    }

    #[test]
    fn toggling_twice_restores_the_flag() {
        let (_dir, mut app, rx) = app();
        app.add("flip", None);
        app.set_status(0, true);
        assert_eq!(app.is_done(0), Some(true));
        app.set_status(0, false);
        assert_eq!(app.is_done(0), Some(false));
        assert!(drain(&rx).iter().all(|e| *e == AppEvent::Changed));
    }

    #[test]
    fn out_of_range_position_fails_without_store_call() {
        let (_dir, mut app, rx) = app();
        app.remove(0);
        app.set_status(3, true);
        assert_eq!(
            drain(&rx),
            vec![
                AppEvent::Failed("No entry at position 1".into()),
                AppEvent::Failed("No entry at position 4".into()),
            ]
        );
    }

    #[test]
    fn failed_store_call_still_refreshes() {
        let (dir, mut app, rx) = app();
        app.add("stale", None);
        drain(&rx);
        let id = app.entries()[0].id();
        assert!(side_store(&dir).delete(id));

        app.set_status(0, true);
        assert_eq!(
            drain(&rx),
            vec![
                AppEvent::Failed("Failed to update entry".into()),
                AppEvent::Changed,
            ]
        );
        assert!(app.entries().is_empty());
    }

    #[test]
    fn unreadable_store_clears_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = unbounded();
        let store = Store::new(
            dir.path().join("missing").join("todo.db"),
            Duration::from_millis(10),
        );
        let mut app = App::new(store, tx);
        app.refresh();
        assert_eq!(
            drain(&rx),
            vec![
                AppEvent::Failed("Database verification failed".into()),
                AppEvent::Failed("Failed to load entries".into()),
            ]
        );
        assert!(app.entries().is_empty());
    }

    #[test]
    fn display_strings_follow_the_cache() {
        let (_dir, mut app, _rx) = app();
        app.add("ab", None);
        app.add("cd", None);
        app.set_status(1, true);
        assert_eq!(app.display_strings(), vec!["ab", "c\u{0336}d\u{0336}"]);
    }
}
