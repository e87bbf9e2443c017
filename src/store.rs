//! Async facade over the note table, with live list queries

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::db::Database;
use crate::error::Result;
use crate::models::Note;

/// Handle to the note store. Cheap to clone; all clones share one
/// connection. Storage work runs on the blocking pool so a UI-bound caller
/// never blocks on I/O.
#[derive(Clone)]
pub struct NoteStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    db: Mutex<Database>,
    watchers: Mutex<Vec<Watcher>>,
}

struct Watcher {
    search: Option<String>,
    tx: watch::Sender<Vec<Note>>,
}

/// Live query handle. Holds the latest delivered sequence; dropping it
/// cancels the subscription.
pub struct NoteWatch {
    rx: watch::Receiver<Vec<Note>>,
}

impl NoteWatch {
    /// The latest delivered sequence.
    pub fn current(&self) -> Vec<Note> {
        self.rx.borrow().clone()
    }

    /// Resolves after the next re-delivery. Returns false once the store is
    /// gone and no further deliveries can happen.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl NoteStore {
    /// Open the store at the default on-device path.
    pub fn open() -> Result<Self> {
        Ok(Self::wrap(Database::open()?))
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        Ok(Self::wrap(Database::open_at(path)?))
    }

    /// In-memory store for testing
    pub fn open_memory() -> Result<Self> {
        Ok(Self::wrap(Database::open_memory()?))
    }

    fn wrap(db: Database) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                db: Mutex::new(db),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Insert a new record when the note has no identity, else replace the
    /// record with the matching identity. Returns the stored identity.
    pub async fn upsert(&self, note: &Note) -> Result<i64> {
        let entity = note.to_entity();
        self.run(move |inner| {
            let db = inner.db.lock().unwrap();
            let id = db.upsert_note(&entity)?;
            inner.notify(&db);
            Ok(id)
        })
        .await
    }

    /// Remove the note's record. A note with no identity or an
    /// already-absent record is a no-op.
    pub async fn delete(&self, note: &Note) -> Result<()> {
        let Some(id) = note.id else {
            return Ok(());
        };
        self.run(move |inner| {
            let db = inner.db.lock().unwrap();
            db.delete_note(id)?;
            inner.notify(&db);
            Ok(())
        })
        .await
    }

    /// Atomically flip the persisted favourite flag for the note's
    /// identity. A note with no identity is a no-op.
    pub async fn toggle_favourite(&self, note: &Note) -> Result<()> {
        let Some(id) = note.id else {
            log::debug!("favourite toggle on unsaved note ignored");
            return Ok(());
        };
        self.run(move |inner| {
            let db = inner.db.lock().unwrap();
            db.switch_favourite(id)?;
            inner.notify(&db);
            Ok(())
        })
        .await
    }

    /// Fetch one note. `StoreError::NotFound` when absent.
    pub async fn get(&self, id: i64) -> Result<Note> {
        self.run(move |inner| {
            let db = inner.db.lock().unwrap();
            let entity = db.get_note(id)?;
            Ok(Note::from_entity(&entity))
        })
        .await
    }

    /// One-shot snapshot: all notes ordered by save date descending,
    /// optionally filtered by a search term (title or text, ASCII
    /// case-insensitive).
    pub async fn list_ordered(&self, search: Option<String>) -> Result<Vec<Note>> {
        self.run(move |inner| {
            let db = inner.db.lock().unwrap();
            let entities = db.list_notes(search.as_deref())?;
            Ok(entities.iter().map(Note::from_entity).collect())
        })
        .await
    }

    /// Live query: the returned handle starts with the current sequence for
    /// `search` and is re-delivered the full updated sequence after every
    /// mutation through this store. Dropping the handle unsubscribes.
    pub async fn watch(&self, search: Option<String>) -> Result<NoteWatch> {
        self.run(move |inner| {
            let db = inner.db.lock().unwrap();
            let initial: Vec<Note> = db
                .list_notes(search.as_deref())?
                .iter()
                .map(Note::from_entity)
                .collect();

            let (tx, rx) = watch::channel(initial);
            inner.watchers.lock().unwrap().push(Watcher { search, tx });
            Ok(NoteWatch { rx })
        })
        .await
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&StoreInner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner)).await?
    }
}

impl StoreInner {
    /// Re-deliver every active subscription. Runs with the connection lock
    /// held, so deliveries observe mutations in program order.
    fn notify(&self, db: &Database) {
        let mut watchers = self.watchers.lock().unwrap();
        watchers.retain(|w| !w.tx.is_closed());

        for watcher in watchers.iter() {
            match db.list_notes(watcher.search.as_deref()) {
                Ok(entities) => {
                    let notes: Vec<Note> = entities.iter().map(Note::from_entity).collect();
                    let _ = watcher.tx.send(notes);
                }
                Err(e) => log::warn!("live query refresh failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, NO_IMAGE};
    use chrono::DateTime;

    fn note(title: &str, text: &str, secs: i64) -> Note {
        Note::new(
            title.to_string(),
            text.to_string(),
            Color::BLACK,
            NO_IMAGE.to_string(),
            DateTime::from_timestamp(secs, 0).unwrap(),
            false,
        )
    }

    #[tokio::test]
    async fn test_upsert_then_get_round_trips() {
        let store = NoteStore::open_memory().unwrap();

        let draft = note("Groceries", "milk\neggs", 100);
        let id = store.upsert(&draft).await.unwrap();

        let stored = store.get(id).await.unwrap();
        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.title(), draft.title());
        assert_eq!(stored.text, draft.text);
        assert_eq!(stored.color, draft.color);
        assert_eq!(stored.image, draft.image);
        assert_eq!(stored.date, draft.date);
        assert_eq!(stored.is_favourite, draft.is_favourite);
    }

    #[tokio::test]
    async fn test_list_ordered_newest_first() {
        let store = NoteStore::open_memory().unwrap();

        store.upsert(&note("older", "b", 100)).await.unwrap();
        store.upsert(&note("newer", "b", 200)).await.unwrap();

        let notes = store.list_ordered(None).await.unwrap();
        assert_eq!(notes[0].title(), "newer");
        assert_eq!(notes[1].title(), "older");
    }

    #[tokio::test]
    async fn test_watch_delivers_after_each_mutation() {
        let store = NoteStore::open_memory().unwrap();

        let mut watch = store.watch(None).await.unwrap();
        assert!(watch.current().is_empty());

        let id = store.upsert(&note("t", "b", 100)).await.unwrap();
        assert!(watch.changed().await);
        assert_eq!(watch.current().len(), 1);

        let stored = store.get(id).await.unwrap();
        store.delete(&stored).await.unwrap();
        assert!(watch.changed().await);
        assert!(watch.current().is_empty());
    }

    #[tokio::test]
    async fn test_watch_sees_awaited_writes_immediately() {
        let store = NoteStore::open_memory().unwrap();

        let watch = store.watch(None).await.unwrap();
        store.upsert(&note("t", "b", 100)).await.unwrap();

        // A completed write has already been delivered
        assert_eq!(watch.current().len(), 1);
    }

    #[tokio::test]
    async fn test_watch_applies_search_filter() {
        let store = NoteStore::open_memory().unwrap();

        let mut watch = store.watch(Some("milk".to_string())).await.unwrap();

        store.upsert(&note("Groceries", "milk and eggs", 100)).await.unwrap();
        assert!(watch.changed().await);
        assert_eq!(watch.current().len(), 1);

        store.upsert(&note("unrelated", "nothing", 200)).await.unwrap();
        assert!(watch.changed().await);
        assert_eq!(watch.current().len(), 1);
        assert_eq!(watch.current()[0].title(), "Groceries");
    }

    #[tokio::test]
    async fn test_dropped_watch_is_pruned() {
        let store = NoteStore::open_memory().unwrap();

        let watch = store.watch(None).await.unwrap();
        drop(watch);

        store.upsert(&note("t", "b", 100)).await.unwrap();
        assert!(store.inner.watchers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unsaved_note_is_noop() {
        let store = NoteStore::open_memory().unwrap();

        store.delete(&note("t", "b", 100)).await.unwrap();
        store.toggle_favourite(&note("t", "b", 100)).await.unwrap();
    }

    #[tokio::test]
    async fn test_toggle_favourite_persists() {
        let store = NoteStore::open_memory().unwrap();

        let id = store.upsert(&note("t", "b", 100)).await.unwrap();
        let stored = store.get(id).await.unwrap();

        store.toggle_favourite(&stored).await.unwrap();
        assert!(store.get(id).await.unwrap().is_favourite);

        store.toggle_favourite(&stored).await.unwrap();
        assert!(!store.get(id).await.unwrap().is_favourite);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_do_not_lose_updates() {
        let store = NoteStore::open_memory().unwrap();

        let id = store.upsert(&note("t", "b", 100)).await.unwrap();
        let stored = store.get(id).await.unwrap();

        let (a, b) = tokio::join!(
            store.toggle_favourite(&stored),
            store.toggle_favourite(&stored)
        );
        a.unwrap();
        b.unwrap();

        // Two racing toggles land as two flips, never a lost update
        assert!(!store.get(id).await.unwrap().is_favourite);
    }
}
