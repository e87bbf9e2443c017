//! State holder for the note editor screen

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::error::{Result, StoreError};
use crate::models::{Color, Note, NO_IMAGE, TITLE_MAX_CHARS};
use crate::store::NoteStore;

/// Editor session phases. `Saved` and `Deleted` are terminal: once reached,
/// further saves and deletes are no-ops for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Empty,
    Loading,
    Ready,
    Saved,
    Deleted,
}

/// One note edit session. Owns a transient copy of the note's fields; the
/// persisted record is only touched on an explicit `save` or `delete`.
/// Background fetches are scoped to the session: superseded or abandoned
/// loads are aborted and their results discarded.
pub struct EditorScreenState {
    store: NoteStore,
    fields: Arc<Mutex<Fields>>,
    load_task: Option<JoinHandle<()>>,
}

struct Fields {
    note_id: Option<i64>,
    title: String,
    text: String,
    color: Color,
    image: String,
    is_favourite: bool,
    phase: EditorPhase,
    generation: u64,
    last_error: Option<String>,
}

impl Fields {
    fn reset(&mut self) {
        self.note_id = None;
        self.title.clear();
        self.text.clear();
        self.color = Color::random_opaque();
        self.image = NO_IMAGE.to_string();
        self.is_favourite = false;
        self.phase = EditorPhase::Empty;
        self.generation += 1;
        self.last_error = None;
    }
}

impl EditorScreenState {
    pub fn new(store: NoteStore) -> Self {
        Self {
            store,
            fields: Arc::new(Mutex::new(Fields {
                note_id: None,
                title: String::new(),
                text: String::new(),
                color: Color::BLACK,
                image: NO_IMAGE.to_string(),
                is_favourite: false,
                phase: EditorPhase::Empty,
                generation: 0,
                last_error: None,
            })),
            load_task: None,
        }
    }

    /// Begin an edit session. Resets every field to its default (including
    /// a fresh random color) and, when `id` is present, fetches the record
    /// in the background, populating the fields once it resolves. The
    /// screen may render before that happens. Any previous in-flight fetch
    /// is aborted; a late result is never applied to the new session.
    pub fn load(&mut self, id: Option<i64>) {
        if let Some(task) = self.load_task.take() {
            task.abort();
        }

        let generation = {
            let mut fields = self.fields.lock().unwrap();
            fields.reset();
            fields.note_id = id;
            fields.phase = if id.is_some() {
                EditorPhase::Loading
            } else {
                EditorPhase::Ready
            };
            fields.generation
        };

        let Some(id) = id else {
            return;
        };

        let store = self.store.clone();
        let fields = Arc::clone(&self.fields);
        self.load_task = Some(tokio::spawn(async move {
            let fetched = store.get(id).await;

            let mut fields = fields.lock().unwrap();
            if fields.generation != generation {
                log::debug!("discarding stale load of note {}", id);
                return;
            }
            match fetched {
                Ok(note) => {
                    fields.title = note.title().to_string();
                    fields.text = note.text.clone();
                    fields.color = note.color;
                    fields.image = note.image.clone();
                    fields.is_favourite = note.is_favourite;
                    fields.phase = EditorPhase::Ready;
                }
                Err(e) => {
                    // A vanished note degrades to a fresh session
                    if e.is_not_found() {
                        fields.note_id = None;
                    }
                    fields.phase = EditorPhase::Ready;
                    fields.last_error = Some(e.to_string());
                }
            }
        }));
    }

    /// Await the current session's in-flight fetch, if any.
    pub async fn loaded(&mut self) {
        if let Some(task) = self.load_task.take() {
            let _ = task.await;
        }
    }

    /// Persist the current fields with `date` = now, letting the store
    /// assign an identity when the session has none, and end the session as
    /// `Saved`. A no-op once the session is `Saved` or `Deleted`.
    pub async fn save(&mut self) -> Result<()> {
        let note = {
            let fields = self.fields.lock().unwrap();
            if matches!(fields.phase, EditorPhase::Saved | EditorPhase::Deleted) {
                return Ok(());
            }
            let mut note = Note::new(
                fields.title.clone(),
                fields.text.clone(),
                fields.color,
                fields.image.clone(),
                Utc::now(),
                fields.is_favourite,
            );
            note.id = fields.note_id;
            note
        };

        match self.store.upsert(&note).await {
            Ok(id) => {
                let mut fields = self.fields.lock().unwrap();
                fields.note_id = Some(id);
                fields.phase = EditorPhase::Saved;
                Ok(())
            }
            Err(e) => {
                log::warn!("note save failed: {}", e);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Delete the session's persisted record, if any, and end the session
    /// as `Deleted`. A record already gone is tolerated; with no identity
    /// there is nothing to remove. A no-op once `Saved` or `Deleted`.
    pub async fn delete(&mut self) -> Result<()> {
        let id = {
            let fields = self.fields.lock().unwrap();
            if matches!(fields.phase, EditorPhase::Saved | EditorPhase::Deleted) {
                return Ok(());
            }
            fields.note_id
        };

        if let Some(id) = id {
            match self.store.get(id).await {
                Ok(stored) => {
                    if let Err(e) = self.store.delete(&stored).await {
                        log::warn!("note delete failed: {}", e);
                        self.record_error(&e);
                        return Err(e);
                    }
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    self.record_error(&e);
                    return Err(e);
                }
            }
        }

        self.fields.lock().unwrap().phase = EditorPhase::Deleted;
        Ok(())
    }

    pub fn phase(&self) -> EditorPhase {
        self.fields.lock().unwrap().phase
    }

    pub fn note_id(&self) -> Option<i64> {
        self.fields.lock().unwrap().note_id
    }

    pub fn title(&self) -> String {
        self.fields.lock().unwrap().title.clone()
    }

    /// Set the title, dropping input beyond [`TITLE_MAX_CHARS`] characters.
    /// The store never sees an over-long title from this editor.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title: String = title.into();
        let capped: String = title.chars().take(TITLE_MAX_CHARS).collect();
        self.fields.lock().unwrap().title = capped;
    }

    pub fn text(&self) -> String {
        self.fields.lock().unwrap().text.clone()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.fields.lock().unwrap().text = text.into();
    }

    pub fn color(&self) -> Color {
        self.fields.lock().unwrap().color
    }

    pub fn set_color(&mut self, color: Color) {
        self.fields.lock().unwrap().color = color;
    }

    pub fn image(&self) -> String {
        self.fields.lock().unwrap().image.clone()
    }

    pub fn set_image(&mut self, uri: impl Into<String>) {
        self.fields.lock().unwrap().image = uri.into();
    }

    /// Back to the "no image" sentinel.
    pub fn clear_image(&mut self) {
        self.fields.lock().unwrap().image = NO_IMAGE.to_string();
    }

    pub fn is_favourite(&self) -> bool {
        self.fields.lock().unwrap().is_favourite
    }

    pub fn set_favourite(&mut self, favourite: bool) {
        self.fields.lock().unwrap().is_favourite = favourite;
    }

    /// Last store failure observed by this session, if any. Taking it
    /// clears it.
    pub fn take_error(&mut self) -> Option<String> {
        self.fields.lock().unwrap().last_error.take()
    }

    fn record_error(&self, e: &StoreError) {
        self.fields.lock().unwrap().last_error = Some(e.to_string());
    }
}

impl Drop for EditorScreenState {
    fn drop(&mut self) {
        // The session is over; a still-running fetch must not outlive it
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
    }
}
