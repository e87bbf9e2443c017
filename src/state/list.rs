//! State holder for the note list screen

use crate::error::Result;
use crate::models::Note;
use crate::store::{NoteStore, NoteWatch};

/// Holds the current search term and a live subscription reflecting it.
/// The subscription is replaced whenever the term changes; no caching
/// beyond what the live query already provides.
pub struct ListScreenState {
    store: NoteStore,
    search: String,
    watch: NoteWatch,
}

impl ListScreenState {
    pub async fn new(store: NoteStore) -> Result<Self> {
        let watch = store.watch(None).await?;
        Ok(Self {
            store,
            search: String::new(),
            watch,
        })
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Change the search term and re-subscribe. An empty term lists
    /// everything.
    pub async fn set_search(&mut self, term: impl Into<String>) -> Result<()> {
        self.search = term.into();
        let filter = if self.search.is_empty() {
            None
        } else {
            Some(self.search.clone())
        };
        self.watch = self.store.watch(filter).await?;
        Ok(())
    }

    /// Current live sequence for the current term.
    pub fn notes(&self) -> Vec<Note> {
        self.watch.current()
    }

    /// Resolves on the next re-delivery for the current term.
    pub async fn changed(&mut self) -> bool {
        self.watch.changed().await
    }

    /// Flip a note's favourite flag through the store.
    pub async fn toggle_favourite(&self, note: &Note) -> Result<()> {
        self.store.toggle_favourite(note).await
    }
}
