use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Color;

/// Title length cap, enforced by the editor and by title derivation.
pub const TITLE_MAX_CHARS: usize = 20;

/// Sentinel for "no image attached". An empty string rather than an Option
/// so the persisted record shape stays stable.
pub const NO_IMAGE: &str = "";

/// A note as the screens work with it. `id` is `None` until the store
/// assigns an identity on first save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Option<i64>,
    title: String,
    pub text: String,
    pub color: Color,
    pub image: String,
    pub date: DateTime<Utc>,
    pub is_favourite: bool,
}

/// The persisted record shape, one row of the `notes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntity {
    pub id: Option<i64>,
    pub title: String,
    pub text: String,
    pub color: u32,
    pub image: String,
    pub date: i64,
    pub is_favourite: bool,
}

impl Note {
    pub fn new(
        title: String,
        text: String,
        color: Color,
        image: String,
        date: DateTime<Utc>,
        is_favourite: bool,
    ) -> Self {
        let mut note = Self {
            id: None,
            title: String::new(),
            text,
            color,
            image,
            date,
            is_favourite,
        };
        note.set_title(title);
        note
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Reassign the title. An empty value falls back to a prefix of `text`:
    /// up to the first newline or [`TITLE_MAX_CHARS`] characters, whichever
    /// comes first. With empty text the title stays empty.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title: String = title.into();
        self.title = if title.is_empty() {
            title_from_text(&self.text)
        } else {
            title
        };
    }

    pub fn from_entity(entity: &NoteEntity) -> Self {
        let mut note = Self::new(
            entity.title.clone(),
            entity.text.clone(),
            Color(entity.color),
            entity.image.clone(),
            DateTime::from_timestamp(entity.date, 0).unwrap_or(DateTime::UNIX_EPOCH),
            entity.is_favourite,
        );
        note.id = entity.id;
        note
    }

    pub fn to_entity(&self) -> NoteEntity {
        NoteEntity {
            id: self.id,
            title: self.title.clone(),
            text: self.text.clone(),
            color: self.color.argb(),
            image: self.image.clone(),
            date: self.date.timestamp(),
            is_favourite: self.is_favourite,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image != NO_IMAGE
    }
}

fn title_from_text(text: &str) -> String {
    let head = match text.find('\n') {
        Some(idx) => &text[..idx],
        None => text,
    };
    head.chars().take(TITLE_MAX_CHARS).collect()
}
