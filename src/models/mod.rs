mod color;
mod note;

pub use color::Color;
pub use note::{Note, NoteEntity, NO_IMAGE, TITLE_MAX_CHARS};
