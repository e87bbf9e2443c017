pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod store;

pub use db::Database;
pub use error::{Result, StoreError};
pub use models::{Color, Note, NoteEntity, NO_IMAGE, TITLE_MAX_CHARS};
pub use state::{EditorPhase, EditorScreenState, ListScreenState};
pub use store::{NoteStore, NoteWatch};
