mod editor;
mod list;

pub use editor::{EditorPhase, EditorScreenState};
pub use list::ListScreenState;
