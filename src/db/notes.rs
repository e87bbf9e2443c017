use rusqlite::{params, Row};

use super::Database;
use crate::error::{Result, StoreError};
use crate::models::NoteEntity;

impl Database {
    // ==================== NOTE WRITE ====================

    /// Insert a new record when the entity has no identity, else replace the
    /// record with the matching identity. Returns the stored identity.
    pub fn upsert_note(&self, entity: &NoteEntity) -> Result<i64> {
        match entity.id {
            Some(id) => {
                self.conn.execute(
                    r#"INSERT OR REPLACE INTO notes (id, title, text, color, image, date, is_favourite)
                       VALUES (?, ?, ?, ?, ?, ?, ?)"#,
                    params![
                        id,
                        entity.title,
                        entity.text,
                        entity.color,
                        entity.image,
                        entity.date,
                        entity.is_favourite as i32,
                    ],
                )?;
                Ok(id)
            }
            None => {
                self.conn.execute(
                    r#"INSERT INTO notes (title, text, color, image, date, is_favourite)
                       VALUES (?, ?, ?, ?, ?, ?)"#,
                    params![
                        entity.title,
                        entity.text,
                        entity.color,
                        entity.image,
                        entity.date,
                        entity.is_favourite as i32,
                    ],
                )?;
                Ok(self.conn.last_insert_rowid())
            }
        }
    }

    /// Remove the record with this identity. Already-absent records are a
    /// no-op.
    pub fn delete_note(&self, id: i64) -> Result<()> {
        self.conn.execute("DELETE FROM notes WHERE id = ?", [id])?;
        Ok(())
    }

    /// Flip `is_favourite` for this identity, read-then-write inside one
    /// transaction. Returns the new value.
    pub fn switch_favourite(&self, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;

        let current: bool = match tx.query_row(
            "SELECT is_favourite FROM notes WHERE id = ?",
            [id],
            |row| row.get(0),
        ) {
            Ok(v) => v,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Err(StoreError::NotFound(id)),
            Err(e) => return Err(e.into()),
        };

        tx.execute(
            "UPDATE notes SET is_favourite = ? WHERE id = ?",
            params![!current as i32, id],
        )?;
        tx.commit()?;

        Ok(!current)
    }

    // ==================== NOTE READ ====================

    /// Fetch one record. `StoreError::NotFound` when no record has `id`.
    pub fn get_note(&self, id: i64) -> Result<NoteEntity> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, text, color, image, date, is_favourite FROM notes WHERE id = ?",
        )?;

        match stmt.query_row([id], Self::row_to_note) {
            Ok(entity) => Ok(entity),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// All notes ordered by save date, most recent first; ties on date break
    /// toward the higher id (newest insert first). With a search term, only
    /// notes whose title or text contains the term; the match is
    /// case-insensitive for ASCII (SQLite LIKE semantics).
    pub fn list_notes(&self, search: Option<&str>) -> Result<Vec<NoteEntity>> {
        match search {
            Some(term) if !term.is_empty() => {
                let pattern = format!("%{}%", term);
                let mut stmt = self.conn.prepare(
                    r#"SELECT id, title, text, color, image, date, is_favourite FROM notes
                       WHERE title LIKE ?1 OR text LIKE ?1
                       ORDER BY date DESC, id DESC"#,
                )?;

                let notes = stmt
                    .query_map([&pattern], Self::row_to_note)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(notes)
            }
            _ => {
                let mut stmt = self.conn.prepare(
                    r#"SELECT id, title, text, color, image, date, is_favourite FROM notes
                       ORDER BY date DESC, id DESC"#,
                )?;

                let notes = stmt
                    .query_map([], Self::row_to_note)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(notes)
            }
        }
    }

    fn row_to_note(row: &Row) -> rusqlite::Result<NoteEntity> {
        Ok(NoteEntity {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            text: row.get(2)?,
            color: row.get(3)?,
            image: row.get(4)?,
            date: row.get(5)?,
            is_favourite: row.get(6)?,
        })
    }
}
