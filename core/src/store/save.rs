//! Save document storage.

use super::SimStore;
use crate::{error::SimResult, snapshot::SaveDocument};
use rusqlite::{params, OptionalExtension};

impl SimStore {
    pub fn insert_save(&self, run_id: &str, doc: &SaveDocument) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO save (run_id, tick, format_version, saved_at, document)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                doc.world.clock.current_tick as i64,
                doc.format_version,
                doc.saved_at.to_rfc3339(),
                doc.to_json()?,
            ],
        )?;
        Ok(())
    }

    /// The most recent save for `run_id`, validated on the way out.
    pub fn latest_save(&self, run_id: &str) -> SimResult<Option<SaveDocument>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM save WHERE run_id = ?1
                 ORDER BY tick DESC, id DESC LIMIT 1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| SaveDocument::from_json(&j)).transpose()
    }
}
