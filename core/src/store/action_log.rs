//! Action log queries: one row per resolved action, in resolution order.

use super::SimStore;
use crate::{error::SimResult, outcome::ActionLogEntry};
use rusqlite::params;

impl SimStore {
    pub fn append_action(&self, entry: &ActionLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO action_log (run_id, seq, tick_before, action_type, success, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.run_id,
                entry.seq as i64,
                entry.tick_before as i64,
                entry.action_type,
                if entry.success { 1 } else { 0 },
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn actions_for_run(&self, run_id: &str) -> SimResult<Vec<ActionLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, tick_before, action_type, success, payload
             FROM action_log WHERE run_id = ?1
             ORDER BY seq ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(ActionLogEntry {
                    id:          Some(row.get(0)?),
                    run_id:      row.get(1)?,
                    seq:         row.get::<_, i64>(2)? as u64,
                    tick_before: row.get::<_, i64>(3)? as u64,
                    action_type: row.get(4)?,
                    success:     row.get::<_, i32>(5)? != 0,
                    payload:     row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn action_count(&self, run_id: &str) -> SimResult<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE run_id = ?1",
            params![run_id],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    pub fn failure_count(&self, run_id: &str) -> SimResult<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE run_id = ?1 AND success = 0",
            params![run_id],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }
}
