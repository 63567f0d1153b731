use crate::error::{RepopulseError, Result};
use crate::model::SCHEMA_VERSION;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub const KIND_AUTHORS: &str = "authors";
pub const KIND_TIMELINE: &str = "timeline";
pub const KIND_PULLS: &str = "pulls";
pub const KIND_REPORT: &str = "report";

/// Local persistence for computed aggregates, keyed by `(owner, repo, kind)`.
/// The dashboard collaborator reads the latest payload per key; older
/// snapshots are overwritten.
pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        let db_path = dir.as_ref().join("snapshots.db");
        let conn = Connection::open(&db_path)?;
        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshots (
                owner TEXT NOT NULL,
                repo TEXT NOT NULL,
                kind TEXT NOT NULL,
                generated_at INTEGER NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (owner, repo, kind)
            );
            CREATE INDEX IF NOT EXISTS idx_snapshots_generated_at ON snapshots(generated_at);
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(RepopulseError::Store(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    pub fn save<T: Serialize>(
        &mut self,
        owner: &str,
        repo: &str,
        kind: &str,
        payload: &T,
    ) -> Result<()> {
        let body = serde_json::to_string(payload)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshots (owner, repo, kind, generated_at, payload)
             VALUES (?, ?, ?, ?, ?)",
            params![owner, repo, kind, Utc::now().timestamp(), body],
        )?;
        Ok(())
    }

    pub fn load<T: DeserializeOwned>(
        &self,
        owner: &str,
        repo: &str,
        kind: &str,
    ) -> Result<Option<(DateTime<Utc>, T)>> {
        let result = self.conn.query_row(
            "SELECT generated_at, payload FROM snapshots WHERE owner = ? AND repo = ? AND kind = ?",
            params![owner, repo, kind],
            |row| {
                let ts: i64 = row.get(0)?;
                let payload: String = row.get(1)?;
                Ok((ts, payload))
            },
        );
        match result {
            Ok((ts, payload)) => {
                let generated_at = Utc.timestamp_opt(ts, 0).single().ok_or_else(|| {
                    RepopulseError::Store(format!("Invalid stored timestamp: {ts}"))
                })?;
                let value = serde_json::from_str(&payload)?;
                Ok(Some((generated_at, value)))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
