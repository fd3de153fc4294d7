use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // In-memory databases have no WAL to fold back, so failure here is fine.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::debug!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS patterns (
            id           TEXT PRIMARY KEY,
            pattern_type TEXT NOT NULL,
            name         TEXT NOT NULL,
            description  TEXT NOT NULL DEFAULT '',
            data         TEXT NOT NULL,
            confidence   REAL NOT NULL CHECK (confidence >= 0.0 AND confidence <= 1.0),
            occurrences  INTEGER NOT NULL DEFAULT 1,
            first_seen   INTEGER NOT NULL,
            last_seen    INTEGER NOT NULL,
            metadata     TEXT
        );

        CREATE TABLE IF NOT EXISTS relationships (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id  TEXT NOT NULL REFERENCES patterns(id),
            child_id   TEXT NOT NULL REFERENCES patterns(id),
            kind       TEXT NOT NULL,
            strength   REAL NOT NULL CHECK (strength >= 0.0 AND strength <= 1.0),
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS semantic_edges (
            source_id  TEXT NOT NULL REFERENCES patterns(id),
            target_id  TEXT NOT NULL REFERENCES patterns(id),
            weight     REAL NOT NULL CHECK (weight >= 0.0),
            kind       TEXT NOT NULL DEFAULT 'semantic',
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (source_id, target_id),
            CHECK (source_id <> target_id)
        );

        CREATE TABLE IF NOT EXISTS embeddings (
            pattern_id TEXT PRIMARY KEY REFERENCES patterns(id),
            model      TEXT NOT NULL,
            dim        INTEGER NOT NULL,
            vector     BLOB NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_pat_type ON patterns(pattern_type);
        CREATE INDEX IF NOT EXISTS idx_pat_confidence ON patterns(confidence);
        CREATE INDEX IF NOT EXISTS idx_rel_parent ON relationships(parent_id);
        CREATE INDEX IF NOT EXISTS idx_rel_child ON relationships(child_id);
        CREATE INDEX IF NOT EXISTS idx_edge_source ON semantic_edges(source_id, weight);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
