//! Schema definition and versioned migrations for the segment store's
//! SQLite database.

use rusqlite::Connection;

const CURRENT_SCHEMA_VERSION: i32 = 1;

pub fn open(path: &std::path::Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;
    conn.execute("PRAGMA foreign_keys = ON", ())?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open_in_memory()?;
    conn.execute("PRAGMA foreign_keys = ON", ())?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL,
            updated TEXT NOT NULL,
            PRIMARY KEY (version)
        )",
        (),
    )?;

    let version: i32 = match conn.query_row(
        "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
        [],
        |row| row.get(0),
    ) {
        Ok(v) => v,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            conn.execute(
                "INSERT INTO schema_version (version, updated) VALUES (0, datetime('now'))",
                [],
            )?;
            0
        }
        Err(e) => return Err(e),
    };

    if version < CURRENT_SCHEMA_VERSION {
        migrate_schema(conn, version)?;
    }
    Ok(())
}

fn migrate_schema(conn: &Connection, from_version: i32) -> Result<(), rusqlite::Error> {
    if from_version < 1 {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS videos (
                uuid TEXT PRIMARY KEY,
                source_path TEXT NOT NULL,
                owner_key TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            (),
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS segments (
                video_uuid TEXT NOT NULL,
                id INTEGER NOT NULL,
                start_s REAL NOT NULL,
                end_s REAL NOT NULL,
                text TEXT NOT NULL,
                PRIMARY KEY (video_uuid, id),
                FOREIGN KEY (video_uuid) REFERENCES videos(uuid)
            )",
            (),
        )?;
        conn.execute(
            "INSERT INTO schema_version (version, updated) VALUES (1, datetime('now'))",
            [],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        open(&path).unwrap();
        open(&path).unwrap();
    }
}
