//! Segment store: the authoritative, owner-scoped list of timed lyric
//! lines for each video.

use std::path::Path;
use std::sync::{Arc, Mutex};

use lyricburn_core::segment::{self, Segment};
use lyricburn_core::Error;
use rusqlite::{Connection, TransactionBehavior};

use crate::db;

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let conn = db::open(path).map_err(to_core_error)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = db::open_in_memory().map_err(to_core_error)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_video(
        &self,
        video_uuid: &str,
        source_path: &str,
        owner_key: &str,
    ) -> Result<(), Error> {
        let conn = Arc::clone(&self.conn);
        let (video_uuid, source_path, owner_key) =
            (video_uuid.to_string(), source_path.to_string(), owner_key.to_string());
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("store mutex poisoned");
            conn.execute(
                "INSERT INTO videos (uuid, source_path, owner_key, created_at) VALUES (?1, ?2, ?3, datetime('now'))",
                (&video_uuid, &source_path, &owner_key),
            )
            .map_err(to_core_error)?;
            Ok(())
        })
        .await
        .expect("blocking task panicked")
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, video_uuid: &str, owner_key: &str) -> Result<Vec<Segment>, Error> {
        let conn = Arc::clone(&self.conn);
        let (video_uuid, owner_key) = (video_uuid.to_string(), owner_key.to_string());
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("store mutex poisoned");
            check_ownership(&conn, &video_uuid, &owner_key)?;
            let rows = fetch_segments(&conn, &video_uuid)?;
            Ok(segment::sorted_by_start(rows))
        })
        .await
        .expect("blocking task panicked")
    }

    /// Atomically replace the full segment set for a video. Validates
    /// shape and overlap before touching the database; on conflict the
    /// prior set is left untouched.
    #[tracing::instrument(skip(self, segments))]
    pub async fn replace(
        &self,
        video_uuid: &str,
        owner_key: &str,
        segments: Vec<Segment>,
    ) -> Result<(), Error> {
        segment::validate_replacement(&segments)?;

        let conn = Arc::clone(&self.conn);
        let video_uuid = video_uuid.to_string();
        let owner_key = owner_key.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().expect("store mutex poisoned");
            check_ownership(&conn, &video_uuid, &owner_key)?;

            // BEGIN IMMEDIATE acquires the write lock up front, serializing
            // concurrent replace() calls against the same video row.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(to_core_error)?;
            tx.execute("DELETE FROM segments WHERE video_uuid = ?1", (&video_uuid,))
                .map_err(to_core_error)?;
            for segment in &segments {
                tx.execute(
                    "INSERT INTO segments (video_uuid, id, start_s, end_s, text) VALUES (?1, ?2, ?3, ?4, ?5)",
                    (&video_uuid, segment.id, segment.start_s, segment.end_s, &segment.text),
                )
                .map_err(to_core_error)?;
            }
            tx.commit().map_err(to_core_error)?;
            Ok(())
        })
        .await
        .expect("blocking task panicked")
    }

    /// Normalize raw transcription output and persist it, bypassing the
    /// owner check since this is an internal pipeline step, not a
    /// client-facing write.
    #[tracing::instrument(skip(self, raw_segments))]
    pub async fn upsert_from_transcription(
        &self,
        video_uuid: &str,
        raw_segments: Vec<Segment>,
    ) -> Result<Vec<Segment>, Error> {
        let normalized = segment::normalize_transcription(raw_segments);

        let conn = Arc::clone(&self.conn);
        let video_uuid_for_task = video_uuid.to_string();
        let to_store = normalized.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().expect("store mutex poisoned");
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(to_core_error)?;
            tx.execute(
                "DELETE FROM segments WHERE video_uuid = ?1",
                (&video_uuid_for_task,),
            )
            .map_err(to_core_error)?;
            for segment in &to_store {
                tx.execute(
                    "INSERT INTO segments (video_uuid, id, start_s, end_s, text) VALUES (?1, ?2, ?3, ?4, ?5)",
                    (&video_uuid_for_task, segment.id, segment.start_s, segment.end_s, &segment.text),
                )
                .map_err(to_core_error)?;
            }
            tx.commit().map_err(to_core_error)?;
            Ok::<(), Error>(())
        })
        .await
        .expect("blocking task panicked")?;

        Ok(normalized)
    }
}

fn check_ownership(conn: &Connection, video_uuid: &str, owner_key: &str) -> Result<(), Error> {
    let stored_owner: String = conn
        .query_row(
            "SELECT owner_key FROM videos WHERE uuid = ?1",
            [video_uuid],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(video_uuid.to_string()),
            other => to_core_error(other),
        })?;

    if stored_owner == owner_key {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

fn fetch_segments(conn: &Connection, video_uuid: &str) -> Result<Vec<Segment>, Error> {
    let mut stmt = conn
        .prepare("SELECT id, start_s, end_s, text FROM segments WHERE video_uuid = ?1")
        .map_err(to_core_error)?;
    let rows = stmt
        .query_map([video_uuid], |row| {
            Ok(Segment {
                id: row.get(0)?,
                start_s: row.get(1)?,
                end_s: row.get(2)?,
                text: row.get(3)?,
            })
        })
        .map_err(to_core_error)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(to_core_error)?);
    }
    Ok(result)
}

fn to_core_error(error: rusqlite::Error) -> Error {
    Error::Db(error)
}
