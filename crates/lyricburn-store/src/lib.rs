//! SQLite-backed persistence for videos and their lyric segments.

pub mod db;
pub mod segment_store;

pub use segment_store::Store;
