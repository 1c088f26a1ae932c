//! Pure, filesystem-free pieces of the lyric-burn pipeline: the timestamp
//! and color codec, the style descriptor, the segment type and its
//! validation rules, and the ASS document builder.
//!
//! # Quick start
//!
//! ```
//! use lyricburn_core::{builder, segment::Segment, style::StyleDescriptor};
//!
//! let segments = vec![Segment { id: 0, start_s: 0.0, end_s: 2.0, text: "hello".into() }];
//! let doc = builder::build_document(&segments, &StyleDescriptor::default(), 1920, 1080).unwrap();
//! assert!(doc.starts_with("[Script Info]"));
//! ```

pub mod builder;
pub mod codec;
pub mod error;
pub mod segment;
pub mod style;

pub use error::{Error, Result};
pub use segment::Segment;
pub use style::{StyleDescriptor, StyleRequest};
