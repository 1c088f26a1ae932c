//! Segment: a single timed lyric line, and the sort/disjoint invariants
//! shared by the builder and the segment store.

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const MAX_TEXT_LEN: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: i64,
    pub start_s: f64,
    pub end_s: f64,
    pub text: String,
}

impl Segment {
    fn validate_shape(&self) -> Result<(), Error> {
        if self.start_s < 0.0 {
            return Err(Error::invalid_input("start_s", "must be non-negative"));
        }
        if self.end_s <= self.start_s {
            return Err(Error::invalid_input("end_s", "must be greater than start_s"));
        }
        if self.text.chars().count() > MAX_TEXT_LEN {
            return Err(Error::invalid_input(
                "text",
                format!("must be at most {MAX_TEXT_LEN} characters"),
            ));
        }
        Ok(())
    }
}

/// Sort by `start_s` ascending, as every read path returns segments.
pub fn sorted_by_start(mut segments: Vec<Segment>) -> Vec<Segment> {
    segments.sort_by(|a, b| a.start_s.partial_cmp(&b.start_s).unwrap_or(std::cmp::Ordering::Equal));
    segments
}

/// Validate a full segment set for a `replace` call: per-row shape, unique
/// ids, and pairwise non-overlap once sorted by start time.
pub fn validate_replacement(segments: &[Segment]) -> Result<(), Error> {
    let mut ids = std::collections::HashSet::new();
    for segment in segments {
        segment.validate_shape()?;
        if !ids.insert(segment.id) {
            return Err(Error::invalid_input(
                "id",
                format!("duplicate segment id {}", segment.id),
            ));
        }
    }

    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by(|a, b| a.start_s.partial_cmp(&b.start_s).unwrap_or(std::cmp::Ordering::Equal));
    for pair in ordered.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b.start_s < a.end_s {
            return Err(Error::Conflict(format!(
                "segment {} [{}, {}) overlaps segment {} [{}, {})",
                a.id, a.start_s, a.end_s, b.id, b.start_s, b.end_s
            )));
        }
    }
    Ok(())
}

/// Clean up raw segments produced by an external transcription service:
/// renumber to a contiguous range, truncate oversized text, clip overlaps
/// against the following segment, and drop anything that collapses.
#[must_use]
pub fn normalize_transcription(mut raw: Vec<Segment>) -> Vec<Segment> {
    raw.sort_by(|a, b| a.start_s.partial_cmp(&b.start_s).unwrap_or(std::cmp::Ordering::Equal));

    let mut clipped = Vec::with_capacity(raw.len());
    let mut iter = raw.drain(..).peekable();
    while let Some(mut segment) = iter.next() {
        if let Some(next) = iter.peek() {
            segment.end_s = segment.end_s.min(next.start_s);
        }
        if segment.end_s <= segment.start_s {
            continue;
        }
        if segment.text.chars().count() > MAX_TEXT_LEN {
            segment.text = segment.text.chars().take(MAX_TEXT_LEN).collect();
        }
        clipped.push(segment);
    }

    for (index, segment) in clipped.iter_mut().enumerate() {
        segment.id = index as i64;
    }
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: i64, start: f64, end: f64) -> Segment {
        Segment {
            id,
            start_s: start,
            end_s: end,
            text: "x".to_string(),
        }
    }

    #[test]
    fn accepts_disjoint_segments() {
        let segments = vec![seg(0, 0.0, 2.0), seg(1, 2.0, 4.0)];
        assert!(validate_replacement(&segments).is_ok());
    }

    #[test]
    fn rejects_overlap() {
        let segments = vec![seg(0, 0.0, 2.0), seg(1, 1.0, 3.0)];
        assert!(matches!(
            validate_replacement(&segments),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let segments = vec![seg(0, 0.0, 1.0), seg(0, 1.0, 2.0)];
        assert!(validate_replacement(&segments).is_err());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let segments = vec![seg(0, 2.0, 1.0)];
        assert!(validate_replacement(&segments).is_err());
    }

    #[test]
    fn normalize_renumbers_contiguously() {
        let raw = vec![seg(7, 1.0, 2.0), seg(3, 0.0, 1.0)];
        let normalized = normalize_transcription(raw);
        assert_eq!(normalized[0].id, 0);
        assert_eq!(normalized[1].id, 1);
    }

    #[test]
    fn normalize_clips_overlap_against_next() {
        let raw = vec![seg(0, 0.0, 3.0), seg(1, 2.0, 4.0)];
        let normalized = normalize_transcription(raw);
        assert_eq!(normalized[0].end_s, 2.0);
    }

    #[test]
    fn normalize_drops_collapsed_segment() {
        let raw = vec![seg(0, 0.0, 1.0), seg(1, 1.0, 1.0), seg(2, 1.0, 2.0)];
        let normalized = normalize_transcription(raw);
        assert_eq!(normalized.len(), 2);
    }
}
