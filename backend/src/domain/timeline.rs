//! Chapter/time coordinate math.
//!
//! Pure functions converting between absolute elapsed seconds and
//! (chapter, offset) coordinates, plus human-readable formatting. Positions
//! are `f64` seconds from book start; durations come from validated
//! [`Book`](super::catalog::Book) records, so every book seen here has a
//! non-empty, gap-free chapter sequence.

use super::catalog::Book;

/// A position expressed as a chapter plus an offset within it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChapterPosition {
    /// Zero-based chapter index.
    pub chapter_index: usize,
    /// Seconds into the chapter, in `[0, duration]`.
    pub offset_seconds: f64,
}

/// Locate the chapter containing an absolute position.
///
/// Negative positions clamp to the start of the first chapter; positions at
/// or past the end of the book clamp to the last chapter with the offset
/// clamped to its duration. Never fails.
///
/// # Examples
/// ```
/// use backend::domain::catalog::{Book, Chapter};
/// use backend::domain::ids::BookId;
/// use backend::domain::timeline::position_to_chapter;
///
/// let book = Book::new(
///     BookId::new("book_doc").unwrap(),
///     "T",
///     "A",
///     200.0,
///     vec![
///         Chapter { index: 0, title: "One".into(), start_seconds: 0.0, duration_seconds: 120.0 },
///         Chapter { index: 1, title: "Two".into(), start_seconds: 120.0, duration_seconds: 80.0 },
///     ],
/// )
/// .unwrap();
/// let pos = position_to_chapter(&book, 130.0);
/// assert_eq!(pos.chapter_index, 1);
/// assert_eq!(pos.offset_seconds, 10.0);
/// ```
#[must_use]
pub fn position_to_chapter(book: &Book, seconds: f64) -> ChapterPosition {
    let clamped = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };

    // Chapters tile the book, so the match is the last chapter starting at
    // or before the position.
    let chapter = book
        .chapters()
        .iter()
        .rev()
        .find(|chapter| clamped >= chapter.start_seconds)
        .or_else(|| book.chapters().first());

    match chapter {
        Some(chapter) => ChapterPosition {
            chapter_index: chapter.index,
            offset_seconds: (clamped - chapter.start_seconds).min(chapter.duration_seconds),
        },
        // Unreachable for validated books; fall back to the origin.
        None => ChapterPosition {
            chapter_index: 0,
            offset_seconds: 0.0,
        },
    }
}

/// Convert a (chapter, offset) coordinate back to an absolute position.
///
/// The offset is clamped to the chapter's duration so a position never
/// spills past the chapter boundary; an out-of-range chapter index clamps to
/// the nearest valid chapter.
#[must_use]
pub fn chapter_to_position(book: &Book, chapter_index: usize, offset_seconds: f64) -> f64 {
    let chapter = book
        .chapters()
        .get(chapter_index)
        .or_else(|| book.chapters().last());

    match chapter {
        Some(chapter) => {
            let offset = if offset_seconds.is_finite() {
                offset_seconds.clamp(0.0, chapter.duration_seconds)
            } else {
                0.0
            };
            chapter.start_seconds + offset
        }
        None => 0.0,
    }
}

/// Format a position as `H:MM:SS` (hours present) or `M:SS`.
///
/// Fractional seconds are floored, matching the wire format the mobile
/// clients already display.
///
/// # Examples
/// ```
/// use backend::domain::timeline::format_timestamp;
///
/// assert_eq!(format_timestamp(3725.0), "1:02:05");
/// assert_eq!(format_timestamp(65.9), "1:05");
/// ```
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Parse `H:MM:SS` or `M:SS` into seconds.
///
/// Parsing is strict: every segment must be a plain decimal number and the
/// shape must be two or three segments, otherwise `None` is returned.
/// Callers that want the historical lenient behaviour can use
/// [`parse_timestamp_or_zero`].
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let segments: Vec<u64> = value
        .trim()
        .split(':')
        .map(|segment| {
            if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
                None
            } else {
                segment.parse::<u64>().ok()
            }
        })
        .collect::<Option<_>>()?;

    match segments.as_slice() {
        [minutes, seconds] => Some(to_f64(minutes * 60 + seconds)),
        [hours, minutes, seconds] => Some(to_f64(hours * 3600 + minutes * 60 + seconds)),
        _ => None,
    }
}

/// Lenient variant of [`parse_timestamp`] defaulting malformed input to `0`.
///
/// Retained for display-only call sites; mutation paths must use the strict
/// parser and reject malformed input before any write.
#[must_use]
pub fn parse_timestamp_or_zero(value: &str) -> f64 {
    parse_timestamp(value).unwrap_or(0.0)
}

/// Completion percentage of `position_seconds` against `total_seconds`.
///
/// Returns `0` for non-positive totals, otherwise the linear ratio clamped
/// to `[0, 100]`.
#[must_use]
pub fn percent(position_seconds: f64, total_seconds: f64) -> f64 {
    if !total_seconds.is_finite() || total_seconds <= 0.0 || !position_seconds.is_finite() {
        return 0.0;
    }
    (position_seconds / total_seconds * 100.0).clamp(0.0, 100.0)
}

/// Format a duration as `17h 45m` (or `45m` under an hour).
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Format a chapter coordinate for display, e.g. `Chapter 5 @ 12:34`.
#[must_use]
pub fn format_chapter_position(book: &Book, chapter_index: usize, offset_seconds: f64) -> String {
    book.chapters().get(chapter_index).map_or_else(String::new, |chapter| {
        format!("{} @ {}", chapter.title, format_timestamp(offset_seconds))
    })
}

fn to_f64(value: u64) -> f64 {
    // Timestamp arithmetic stays far below 2^53, so the cast is exact.
    value as f64
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod tests;
