//! Word-level comparison of an original text and its correction.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// Class applied to inserted runs in rendered markup.
pub const ADDED_CLASS: &str = "retouch-diff-added";

/// Class applied to deleted runs in rendered markup.
pub const REMOVED_CLASS: &str = "retouch-diff-removed";

/// How a run of text changed between the original and the correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Unchanged,
    Added,
    Removed,
}

/// One run of a word-level diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    pub kind: SegmentKind,
    pub text: String,
}

impl DiffSegment {
    pub fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

fn push(segments: &mut Vec<DiffSegment>, kind: SegmentKind, text: &str) {
    match segments.last_mut() {
        Some(last) if last.kind == kind => last.text.push_str(text),
        _ => segments.push(DiffSegment::new(kind, text)),
    }
}

fn flush_changes(segments: &mut Vec<DiffSegment>, removed: &mut String, added: &mut String) {
    if !removed.is_empty() {
        push(segments, SegmentKind::Removed, removed);
        removed.clear();
    }
    if !added.is_empty() {
        push(segments, SegmentKind::Added, added);
        added.clear();
    }
}

/// Compare two texts word by word.
///
/// Adjacent tokens with the same classification are merged, and within a
/// changed region the removed text always precedes the added text.
pub fn diff_words(original: &str, corrected: &str) -> Vec<DiffSegment> {
    let diff = TextDiff::from_words(original, corrected);

    let mut segments = Vec::new();
    let mut removed = String::new();
    let mut added = String::new();

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => {
                flush_changes(&mut segments, &mut removed, &mut added);
                push(&mut segments, SegmentKind::Unchanged, change.value());
            }
            ChangeTag::Delete => removed.push_str(change.value()),
            ChangeTag::Insert => added.push_str(change.value()),
        }
    }
    flush_changes(&mut segments, &mut removed, &mut added);

    segments
}

/// The original text, rebuilt from unchanged and removed runs.
pub fn original_text(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|segment| segment.kind != SegmentKind::Added)
        .map(|segment| segment.text.as_str())
        .collect()
}

/// The corrected text, rebuilt from unchanged and added runs.
pub fn corrected_text(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|segment| segment.kind != SegmentKind::Removed)
        .map(|segment| segment.text.as_str())
        .collect()
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    v_htmlescape::escape(text).to_string()
}

/// Render segments as inline HTML: unchanged text escaped, changed runs
/// wrapped in spans carrying [`ADDED_CLASS`] or [`REMOVED_CLASS`].
pub fn render_markup(segments: &[DiffSegment]) -> String {
    let mut markup = String::new();
    for segment in segments {
        let text = escape_html(&segment.text);
        match segment.kind {
            SegmentKind::Unchanged => markup.push_str(&text),
            SegmentKind::Added => {
                markup.push_str(&format!("<span class=\"{ADDED_CLASS}\">{text}</span>"))
            }
            SegmentKind::Removed => {
                markup.push_str(&format!("<span class=\"{REMOVED_CLASS}\">{text}</span>"))
            }
        }
    }
    markup
}
