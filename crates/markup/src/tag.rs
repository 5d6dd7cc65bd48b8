//! The product marker grammar and pure transformations over it.
//!
//! A marker is the literal `[PRODUCT:` followed by one or more id characters
//! from `[A-Za-z0-9_-]`, followed by `]`:
//!
//! ```text
//! [PRODUCT:LINKTIVITY-3PWVV]
//! ```
//!
//! Markers never nest and the id alphabet excludes both delimiters, so every
//! complete marker is matched by one leftmost scan. A marker that never
//! closes is not an error — it is plain text (the assembler flushes it at
//! end of stream).
//!
//! Complete markers are replaced by the placeholder
//! `<!-- PRODUCT_PLACEHOLDER:<id> -->`, an HTML comment so any markdown
//! renderer that receives it un-split ignores it.

use regex_lite::Regex;
use std::sync::OnceLock;

/// The opening literal of a marker.
pub const MARKER_OPEN: &str = "[PRODUCT:";

/// Prefix of the placeholder token substituted for a complete marker.
pub const PLACEHOLDER_OPEN: &str = "<!-- PRODUCT_PLACEHOLDER:";

/// Suffix of the placeholder token.
pub const PLACEHOLDER_CLOSE: &str = " -->";

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[PRODUCT:([A-Za-z0-9_-]+)\]").expect("marker pattern is valid")
    })
}

/// One complete marker found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// The catalog id carried by the marker.
    pub id: String,
    /// Byte offset of the opening `[`.
    pub start: usize,
    /// Byte offset one past the closing `]`.
    pub end: usize,
}

/// Every non-overlapping, leftmost complete marker in `text`, in order.
pub fn find_markers(text: &str) -> Vec<Marker> {
    marker_re()
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).expect("group 0 always present");
            let id = caps.get(1).expect("grammar has one capture");
            Marker {
                id: id.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
            }
        })
        .collect()
}

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Byte offset of a suffix of `text` that could still become a marker.
///
/// The suffix must run to the end of the string and match a prefix of the
/// grammar: part of the `[PRODUCT:` literal itself, or the full literal
/// followed by zero or more id characters with no closing `]` yet. There is
/// at most one such suffix, anchored at the last `[` — the opening literal
/// cannot recur inside itself.
pub fn dangling_prefix(text: &str) -> Option<usize> {
    let start = text.rfind('[')?;
    let suffix = &text[start..];

    if suffix.len() <= MARKER_OPEN.len() {
        // Still inside the literal ("[", "[P", ..., "[PRODUCT:").
        MARKER_OPEN.starts_with(suffix).then_some(start)
    } else if let Some(rest) = suffix.strip_prefix(MARKER_OPEN) {
        // Literal complete; everything after must be id characters. A `]`
        // would have closed the marker, any other byte kills it for good.
        rest.bytes().all(is_id_byte).then_some(start)
    } else {
        None
    }
}

/// Replace every complete marker with its placeholder token.
///
/// Partial markers and all other text pass through untouched. Idempotent:
/// substituted output contains no grammar match, so a second pass is a no-op.
pub fn substitute_placeholders(text: &str) -> String {
    let replacement = format!("{PLACEHOLDER_OPEN}$1{PLACEHOLDER_CLOSE}");
    marker_re().replace_all(text, replacement.as_str()).into_owned()
}

/// All ids from complete markers, duplicates preserved, in appearance order.
pub fn extract_ids(text: &str) -> Vec<String> {
    find_markers(text).into_iter().map(|m| m.id).collect()
}

/// The placeholder token for a given id, as produced by
/// [`substitute_placeholders`].
pub fn placeholder_for(id: &str) -> String {
    format!("{PLACEHOLDER_OPEN}{id}{PLACEHOLDER_CLOSE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_markers_in_order() {
        let text = "去 [PRODUCT:LINKTIVITY-2IV2I] 然后 [PRODUCT:Ninja-Kabuki-Tokyo] 结束";
        let markers = find_markers(text);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].id, "LINKTIVITY-2IV2I");
        assert_eq!(markers[1].id, "Ninja-Kabuki-Tokyo");
        assert_eq!(&text[markers[0].start..markers[0].end], "[PRODUCT:LINKTIVITY-2IV2I]");
    }

    #[test]
    fn duplicate_ids_are_preserved() {
        let text = "[PRODUCT:A1][PRODUCT:B2][PRODUCT:A1]";
        assert_eq!(extract_ids(text), vec!["A1", "B2", "A1"]);
    }

    #[test]
    fn malformed_markers_never_match() {
        assert!(find_markers("[PRODUCT:]").is_empty()); // empty id
        assert!(find_markers("[PRODUCT:abc").is_empty()); // never closes
        assert!(find_markers("[product:abc]").is_empty()); // wrong case
        assert!(find_markers("[PRODUCT:a b]").is_empty()); // space not in alphabet
    }

    #[test]
    fn dangling_inside_literal() {
        for cut in 1..=MARKER_OPEN.len() {
            let text = format!("prefix {}", &MARKER_OPEN[..cut]);
            assert_eq!(dangling_prefix(&text), Some(7), "cut at {cut}");
        }
    }

    #[test]
    fn dangling_with_partial_id() {
        assert_eq!(dangling_prefix("Visit [PRODUCT:ABC"), Some(6));
        assert_eq!(dangling_prefix("[PRODUCT:"), Some(0));
    }

    #[test]
    fn complete_marker_is_not_dangling() {
        assert_eq!(dangling_prefix("Visit [PRODUCT:ABC-1]"), None);
    }

    #[test]
    fn dead_marker_is_not_dangling() {
        // A byte outside the id alphabet can never close; it is plain text.
        assert_eq!(dangling_prefix("[PRODUCT:AB C"), None);
        assert_eq!(dangling_prefix("[PRODUCT:AB 的文字"), None);
    }

    #[test]
    fn bracket_after_complete_marker_is_dangling() {
        let text = "[PRODUCT:ABC-1] then [PRO";
        assert_eq!(dangling_prefix(text), Some(21));
    }

    #[test]
    fn lone_unrelated_bracket() {
        assert_eq!(dangling_prefix("list: [1] done"), None);
        // A trailing lone bracket could still open a marker.
        assert_eq!(dangling_prefix("list: ["), Some(6));
    }

    #[test]
    fn substitution_replaces_only_complete_markers() {
        let text = "A [PRODUCT:X-1] B [PRODUCT:in";
        let out = substitute_placeholders(text);
        assert_eq!(out, format!("A {} B [PRODUCT:in", placeholder_for("X-1")));
    }

    #[test]
    fn substitution_is_idempotent() {
        let once = substitute_placeholders("[PRODUCT:ABC][PRODUCT:DEF] tail");
        let twice = substitute_placeholders(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn multibyte_text_around_markers() {
        let text = "推荐晴空塔套票\n\n[PRODUCT:LINKTIVITY-3PWVV]\n\n夜景很美";
        assert_eq!(extract_ids(text), vec!["LINKTIVITY-3PWVV"]);
        let out = substitute_placeholders(text);
        assert!(out.contains(&placeholder_for("LINKTIVITY-3PWVV")));
        assert!(out.starts_with("推荐晴空塔套票"));
        assert!(out.ends_with("夜景很美"));
    }
}
