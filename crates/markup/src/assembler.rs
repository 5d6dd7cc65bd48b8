//! Boundary-safe incremental document assembly.
//!
//! `StreamAssembler` consumes raw text fragments from a completion stream
//! and maintains a committed, placeholder-substituted document that is safe
//! to render after every fragment. Text that might still be the prefix of a
//! marker is held back in `pending` and never exposed.
//!
//! One assembler serves exactly one assistant turn: created when the stream
//! opens, fed every fragment in arrival order, consumed by [`finish`] when
//! the stream ends, or dropped on abort.
//!
//! [`finish`]: StreamAssembler::finish

use crate::tag;

/// Stateful incremental buffer over one completion stream.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    /// Everything received so far, untouched.
    raw: String,
    /// Placeholder-substituted text proven free of partial markers.
    committed: String,
    /// Raw suffix that may still become a marker. Never rendered.
    pending: String,
    /// Ids extracted from the committed region, in order, duplicates kept.
    references: Vec<String>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment and return the updated committed document.
    ///
    /// The dangling-prefix check runs over the entire accumulated text, not
    /// the fragment — a marker's opening may have arrived many fragments
    /// ago. The committed document only ever grows by appending; earlier
    /// committed text is never rewritten.
    pub fn consume(&mut self, fragment: &str) -> &str {
        self.raw.push_str(fragment);

        let safe_end = tag::dangling_prefix(&self.raw).unwrap_or(self.raw.len());
        let safe = &self.raw[..safe_end];

        self.committed = tag::substitute_placeholders(safe);
        self.references = tag::extract_ids(safe);
        self.pending = self.raw[safe_end..].to_string();

        &self.committed
    }

    /// The current render-safe document.
    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Held-back raw suffix (an in-progress marker candidate, or empty).
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Ids discovered so far in the committed region.
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Finalize at end of stream.
    ///
    /// Any trailing pending text is flushed as plain text — the grammar's
    /// prefix alone means nothing to the user. The document and reference
    /// list are re-derived from the full accumulated text, so the result is
    /// identical to a single-pass extraction over the complete output.
    pub fn finish(self) -> (String, Vec<String>) {
        let document = tag::substitute_placeholders(&self.raw);
        let references = tag::extract_ids(&self.raw);
        (document, references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::placeholder_for;

    /// Feed `text` split into the given pieces, asserting after every piece
    /// that no partial marker text leaks into the committed document.
    fn feed_checked(pieces: &[&str], forbidden: &[&str]) -> StreamAssembler {
        let mut asm = StreamAssembler::new();
        for piece in pieces {
            let live = asm.consume(piece);
            for f in forbidden {
                assert!(
                    !live.contains(f),
                    "committed text leaked {f:?} after piece {piece:?}: {live:?}"
                );
            }
        }
        asm
    }

    #[test]
    fn scenario_marker_split_mid_literal() {
        let asm = feed_checked(
            &["Visit Tower [PRO", "DUCT:ABC-1]", " today."],
            &["ABC-1", "[PRO", "[PRODUCT"],
        );
        let (doc, refs) = asm.finish();
        assert_eq!(doc, format!("Visit Tower {} today.", placeholder_for("ABC-1")));
        assert_eq!(refs, vec!["ABC-1"]);
    }

    #[test]
    fn boundary_safety_at_every_split_offset() {
        let text = "Go see [PRODUCT:LINKTIVITY-3PWVV] tonight";
        for cut in 1..text.len() {
            if !text.is_char_boundary(cut) {
                continue;
            }
            let mut asm = StreamAssembler::new();
            let live1 = asm.consume(&text[..cut]).to_string();
            assert!(!live1.contains("LINKTIVITY-3PWVV") || live1.contains(&placeholder_for("LINKTIVITY-3PWVV")),
                "raw id visible at cut {cut}: {live1:?}");
            asm.consume(&text[cut..]);
            let (doc, refs) = asm.finish();
            assert_eq!(refs, vec!["LINKTIVITY-3PWVV"], "cut {cut}");
            assert_eq!(doc, format!("Go see {} tonight", placeholder_for("LINKTIVITY-3PWVV")));
        }
    }

    #[test]
    fn single_pass_equivalence_char_by_char() {
        let text = "第一天 [PRODUCT:A-1]\n\n[PRODUCT:B_2] 再去 [PRODUCT:A-1] 最后 [PRODUCT:in";
        let mut asm = StreamAssembler::new();
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            asm.consume(ch.encode_utf8(&mut buf));
        }
        let (_, refs) = asm.finish();
        assert_eq!(refs, tag::extract_ids(text));
        assert_eq!(refs, vec!["A-1", "B_2", "A-1"]);
    }

    #[test]
    fn committed_grows_monotonically() {
        let pieces = ["行程：", "[PRO", "DUCT:X", "YZ]", " 结束", "[", "PRODUCT:W]"];
        let mut asm = StreamAssembler::new();
        let mut prev = String::new();
        for piece in pieces {
            let live = asm.consume(piece).to_string();
            assert!(live.starts_with(&prev), "committed rewrote history: {prev:?} -> {live:?}");
            prev = live;
        }
    }

    #[test]
    fn pending_is_never_shown_but_flushed_at_finish() {
        let mut asm = StreamAssembler::new();
        asm.consume("tail [PRODUCT:never-closes");
        assert_eq!(asm.committed(), "tail ");
        assert_eq!(asm.pending(), "[PRODUCT:never-closes");
        assert!(asm.references().is_empty());

        let (doc, refs) = asm.finish();
        assert_eq!(doc, "tail [PRODUCT:never-closes");
        assert!(refs.is_empty());
    }

    #[test]
    fn last_fragment_completes_straddled_marker() {
        // The closing bracket arrives as the very last byte before the
        // stream ends; finish must still resolve the marker.
        let mut asm = StreamAssembler::new();
        asm.consume("x [PRODUCT:LAST-1");
        asm.consume("]");
        let (doc, refs) = asm.finish();
        assert_eq!(refs, vec!["LAST-1"]);
        assert_eq!(doc, format!("x {}", placeholder_for("LAST-1")));
    }

    #[test]
    fn empty_and_whitespace_fragments() {
        let mut asm = StreamAssembler::new();
        assert_eq!(asm.consume(""), "");
        assert_eq!(asm.consume("  \n"), "  \n");
        let (doc, refs) = asm.finish();
        assert_eq!(doc, "  \n");
        assert!(refs.is_empty());
    }

    #[test]
    fn duplicate_references_preserved_in_order() {
        let mut asm = StreamAssembler::new();
        asm.consume("[PRODUCT:A][PRODUCT:B][PRODUCT:A]");
        assert_eq!(asm.references(), ["A", "B", "A"]);
        let (_, refs) = asm.finish();
        assert_eq!(refs, vec!["A", "B", "A"]);
    }
}
