//! Streaming marker parsing and document assembly.
//!
//! Model output embeds product references as `[PRODUCT:<id>]` markers. The
//! transport delivers that output as arbitrarily-cut fragments, so a marker
//! may arrive torn across several fragments. This crate reconstructs a
//! render-safe document from that stream:
//!
//! 1. **`tag`** — the marker grammar: find complete markers, detect a
//!    dangling prefix at end of input, substitute placeholders, extract ids.
//! 2. **`assembler`** — `StreamAssembler`, the stateful incremental buffer
//!    that never exposes a torn marker in its committed output.
//! 3. **`segment`** — split a committed document into `Text` / `ProductRef`
//!    render segments against a catalog snapshot.

pub mod assembler;
pub mod segment;
pub mod tag;

pub use assembler::StreamAssembler;
pub use segment::{derive_segments, RenderSegment, UnknownRefPolicy};
pub use tag::{dangling_prefix, extract_ids, find_markers, substitute_placeholders, Marker};
