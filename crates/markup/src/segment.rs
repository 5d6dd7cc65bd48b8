//! Render-segment derivation.
//!
//! A committed document interleaves markdown text with placeholder tokens.
//! The renderer wants an ordered list of segments: plain text to hand to a
//! markdown view, and product references to turn into cards. Derivation is
//! the only consumer of placeholder tokens.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

use itinera_core::Product;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<!-- PRODUCT_PLACEHOLDER:([A-Za-z0-9_-]+) -->")
            .expect("placeholder pattern is valid")
    })
}

/// One renderable piece of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderSegment {
    /// Verbatim markdown text.
    Text { content: String },
    /// A resolved product reference, rendered as a card.
    ProductRef { id: String },
}

/// What to do with a placeholder whose id is absent from the catalog.
///
/// Both behaviors exist in real deployments; this is a configuration point,
/// not a hard-coded choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRefPolicy {
    /// Render a visible inline warning at the reference's position.
    #[default]
    Error,
    /// Omit the reference silently.
    Skip,
}

/// Split a placeholder-substituted document into ordered render segments.
///
/// Non-placeholder text is preserved verbatim; empty text runs are dropped.
/// Unknown ids are handled per `policy`.
pub fn derive_segments(
    document: &str,
    catalog: &[Product],
    policy: UnknownRefPolicy,
) -> Vec<RenderSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in placeholder_re().captures_iter(document) {
        let whole = caps.get(0).expect("group 0 always present");
        let id = caps.get(1).expect("pattern has one capture").as_str();

        if whole.start() > cursor {
            segments.push(RenderSegment::Text {
                content: document[cursor..whole.start()].to_string(),
            });
        }
        cursor = whole.end();

        if catalog.iter().any(|p| p.id == id) {
            segments.push(RenderSegment::ProductRef { id: id.to_string() });
        } else {
            debug!(product_id = id, ?policy, "Placeholder references unknown product");
            match policy {
                UnknownRefPolicy::Error => segments.push(RenderSegment::Text {
                    content: format!("⚠️ 未找到产品: {id}"),
                }),
                UnknownRefPolicy::Skip => {}
            }
        }
    }

    if cursor < document.len() {
        segments.push(RenderSegment::Text {
            content: document[cursor..].to_string(),
        });
    }

    segments
}
