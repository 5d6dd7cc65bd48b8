//! Conversation session orchestration for Itinera.
//!
//! Drives a full user turn end to end: topic classification, catalog-grounded
//! prompt construction, streaming assembly through `itinera-markup`, and
//! entry finalization. The session is the only writer of its entry log and is
//! designed to be owned by a single task.

pub mod budget;
pub mod prompt;
pub mod session;

pub use budget::parse_budget;
pub use prompt::build_grounding_prompt;
pub use session::{
    ConversationSession, EntryMaterialization, Phase, SessionOptions, MSG_BUSY,
    MSG_INVALID_CREDENTIAL, MSG_NETWORK, MSG_NO_CONTENT, MSG_REJECTED, MSG_SERVICE_PREFIX,
    MSG_TRANSPORT,
};
