//! Gateway implementations for Itinera.
//!
//! All gateways implement the `itinera_core` traits. The composition root
//! selects the Zhipu gateway when an API key is configured and falls back to
//! the scripted replay otherwise.

pub mod scripted;
pub mod sse;
pub mod zhipu;

pub use scripted::{ScriptedGateway, SCRIPTED_ITINERARY};
pub use sse::{SseDecoder, SseEvent};
pub use zhipu::ZhipuGateway;
