// Shared HTTP transport
//
// - bucket: token bucket bounding outbound request rate
// - adaptive: status-code driven rate/pause advice
// - client: the Transport every source and the authenticator send through
//
// One Transport is built per scan and shared behind an Arc.

pub mod adaptive;
pub mod bucket;
pub mod client;

pub use adaptive::{AdaptiveController, Advice};
pub use bucket::TokenBucket;
pub use client::{Response, Transport, MAX_REDIRECTS};
