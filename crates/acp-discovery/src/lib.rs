pub mod engine;
pub mod negotiate;
pub mod request;
pub mod scoring;

pub use engine::discover;
pub use negotiate::{negotiate, CounterOffer, NegotiationOutcome};
pub use request::{can_fulfill, DiscoveryMatch, DiscoveryRequest, Subscores};
pub use scoring::{availability_score, experience_score, price_score, relevance_score, reputation_score};
