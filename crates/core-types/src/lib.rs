pub mod error;
pub mod structs;
pub mod tags;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use structs::{IndexPoint, Observation, ReturnRecord, TokenMeta, TokenMetricsRecord, TokenSeries};
pub use tags::TagSet;
