//! # Token Metrics Engine
//!
//! For every token with a sufficiently long observation history, computes how
//! it behaves relative to the overall index: directional sensitivities
//! (usens/dsens), OLS beta, 24h/7d momentum, and the blended
//! overbought coefficient.
//!
//! ## Architectural Principles
//!
//! - **Total over uneven data:** every metric degrades to a documented
//!   default instead of raising. Tokens with fewer than 10 index-aligned
//!   observations are omitted from the output entirely — absence means
//!   "not enough history", not zero.
//! - **Deterministic parallelism:** the per-token sweep fans out over rayon
//!   and gathers into an ordered map; each task reads only immutable input.

pub mod engine;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{
    DAY_LOOKBACK, MIN_ALIGNED_OBSERVATIONS, OVERBOUGHT_LOOKBACK, WEEK_LOOKBACK, compute_metrics,
};
