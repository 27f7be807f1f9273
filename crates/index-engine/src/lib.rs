//! # Index Engine
//!
//! Aggregates normalized per-token return/weight series into a single
//! capitalization-weighted index series, for the whole universe or a
//! tag-scoped subset, and reconstructs the compounding index level.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O, no shared state. The same observations always
//!   produce the same series.
//! - **Total over uneven data:** zero-weight periods and empty tag subsets
//!   are normal results, never errors. Only malformed input is rejected.

pub mod engine;
pub mod error;
pub mod series;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{DEFAULT_BASE_VALUE, build_index, build_index_for_tag};
pub use error::IndexError;
pub use series::IndexSeries;
