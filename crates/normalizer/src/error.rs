use chrono::{DateTime, Utc};
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Duplicate timestamp {timestamp} for token '{token_id}'")]
    DuplicateTimestamp {
        token_id: String,
        timestamp: DateTime<Utc>,
    },
}
