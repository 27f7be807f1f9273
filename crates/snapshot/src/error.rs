use index_engine::IndexError;
use normalizer::NormalizerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Normalizer(#[from] NormalizerError),
}
