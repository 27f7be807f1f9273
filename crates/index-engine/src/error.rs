use normalizer::NormalizerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error(transparent)]
    Normalizer(#[from] NormalizerError),
}
