use crate::acquisition::error::ProviderError;
use crate::convert::error::ConvertError;
use crate::store::StoreError;
use crate::types::dataset::DatasetParseError;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetforgeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    DatasetParse(#[from] DatasetParseError),

    #[error("failed to serialize normalized dataset")]
    DatasetSerialize(#[from] serde_json::Error),
}
