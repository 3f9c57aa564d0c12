use thiserror::Error;

use crate::store::RecordId;

/// Failures of the in-memory record stores. State is never changed when one
/// of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("required field `{field}` is empty")]
    Validation { field: &'static str },

    #[error("index {index} is out of range for {len} records")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no record with id {0}")]
    NotFound(RecordId),
}

/// Failures of the recipe generation service.
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("no ingredients selected")]
    NoIngredients,

    #[error("recipe service has no api key configured")]
    MissingApiKey,

    #[error("request to recipe service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("recipe service answered {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed answer from recipe service: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("recipe service returned no content")]
    EmptyResponse,
}
