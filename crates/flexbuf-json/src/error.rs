use flexbuf::FlexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("flexbuffer error: {0}")]
    Flex(#[from] FlexError),
    #[error("json parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("object with {len} keys does not fit a {digits}-digit index prefix")]
    TooManyKeys { len: usize, digits: usize },
    #[error("map key '{key}' is shorter than the {digits}-digit index prefix")]
    MissingKeyPrefix { key: String, digits: usize },
}
