use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown message type `{0}`")]
    UnknownMessage(String),
    #[error("malformed message payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server reported: {0}")]
    Server(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for query parameter `{key}`")]
    InvalidValue { key: &'static str, value: String },
}
