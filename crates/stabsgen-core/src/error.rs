use thiserror::Error;

use crate::types::TypeId;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid type definition: {0}")]
    InvalidType(String),

    #[error("Unknown type {0}")]
    UnknownType(TypeId),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Cannot render configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Invalid compilation unit: {0}")]
    Unit(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
