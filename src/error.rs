use thiserror::Error;

use crate::session::Difficulty;

#[derive(Error, Debug)]
pub enum TypespeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize/deserialize data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write history: {0}")]
    Csv(#[from] csv::Error),

    #[error("Phrase pool for {0} difficulty is empty")]
    EmptyPool(Difficulty),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Phrase file {0} is not valid UTF-8")]
    Corpus(String),
}

pub type Result<T> = std::result::Result<T, TypespeedError>;
