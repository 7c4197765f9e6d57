use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Schema backend error: {0}")]
    Schema(String),

    #[error("Output file {} already exists (pass force to overwrite)", .0.display())]
    OutputExists(PathBuf),

    #[error("Graph has not been generated yet")]
    NotGenerated,
}
