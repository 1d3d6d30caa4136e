use super::config::ConfigError;
use super::runtime::{EnvironmentUnavailable, ExecutionError};
use crate::core::io::documents::DocumentError;
use crate::core::io::pdb::PdbError;
use crate::core::io::tables::TableError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure raised inside a tool adapter.
///
/// Backend failures are lifted to their own [`PipelineError`] variants by the stage that
/// owns the adapter; everything else is reported under that stage.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Environment(#[from] EnvironmentUnavailable),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Required input is missing: {0}")]
    MissingInput(&'static str),

    #[error("Expected output '{}' was not produced", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Malformed output '{}': {reason}", path.display())]
    MalformedArtifact { path: PathBuf, reason: String },

    #[error("Structure file error: {0}")]
    Structure(#[from] PdbError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    EnvironmentUnavailable(#[from] EnvironmentUnavailable),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Backbone generation failed: {0}")]
    Generation(#[source] AdapterError),

    #[error("Sequence design failed: {0}")]
    Design(#[source] AdapterError),

    #[error("Structure prediction failed: {0}")]
    Prediction(#[source] AdapterError),

    #[error("Target preparation failed: {0}")]
    TargetPreparation(String),

    #[error("Structure file error: {0}")]
    Structure(#[from] PdbError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    fn lift(err: AdapterError, wrap: fn(AdapterError) -> PipelineError) -> Self {
        match err {
            AdapterError::Environment(e) => PipelineError::EnvironmentUnavailable(e),
            AdapterError::Execution(e) => PipelineError::Execution(e),
            other => wrap(other),
        }
    }

    pub fn generation(err: AdapterError) -> Self {
        Self::lift(err, PipelineError::Generation)
    }

    pub fn design(err: AdapterError) -> Self {
        Self::lift(err, PipelineError::Design)
    }

    pub fn prediction(err: AdapterError) -> Self {
        Self::lift(err, PipelineError::Prediction)
    }
}
