//! Error type shared by all generators.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while producing a PDF file.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// A generator or registry was configured with unusable values.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A font family could not be resolved or loaded.
    #[error("font family '{family}' could not be loaded: {source}")]
    Font {
        /// Name of the family that failed.
        family: String,
        /// Underlying loader error.
        #[source]
        source: genpdf::error::Error,
    },

    /// The document definition violates a structural rule.
    #[error("invalid document definition: {0}")]
    InvalidDefinition(String),

    /// The layout engine failed while building or rendering the document.
    #[error("layout failed: {0}")]
    Layout(#[from] genpdf::error::Error),

    /// The low-level drawing backend failed.
    #[error("drawing failed: {0}")]
    Drawing(String),

    /// The rendered document could not be post-processed.
    #[error("failed to update document information: {0}")]
    Metadata(#[from] lopdf::Error),

    /// The HTML template could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    Template {
        /// Path of the template file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The HTML rendering backend reported a failure.
    #[error("html rendering failed: {0}")]
    Render(String),

    /// Reading or writing a file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A JSON document definition could not be decoded.
    #[error("failed to decode document definition: {0}")]
    Decode(#[from] serde_json::Error),

    /// A blocking render task panicked or was cancelled.
    #[error("render task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl GenerationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
