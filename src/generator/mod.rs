//! The generator contract and its three implementations.
//!
//! Every generator writes exactly one file per call and resolves to the bytes
//! it wrote. CPU-bound layout runs on the blocking thread pool so callers on an
//! async runtime are never stalled.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::GenerationError;

pub mod drawing;
pub mod structured;
pub mod template;

pub use drawing::DirectDrawingGenerator;
pub use structured::StructuredDocumentGenerator;
pub use template::TemplateGenerator;

/// A file produced by a [`DocumentGenerator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedPdf {
    /// Location the document was written to.
    pub path: PathBuf,
    /// The rendered document.
    pub bytes: Vec<u8>,
}

/// Common interface of all PDF generators.
///
/// The payload describes the content to render and differs per generator.
pub trait DocumentGenerator {
    /// Input consumed by a single generation run.
    type Payload: Send;

    /// Renders `payload` and writes the result to `output`.
    fn generate_pdf(
        &self,
        output: &Path,
        payload: Self::Payload,
    ) -> impl Future<Output = Result<GeneratedPdf, GenerationError>> + Send;
}

/// Writes `bytes` to `output` and reports the generated file.
pub(crate) async fn write_output(
    output: &Path,
    bytes: Vec<u8>,
) -> Result<GeneratedPdf, GenerationError> {
    tokio::fs::write(output, &bytes)
        .await
        .map_err(|source| GenerationError::io(output, source))?;

    Ok(GeneratedPdf {
        path: output.to_path_buf(),
        bytes,
    })
}
