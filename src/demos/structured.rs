use std::path::Path;

use crate::error::GenerationError;
use crate::generator::{DocumentGenerator, GeneratedPdf, StructuredDocumentGenerator};
use crate::model::DocumentDefinitions;

/// File name written by [`run`].
pub const FILE_NAME: &str = "pdfMakeTs.pdf";

/// Returns the two paragraph document rendered by [`run`].
pub fn definitions() -> DocumentDefinitions {
    DocumentDefinitions::new([
        "First paragraph",
        "Another paragraph, this time a little bit longer to make sure, this line will be divided into at least two lines",
    ])
}

/// Renders [`definitions`] with the bundled fonts to `output_dir/pdfMakeTs.pdf`.
pub async fn run(output_dir: &Path) -> Result<GeneratedPdf, GenerationError> {
    super::ensure_dir(output_dir).await?;
    StructuredDocumentGenerator::default()
        .generate_pdf(&output_dir.join(FILE_NAME), definitions())
        .await
}
