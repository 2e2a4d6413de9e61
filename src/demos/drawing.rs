use std::path::Path;

use crate::error::GenerationError;
use crate::generator::{DirectDrawingGenerator, DocumentGenerator, GeneratedPdf};

/// File name written by [`run`].
pub const FILE_NAME: &str = "pdfKitTs.pdf";

/// Text drawn by [`run`].
pub const TEXT: &str = "First text";

/// Draws [`TEXT`] to `output_dir/pdfKitTs.pdf`.
pub async fn run(output_dir: &Path) -> Result<GeneratedPdf, GenerationError> {
    super::ensure_dir(output_dir).await?;
    DirectDrawingGenerator::new()
        .generate_pdf(&output_dir.join(FILE_NAME), TEXT.to_string())
        .await
}
