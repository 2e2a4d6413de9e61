use std::path::Path;

use crate::error::GenerationError;
use crate::generator::{DocumentGenerator, GeneratedPdf, TemplateGenerator};
use crate::template::{bundled_template, Dimension, HtmlRenderer, RenderOptions, Substitutions};

/// File name written by [`run`].
pub const FILE_NAME: &str = "htmlPdfTs.pdf";

/// Returns the 50mm by 90mm page used by [`run`].
pub fn options() -> RenderOptions {
    RenderOptions::new().with_size(Dimension::mm(50.0), Dimension::mm(90.0))
}

/// Returns the placeholder values used by [`run`].
pub fn substitutions() -> Substitutions {
    Substitutions::new()
        .with("firstName", "John")
        .with("lastName", "Doe")
}

/// Fills the bundled template and renders it to `output_dir/htmlPdfTs.pdf`.
pub async fn run<R: HtmlRenderer>(
    output_dir: &Path,
    renderer: R,
) -> Result<GeneratedPdf, GenerationError> {
    super::ensure_dir(output_dir).await?;
    TemplateGenerator::new(bundled_template(), options(), renderer)
        .generate_pdf(&output_dir.join(FILE_NAME), substitutions())
        .await
}
