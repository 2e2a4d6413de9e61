//! Demonstration runs writing one document per generator.
//!
//! Output goes to `pdfs/` relative to the working directory unless another
//! directory is given.

use std::path::Path;

use log::info;

use crate::error::GenerationError;
use crate::generator::GeneratedPdf;
use crate::template::HtmlRenderer;

pub mod drawing;
pub mod structured;
pub mod template;

/// Default output directory of the demos.
pub const OUTPUT_DIR: &str = "pdfs";

/// Runs all three demos into `output_dir`, creating it when missing.
pub async fn run_all<R: HtmlRenderer>(
    output_dir: &Path,
    renderer: R,
) -> Result<Vec<GeneratedPdf>, GenerationError> {
    ensure_dir(output_dir).await?;

    let generated = vec![
        structured::run(output_dir).await?,
        drawing::run(output_dir).await?,
        template::run(output_dir, renderer).await?,
    ];

    info!("All {} demo documents were created", generated.len());
    Ok(generated)
}

pub(crate) async fn ensure_dir(path: &Path) -> Result<(), GenerationError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| GenerationError::io(path, source))
}
