//! Generator that draws a single text run with `printpdf`.

use std::io::BufWriter;
use std::path::Path;

use log::info;
use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::{write_output, DocumentGenerator, GeneratedPdf};
use crate::error::GenerationError;
use crate::model::{PageSize, MM_PER_POINT};

/// Default font size of the drawn text, in points.
pub const DEFAULT_FONT_SIZE: u8 = 25;

/// Distance of the text from the top and left page edges, in millimetres.
const PAGE_MARGIN_MM: f64 = 25.4;

/// Writes one page holding one line of text, without any layout.
#[derive(Clone, Debug)]
pub struct DirectDrawingGenerator {
    font_size: u8,
    page_size: PageSize,
    title: String,
}

impl DirectDrawingGenerator {
    /// Creates a generator drawing 25 pt Helvetica on an A4 page.
    pub fn new() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            page_size: PageSize::A4,
            title: "Document".to_string(),
        }
    }

    /// Sets the font size and returns the updated generator.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = font_size;
        self
    }

    /// Sets the page size and returns the updated generator.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the document title and returns the updated generator.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns the configured font size in points.
    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    /// Draws `text` and returns the finished document.
    pub fn draw(&self, text: &str) -> Result<Vec<u8>, GenerationError> {
        let (width, height) = self.page_size.dimensions_mm();
        let (document, page, layer) =
            PdfDocument::new(self.title.as_str(), Mm(width), Mm(height), "Layer 1");

        let font = document
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| GenerationError::Drawing(err.to_string()))?;

        let baseline = height - PAGE_MARGIN_MM - f64::from(self.font_size) * MM_PER_POINT;
        document.get_page(page).get_layer(layer).use_text(
            text,
            self.font_size.into(),
            Mm(PAGE_MARGIN_MM),
            Mm(baseline),
            &font,
        );

        let mut writer = BufWriter::new(Vec::new());
        document
            .save(&mut writer)
            .map_err(|err| GenerationError::Drawing(err.to_string()))?;
        writer
            .into_inner()
            .map_err(|err| GenerationError::Drawing(err.to_string()))
    }
}

impl Default for DirectDrawingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentGenerator for DirectDrawingGenerator {
    type Payload = String;

    async fn generate_pdf(
        &self,
        output: &Path,
        text: String,
    ) -> Result<GeneratedPdf, GenerationError> {
        let generator = self.clone();
        let bytes = tokio::task::spawn_blocking(move || generator.draw(&text)).await??;

        let pdf = write_output(output, bytes).await?;
        info!("Created pdf: {}", pdf.path.display());
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_a_single_page_document() {
        let bytes = DirectDrawingGenerator::new().draw("First text").unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let document = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), 1);
    }

    #[test]
    fn builder_overrides_defaults() {
        let generator = DirectDrawingGenerator::new()
            .with_font_size(12)
            .with_page_size(PageSize::Letter);
        assert_eq!(generator.font_size(), 12);
        assert!(generator.draw("Letter").is_ok());
    }
}
