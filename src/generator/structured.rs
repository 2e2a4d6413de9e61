//! Generator for declarative document definitions.

use std::path::Path;

use log::{error, info};

use super::{write_output, DocumentGenerator, GeneratedPdf};
use crate::builder;
use crate::error::GenerationError;
use crate::fonts::FontRegistry;
use crate::model::DocumentDefinitions;

/// Lays out [`DocumentDefinitions`] with the fonts of a [`FontRegistry`].
///
/// Failures are logged before they are returned; a failed run may leave a
/// partially written file behind.
#[derive(Clone, Debug, Default)]
pub struct StructuredDocumentGenerator {
    fonts: FontRegistry,
}

impl StructuredDocumentGenerator {
    /// Creates a generator that renders with the families of `fonts`.
    pub fn new(fonts: FontRegistry) -> Self {
        Self { fonts }
    }

    /// Returns the registry used for rendering.
    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    async fn generate(
        &self,
        output: &Path,
        definitions: DocumentDefinitions,
    ) -> Result<GeneratedPdf, GenerationError> {
        let fonts = self.fonts.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            builder::render_definitions(&definitions, &fonts)
        })
        .await??;

        write_output(output, bytes).await
    }
}

impl DocumentGenerator for StructuredDocumentGenerator {
    type Payload = DocumentDefinitions;

    async fn generate_pdf(
        &self,
        output: &Path,
        definitions: DocumentDefinitions,
    ) -> Result<GeneratedPdf, GenerationError> {
        match self.generate(output, definitions).await {
            Ok(pdf) => {
                info!("Created pdf: {}", pdf.path.display());
                Ok(pdf)
            }
            Err(err) => {
                error!("Failed to create {}: {}", output.display(), err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontFamilyTypes;

    #[tokio::test]
    async fn unknown_font_family_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let generator = StructuredDocumentGenerator::new(
            FontRegistry::new().with_family("Ghost", FontFamilyTypes::new("/__missing__/g.ttf")),
        );

        let err = generator
            .generate_pdf(&output, DocumentDefinitions::new(["text"]))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Font { .. }));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let err = StructuredDocumentGenerator::default()
            .generate_pdf(&output, DocumentDefinitions::new(Vec::<String>::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::InvalidDefinition(_)));
    }
}
