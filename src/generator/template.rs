//! Generator filling an HTML template and handing it to an [`HtmlRenderer`].

use std::path::{Path, PathBuf};

use log::info;

use super::{write_output, DocumentGenerator, GeneratedPdf};
use crate::error::GenerationError;
use crate::template::{
    self, bundled_image_asset, HtmlRenderer, RenderOptions, Substitutions, TextLayoutRenderer,
};

/// Renders one HTML template with varying placeholder values.
///
/// The template path and render options are fixed at construction; every
/// call reads the template again and writes an independent file.
#[derive(Clone, Debug)]
pub struct TemplateGenerator<R = TextLayoutRenderer> {
    template: PathBuf,
    options: RenderOptions,
    renderer: R,
    image_asset: PathBuf,
}

impl<R: HtmlRenderer> TemplateGenerator<R> {
    /// Creates a generator for the template at `template`.
    pub fn new(template: impl Into<PathBuf>, options: RenderOptions, renderer: R) -> Self {
        Self {
            template: template.into(),
            options,
            renderer,
            image_asset: bundled_image_asset(),
        }
    }

    /// Replaces the image referenced by `{{image}}` and returns the updated generator.
    pub fn with_image_asset(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_asset = path.into();
        self
    }

    /// Returns the template path.
    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Returns the render options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Returns the renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Reads the template and replaces its placeholders.
    pub async fn render_html(&self, substitutions: &Substitutions) -> Result<String, GenerationError> {
        let source = tokio::fs::read_to_string(&self.template)
            .await
            .map_err(|source| GenerationError::Template {
                path: self.template.clone(),
                source,
            })?;

        let image_uri = template::image_uri(&self.image_asset);
        Ok(template::substitute(&source, &image_uri, substitutions))
    }
}

impl<R: HtmlRenderer> DocumentGenerator for TemplateGenerator<R> {
    type Payload = Substitutions;

    async fn generate_pdf(
        &self,
        output: &Path,
        substitutions: Substitutions,
    ) -> Result<GeneratedPdf, GenerationError> {
        let html = self.render_html(&substitutions).await?;
        let bytes = self.renderer.render(&html, &self.options).await?;

        let pdf = write_output(output, bytes).await?;
        info!("Created pdf: {}", pdf.path.display());
        Ok(pdf)
    }
}
