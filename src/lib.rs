//! PDF generators sharing one document model and one generator contract.
//!
//! * [`StructuredDocumentGenerator`] lays out declarative [`DocumentDefinitions`].
//! * [`DirectDrawingGenerator`] draws a single text run.
//! * [`TemplateGenerator`] fills an HTML template and hands it to an
//!   [`HtmlRenderer`](template::HtmlRenderer).

pub mod builder;
pub mod demos;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod generator;
pub mod metadata;
pub mod model;
pub mod style;
pub mod template;

pub use error::GenerationError;
pub use fonts::{FontFamilyTypes, FontRegistry};
pub use generator::{
    DirectDrawingGenerator, DocumentGenerator, GeneratedPdf, StructuredDocumentGenerator,
    TemplateGenerator,
};
pub use model::{DocumentDefinitions, DocumentItem};
