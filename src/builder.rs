//! Construction of layout engine documents from document definitions.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style;
use genpdf::{self, Element, Margins, Mm, PageDecorator, Position, Size};
use log::debug;

use crate::elements::{self, ElementFactory};
use crate::error::GenerationError;
use crate::fonts::FontRegistry;
use crate::metadata;
use crate::model::{
    Background, DocumentDefinitions, DocumentItem, HeaderFooter, HorizontalAlignment,
    PageMargins,
};
use crate::style::{to_style, LoadedFamilies};

/// Builder for `genpdf::Document` instances described by [`DocumentDefinitions`].
pub struct DocumentBuilder<'a> {
    definitions: &'a DocumentDefinitions,
    default_family: String,
    families: BTreeMap<String, FontFamily<FontData>>,
    page_count: usize,
    page_counter: Option<Rc<Cell<usize>>>,
}

impl<'a> DocumentBuilder<'a> {
    /// Creates a builder for `definitions` using the loaded font families.
    ///
    /// `default_family` must be a key of `families`.
    pub fn new(
        definitions: &'a DocumentDefinitions,
        default_family: impl Into<String>,
        families: BTreeMap<String, FontFamily<FontData>>,
    ) -> Self {
        Self {
            definitions,
            default_family: default_family.into(),
            families,
            page_count: 0,
            page_counter: None,
        }
    }

    /// Sets the total page count passed to dynamic headers and footers.
    pub fn with_page_count(mut self, page_count: usize) -> Self {
        self.page_count = page_count;
        self
    }

    /// Records the number of decorated pages into `counter` while rendering.
    pub fn with_page_counter(mut self, counter: Rc<Cell<usize>>) -> Self {
        self.page_counter = Some(counter);
        self
    }

    /// Builds a fully configured `genpdf::Document` instance.
    pub fn build(self) -> Result<genpdf::Document, GenerationError> {
        let definitions = self.definitions;
        let default_data = self.families.get(&self.default_family).ok_or_else(|| {
            GenerationError::Config(format!(
                "default font family '{}' was not loaded",
                self.default_family
            ))
        })?;

        let mut document = genpdf::Document::new(default_data.clone());
        let mut loaded = LoadedFamilies::new(self.default_family.clone());
        for (name, data) in &self.families {
            if *name != self.default_family {
                loaded.insert(name.clone(), document.add_font_family(data.clone()));
            }
        }

        let (width_mm, height_mm) = definitions.page_dimensions_mm();
        document.set_paper_size(Size::new(
            elements::mm_from_f64(width_mm),
            elements::mm_from_f64(height_mm),
        ));
        if let Some(title) = &definitions.info().title {
            document.set_title(title.clone());
        }

        let default_style = definitions.default_style();
        if let Some(size) = default_style.font_size {
            document.set_font_size(size);
        }
        let base_style = to_style(default_style, &loaded)?;
        let alignment = default_style.alignment.unwrap_or_default();

        let margins = definitions.page_margins();
        let factory = Rc::new(ElementFactory::new(
            definitions.styles().clone(),
            definitions.images().clone(),
            loaded,
            elements::content_width_pt(width_mm, margins.left, margins.right),
        ));

        document.set_page_decorator(DefinitionDecorator {
            page: 0,
            page_count: self.page_count,
            margins,
            header: definitions.header().cloned(),
            footer: definitions.footer().cloned(),
            background: definitions.background().cloned(),
            factory: Rc::clone(&factory),
            alignment,
            page_counter: self.page_counter,
        });

        for item in definitions.content() {
            for element in factory.build_flow(item, alignment)? {
                document.push(element.styled(base_style.clone()));
            }
        }

        Ok(document)
    }
}

/// Renders `definitions` with the fonts of `registry` into PDF bytes.
///
/// When a header or footer depends on the total page count the document is
/// laid out twice: once to count pages, once to produce the output.
pub fn render_definitions(
    definitions: &DocumentDefinitions,
    registry: &FontRegistry,
) -> Result<Vec<u8>, GenerationError> {
    definitions.validate()?;

    let default_family = registry
        .select(definitions.default_style().font.as_deref())?
        .to_string();
    let families = registry.load()?;

    let page_count = if definitions.needs_page_count() {
        let counter = Rc::new(Cell::new(0));
        DocumentBuilder::new(definitions, default_family.clone(), families.clone())
            .with_page_counter(Rc::clone(&counter))
            .build()?
            .render(io::sink())?;
        debug!("counting pass laid out {} pages", counter.get());
        counter.get()
    } else {
        0
    };

    let mut bytes = Vec::new();
    DocumentBuilder::new(definitions, default_family, families)
        .with_page_count(page_count)
        .build()?
        .render(&mut bytes)?;

    if definitions.info().is_empty() {
        Ok(bytes)
    } else {
        metadata::apply_document_information(&bytes, definitions.info())
    }
}

/// Page decorator that applies page margins and draws the background,
/// header and footer of every page.
///
/// Headers and footers occupy the top and bottom margin bands, the
/// background spans the whole page and is drawn first.
struct DefinitionDecorator {
    page: usize,
    page_count: usize,
    margins: PageMargins,
    header: Option<HeaderFooter>,
    footer: Option<HeaderFooter>,
    background: Option<Background>,
    factory: Rc<ElementFactory>,
    alignment: HorizontalAlignment,
    page_counter: Option<Rc<Cell<usize>>>,
}

impl DefinitionDecorator {
    fn element(&self, item: &DocumentItem) -> Result<elements::ItemElement, Error> {
        self.factory
            .build(item, self.alignment)
            .map_err(|err| Error::new(err.to_string(), ErrorKind::InvalidData))
    }

    #[allow(clippy::too_many_arguments)]
    fn render_band<'a>(
        &self,
        context: &genpdf::Context,
        page_area: &genpdf::render::Area<'a>,
        item: &DocumentItem,
        offset: Mm,
        height: Mm,
        style: style::Style,
        label: &str,
    ) -> Result<(), Error> {
        let zero = Mm::default();
        let mut band = page_area.clone();
        band.add_offset(Position::new(zero, offset));
        band.set_height(height);
        band.add_margins(Margins::trbl(
            zero,
            elements::mm_from_points(self.margins.right),
            zero,
            elements::mm_from_points(self.margins.left),
        ));

        let result = self.element(item)?.render(context, band, style)?;
        if result.has_more {
            return Err(Error::new(
                format!("{label} does not fit into the page margin"),
                ErrorKind::PageSizeExceeded,
            ));
        }
        Ok(())
    }
}

impl PageDecorator for DefinitionDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        if let Some(counter) = &self.page_counter {
            counter.set(self.page);
        }

        let page_area = area.clone();
        let page_height = page_area.size().height;
        let top = elements::mm_from_points(self.margins.top);
        let bottom = elements::mm_from_points(self.margins.bottom);

        if let Some(background) = &self.background {
            let item = background.resolve(self.page);
            self.element(&item)?
                .render(context, page_area.clone(), style.clone())?;
        }

        if let Some(header) = &self.header {
            let item = header.resolve(self.page, self.page_count);
            self.render_band(
                context,
                &page_area,
                &item,
                Mm::default(),
                top,
                style.clone(),
                "Header",
            )?;
        }

        if let Some(footer) = &self.footer {
            if bottom > page_height {
                return Err(Error::new(
                    "Footer margin exceeds the page height",
                    ErrorKind::InvalidData,
                ));
            }
            let item = footer.resolve(self.page, self.page_count);
            self.render_band(
                context,
                &page_area,
                &item,
                page_height - bottom,
                bottom,
                style.clone(),
                "Footer",
            )?;
        }

        area.add_margins(Margins::trbl(
            top,
            elements::mm_from_points(self.margins.right),
            bottom,
            elements::mm_from_points(self.margins.left),
        ));

        Ok(area)
    }
}
