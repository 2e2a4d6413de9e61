//! Data structures describing the logical content of a PDF document.
//!
//! The types in this module form a declarative description of a document that
//! is handed to [`crate::generator::StructuredDocumentGenerator`].  They do not
//! reference the layout engine directly so definitions can be produced by
//! frontends, decoded from JSON (see [`DocumentDefinitions::from_json`]) or
//! exchanged between threads without pulling in rendering state.
//!
//! A [`DocumentItem`] is a closed sum type: every shape has exactly one variant,
//! so the question of which optional field is "the" discriminant never arises
//! once a value has been constructed.

mod de;
mod page;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::GenerationError;

pub use page::{PageMargins, PageOrientation, PageSize, MM_PER_POINT};

/// Horizontal alignment of text and images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Right aligned content.
    Right,
    /// Fully justified paragraphs.
    Justify,
}

/// Inline style attributes that can be attached to items or registered by name.
///
/// Unset fields inherit from the enclosing item, the named styles referenced by
/// the item and finally the document's default style.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStyle {
    /// Font size in points. Fractional JSON sizes are rounded to the nearest point.
    #[serde(default, deserialize_with = "de::font_size")]
    pub font_size: Option<u8>,
    /// Bold flag.
    pub bold: Option<bool>,
    /// Italic flag.
    #[serde(alias = "italics")]
    pub italic: Option<bool>,
    /// Text color, either `#rrggbb` or a basic color name.
    pub color: Option<String>,
    /// Horizontal alignment.
    pub alignment: Option<HorizontalAlignment>,
    /// Font family name looked up in the font registry.
    pub font: Option<String>,
}

impl DocumentStyle {
    /// Creates an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the font size and returns the updated style.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Marks the style as bold.
    pub fn bold(mut self) -> Self {
        self.bold = Some(true);
        self
    }

    /// Marks the style as italic.
    pub fn italic(mut self) -> Self {
        self.italic = Some(true);
        self
    }

    /// Sets the color and returns the updated style.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the alignment and returns the updated style.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Sets the font family and returns the updated style.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    /// Returns a style where every attribute set on `other` overrides `self`.
    pub fn merged_with(&self, other: &DocumentStyle) -> DocumentStyle {
        DocumentStyle {
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            color: other.color.clone().or_else(|| self.color.clone()),
            alignment: other.alignment.or(self.alignment),
            font: other.font.clone().or_else(|| self.font.clone()),
        }
    }

    /// Returns `true` when no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == DocumentStyle::default()
    }
}

/// Outer spacing around an item, in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Margin {
    /// The same spacing on all four sides.
    Uniform(f64),
    /// Horizontal (left/right) and vertical (top/bottom) spacing.
    Symmetric {
        /// Left and right spacing.
        horizontal: f64,
        /// Top and bottom spacing.
        vertical: f64,
    },
    /// Explicit spacing per side.
    Sides {
        /// Left spacing.
        left: f64,
        /// Top spacing.
        top: f64,
        /// Right spacing.
        right: f64,
        /// Bottom spacing.
        bottom: f64,
    },
}

impl Margin {
    /// Returns the margin as `[left, top, right, bottom]`.
    pub fn sides(&self) -> [f64; 4] {
        match *self {
            Margin::Uniform(all) => [all, all, all, all],
            Margin::Symmetric {
                horizontal,
                vertical,
            } => [horizontal, vertical, horizontal, vertical],
            Margin::Sides {
                left,
                top,
                right,
                bottom,
            } => [left, top, right, bottom],
        }
    }
}

/// Forces a page break around an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageBreak {
    /// Start the item on a new page.
    Before,
    /// Continue with a new page after the item.
    After,
}

/// Attributes shared by every non-plain [`DocumentItem`] variant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemAttributes {
    /// Inline style attributes.
    pub style: DocumentStyle,
    /// Outer spacing.
    pub margin: Option<Margin>,
    /// Names of registered styles applied before the inline style, in order.
    pub style_refs: Vec<String>,
    /// Page break hint.
    pub page_break: Option<PageBreak>,
}

impl ItemAttributes {
    /// Creates empty attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inline style and returns the updated attributes.
    pub fn with_style(mut self, style: DocumentStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the margin and returns the updated attributes.
    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = Some(margin);
        self
    }

    /// Appends a named style reference and returns the updated attributes.
    pub fn with_style_ref(mut self, name: impl Into<String>) -> Self {
        self.style_refs.push(name.into());
        self
    }

    /// Sets the page break hint and returns the updated attributes.
    pub fn with_page_break(mut self, page_break: PageBreak) -> Self {
        self.page_break = Some(page_break);
        self
    }
}

/// Body of a text item: a single string or a run of nested items.
#[derive(Clone, Debug, PartialEq)]
pub enum TextContent {
    /// A plain string.
    Plain(String),
    /// Nested items rendered inline when they are textual.
    Nested(Vec<DocumentItem>),
}

/// Styled text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    /// The text body.
    pub content: TextContent,
    /// Shared item attributes.
    pub attributes: ItemAttributes,
}

/// Requested width of a column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnWidth {
    /// Fixed width in points.
    Points(f64),
    /// Width derived from the content.
    Auto,
    /// Share of the remaining space.
    Star,
    /// Percentage of the available width.
    Percent(f64),
}

/// A single column of a [`ColumnsItem`].
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Requested width.
    pub width: ColumnWidth,
    /// Column text.
    pub text: String,
}

/// Side-by-side columns.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnsItem {
    /// Columns from left to right.
    pub columns: Vec<Column>,
    /// Gap between adjacent columns, in points.
    pub column_gap: f64,
    /// Shared item attributes.
    pub attributes: ItemAttributes,
}

/// A grid of items.
#[derive(Clone, Debug, PartialEq)]
pub struct TableItem {
    /// Number of leading rows that form the table header. Their cells are set in bold.
    pub header_rows: usize,
    /// Width of every column.
    pub widths: Vec<ColumnWidth>,
    /// Rows of cells; every row has `widths.len()` cells.
    pub body: Vec<Vec<DocumentItem>>,
    /// Shared item attributes.
    pub attributes: ItemAttributes,
}

/// Ordered or unordered list entries.
#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    /// List entries.
    pub items: Vec<DocumentItem>,
    /// Shared item attributes.
    pub attributes: ItemAttributes,
}

/// Items stacked vertically.
#[derive(Clone, Debug, PartialEq)]
pub struct StackItem {
    /// Stacked items.
    pub items: Vec<DocumentItem>,
    /// Shared item attributes.
    pub attributes: ItemAttributes,
}

/// An image referenced by path or by name in [`DocumentDefinitions::images`].
#[derive(Clone, Debug, PartialEq)]
pub struct ImageItem {
    /// Path or registry name.
    pub image: String,
    /// Rendered width in points.
    pub width: Option<f64>,
    /// Rendered height in points.
    pub height: Option<f64>,
    /// Box `[width, height]` in points the image is scaled to fit into.
    pub fit: Option<[f64; 2]>,
    /// Shared item attributes.
    pub attributes: ItemAttributes,
}

impl ImageItem {
    /// Creates an image item without sizing constraints.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            width: None,
            height: None,
            fit: None,
            attributes: ItemAttributes::default(),
        }
    }

    /// Sets the width and returns the updated item.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the height and returns the updated item.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Sets the fit box and returns the updated item.
    pub fn with_fit(mut self, width: f64, height: f64) -> Self {
        self.fit = Some([width, height]);
        self
    }
}

/// One node of the document content tree.
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentItem {
    /// Unstyled paragraph.
    Plain(String),
    /// Styled text (`text`).
    Text(TextItem),
    /// Columns (`columns`).
    Columns(ColumnsItem),
    /// Table (`table`).
    Table(TableItem),
    /// Numbered list (`ol`).
    NumberedList(ListItem),
    /// Bulleted list (`ul`).
    BulletedList(ListItem),
    /// Vertical stack (`stack`).
    Stack(StackItem),
    /// Image (`image`).
    Image(ImageItem),
}

impl DocumentItem {
    /// Creates a styled text item.
    pub fn text(text: impl Into<String>, style: DocumentStyle) -> Self {
        Self::Text(TextItem {
            content: TextContent::Plain(text.into()),
            attributes: ItemAttributes::new().with_style(style),
        })
    }

    /// Creates a text item made of inline runs.
    pub fn runs(items: impl Into<Vec<DocumentItem>>) -> Self {
        Self::Text(TextItem {
            content: TextContent::Nested(items.into()),
            attributes: ItemAttributes::default(),
        })
    }

    /// Creates a vertical stack.
    pub fn stack(items: impl Into<Vec<DocumentItem>>) -> Self {
        Self::Stack(StackItem {
            items: items.into(),
            attributes: ItemAttributes::default(),
        })
    }

    /// Creates a numbered list.
    pub fn ordered_list(items: impl Into<Vec<DocumentItem>>) -> Self {
        Self::NumberedList(ListItem {
            items: items.into(),
            attributes: ItemAttributes::default(),
        })
    }

    /// Creates a bulleted list.
    pub fn bulleted_list(items: impl Into<Vec<DocumentItem>>) -> Self {
        Self::BulletedList(ListItem {
            items: items.into(),
            attributes: ItemAttributes::default(),
        })
    }

    /// Creates a table with the given column widths and rows.
    pub fn table(widths: Vec<ColumnWidth>, body: Vec<Vec<DocumentItem>>) -> Self {
        Self::Table(TableItem {
            header_rows: 0,
            widths,
            body,
            attributes: ItemAttributes::default(),
        })
    }

    /// Creates an image item.
    pub fn image(image: ImageItem) -> Self {
        Self::Image(image)
    }

    /// Returns the discriminant name used by the JSON representation.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentItem::Plain(_) => "string",
            DocumentItem::Text(_) => "text",
            DocumentItem::Columns(_) => "columns",
            DocumentItem::Table(_) => "table",
            DocumentItem::NumberedList(_) => "ol",
            DocumentItem::BulletedList(_) => "ul",
            DocumentItem::Stack(_) => "stack",
            DocumentItem::Image(_) => "image",
        }
    }

    /// Returns the shared attributes, or `None` for plain strings.
    pub fn attributes(&self) -> Option<&ItemAttributes> {
        match self {
            DocumentItem::Plain(_) => None,
            DocumentItem::Text(item) => Some(&item.attributes),
            DocumentItem::Columns(item) => Some(&item.attributes),
            DocumentItem::Table(item) => Some(&item.attributes),
            DocumentItem::NumberedList(item) | DocumentItem::BulletedList(item) => {
                Some(&item.attributes)
            }
            DocumentItem::Stack(item) => Some(&item.attributes),
            DocumentItem::Image(item) => Some(&item.attributes),
        }
    }

    /// Replaces the shared attributes. Plain strings are promoted to text items.
    pub fn with_attributes(self, attributes: ItemAttributes) -> Self {
        match self {
            DocumentItem::Plain(text) => DocumentItem::Text(TextItem {
                content: TextContent::Plain(text),
                attributes,
            }),
            DocumentItem::Text(item) => DocumentItem::Text(TextItem { attributes, ..item }),
            DocumentItem::Columns(item) => DocumentItem::Columns(ColumnsItem { attributes, ..item }),
            DocumentItem::Table(item) => DocumentItem::Table(TableItem { attributes, ..item }),
            DocumentItem::NumberedList(item) => {
                DocumentItem::NumberedList(ListItem { attributes, ..item })
            }
            DocumentItem::BulletedList(item) => {
                DocumentItem::BulletedList(ListItem { attributes, ..item })
            }
            DocumentItem::Stack(item) => DocumentItem::Stack(StackItem { attributes, ..item }),
            DocumentItem::Image(item) => DocumentItem::Image(ImageItem { attributes, ..item }),
        }
    }

    fn children(&self) -> Vec<&DocumentItem> {
        match self {
            DocumentItem::Plain(_) | DocumentItem::Columns(_) | DocumentItem::Image(_) => {
                Vec::new()
            }
            DocumentItem::Text(item) => match &item.content {
                TextContent::Plain(_) => Vec::new(),
                TextContent::Nested(items) => items.iter().collect(),
            },
            DocumentItem::Table(item) => item.body.iter().flatten().collect(),
            DocumentItem::NumberedList(item) | DocumentItem::BulletedList(item) => {
                item.items.iter().collect()
            }
            DocumentItem::Stack(item) => item.items.iter().collect(),
        }
    }
}

impl From<&str> for DocumentItem {
    fn from(text: &str) -> Self {
        DocumentItem::Plain(text.to_string())
    }
}

impl From<String> for DocumentItem {
    fn from(text: String) -> Self {
        DocumentItem::Plain(text)
    }
}

/// Callback producing a header or footer from the current page and the total page count.
pub type HeaderFooterFn = Arc<dyn Fn(usize, usize) -> DocumentItem + Send + Sync>;

/// Callback producing a background layer from the current page number.
pub type BackgroundFn = Arc<dyn Fn(usize) -> DocumentItem + Send + Sync>;

/// Header or footer content.
#[derive(Clone)]
pub enum HeaderFooter {
    /// The same item on every page.
    Static(DocumentItem),
    /// An item computed per page; pages are numbered from 1.
    Dynamic(HeaderFooterFn),
}

impl HeaderFooter {
    /// Wraps a per-page callback.
    pub fn dynamic<F>(callback: F) -> Self
    where
        F: Fn(usize, usize) -> DocumentItem + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(callback))
    }

    /// Returns the item for `page` out of `page_count` pages.
    pub fn resolve(&self, page: usize, page_count: usize) -> DocumentItem {
        match self {
            HeaderFooter::Static(item) => item.clone(),
            HeaderFooter::Dynamic(callback) => callback(page, page_count),
        }
    }

    /// Returns whether the content depends on the page.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, HeaderFooter::Dynamic(_))
    }
}

impl fmt::Debug for HeaderFooter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderFooter::Static(item) => f.debug_tuple("Static").field(item).finish(),
            HeaderFooter::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Background layer drawn beneath the page content.
#[derive(Clone)]
pub enum Background {
    /// The same item on every page.
    Static(DocumentItem),
    /// An item computed from the page number.
    Dynamic(BackgroundFn),
}

impl Background {
    /// Wraps a per-page callback.
    pub fn dynamic<F>(callback: F) -> Self
    where
        F: Fn(usize) -> DocumentItem + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(callback))
    }

    /// Returns the item for `page`.
    pub fn resolve(&self, page: usize) -> DocumentItem {
        match self {
            Background::Static(item) => item.clone(),
            Background::Dynamic(callback) => callback(page),
        }
    }
}

impl fmt::Debug for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Static(item) => f.debug_tuple("Static").field(item).finish(),
            Background::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Entries written into the PDF document information dictionary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentInformation {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Keywords.
    pub keywords: Option<String>,
}

impl DocumentInformation {
    /// Returns `true` when no entry is set.
    pub fn is_empty(&self) -> bool {
        *self == DocumentInformation::default()
    }
}

/// Root aggregate describing a complete document.
#[derive(Clone, Debug, Default)]
pub struct DocumentDefinitions {
    content: Vec<DocumentItem>,
    header: Option<HeaderFooter>,
    footer: Option<HeaderFooter>,
    background: Option<Background>,
    info: DocumentInformation,
    images: BTreeMap<String, String>,
    styles: BTreeMap<String, DocumentStyle>,
    page_size: PageSize,
    page_orientation: PageOrientation,
    page_margins: PageMargins,
    default_style: DocumentStyle,
}

impl DocumentDefinitions {
    /// Creates a definition with the given content and default page setup.
    pub fn new<I, T>(content: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DocumentItem>,
    {
        Self {
            content: content.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Decodes a definition from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, GenerationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the content items.
    pub fn content(&self) -> &[DocumentItem] {
        &self.content
    }

    /// Returns the header, if any.
    pub fn header(&self) -> Option<&HeaderFooter> {
        self.header.as_ref()
    }

    /// Returns the footer, if any.
    pub fn footer(&self) -> Option<&HeaderFooter> {
        self.footer.as_ref()
    }

    /// Returns the background layer, if any.
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Returns the document information.
    pub fn info(&self) -> &DocumentInformation {
        &self.info
    }

    /// Returns the named image registry.
    pub fn images(&self) -> &BTreeMap<String, String> {
        &self.images
    }

    /// Returns the named style registry.
    pub fn styles(&self) -> &BTreeMap<String, DocumentStyle> {
        &self.styles
    }

    /// Returns the page size.
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Returns the page orientation.
    pub fn page_orientation(&self) -> PageOrientation {
        self.page_orientation
    }

    /// Returns the page margins.
    pub fn page_margins(&self) -> PageMargins {
        self.page_margins
    }

    /// Returns the default style.
    pub fn default_style(&self) -> &DocumentStyle {
        &self.default_style
    }

    /// Returns the page width and height in millimetres after applying the orientation.
    pub fn page_dimensions_mm(&self) -> (f64, f64) {
        self.page_orientation
            .apply(self.page_size.dimensions_mm())
    }

    /// Returns whether a header or footer needs the total page count.
    pub fn needs_page_count(&self) -> bool {
        self.header.as_ref().is_some_and(HeaderFooter::is_dynamic)
            || self.footer.as_ref().is_some_and(HeaderFooter::is_dynamic)
    }

    /// Appends a content item and returns the updated definition.
    pub fn with_item(mut self, item: impl Into<DocumentItem>) -> Self {
        self.content.push(item.into());
        self
    }

    /// Sets the header and returns the updated definition.
    pub fn with_header(mut self, header: HeaderFooter) -> Self {
        self.header = Some(header);
        self
    }

    /// Sets the footer and returns the updated definition.
    pub fn with_footer(mut self, footer: HeaderFooter) -> Self {
        self.footer = Some(footer);
        self
    }

    /// Sets the background layer and returns the updated definition.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    /// Sets the document information and returns the updated definition.
    pub fn with_info(mut self, info: DocumentInformation) -> Self {
        self.info = info;
        self
    }

    /// Registers a named image and returns the updated definition.
    pub fn with_image(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.images.insert(name.into(), path.into());
        self
    }

    /// Registers a named style and returns the updated definition.
    pub fn with_style(mut self, name: impl Into<String>, style: DocumentStyle) -> Self {
        self.styles.insert(name.into(), style);
        self
    }

    /// Sets the page size and returns the updated definition.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the page orientation and returns the updated definition.
    pub fn with_page_orientation(mut self, orientation: PageOrientation) -> Self {
        self.page_orientation = orientation;
        self
    }

    /// Sets the page margins and returns the updated definition.
    pub fn with_page_margins(mut self, margins: PageMargins) -> Self {
        self.page_margins = margins;
        self
    }

    /// Sets the default style and returns the updated definition.
    pub fn with_default_style(mut self, style: DocumentStyle) -> Self {
        self.default_style = style;
        self
    }

    /// Checks the structural rules the layout step relies on.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.content.is_empty() {
            return Err(GenerationError::InvalidDefinition(
                "content must contain at least one item".to_string(),
            ));
        }
        self.validate_margins()?;

        let mut pending: Vec<&DocumentItem> = self.content.iter().collect();
        pending.extend(self.static_decorations());

        while let Some(item) = pending.pop() {
            self.validate_item(item)?;
            pending.extend(item.children());
        }

        Ok(())
    }

    fn validate_margins(&self) -> Result<(), GenerationError> {
        let margins = self.page_margins;
        if [margins.left, margins.top, margins.right, margins.bottom]
            .iter()
            .any(|side| !side.is_finite() || *side < 0.0)
        {
            return Err(GenerationError::InvalidDefinition(
                "page margins must be finite and not negative".to_string(),
            ));
        }

        let (width_mm, height_mm) = self.page_dimensions_mm();
        let (width, height) = (width_mm / MM_PER_POINT, height_mm / MM_PER_POINT);
        if margins.left + margins.right >= width {
            return Err(GenerationError::InvalidDefinition(format!(
                "left and right page margins ({} + {} pt) leave no room on a page {:.2} pt wide",
                margins.left, margins.right, width
            )));
        }
        if margins.top + margins.bottom >= height {
            return Err(GenerationError::InvalidDefinition(format!(
                "top and bottom page margins ({} + {} pt) leave no room on a page {:.2} pt high",
                margins.top, margins.bottom, height
            )));
        }
        Ok(())
    }

    fn static_decorations(&self) -> Vec<&DocumentItem> {
        let mut items = Vec::new();
        for decoration in [&self.header, &self.footer].into_iter().flatten() {
            if let HeaderFooter::Static(item) = decoration {
                items.push(item);
            }
        }
        if let Some(Background::Static(item)) = &self.background {
            items.push(item);
        }
        items
    }

    fn validate_item(&self, item: &DocumentItem) -> Result<(), GenerationError> {
        if let Some(attributes) = item.attributes() {
            if let Some(name) = attributes
                .style_refs
                .iter()
                .find(|name| !self.styles.contains_key(name.as_str()))
            {
                return Err(GenerationError::InvalidDefinition(format!(
                    "{} item references unknown style '{}'",
                    item.kind(),
                    name
                )));
            }
        }

        if let DocumentItem::Table(table) = item {
            if table.widths.is_empty() {
                return Err(GenerationError::InvalidDefinition(
                    "table must declare at least one column width".to_string(),
                ));
            }
            if table.header_rows > table.body.len() {
                return Err(GenerationError::InvalidDefinition(format!(
                    "table declares {} header rows but has only {} rows",
                    table.header_rows,
                    table.body.len()
                )));
            }
            if let Some((index, row)) = table
                .body
                .iter()
                .enumerate()
                .find(|(_, row)| row.len() != table.widths.len())
            {
                return Err(GenerationError::InvalidDefinition(format!(
                    "table row {} has {} cells, expected {}",
                    index,
                    row.len(),
                    table.widths.len()
                )));
            }
        }

        if let DocumentItem::Columns(columns) = item {
            if columns.columns.is_empty() {
                return Err(GenerationError::InvalidDefinition(
                    "columns item must contain at least one column".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_style_prefers_overrides() {
        let base = DocumentStyle::new().with_font_size(10).bold().with_color("red");
        let merged = base.merged_with(&DocumentStyle::new().with_font_size(14));
        assert_eq!(merged.font_size, Some(14));
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.color.as_deref(), Some("red"));
    }

    #[test]
    fn validate_rejects_empty_content() {
        let definitions = DocumentDefinitions::new(Vec::<DocumentItem>::new());
        let err = definitions.validate().unwrap_err();
        assert!(err.to_string().contains("at least one item"));
    }

    #[test]
    fn validate_rejects_ragged_tables() {
        let table = DocumentItem::table(
            vec![ColumnWidth::Star, ColumnWidth::Star],
            vec![vec!["a".into(), "b".into()], vec!["c".into()]],
        );
        let definitions = DocumentDefinitions::new([table]);
        let err = definitions.validate().unwrap_err();
        assert!(err.to_string().contains("row 1 has 1 cells"));
    }

    #[test]
    fn validate_rejects_margins_wider_than_the_page() {
        let definitions = DocumentDefinitions::new(["body"])
            .with_page_size(PageSize::A4)
            .with_page_margins(PageMargins::new(400.0, 10.0, 400.0, 10.0));
        let err = definitions.validate().unwrap_err();
        assert!(matches!(err, GenerationError::InvalidDefinition(_)));
        assert!(err.to_string().contains("left and right page margins"));

        let json = DocumentDefinitions::from_json(
            r#"{"content": ["body"], "pageSize": "A4", "pageMargins": [10, 430, 10, 430]}"#,
        )
        .unwrap();
        assert!(json
            .validate()
            .unwrap_err()
            .to_string()
            .contains("top and bottom page margins"));
    }

    #[test]
    fn margins_follow_page_orientation() {
        let margins = PageMargins::new(300.0, 10.0, 300.0, 10.0);
        let portrait = DocumentDefinitions::new(["body"]).with_page_margins(margins);
        assert!(portrait.validate().is_err());

        let landscape = portrait.with_page_orientation(PageOrientation::Landscape);
        assert!(landscape.validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_margins() {
        let definitions =
            DocumentDefinitions::new(["body"]).with_page_margins(PageMargins::new(-1.0, 0.0, 0.0, 0.0));
        assert!(definitions.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_style_reference_in_nested_items() {
        let nested = DocumentItem::Plain("inner".into())
            .with_attributes(ItemAttributes::new().with_style_ref("missing"));
        let definitions = DocumentDefinitions::new([DocumentItem::stack(vec![nested])]);
        let err = definitions.validate().unwrap_err();
        assert!(err.to_string().contains("unknown style 'missing'"));
    }

    #[test]
    fn validate_accepts_registered_style_reference() {
        let item = DocumentItem::Plain("Title".into())
            .with_attributes(ItemAttributes::new().with_style_ref("header"));
        let definitions = DocumentDefinitions::new([item])
            .with_style("header", DocumentStyle::new().bold().with_font_size(18));
        assert!(definitions.validate().is_ok());
    }

    #[test]
    fn dynamic_footer_requires_page_count() {
        let definitions = DocumentDefinitions::new(["body"]).with_footer(HeaderFooter::dynamic(
            |page, total| format!("{page} / {total}").into(),
        ));
        assert!(definitions.needs_page_count());
        let footer = definitions.footer().unwrap().resolve(2, 5);
        assert_eq!(footer, DocumentItem::Plain("2 / 5".into()));
    }

    #[test]
    fn plain_items_are_promoted_when_attributes_are_set() {
        let item = DocumentItem::from("hello")
            .with_attributes(ItemAttributes::new().with_page_break(PageBreak::Before));
        assert_eq!(item.kind(), "text");
        assert_eq!(
            item.attributes().and_then(|attributes| attributes.page_break),
            Some(PageBreak::Before)
        );
    }
}
