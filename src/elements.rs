//! Conversion of document items into layout engine elements.
//!
//! [`ElementFactory`] walks a [`DocumentItem`] tree and produces boxed
//! `genpdf` elements.  Named styles are resolved and merged here, alignment is
//! inherited from enclosing items, and images are decoded with the [`image`]
//! crate so that their requested size can be turned into a scale factor.

use std::collections::BTreeMap;
use std::path::Path;

use image::GenericImageView;

use genpdf::elements::{
    FrameCellDecorator, Image, LinearLayout, OrderedList, PageBreak as PageBreakElement,
    Paragraph, TableLayout, UnorderedList,
};
use genpdf::error::{Context as _, Error};
use genpdf::style::Style;
use genpdf::{render, Element, Margins, Mm, RenderResult, Scale};

use crate::error::GenerationError;
use crate::model::{
    ColumnWidth, ColumnsItem, DocumentItem, DocumentStyle, HorizontalAlignment, ImageItem,
    ItemAttributes, Margin, PageBreak, TableItem, TextContent, MM_PER_POINT,
};
use crate::style::{self, LoadedFamilies};

/// Resolution the layout engine assumes for embedded images.
const ENGINE_IMAGE_DPI: f64 = 300.0;
/// Resolution at which an unconstrained image pixel maps to one point.
const POINT_DPI: f64 = 72.0;
const MM_PER_INCH: f64 = 25.4;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_from_points(points: f64) -> Mm {
    mm_from_f64(points * MM_PER_POINT)
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> (f64, f64) {
    let (px_width, px_height) = image.dimensions();
    (
        MM_PER_INCH * (px_width as f64) / dpi,
        MM_PER_INCH * (px_height as f64) / dpi,
    )
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// A type-erased element so that heterogeneous items can share one container.
pub struct ItemElement(Box<dyn Element>);

impl ItemElement {
    fn new<E: Element + 'static>(element: E) -> Self {
        Self(Box::new(element))
    }
}

impl Element for ItemElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        self.0.render(context, area, style)
    }
}

/// Builds layout engine elements from document items.
pub(crate) struct ElementFactory {
    styles: BTreeMap<String, DocumentStyle>,
    images: BTreeMap<String, String>,
    families: LoadedFamilies,
    content_width_pt: f64,
}

impl ElementFactory {
    pub(crate) fn new(
        styles: BTreeMap<String, DocumentStyle>,
        images: BTreeMap<String, String>,
        families: LoadedFamilies,
        content_width_pt: f64,
    ) -> Self {
        Self {
            styles,
            images,
            families,
            content_width_pt,
        }
    }

    /// Builds an item together with the page breaks it requests.
    pub(crate) fn build_flow(
        &self,
        item: &DocumentItem,
        alignment: HorizontalAlignment,
    ) -> Result<Vec<ItemElement>, GenerationError> {
        let page_break = item.attributes().and_then(|attributes| attributes.page_break);
        let mut elements = Vec::with_capacity(3);
        if page_break == Some(PageBreak::Before) {
            elements.push(ItemElement::new(PageBreakElement::new()));
        }
        elements.push(self.build(item, alignment)?);
        if page_break == Some(PageBreak::After) {
            elements.push(ItemElement::new(PageBreakElement::new()));
        }
        Ok(elements)
    }

    /// Builds a single item, ignoring page break hints.
    pub(crate) fn build(
        &self,
        item: &DocumentItem,
        inherited: HorizontalAlignment,
    ) -> Result<ItemElement, GenerationError> {
        let attributes = item.attributes().cloned().unwrap_or_default();
        let effective = self.effective_style(&attributes);
        let alignment = effective.alignment.unwrap_or(inherited);

        let element = match item {
            DocumentItem::Plain(text) => ItemElement::new(paragraph(text.clone(), alignment)),
            DocumentItem::Text(text) => match &text.content {
                TextContent::Plain(body) => ItemElement::new(paragraph(body.clone(), alignment)),
                TextContent::Nested(items) if items.iter().all(is_inline) => {
                    let mut runs = Paragraph::default();
                    runs.set_alignment(style::to_alignment(alignment));
                    self.push_runs(&mut runs, items, Style::new())?;
                    ItemElement::new(runs)
                }
                TextContent::Nested(items) => self.vertical(items, alignment)?,
            },
            DocumentItem::Columns(columns) => self.columns(columns, alignment)?,
            DocumentItem::Table(table) => self.table(table, alignment)?,
            DocumentItem::NumberedList(list) => {
                let mut ordered = OrderedList::new();
                for entry in &list.items {
                    ordered.push(self.build(entry, alignment)?);
                }
                ItemElement::new(ordered)
            }
            DocumentItem::BulletedList(list) => {
                let mut bulleted = UnorderedList::new();
                for entry in &list.items {
                    bulleted.push(self.build(entry, alignment)?);
                }
                ItemElement::new(bulleted)
            }
            DocumentItem::Stack(stack) => self.vertical(&stack.items, alignment)?,
            DocumentItem::Image(image) => self.image(image, alignment)?,
        };

        let element = if effective.is_empty() {
            element
        } else {
            ItemElement::new(element.styled(style::to_style(&effective, &self.families)?))
        };

        Ok(match attributes.margin {
            Some(margin) => ItemElement::new(element.padded(margins(margin))),
            None => element,
        })
    }

    /// Merges the referenced named styles in order, then the inline style.
    fn effective_style(&self, attributes: &ItemAttributes) -> DocumentStyle {
        attributes
            .style_refs
            .iter()
            .filter_map(|name| self.styles.get(name))
            .fold(DocumentStyle::default(), |acc, named| acc.merged_with(named))
            .merged_with(&attributes.style)
    }

    fn push_runs(
        &self,
        paragraph: &mut Paragraph,
        items: &[DocumentItem],
        base: Style,
    ) -> Result<(), GenerationError> {
        for item in items {
            match item {
                DocumentItem::Plain(text) => {
                    paragraph.push_styled(text.clone(), base.clone());
                }
                DocumentItem::Text(text) => {
                    let effective = self.effective_style(&text.attributes);
                    let run_style = base
                        .clone()
                        .and(style::to_style(&effective, &self.families)?);
                    match &text.content {
                        TextContent::Plain(body) => {
                            paragraph.push_styled(body.clone(), run_style);
                        }
                        TextContent::Nested(nested) => {
                            self.push_runs(paragraph, nested, run_style)?
                        }
                    }
                }
                other => {
                    return Err(GenerationError::InvalidDefinition(format!(
                        "{} item cannot be rendered inline",
                        other.kind()
                    )))
                }
            }
        }
        Ok(())
    }

    fn vertical(
        &self,
        items: &[DocumentItem],
        alignment: HorizontalAlignment,
    ) -> Result<ItemElement, GenerationError> {
        let mut layout = LinearLayout::vertical();
        for item in items {
            for element in self.build_flow(item, alignment)? {
                layout.push(element);
            }
        }
        Ok(ItemElement::new(layout))
    }

    fn columns(
        &self,
        item: &ColumnsItem,
        alignment: HorizontalAlignment,
    ) -> Result<ItemElement, GenerationError> {
        let widths: Vec<ColumnWidth> = item.columns.iter().map(|column| column.width).collect();
        let mut table = TableLayout::new(column_weights(&widths, self.content_width_pt));
        let gap = mm_from_points(item.column_gap);
        let last = item.columns.len().saturating_sub(1);

        let mut row = table.row();
        for (index, column) in item.columns.iter().enumerate() {
            let cell = paragraph(column.text.clone(), alignment);
            if index < last && item.column_gap > 0.0 {
                let zero = Mm::default();
                row.push_element(cell.padded(Margins::trbl(zero, gap, zero, zero)));
            } else {
                row.push_element(cell);
            }
        }
        row.push()?;

        Ok(ItemElement::new(table))
    }

    fn table(
        &self,
        item: &TableItem,
        alignment: HorizontalAlignment,
    ) -> Result<ItemElement, GenerationError> {
        let mut table = TableLayout::new(column_weights(&item.widths, self.content_width_pt));
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

        for (index, cells) in item.body.iter().enumerate() {
            let header = header_row_style(index, item.header_rows);
            let mut row = table.row();
            for cell in cells {
                let element = self.build(cell, alignment)?;
                let element = match header {
                    Some(style) => ItemElement::new(element.styled(style)),
                    None => element,
                };
                row.push_element(element.padded(cell_padding()));
            }
            row.push()?;
        }

        Ok(ItemElement::new(table))
    }

    fn image(
        &self,
        item: &ImageItem,
        alignment: HorizontalAlignment,
    ) -> Result<ItemElement, GenerationError> {
        let source = self
            .images
            .get(&item.image)
            .map(String::as_str)
            .unwrap_or(item.image.as_str());
        if source.starts_with("data:") {
            return Err(GenerationError::InvalidDefinition(
                "inline data URIs are not supported for images; register a file path".to_string(),
            ));
        }

        let decoded = decode_image_from_path(source)?;
        let natural = estimated_image_size(&decoded, ENGINE_IMAGE_DPI);
        let scale = image_scale(natural, estimated_image_size(&decoded, POINT_DPI), item);

        let mut image = Image::from_dynamic_image(decoded)?;
        image.set_alignment(style::to_alignment(alignment));
        image.set_scale(scale);
        Ok(ItemElement::new(image))
    }
}

fn cell_padding() -> Margins {
    Margins::all(mm_from_f64(1.0))
}

fn paragraph(text: String, alignment: HorizontalAlignment) -> Paragraph {
    let mut paragraph = Paragraph::new(text);
    paragraph.set_alignment(style::to_alignment(alignment));
    paragraph
}

fn is_inline(item: &DocumentItem) -> bool {
    match item {
        DocumentItem::Plain(_) => true,
        DocumentItem::Text(text) => match &text.content {
            TextContent::Plain(_) => true,
            TextContent::Nested(items) => items.iter().all(is_inline),
        },
        _ => false,
    }
}

fn margins(margin: Margin) -> Margins {
    let [left, top, right, bottom] = margin.sides();
    Margins::trbl(
        mm_from_points(top),
        mm_from_points(right),
        mm_from_points(bottom),
        mm_from_points(left),
    )
}

/// Computes the scale applied to an image whose engine size is `natural` (mm).
///
/// `at_points` is the size the image would have if one pixel were one point,
/// which is the size used when no constraint is given.
fn image_scale(natural: (f64, f64), at_points: (f64, f64), item: &ImageItem) -> Scale {
    let (natural_w, natural_h) = natural;
    if natural_w <= f64::EPSILON || natural_h <= f64::EPSILON {
        return Scale::new(1.0, 1.0);
    }

    let (target_w, target_h) = target_size_mm(at_points, item);
    Scale::new(target_w / natural_w, target_h / natural_h)
}

fn target_size_mm((width, height): (f64, f64), item: &ImageItem) -> (f64, f64) {
    let aspect = height / width;
    match (item.width, item.height, item.fit) {
        (Some(w), Some(h), _) => (w * MM_PER_POINT, h * MM_PER_POINT),
        (Some(w), None, _) => {
            let w = w * MM_PER_POINT;
            (w, w * aspect)
        }
        (None, Some(h), _) => {
            let h = h * MM_PER_POINT;
            (h / aspect, h)
        }
        (None, None, Some([fit_w, fit_h])) => {
            let factor = (fit_w * MM_PER_POINT / width).min(fit_h * MM_PER_POINT / height);
            (width * factor, height * factor)
        }
        (None, None, None) => (width, height),
    }
}

/// Turns requested column widths into relative weights for a table layout.
///
/// Fixed and percentage widths are expressed in points; `auto` and `*`
/// columns share whatever width remains.
pub(crate) fn column_weights(widths: &[ColumnWidth], available_pt: f64) -> Vec<usize> {
    let fixed: f64 = widths
        .iter()
        .map(|width| match width {
            ColumnWidth::Points(points) => *points,
            ColumnWidth::Percent(percent) => available_pt * percent / 100.0,
            ColumnWidth::Auto | ColumnWidth::Star => 0.0,
        })
        .sum();
    let flexible = widths
        .iter()
        .filter(|width| matches!(width, ColumnWidth::Auto | ColumnWidth::Star))
        .count();

    let share = if flexible == 0 {
        0.0
    } else {
        let remaining = (available_pt - fixed).max(0.0) / flexible as f64;
        if remaining >= 1.0 {
            remaining
        } else if fixed > 0.0 {
            fixed / (widths.len() - flexible) as f64
        } else {
            1.0
        }
    };

    widths
        .iter()
        .map(|width| {
            let value = match width {
                ColumnWidth::Points(points) => *points,
                ColumnWidth::Percent(percent) => available_pt * percent / 100.0,
                ColumnWidth::Auto | ColumnWidth::Star => share,
            };
            (value.round() as usize).max(1)
        })
        .collect()
}

/// Returns the usable content width in points for a page of `page_width_mm`.
pub(crate) fn content_width_pt(page_width_mm: f64, left_pt: f64, right_pt: f64) -> f64 {
    (page_width_mm / MM_PER_POINT - left_pt - right_pt).max(1.0)
}

/// Style for the cells of row `index`, bold within the first `header_rows` rows.
fn header_row_style(index: usize, header_rows: usize) -> Option<Style> {
    (index < header_rows).then(|| {
        let mut style = Style::new();
        style.set_bold();
        style
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_rows_are_bold() {
        assert!(header_row_style(0, 2).is_some_and(|style| style.is_bold()));
        assert!(header_row_style(1, 2).is_some_and(|style| style.is_bold()));
        assert!(header_row_style(2, 2).is_none());
        assert!(header_row_style(0, 0).is_none());
    }

    #[test]
    fn star_columns_share_remaining_width() {
        let weights = column_weights(
            &[ColumnWidth::Points(100.0), ColumnWidth::Star, ColumnWidth::Star],
            500.0,
        );
        assert_eq!(weights, vec![100, 200, 200]);
    }

    #[test]
    fn percentage_columns_use_available_width() {
        let weights = column_weights(&[ColumnWidth::Percent(25.0), ColumnWidth::Auto], 400.0);
        assert_eq!(weights, vec![100, 300]);
    }

    #[test]
    fn overfull_fixed_columns_keep_flexible_columns_visible() {
        let weights = column_weights(&[ColumnWidth::Points(600.0), ColumnWidth::Star], 500.0);
        assert_eq!(weights, vec![600, 600]);
    }

    #[test]
    fn weights_are_never_zero() {
        let weights = column_weights(&[ColumnWidth::Points(0.0), ColumnWidth::Points(0.2)], 500.0);
        assert_eq!(weights, vec![1, 1]);
    }

    #[test]
    fn width_constraint_keeps_aspect_ratio() {
        let item = ImageItem::new("x.png").with_width(72.0);
        let (w, h) = target_size_mm((50.8, 25.4), &item);
        assert!((w - 25.4).abs() < 1e-9);
        assert!((h - 12.7).abs() < 1e-9);
    }

    #[test]
    fn fit_box_scales_by_limiting_side() {
        let item = ImageItem::new("x.png").with_fit(72.0, 72.0);
        let (w, h) = target_size_mm((50.8, 25.4), &item);
        assert!((w - 25.4).abs() < 1e-9);
        assert!((h - 12.7).abs() < 1e-9);
    }

    #[test]
    fn explicit_width_and_height_stretch() {
        let item = ImageItem::new("x.png").with_width(72.0).with_height(144.0);
        let (w, h) = target_size_mm((10.0, 10.0), &item);
        assert!((w - 25.4).abs() < 1e-9);
        assert!((h - 50.8).abs() < 1e-9);
    }

    #[test]
    fn nested_text_is_inline_only_when_all_runs_are_text() {
        let inline = DocumentItem::runs(vec![
            "plain".into(),
            DocumentItem::text("bold", DocumentStyle::new().bold()),
        ]);
        assert!(is_inline(&inline));
        let block = DocumentItem::runs(vec![DocumentItem::bulleted_list(vec!["a".into()])]);
        assert!(!is_inline(&block));
    }

    #[test]
    fn content_width_subtracts_margins() {
        let width = content_width_pt(210.0, 40.0, 40.0);
        assert!((width - (210.0 / MM_PER_POINT - 80.0)).abs() < 1e-9);
    }
}
