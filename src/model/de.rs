//! JSON decoding of document definitions.
//!
//! The wire shape follows the familiar declarative layout where an item is
//! either a bare string or an object that carries exactly one discriminant key
//! (`text`, `columns`, `table`, `ol`, `ul`, `stack` or `image`).  Objects with
//! zero or several discriminants are rejected instead of guessing.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::{
    Background, Column, ColumnWidth, ColumnsItem, DocumentDefinitions, DocumentInformation,
    DocumentItem, DocumentStyle, HeaderFooter, ImageItem, ItemAttributes, ListItem, Margin,
    PageBreak, PageMargins, PageOrientation, PageSize, StackItem, TableItem, TextContent,
    TextItem,
};

/// Decodes a font size given as any JSON number, rounded to whole points.
pub(super) fn font_size<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(size) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let rounded = size.round();
    if !(1.0..=f64::from(u8::MAX)).contains(&rounded) {
        return Err(de::Error::custom(format!(
            "fontSize must be between 1 and 255, got {size}"
        )));
    }
    Ok(Some(rounded as u8))
}

const DISCRIMINANTS: &[&str] = &["text", "columns", "table", "ol", "ul", "stack", "image"];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Plain(String),
    Nested(Vec<DocumentItem>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StyleRefs {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct RawColumn {
    width: Option<ColumnWidth>,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTable {
    #[serde(default)]
    header_rows: usize,
    widths: Option<Vec<ColumnWidth>>,
    body: Vec<Vec<DocumentItem>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObject {
    text: Option<RawText>,
    columns: Option<Vec<RawColumn>>,
    column_gap: Option<f64>,
    table: Option<RawTable>,
    ol: Option<Vec<DocumentItem>>,
    ul: Option<Vec<DocumentItem>>,
    stack: Option<Vec<DocumentItem>>,
    image: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    fit: Option<[f64; 2]>,
    margin: Option<Margin>,
    style: Option<StyleRefs>,
    page_break: Option<PageBreak>,
    #[serde(flatten)]
    inline: DocumentStyle,
}

impl RawObject {
    fn into_item(self) -> DocumentItem {
        let attributes = ItemAttributes {
            style: self.inline,
            margin: self.margin,
            style_refs: match self.style {
                None => Vec::new(),
                Some(StyleRefs::One(name)) => vec![name],
                Some(StyleRefs::Many(names)) => names,
            },
            page_break: self.page_break,
        };

        if let Some(text) = self.text {
            let content = match text {
                RawText::Plain(text) => TextContent::Plain(text),
                RawText::Nested(items) => TextContent::Nested(items),
            };
            return DocumentItem::Text(TextItem {
                content,
                attributes,
            });
        }

        if let Some(columns) = self.columns {
            return DocumentItem::Columns(ColumnsItem {
                columns: columns
                    .into_iter()
                    .map(|column| Column {
                        width: column.width.unwrap_or(ColumnWidth::Star),
                        text: column.text,
                    })
                    .collect(),
                column_gap: self.column_gap.unwrap_or(0.0),
                attributes,
            });
        }

        if let Some(table) = self.table {
            let widths = table.widths.unwrap_or_else(|| {
                let columns = table.body.first().map_or(0, Vec::len);
                vec![ColumnWidth::Star; columns]
            });
            return DocumentItem::Table(TableItem {
                header_rows: table.header_rows,
                widths,
                body: table.body,
                attributes,
            });
        }

        if let Some(items) = self.ol {
            return DocumentItem::NumberedList(ListItem { items, attributes });
        }

        if let Some(items) = self.ul {
            return DocumentItem::BulletedList(ListItem { items, attributes });
        }

        if let Some(items) = self.stack {
            return DocumentItem::Stack(StackItem { items, attributes });
        }

        DocumentItem::Image(ImageItem {
            image: self.image.unwrap_or_default(),
            width: self.width,
            height: self.height,
            fit: self.fit,
            attributes,
        })
    }
}

impl<'de> Deserialize<'de> for DocumentItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(DocumentItem::Plain(text)),
            Value::Object(map) => {
                let present: Vec<&str> = DISCRIMINANTS
                    .iter()
                    .copied()
                    .filter(|key| map.contains_key(*key))
                    .collect();
                match present.len() {
                    1 => {}
                    0 => {
                        return Err(de::Error::custom(format!(
                            "document item must contain one of: {}",
                            DISCRIMINANTS.join(", ")
                        )))
                    }
                    _ => {
                        return Err(de::Error::custom(format!(
                            "document item must contain exactly one of {}; found {}",
                            DISCRIMINANTS.join(", "),
                            present.join(", ")
                        )))
                    }
                }

                let raw: RawObject =
                    serde_json::from_value(Value::Object(map)).map_err(de::Error::custom)?;
                Ok(raw.into_item())
            }
            other => Err(de::Error::custom(format!(
                "document item must be a string or an object, found {other}"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for ColumnWidth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => number
                .as_f64()
                .map(ColumnWidth::Points)
                .ok_or_else(|| de::Error::custom("column width is not a finite number")),
            Value::String(text) => parse_column_width(&text).map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "column width must be a number or a string, found {other}"
            ))),
        }
    }
}

fn parse_column_width(text: &str) -> Result<ColumnWidth, String> {
    let trimmed = text.trim();
    match trimmed {
        "auto" => Ok(ColumnWidth::Auto),
        "*" => Ok(ColumnWidth::Star),
        _ => {
            if let Some(percent) = trimmed.strip_suffix('%') {
                percent
                    .trim()
                    .parse::<f64>()
                    .map(ColumnWidth::Percent)
                    .map_err(|_| format!("invalid percentage column width '{text}'"))
            } else {
                trimmed
                    .parse::<f64>()
                    .map(ColumnWidth::Points)
                    .map_err(|_| format!("invalid column width '{text}'"))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Margin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawMargin {
            One(f64),
            Many(Vec<f64>),
        }

        match RawMargin::deserialize(deserializer)? {
            RawMargin::One(all) => Ok(Margin::Uniform(all)),
            RawMargin::Many(values) => match values.as_slice() {
                [horizontal, vertical] => Ok(Margin::Symmetric {
                    horizontal: *horizontal,
                    vertical: *vertical,
                }),
                [left, top, right, bottom] => Ok(Margin::Sides {
                    left: *left,
                    top: *top,
                    right: *right,
                    bottom: *bottom,
                }),
                _ => Err(de::Error::custom(format!(
                    "margin must have 1, 2 or 4 values, found {}",
                    values.len()
                ))),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDefinitions {
    content: Vec<DocumentItem>,
    header: Option<DocumentItem>,
    footer: Option<DocumentItem>,
    background: Option<DocumentItem>,
    #[serde(default)]
    info: DocumentInformation,
    #[serde(default)]
    images: BTreeMap<String, String>,
    #[serde(default)]
    styles: BTreeMap<String, DocumentStyle>,
    #[serde(default)]
    page_size: PageSize,
    #[serde(default)]
    page_orientation: PageOrientation,
    #[serde(default)]
    page_margins: PageMargins,
    #[serde(default)]
    default_style: DocumentStyle,
}

impl<'de> Deserialize<'de> for DocumentDefinitions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawDefinitions::deserialize(deserializer)?;
        Ok(DocumentDefinitions {
            content: raw.content,
            header: raw.header.map(HeaderFooter::Static),
            footer: raw.footer.map(HeaderFooter::Static),
            background: raw.background.map(Background::Static),
            info: raw.info,
            images: raw.images,
            styles: raw.styles,
            page_size: raw.page_size,
            page_orientation: raw.page_orientation,
            page_margins: raw.page_margins,
            default_style: raw.default_style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HorizontalAlignment;

    #[test]
    fn decodes_plain_paragraphs() {
        let definitions = DocumentDefinitions::from_json(
            r#"{"content": ["First paragraph", "Another paragraph"]}"#,
        )
        .expect("decode succeeds");
        assert_eq!(definitions.content().len(), 2);
        assert_eq!(
            definitions.content()[0],
            DocumentItem::Plain("First paragraph".into())
        );
        assert_eq!(definitions.page_size(), PageSize::A4);
    }

    #[test]
    fn decodes_styled_text_with_style_references() {
        let item: DocumentItem = serde_json::from_str(
            r#"{"text": "Title", "fontSize": 18, "bold": true, "style": ["header", "accent"], "margin": [0, 10], "pageBreak": "before"}"#,
        )
        .expect("decode succeeds");

        let DocumentItem::Text(text) = item else {
            panic!("expected a text item");
        };
        assert_eq!(text.content, TextContent::Plain("Title".into()));
        assert_eq!(text.attributes.style.font_size, Some(18));
        assert_eq!(text.attributes.style.bold, Some(true));
        assert_eq!(text.attributes.style_refs, vec!["header", "accent"]);
        assert_eq!(
            text.attributes.margin,
            Some(Margin::Symmetric {
                horizontal: 0.0,
                vertical: 10.0
            })
        );
        assert_eq!(text.attributes.page_break, Some(PageBreak::Before));
    }

    #[test]
    fn fractional_font_sizes_are_rounded() {
        let definitions = DocumentDefinitions::from_json(
            r#"{"content": [{"text": "a", "fontSize": 10.5}], "defaultStyle": {"fontSize": 11.2}, "styles": {"small": {"fontSize": 7.4}}}"#,
        )
        .expect("decode succeeds");
        let DocumentItem::Text(text) = &definitions.content()[0] else {
            panic!("expected a text item");
        };
        assert_eq!(text.attributes.style.font_size, Some(11));
        assert_eq!(definitions.default_style().font_size, Some(11));
        assert_eq!(definitions.styles()["small"].font_size, Some(7));
    }

    #[test]
    fn out_of_range_font_sizes_are_rejected() {
        for json in [
            r#"{"text": "a", "fontSize": 300}"#,
            r#"{"text": "a", "fontSize": 0.2}"#,
            r#"{"text": "a", "fontSize": -4}"#,
        ] {
            let err = serde_json::from_str::<DocumentItem>(json).unwrap_err();
            assert!(err.to_string().contains("fontSize must be between 1 and 255"), "{err}");
        }
    }

    #[test]
    fn decodes_tables_and_columns() {
        let definitions = DocumentDefinitions::from_json(
            r#"{
                "content": [
                    {"columns": [{"width": "auto", "text": "a"}, {"width": "30%", "text": "b"}, {"text": "c"}], "columnGap": 10},
                    {"table": {"headerRows": 1, "widths": [100, "*"], "body": [["h1", "h2"], ["a", {"ul": ["x", "y"]}]]}}
                ],
                "pageOrientation": "landscape",
                "pageMargins": [10, 20, 10, 20]
            }"#,
        )
        .expect("decode succeeds");

        let DocumentItem::Columns(columns) = &definitions.content()[0] else {
            panic!("expected columns");
        };
        assert_eq!(columns.columns[0].width, ColumnWidth::Auto);
        assert_eq!(columns.columns[1].width, ColumnWidth::Percent(30.0));
        assert_eq!(columns.columns[2].width, ColumnWidth::Star);
        assert_eq!(columns.column_gap, 10.0);

        let DocumentItem::Table(table) = &definitions.content()[1] else {
            panic!("expected a table");
        };
        assert_eq!(table.header_rows, 1);
        assert_eq!(table.widths, vec![ColumnWidth::Points(100.0), ColumnWidth::Star]);
        assert_eq!(table.body[1][1].kind(), "ul");
        assert_eq!(definitions.page_orientation(), PageOrientation::Landscape);
        assert_eq!(definitions.page_margins().top, 20.0);
    }

    #[test]
    fn rejects_items_with_several_discriminants() {
        let err = serde_json::from_str::<DocumentItem>(r#"{"text": "a", "ul": ["b"]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("found text, ul"));
    }

    #[test]
    fn rejects_items_without_discriminant() {
        let err = serde_json::from_str::<DocumentItem>(r#"{"bold": true}"#).unwrap_err();
        assert!(err.to_string().contains("must contain one of"));
    }

    #[test]
    fn static_header_and_info_are_decoded() {
        let definitions = DocumentDefinitions::from_json(
            r#"{"content": ["body"], "header": "Report", "info": {"title": "T", "author": "A"}}"#,
        )
        .expect("decode succeeds");
        assert!(!definitions.needs_page_count());
        assert_eq!(
            definitions.header().map(|header| header.resolve(1, 1)),
            Some(DocumentItem::Plain("Report".into()))
        );
        assert_eq!(definitions.info().author.as_deref(), Some("A"));
    }

    #[test]
    fn images_with_fit_box() {
        let item: DocumentItem =
            serde_json::from_str(r#"{"image": "logo", "fit": [100, 50], "alignment": "center"}"#)
                .expect("decode succeeds");
        let DocumentItem::Image(image) = item else {
            panic!("expected an image");
        };
        assert_eq!(image.image, "logo");
        assert_eq!(image.fit, Some([100.0, 50.0]));
        assert_eq!(
            image.attributes.style.alignment,
            Some(HorizontalAlignment::Center)
        );
    }
}
