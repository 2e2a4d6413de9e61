use std::sync::{Arc, Mutex};

use pdf_generators::builder::render_definitions;
use pdf_generators::demos;
use pdf_generators::fonts::{self, FontRegistry};
use pdf_generators::generator::{DocumentGenerator, StructuredDocumentGenerator};
use pdf_generators::model::{
    DocumentDefinitions, DocumentInformation, DocumentItem, DocumentStyle, HeaderFooter,
    ImageItem, PageOrientation, PageSize,
};
use sha2::{Digest, Sha256};

fn fonts_available(test: &str) -> bool {
    if fonts::bundled_fonts_available() {
        return true;
    }
    eprintln!(
        "Skipping {test}: bundled fonts missing. Set PDF_GENERATORS_FONTS_DIR or copy assets/fonts next to the binary."
    );
    false
}

fn render_sample_pdf() -> Vec<u8> {
    let definitions = DocumentDefinitions::new([
        DocumentItem::text("Sample", DocumentStyle::new().with_font_size(18).bold()),
        DocumentItem::from("Hello, PDF!"),
    ]);
    render_definitions(&definitions, &FontRegistry::bundled()).expect("render sample pdf")
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            else {
                break;
            };
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    for tag in [&b"/CreationDate("[..], b"/ModDate(", b"/Producer("] {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    for (start, end) in [
        (&b"<xmp:CreateDate>"[..], &b"</xmp:CreateDate>"[..]),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ] {
        scrub_xml(&mut normalized, start, end);
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

fn page_count(bytes: &[u8]) -> usize {
    lopdf::Document::load_mem(bytes)
        .expect("parse rendered pdf")
        .get_pages()
        .len()
}

#[test]
fn renders_non_empty_output() {
    if !fonts_available("renders_non_empty_output") {
        return;
    }
    let bytes = render_sample_pdf();
    assert!(bytes.starts_with(b"%PDF"), "rendered PDF should start with a header");
}

#[test]
fn rendering_is_deterministic() {
    if !fonts_available("rendering_is_deterministic") {
        return;
    }
    let bytes_a = render_sample_pdf();
    let bytes_b = render_sample_pdf();

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[tokio::test]
async fn two_paragraph_document_is_written() {
    if !fonts_available("two_paragraph_document_is_written") {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("pdfMakeTs.pdf");

    let pdf = StructuredDocumentGenerator::new(FontRegistry::bundled())
        .generate_pdf(&output, demos::structured::definitions())
        .await
        .expect("structured generation succeeds");

    let written = std::fs::read(&output).unwrap();
    assert!(!written.is_empty());
    assert_eq!(written, pdf.bytes);
    assert_eq!(page_count(&written), 1);
}

#[tokio::test]
async fn default_registry_renders_without_explicit_fonts() {
    if !fonts_available("default_registry_renders_without_explicit_fonts") {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let pdf = demos::structured::run(dir.path()).await.unwrap();
    assert!(pdf.path.ends_with(demos::structured::FILE_NAME));
    assert!(pdf.path.metadata().unwrap().len() > 0);
}

#[test]
fn dynamic_footer_receives_total_page_count() {
    if !fonts_available("dynamic_footer_receives_total_page_count") {
        return;
    }
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);
    let paragraphs = (1..=120).map(|index| format!("Paragraph number {index} of a long document"));
    let definitions = DocumentDefinitions::new(paragraphs).with_footer(HeaderFooter::dynamic(
        move |page, total| {
            recorded.lock().unwrap().push((page, total));
            DocumentItem::from(format!("{page} / {total}"))
        },
    ));

    let bytes = render_definitions(&definitions, &FontRegistry::bundled()).unwrap();
    let pages = page_count(&bytes);
    assert!(pages >= 2, "document should span several pages");

    let calls = calls.lock().unwrap();
    let final_pass: Vec<_> = calls.iter().filter(|(_, total)| *total != 0).collect();
    assert_eq!(final_pass.len(), pages);
    assert!(final_pass.iter().all(|(_, total)| *total == pages));
    assert_eq!(final_pass.last().map(|(page, _)| *page), Some(pages));
}

#[test]
fn document_information_is_written() {
    if !fonts_available("document_information_is_written") {
        return;
    }
    let definitions = DocumentDefinitions::new(["Body"]).with_info(DocumentInformation {
        title: Some("Report".into()),
        author: Some("Jane Roe".into()),
        subject: Some("Testing".into()),
        keywords: Some("pdf".into()),
    });
    let bytes = render_definitions(&definitions, &FontRegistry::bundled()).unwrap();

    let document = lopdf::Document::load_mem(&bytes).unwrap();
    let info_id = document
        .trailer
        .get(b"Info")
        .and_then(lopdf::Object::as_reference)
        .unwrap();
    let info = document.get_dictionary(info_id).unwrap();
    assert!(matches!(info.get(b"Author"), Ok(lopdf::Object::String(value, _)) if value == b"Jane Roe"));
}

#[test]
fn json_definition_with_every_item_kind_renders() {
    if !fonts_available("json_definition_with_every_item_kind_renders") {
        return;
    }
    let image = format!("{}/templates/image.png", env!("CARGO_MANIFEST_DIR"));
    let json = format!(
        r##"{{
            "pageSize": "A5",
            "pageOrientation": "landscape",
            "pageMargins": [30, 50, 30, 50],
            "header": {{"text": "Header", "alignment": "center"}},
            "footer": "Footer",
            "info": {{"title": "Every kind"}},
            "images": {{"logo": "{image}"}},
            "styles": {{"heading": {{"fontSize": 16, "bold": true, "color": "#336699"}}}},
            "defaultStyle": {{"fontSize": 10}},
            "content": [
                {{"text": "Heading", "style": "heading"}},
                {{"text": ["Inline ", {{"text": "bold", "bold": true}}, " runs"]}},
                {{"columns": [{{"width": "*", "text": "Left"}}, {{"width": 100, "text": "Right"}}], "columnGap": 10}},
                {{"table": {{"headerRows": 1, "widths": ["auto", "*"], "body": [["Key", "Value"], ["a", {{"text": "1", "italics": true}}]]}}}},
                {{"ol": ["first", "second"]}},
                {{"ul": ["apple", {{"text": "pear", "color": "red"}}]}},
                {{"stack": ["one", "two"], "margin": [0, 5]}},
                {{"image": "logo", "width": 40, "pageBreak": "before"}}
            ]
        }}"##
    );

    let definitions = DocumentDefinitions::from_json(&json).expect("decode definition");
    assert_eq!(definitions.page_size(), PageSize::A5);
    assert_eq!(definitions.page_orientation(), PageOrientation::Landscape);

    let bytes = render_definitions(&definitions, &FontRegistry::bundled()).unwrap();
    assert!(page_count(&bytes) >= 2, "page break should start a new page");
}

#[test]
fn image_path_items_render() {
    if !fonts_available("image_path_items_render") {
        return;
    }
    let image = format!("{}/templates/image.png", env!("CARGO_MANIFEST_DIR"));
    let definitions = DocumentDefinitions::new([
        DocumentItem::image(ImageItem::new(image.clone()).with_fit(30.0, 30.0)),
        DocumentItem::image(ImageItem::new(image).with_height(20.0)),
    ]);
    assert!(render_definitions(&definitions, &FontRegistry::bundled()).is_ok());
}
