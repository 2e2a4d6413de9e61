//! Document information management built on top of `lopdf`.
//!
//! The layout engine only exposes the document title, so author, subject and
//! keywords are written by reopening the rendered bytes and updating the
//! trailer's `/Info` dictionary.

use lopdf::{Dictionary, Document, Object, StringFormat};

use crate::error::GenerationError;
use crate::model::DocumentInformation;

/// Writes the set entries of `info` into the information dictionary of `pdf_bytes`.
///
/// An `/Info` dictionary is created when the document has none.
pub fn apply_document_information(
    pdf_bytes: &[u8],
    info: &DocumentInformation,
) -> Result<Vec<u8>, GenerationError> {
    let mut document = Document::load_mem(pdf_bytes)?;

    let existing = document
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok();

    let info_id = match existing {
        Some(id) => id,
        None => {
            let id = document.add_object(Dictionary::new());
            document.trailer.set("Info", Object::Reference(id));
            id
        }
    };

    let dictionary = document.get_object_mut(info_id)?.as_dict_mut()?;
    let entries = [
        ("Title", &info.title),
        ("Author", &info.author),
        ("Subject", &info.subject),
        ("Keywords", &info.keywords),
    ];
    for (key, value) in entries {
        if let Some(value) = value {
            dictionary.set(key, text_string(value));
        }
    }

    let mut buffer = Vec::new();
    document
        .save_to(&mut buffer)
        .map_err(|err| GenerationError::Metadata(err.into()))?;
    Ok(buffer)
}

/// Encodes a PDF text string: literal for ASCII, UTF-16BE with byte order mark otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn minimal_pdf() -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).unwrap();
        bytes
    }

    fn info_entry(bytes: &[u8], key: &[u8]) -> Vec<u8> {
        let document = Document::load_mem(bytes).unwrap();
        let info_id = document
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .unwrap();
        let dictionary = document.get_dictionary(info_id).unwrap();
        match dictionary.get(key).unwrap() {
            Object::String(bytes, _) => bytes.clone(),
            other => panic!("unexpected object {other:?}"),
        }
    }

    #[test]
    fn creates_info_dictionary_when_missing() {
        let info = DocumentInformation {
            author: Some("Jane Roe".into()),
            keywords: Some("pdf, demo".into()),
            ..DocumentInformation::default()
        };
        let updated = apply_document_information(&minimal_pdf(), &info).unwrap();
        assert_eq!(info_entry(&updated, b"Author"), b"Jane Roe");
        assert_eq!(info_entry(&updated, b"Keywords"), b"pdf, demo");
    }

    #[test]
    fn non_ascii_values_are_utf16_encoded() {
        let info = DocumentInformation {
            subject: Some("Grüße".into()),
            ..DocumentInformation::default()
        };
        let updated = apply_document_information(&minimal_pdf(), &info).unwrap();
        let subject = info_entry(&updated, b"Subject");
        assert_eq!(&subject[..2], &[0xFE, 0xFF]);
        assert_eq!(subject.len(), 2 + 2 * "Grüße".encode_utf16().count());
    }

    #[test]
    fn rejects_bytes_that_are_not_pdf() {
        let err = apply_document_information(b"not a pdf", &DocumentInformation::default())
            .unwrap_err();
        assert!(matches!(err, GenerationError::Metadata(_)));
    }
}
