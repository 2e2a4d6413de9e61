use pdf_generators::demos;
use pdf_generators::generator::{DirectDrawingGenerator, DocumentGenerator};

#[tokio::test]
async fn first_text_is_drawn_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("pdfKitTs.pdf");

    DirectDrawingGenerator::new()
        .generate_pdf(&output, "First text".to_string())
        .await
        .unwrap();

    let written = std::fs::read(&output).unwrap();
    assert!(!written.is_empty());
    assert!(written.starts_with(b"%PDF"));
}

#[tokio::test]
async fn demo_writes_into_created_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("pdfs");

    let pdf = demos::drawing::run(&output_dir).await.unwrap();

    assert_eq!(pdf.path, output_dir.join(demos::drawing::FILE_NAME));
    assert!(pdf.path.is_file());
}

#[tokio::test]
async fn unwritable_output_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("missing").join("out.pdf");

    let err = DirectDrawingGenerator::new()
        .generate_pdf(&output, "First text".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, pdf_generators::GenerationError::Io { ref path, .. } if *path == output));
}
