//! Backends turning HTML into PDF bytes.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use genpdf::elements::{Break, Paragraph};
use genpdf::style::Style;
use genpdf::{Element, Margins, SimplePageDecorator, Size};
use log::debug;
use quick_xml::escape;
use quick_xml::events::{BytesRef, Event as XmlEvent};
use quick_xml::name::QName;
use quick_xml::Reader;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::RenderOptions;
use crate::elements::mm_from_f64;
use crate::error::GenerationError;
use crate::fonts::FontRegistry;

/// Converter used by [`CommandRenderer::new`].
pub const DEFAULT_CONVERTER: &str = "wkhtmltopdf";

const BODY_FONT_SIZE: u8 = 10;
const HEADING_FONT_SIZE: u8 = 14;

/// Turns an HTML document into PDF bytes.
pub trait HtmlRenderer: Send + Sync {
    /// Renders `html` with the page geometry of `options`.
    fn render(
        &self,
        html: &str,
        options: &RenderOptions,
    ) -> impl Future<Output = Result<Vec<u8>, GenerationError>> + Send;
}

/// Renders through an external HTML to PDF converter.
///
/// The HTML is piped to the converter's standard input and the PDF is read
/// from its standard output. The converter is killed when the timeout of the
/// render options elapses.
#[derive(Clone, Debug)]
pub struct CommandRenderer {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandRenderer {
    /// Creates a renderer invoking `wkhtmltopdf` from the `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_CONVERTER),
            extra_args: Vec::new(),
        }
    }

    /// Sets the converter executable and returns the updated renderer.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Appends an argument passed before the input and output operands.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Returns the command line arguments used for `options`.
    pub fn arguments(&self, options: &RenderOptions) -> Vec<String> {
        let mut args = vec!["--quiet".to_string(), "--enable-local-file-access".to_string()];

        match options.size() {
            Some((width, height)) => {
                args.push("--page-width".to_string());
                args.push(format!("{}mm", width.to_mm()));
                args.push("--page-height".to_string());
                args.push(format!("{}mm", height.to_mm()));
            }
            None => {
                args.push("--page-size".to_string());
                args.push(options.format().name().to_string());
                args.push("--orientation".to_string());
                args.push(options.orientation().name().to_string());
            }
        }

        let border = format!("{}mm", options.border_mm());
        for side in ["--margin-top", "--margin-right", "--margin-bottom", "--margin-left"] {
            args.push(side.to_string());
            args.push(border.clone());
        }

        args.extend(self.extra_args.iter().cloned());
        args.push("-".to_string());
        args.push("-".to_string());
        args
    }

    async fn run(&self, html: String, options: &RenderOptions) -> Result<Vec<u8>, GenerationError> {
        let program = self.program.display().to_string();
        let mut child = Command::new(&self.program)
            .args(self.arguments(options))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| GenerationError::Render(format!("failed to start {program}: {err}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| GenerationError::Render(format!("{program} has no standard input")))?;

        let write = async move {
            stdin.write_all(html.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output
            .map_err(|err| GenerationError::Render(format!("failed to wait for {program}: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerationError::Render(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        written.map_err(|err| {
            GenerationError::Render(format!("failed to send html to {program}: {err}"))
        })?;
        if output.stdout.is_empty() {
            return Err(GenerationError::Render(format!("{program} produced no output")));
        }

        Ok(output.stdout)
    }
}

impl Default for CommandRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRenderer for CommandRenderer {
    async fn render(&self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, GenerationError> {
        let html = match options.base() {
            Some(base) => with_base_href(html, base),
            None => html.to_string(),
        };

        tokio::time::timeout(options.timeout(), self.run(html, options))
            .await
            .map_err(|_| {
                GenerationError::Render(format!(
                    "{} did not finish within {:?}",
                    self.program.display(),
                    options.timeout()
                ))
            })?
    }
}

/// Inserts a `<base>` element so relative URLs resolve against `base`.
fn with_base_href(html: &str, base: &str) -> String {
    let element = format!("<base href=\"{base}\">");
    match html.to_ascii_lowercase().find("<head>") {
        Some(position) => {
            let insert_at = position + "<head>".len();
            format!("{}{}{}", &html[..insert_at], element, &html[insert_at..])
        }
        None => format!("{element}{html}"),
    }
}

/// Lays out the text of an HTML document without an HTML engine.
///
/// Markup is reduced to paragraphs, with headings set in bold. Images and
/// stylesheets are ignored.
#[derive(Clone, Debug, Default)]
pub struct TextLayoutRenderer {
    fonts: FontRegistry,
}

impl TextLayoutRenderer {
    /// Creates a renderer using the families of `fonts`.
    pub fn new(fonts: FontRegistry) -> Self {
        Self { fonts }
    }
}

impl HtmlRenderer for TextLayoutRenderer {
    async fn render(&self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, GenerationError> {
        let blocks = html_to_blocks(html)?;
        let fonts = self.fonts.clone();
        let layout_options = options.clone();
        let task = tokio::task::spawn_blocking(move || layout_blocks(&blocks, &layout_options, &fonts));

        tokio::time::timeout(options.timeout(), task)
            .await
            .map_err(|_| {
                GenerationError::Render(format!(
                    "text layout did not finish within {:?}",
                    options.timeout()
                ))
            })??
    }
}

fn layout_blocks(
    blocks: &[TextBlock],
    options: &RenderOptions,
    fonts: &FontRegistry,
) -> Result<Vec<u8>, GenerationError> {
    let name = fonts.select(None)?;
    let family = fonts
        .get(name)
        .ok_or_else(|| GenerationError::Config(format!("font family '{name}' is not registered")))?
        .load(name)?;

    let mut document = genpdf::Document::new(family);
    let (width, height) = options.page_size_mm();
    document.set_paper_size(Size::new(mm_from_f64(width), mm_from_f64(height)));
    document.set_font_size(BODY_FONT_SIZE);

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(Margins::all(mm_from_f64(options.border_mm())));
    document.set_page_decorator(decorator);

    if blocks.is_empty() {
        document.push(Break::new(1));
    }
    for block in blocks {
        let paragraph = Paragraph::new(block.text.clone());
        if block.heading {
            let mut style = Style::new();
            style.set_bold();
            style.set_font_size(HEADING_FONT_SIZE);
            document.push(paragraph.styled(style));
        } else {
            document.push(paragraph);
        }
    }
    debug!("laid out {} text blocks", blocks.len());

    let mut bytes = Vec::new();
    document
        .render(&mut bytes)
        .map_err(|err| GenerationError::Render(err.to_string()))?;
    Ok(bytes)
}

/// A paragraph extracted from HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBlock {
    /// Text with whitespace collapsed.
    pub text: String,
    /// Whether the text came from an `h1` to `h6` element.
    pub heading: bool,
}

const SKIPPED_ELEMENTS: &[&[u8]] = &[b"head", b"script", b"style", b"title"];

const BLOCK_ELEMENTS: &[&[u8]] = &[
    b"p", b"div", b"br", b"li", b"ul", b"ol", b"tr", b"table", b"section", b"article", b"header",
    b"footer", b"body", b"blockquote", b"pre", b"hr",
];

/// Reduces `html` to its text paragraphs.
///
/// Block elements end a paragraph, `head`, `script`, `style` and `title`
/// are dropped, and character references are decoded. End tags need not
/// match their start tags, and a `<` or `&` that cannot open markup is
/// kept as text.
pub fn html_to_blocks(html: &str) -> Result<Vec<TextBlock>, GenerationError> {
    let source = escape_stray_markup(html);
    let mut reader = Reader::from_str(&source);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut heading = false;

    loop {
        let event = reader.read_event().map_err(|err| {
            GenerationError::Render(format!(
                "malformed html at byte {}: {err}",
                reader.error_position()
            ))
        })?;
        match event {
            XmlEvent::Start(e) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if SKIPPED_ELEMENTS.contains(&name.as_slice()) {
                    let end = e.name().as_ref().to_vec();
                    if reader.read_to_end(QName(&end)).is_err() {
                        break;
                    }
                } else if is_heading(&name) {
                    flush(&mut blocks, &mut current, heading);
                    heading = true;
                } else if BLOCK_ELEMENTS.contains(&name.as_slice()) {
                    flush(&mut blocks, &mut current, heading);
                }
            }
            XmlEvent::Empty(e) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if is_heading(&name) || BLOCK_ELEMENTS.contains(&name.as_slice()) {
                    flush(&mut blocks, &mut current, heading);
                }
            }
            XmlEvent::End(e) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if is_heading(&name) {
                    flush(&mut blocks, &mut current, heading);
                    heading = false;
                } else if BLOCK_ELEMENTS.contains(&name.as_slice()) {
                    flush(&mut blocks, &mut current, heading);
                }
            }
            XmlEvent::Text(e) => match e.decode() {
                Ok(text) => push_text(&mut current, &text),
                Err(_) => push_text(&mut current, &String::from_utf8_lossy(&e)),
            },
            XmlEvent::GeneralRef(e) => push_text(&mut current, &resolve_reference(&e)),
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    flush(&mut blocks, &mut current, heading);
    Ok(blocks)
}

fn resolve_reference(reference: &BytesRef<'_>) -> String {
    if let Ok(Some(c)) = reference.resolve_char_ref() {
        return c.to_string();
    }
    let name = String::from_utf8_lossy(reference);
    match escape::resolve_html5_entity(&name) {
        Some(text) => text.to_string(),
        None => format!("&{name};"),
    }
}

/// Escapes `<` not followed by a tag name, `/`, `!` or `?`, and `&` not
/// starting a reference.
fn escape_stray_markup(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    for (index, c) in html.char_indices() {
        let rest = &html[index + c.len_utf8()..];
        match c {
            '<' if !opens_markup(rest) => output.push_str("&lt;"),
            '&' if !opens_reference(rest) => output.push_str("&amp;"),
            _ => output.push(c),
        }
    }
    output
}

fn opens_markup(rest: &str) -> bool {
    rest.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

fn opens_reference(rest: &str) -> bool {
    let body = rest.strip_prefix('#').unwrap_or(rest);
    let len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    len > 0 && body[len..].starts_with(';')
}

fn is_heading(name: &[u8]) -> bool {
    matches!(name, b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6")
}

fn push_text(current: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
            }
        } else {
            current.push(c);
        }
    }
}

fn flush(blocks: &mut Vec<TextBlock>, current: &mut String, heading: bool) {
    let text = current.trim();
    if !text.is_empty() {
        blocks.push(TextBlock {
            text: text.to_string(),
            heading,
        });
    }
    current.clear();
}
