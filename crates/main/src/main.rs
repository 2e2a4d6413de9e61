use std::error::Error;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use pdf_generators::demos;
use pdf_generators::generator::{
    DirectDrawingGenerator, DocumentGenerator, GeneratedPdf, StructuredDocumentGenerator,
    TemplateGenerator,
};
use pdf_generators::model::DocumentDefinitions;
use pdf_generators::template::{
    CommandRenderer, Dimension, HtmlRenderer, Orientation, PaperFormat, RenderOptions,
    Substitutions, TextLayoutRenderer,
};
use pdf_generators::{FontRegistry, GenerationError};

/// Generates PDF documents from definitions, plain text or HTML templates.
///
/// Fonts are read from `assets/fonts` in the directory named by
/// `PDF_GENERATORS_FONTS_DIR`, next to the executable, or in the crate
/// sources. Set `RUST_LOG=info` to see progress.
#[derive(Parser)]
#[command(author, version, about = "Generate PDF documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON document definition.
    Structured {
        /// JSON file describing the document.
        #[arg(long)]
        definition: PathBuf,
        /// Font registry JSON mapping family names to font files.
        #[arg(long)]
        fonts: Option<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },

    /// Draw a single line of text.
    Draw {
        #[arg(long)]
        text: String,
        /// Font size in points.
        #[arg(long, default_value_t = 25)]
        font_size: u8,
        #[arg(long)]
        output: PathBuf,
    },

    /// Fill an HTML template and render it.
    Template {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Placeholder value as `key=value`; may be repeated.
        #[arg(long = "set", value_parser = parse_key_value)]
        values: Vec<(String, String)>,
        /// Page width such as `50mm`; requires `--height`.
        #[arg(long, requires = "height", value_parser = parse_value::<Dimension>)]
        width: Option<Dimension>,
        /// Page height such as `90mm`; requires `--width`.
        #[arg(long, requires = "width", value_parser = parse_value::<Dimension>)]
        height: Option<Dimension>,
        /// Paper format used without an explicit size.
        #[arg(long, value_parser = parse_value::<PaperFormat>)]
        format: Option<PaperFormat>,
        #[arg(long, value_parser = parse_value::<Orientation>)]
        orientation: Option<Orientation>,
        /// Image inserted for `{{image}}`.
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RendererKind::Text)]
        renderer: RendererKind,
        /// Converter executable used by the command renderer.
        #[arg(long)]
        program: Option<PathBuf>,
    },

    /// Render the three demo documents into `pdfs/` and list every file written.
    #[command(name = "run-all", aliases = ["run_all", "all", "demo"])]
    RunAll {
        #[arg(long, default_value = demos::OUTPUT_DIR)]
        output_dir: PathBuf,
        /// Backend for the template demo.
        #[arg(long, value_enum, default_value_t = RendererKind::Text)]
        renderer: RendererKind,
        /// Converter executable used by the command renderer.
        #[arg(long)]
        program: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RendererKind {
    /// Built-in text layout.
    Text,
    /// External HTML converter.
    Command,
}

fn parse_value<T>(input: &str) -> Result<T, String>
where
    T: FromStr<Err = GenerationError>,
{
    input.parse().map_err(|err: GenerationError| err.to_string())
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{input}'"))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Structured {
            definition,
            fonts,
            output,
        } => structured(&definition, fonts.as_deref(), &output).await.map(report),
        Commands::Draw {
            text,
            font_size,
            output,
        } => DirectDrawingGenerator::new()
            .with_font_size(font_size)
            .generate_pdf(&output, text)
            .await
            .map(report),
        Commands::Template {
            template,
            output,
            values,
            width,
            height,
            format,
            orientation,
            image,
            renderer,
            program,
        } => {
            let mut options = RenderOptions::new();
            if let (Some(width), Some(height)) = (width, height) {
                options = options.with_size(width, height);
            }
            if let Some(format) = format {
                options = options.with_format(format);
            }
            if let Some(orientation) = orientation {
                options = options.with_orientation(orientation);
            }
            let substitutions: Substitutions = values.into_iter().collect();

            let generated = match renderer {
                RendererKind::Text => {
                    let renderer = TextLayoutRenderer::default();
                    render_template(template, options, renderer, image, &output, substitutions)
                        .await
                }
                RendererKind::Command => {
                    let renderer = command_renderer(program);
                    render_template(template, options, renderer, image, &output, substitutions)
                        .await
                }
            };
            generated.map(report)
        }
        Commands::RunAll {
            output_dir,
            renderer,
            program,
        } => {
            let generated = match renderer {
                RendererKind::Text => {
                    demos::run_all(&output_dir, TextLayoutRenderer::default()).await
                }
                RendererKind::Command => {
                    demos::run_all(&output_dir, command_renderer(program)).await
                }
            };
            generated.map(|generated| generated.into_iter().for_each(report))
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(&err);
        std::process::exit(1);
    }
}

async fn structured(
    definition: &Path,
    fonts: Option<&Path>,
    output: &Path,
) -> Result<GeneratedPdf, GenerationError> {
    let json = read_to_string(definition).await?;
    let definitions = DocumentDefinitions::from_json(&json)?;
    let registry = match fonts {
        Some(path) => serde_json::from_str::<FontRegistry>(&read_to_string(path).await?)?,
        None => FontRegistry::default(),
    };

    StructuredDocumentGenerator::new(registry)
        .generate_pdf(output, definitions)
        .await
}

fn command_renderer(program: Option<PathBuf>) -> CommandRenderer {
    match program {
        Some(program) => CommandRenderer::new().with_program(program),
        None => CommandRenderer::new(),
    }
}

async fn render_template<R: HtmlRenderer>(
    template: PathBuf,
    options: RenderOptions,
    renderer: R,
    image: Option<PathBuf>,
    output: &Path,
    substitutions: Substitutions,
) -> Result<GeneratedPdf, GenerationError> {
    let mut generator = TemplateGenerator::new(template, options, renderer);
    if let Some(image) = image {
        generator = generator.with_image_asset(image);
    }
    generator.generate_pdf(output, substitutions).await
}

async fn read_to_string(path: &Path) -> Result<String, GenerationError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GenerationError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn report(pdf: GeneratedPdf) {
    println!("Generated {} ({} bytes)", pdf.path.display(), pdf.bytes.len());
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_is_an_alias_of_run_all() {
        let cli = Cli::try_parse_from(["pdf-generators", "demo", "--renderer", "command"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::RunAll {
                renderer: RendererKind::Command,
                program: None,
                ..
            }
        ));

        let cli = Cli::try_parse_from(["pdf-generators", "run-all"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::RunAll {
                renderer: RendererKind::Text,
                ..
            }
        ));
    }
}
