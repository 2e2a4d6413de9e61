//! Font registry and bundled font discovery.
//!
//! A [`FontRegistry`] maps family names to the TrueType files of up to four
//! style variants.  Nothing is read from disk until [`FontRegistry::load`] is
//! called by a generator, so registries are cheap to build and pass around.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use genpdf::fonts::{FontData, FontFamily};
use log::debug;
use serde::Deserialize;

use crate::error::GenerationError;

/// Name of the preferred bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Name of the family shipped in `assets/fonts`.
pub const FALLBACK_FONT_FAMILY_NAME: &str = "DejaVu Sans";

/// Environment variable that overrides the bundled font directory.
pub const FONTS_DIR_ENV: &str = "PDF_GENERATORS_FONTS_DIR";

/// File names of a bundled family, in normal, bold, italic, bold italic order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BundledFamily {
    /// Registry name of the family.
    pub name: &'static str,
    /// Variant file names.
    pub files: [&'static str; 4],
}

impl BundledFamily {
    fn types(&self, directory: &Path) -> FontFamilyTypes {
        let [normal, bold, italics, bolditalics] = self.files;
        FontFamilyTypes::new(directory.join(normal))
            .with_bold(directory.join(bold))
            .with_italics(directory.join(italics))
            .with_bolditalics(directory.join(bolditalics))
    }

    fn missing_files(&self, directory: &Path) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|name| directory.join(name))
            .filter(|candidate| !candidate.is_file())
            .collect()
    }
}

/// Bundled families in order of preference.
pub const BUNDLED_FAMILIES: &[BundledFamily] = &[
    BundledFamily {
        name: DEFAULT_FONT_FAMILY_NAME,
        files: [
            "Roboto-Regular.ttf",
            "Roboto-Medium.ttf",
            "Roboto-Italic.ttf",
            "Roboto-MediumItalic.ttf",
        ],
    },
    BundledFamily {
        name: FALLBACK_FONT_FAMILY_NAME,
        files: [
            "DejaVuSans.ttf",
            "DejaVuSans-Bold.ttf",
            "DejaVuSans-Oblique.ttf",
            "DejaVuSans-BoldOblique.ttf",
        ],
    },
];

/// Font files for the style variants of one family.
///
/// Variants that are not provided fall back to the `normal` file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FontFamilyTypes {
    /// Regular weight, upright.
    pub normal: Option<PathBuf>,
    /// Bold weight, upright.
    pub bold: Option<PathBuf>,
    /// Regular weight, italic.
    pub italics: Option<PathBuf>,
    /// Bold weight, italic.
    pub bolditalics: Option<PathBuf>,
}

impl FontFamilyTypes {
    /// Creates a family that uses `normal` for every variant.
    pub fn new(normal: impl Into<PathBuf>) -> Self {
        Self {
            normal: Some(normal.into()),
            ..Self::default()
        }
    }

    /// Sets the bold variant and returns the updated family.
    pub fn with_bold(mut self, path: impl Into<PathBuf>) -> Self {
        self.bold = Some(path.into());
        self
    }

    /// Sets the italic variant and returns the updated family.
    pub fn with_italics(mut self, path: impl Into<PathBuf>) -> Self {
        self.italics = Some(path.into());
        self
    }

    /// Sets the bold italic variant and returns the updated family.
    pub fn with_bolditalics(mut self, path: impl Into<PathBuf>) -> Self {
        self.bolditalics = Some(path.into());
        self
    }

    /// Reads the variant files and returns them as a layout engine font family.
    pub fn load(&self, family: &str) -> Result<FontFamily<FontData>, GenerationError> {
        let normal = self.normal.as_deref().ok_or_else(|| {
            GenerationError::Config(format!(
                "font family '{family}' does not define a normal variant"
            ))
        })?;

        let load = |path: Option<&Path>| -> Result<FontData, GenerationError> {
            let path = path.unwrap_or(normal);
            FontData::load(path, None).map_err(|source| GenerationError::Font {
                family: family.to_string(),
                source,
            })
        };

        Ok(FontFamily {
            regular: load(Some(normal))?,
            bold: load(self.bold.as_deref())?,
            italic: load(self.italics.as_deref())?,
            bold_italic: load(self.bolditalics.as_deref())?,
        })
    }

    fn paths(&self) -> impl Iterator<Item = &Path> {
        [&self.normal, &self.bold, &self.italics, &self.bolditalics]
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
    }
}

/// Mapping from family name to font files.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FontRegistry {
    families: BTreeMap<String, FontFamilyTypes>,
}

impl FontRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            families: BTreeMap::new(),
        }
    }

    /// Returns a registry containing the first bundled family found on disk.
    ///
    /// Roboto is preferred; the DejaVu Sans files shipped in `assets/fonts`
    /// are used otherwise. When no candidate directory holds either family,
    /// Roboto is registered at the manifest location and loading reports the
    /// missing files.
    pub fn bundled() -> Self {
        let (directory, family) = resolve_font_directory().unwrap_or_else(|err| {
            debug!("{err}");
            (bundled_fonts_source_dir(), BUNDLED_FAMILIES[0])
        });

        Self::new().with_family(family.name, family.types(&directory))
    }

    /// Registers a family and returns the updated registry.
    pub fn with_family(mut self, name: impl Into<String>, family: FontFamilyTypes) -> Self {
        self.insert(name, family);
        self
    }

    /// Registers or replaces a family.
    pub fn insert(&mut self, name: impl Into<String>, family: FontFamilyTypes) {
        self.families.insert(name.into(), family);
    }

    /// Looks up a family by its exact name.
    pub fn get(&self, name: &str) -> Option<&FontFamilyTypes> {
        self.families.get(name)
    }

    /// Returns the registered family names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    /// Returns `true` when no family is registered.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Returns `true` when every file referenced by the registry exists.
    pub fn files_present(&self) -> bool {
        self.families
            .values()
            .flat_map(FontFamilyTypes::paths)
            .all(Path::is_file)
    }

    /// Picks the family used for the document body.
    ///
    /// `requested` wins when given; otherwise the bundled family name is used if
    /// registered, else the first registered family.
    pub fn select<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str, GenerationError> {
        if let Some(name) = requested {
            return if self.families.contains_key(name) {
                Ok(name)
            } else {
                Err(GenerationError::Config(format!(
                    "font family '{}' is not registered (known: {})",
                    name,
                    self.names().collect::<Vec<_>>().join(", ")
                )))
            };
        }

        if self.families.contains_key(DEFAULT_FONT_FAMILY_NAME) {
            return Ok(DEFAULT_FONT_FAMILY_NAME);
        }

        self.names()
            .next()
            .ok_or_else(|| GenerationError::Config("font registry is empty".to_string()))
    }

    /// Reads every registered family from disk.
    pub fn load(&self) -> Result<BTreeMap<String, FontFamily<FontData>>, GenerationError> {
        self.families
            .iter()
            .map(|(name, family)| Ok((name.clone(), family.load(name)?)))
            .collect()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Returns the font directory inside the crate sources.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(path) = env::var(FONTS_DIR_ENV) {
        if !path.trim().is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = bundled_fonts_source_dir();
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn resolve_font_directory() -> Result<(PathBuf, BundledFamily), GenerationError> {
    let candidates = font_directory_candidates();
    let mut attempts = Vec::new();

    for family in BUNDLED_FAMILIES {
        for candidate in &candidates {
            if !candidate.is_dir() {
                attempts.push(format!("{} (directory missing)", candidate.display()));
                continue;
            }

            let missing = family.missing_files(candidate);
            if missing.is_empty() {
                debug!("using {} fonts from {}", family.name, candidate.display());
                return Ok((candidate.clone(), *family));
            }

            let missing_list = missing
                .iter()
                .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
                .collect::<Vec<_>>()
                .join(", ");
            attempts.push(format!(
                "{} ({} missing files [{}])",
                candidate.display(),
                family.name,
                missing_list
            ));
        }
    }

    Err(GenerationError::Config(format!(
        "Unable to locate bundled font directory. Checked: {}. See assets/fonts/README.md or set {}.",
        attempts.join(", "),
        FONTS_DIR_ENV
    )))
}

/// Returns the directory holding the bundled font files.
///
/// Search order: the `PDF_GENERATORS_FONTS_DIR` environment variable, an
/// `assets/fonts` directory next to the running executable, then
/// `assets/fonts` inside the crate sources. Every location is tried for
/// Roboto before any is tried for DejaVu Sans.
pub fn bundled_fonts_dir() -> Result<PathBuf, GenerationError> {
    resolve_font_directory().map(|(directory, _)| directory)
}

/// Indicates whether the files of a bundled family are present on disk.
pub fn bundled_fonts_available() -> bool {
    resolve_font_directory().is_ok()
}
