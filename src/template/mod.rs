//! HTML templates with `{{key}}` placeholders and their rendering backends.

use std::path::{Path, PathBuf};

mod options;
mod renderer;

pub use options::{Dimension, Orientation, PaperFormat, RenderOptions, Unit, DEFAULT_TIMEOUT};
pub use renderer::{html_to_blocks, CommandRenderer, HtmlRenderer, TextBlock, TextLayoutRenderer};

/// Placeholder replaced with the URI of the bundled image asset.
pub const IMAGE_PLACEHOLDER: &str = "image";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Ordered placeholder values.
///
/// Setting a key again replaces its value but keeps its original position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitutions {
    entries: Vec<(String, String)>,
}

impl Substitutions {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value` and returns the updated set.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entry is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut substitutions = Self::new();
        for (key, value) in iter {
            substitutions.set(key, value);
        }
        substitutions
    }
}

/// Replaces the placeholders of `template`.
///
/// `{{image}}` becomes `image_uri`, `{{key}}` becomes the value of `key`.
/// Replaced text is never scanned again; unknown placeholders and an
/// unterminated `{{` are copied unchanged.
pub fn substitute(template: &str, image_uri: &str, substitutions: &Substitutions) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);
        let candidate = &rest[start + OPEN.len()..];

        let value = candidate.find(CLOSE).and_then(|end| {
            let key = &candidate[..end];
            let value = if key == IMAGE_PLACEHOLDER {
                Some(image_uri)
            } else {
                substitutions.get(key)
            };
            value.map(|value| (value, end))
        });

        match value {
            Some((value, end)) => {
                output.push_str(value);
                rest = &candidate[end + CLOSE.len()..];
            }
            None => {
                output.push_str(OPEN);
                rest = candidate;
            }
        }
    }

    output.push_str(rest);
    output
}

/// Returns the bundled image asset shipped in `templates/`.
pub fn bundled_image_asset() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates/image.png")
}

/// Returns the bundled HTML template shipped in `templates/`.
pub fn bundled_template() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates/template.html")
}

/// Builds a `file://` URI for `path`, resolved against the working directory when relative.
pub fn image_uri(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    format!("file://{}", absolute.display())
}
