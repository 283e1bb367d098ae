use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error returned when loading a font.
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font data: {0}")]
    Parse(String),
}

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

/// Monospace fonts commonly present on desktop systems.
const MONOSPACE_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "/Library/Fonts/Courier New.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
];

/// Owns the fonts used by the overlay.
///
/// Fonts are immutable after loading; glyphs are rasterized on demand by the
/// text renderer.
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError::Parse(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        Ok(id)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<FontId, FontLoadError> {
        let bytes = std::fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_font(&bytes)
    }

    /// Loads the first usable system monospace font.
    pub fn load_system_monospace(&mut self) -> Option<FontId> {
        MONOSPACE_CANDIDATES
            .iter()
            .map(Path::new)
            .filter(|p| p.is_file())
            .find_map(|p| match self.load_file(p) {
                Ok(id) => {
                    log::debug!("overlay font: {}", p.display());
                    Some(id)
                }
                Err(e) => {
                    log::debug!("skipping {}: {e}", p.display());
                    None
                }
            })
    }

    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }

    /// Baseline-to-baseline distance at `px`.
    pub fn line_height(&self, id: FontId, px: f32) -> f32 {
        self.get(id)
            .and_then(|f| f.horizontal_line_metrics(px))
            .map_or(px * 1.2, |m| m.new_line_size)
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut fonts = FontSystem::new();
        assert!(matches!(
            fonts.load_font(b"not a font"),
            Err(FontLoadError::Parse(_))
        ));
        assert!(fonts.get(FontId(0)).is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let mut fonts = FontSystem::new();
        let err = fonts
            .load_file(Path::new("/nonexistent/lumen/font.ttf"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lumen/font.ttf"));
    }

    #[test]
    fn unknown_font_uses_fallback_line_height() {
        let fonts = FontSystem::new();
        assert!((fonts.line_height(FontId(3), 10.0) - 12.0).abs() < 1e-6);
    }
}
