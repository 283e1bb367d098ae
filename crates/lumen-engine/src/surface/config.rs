use std::path::PathBuf;

/// What `set_uniform` and the vertex binder do with names the linked program
/// does not declare.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum UniformPolicy {
    /// Ignore the call. Unused uniforms are routinely stripped from programs.
    #[default]
    Lenient,
    /// Return `UniformNotFound` / `AttributeNotFound`.
    Strict,
}

/// Debug overlay settings.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub enabled: bool,

    /// Monospace TTF/OTF used for overlay text. When unset, common system
    /// locations are searched; without a font only the bar graph is drawn.
    pub font_path: Option<PathBuf>,

    /// Font size in logical pixels at surface scale 1.
    pub font_size: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            font_path: None,
            font_size: 12.0,
        }
    }
}

/// Render surface configuration.
///
/// `width`/`height` are the displayed size in logical pixels; the backing
/// surface is `floor(width / scale) × floor(height / scale)`.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
    pub uniform_policy: UniformPolicy,
    pub overlay: OverlayConfig,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            width: 600.0,
            height: 600.0,
            scale: 1.0,
            uniform_policy: UniformPolicy::default(),
            overlay: OverlayConfig::default(),
        }
    }
}
