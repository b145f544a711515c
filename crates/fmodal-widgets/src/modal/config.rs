#![forbid(unsafe_code)]

//! Modal configuration and per-display content options.
//!
//! [`ModalConfig`] holds the instance defaults and is fixed at construction.
//! It can be loaded from TOML or JSON; every field has a default, so partial
//! files only override what they name.
//!
//! ```toml
//! overlay_opacity = 0.7
//! panel_css_class = "lightbox"
//! panel_width = 800
//! load_mode = "in-place"
//! ```
//!
//! [`ContentOptions`] carries the overrides for one display cycle. Missing
//! fields fall back to the config. Both types also accept the camelCase keys
//! (`panelWidth`, `overlayZIndex`, ...) a JavaScript host sends.

use std::path::Path;

use fmodal_backend::BoxExtents;
use fmodal_core::geometry::Size;
use fmodal_layout::PanelRequest;
use serde::{Deserialize, Serialize};

/// What loading new content does while the modal is already showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Full `hide()` then `show()`: listeners are re-bound and both
    /// notifications fire.
    #[default]
    Reshow,
    /// Swap content and options and re-lay out; no notifications.
    InPlace,
}

/// Which box layers content measurement includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureLayers {
    pub padding: bool,
    pub border: bool,
    pub margin: bool,
}

impl Default for MeasureLayers {
    fn default() -> Self {
        Self {
            padding: true,
            border: true,
            margin: true,
        }
    }
}

impl MeasureLayers {
    #[must_use]
    pub fn extents(self) -> BoxExtents {
        let mut extents = BoxExtents::empty();
        extents.set(BoxExtents::PADDING, self.padding);
        extents.set(BoxExtents::BORDER, self.border);
        extents.set(BoxExtents::MARGIN, self.margin);
        extents
    }
}

/// Instance defaults for a modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    #[serde(alias = "overlayOpacity")]
    pub overlay_opacity: f64,
    #[serde(alias = "overlayZIndex")]
    pub overlay_z_index: i32,
    #[serde(alias = "overlayBackgroundColor")]
    pub overlay_background_color: String,
    #[serde(alias = "overlayCssClass")]
    pub overlay_css_class: Option<String>,
    #[serde(alias = "panelZIndex")]
    pub panel_z_index: i32,
    #[serde(alias = "panelWidth")]
    pub panel_width: f64,
    #[serde(alias = "panelHeight")]
    pub panel_height: f64,
    #[serde(alias = "panelBackgroundColor")]
    pub panel_background_color: String,
    #[serde(alias = "panelCssClass")]
    pub panel_css_class: Option<String>,
    #[serde(alias = "panelXOffset")]
    pub panel_x_offset: f64,
    #[serde(alias = "panelYOffset")]
    pub panel_y_offset: f64,
    #[serde(alias = "loadMode")]
    pub load_mode: LoadMode,
    #[serde(alias = "measureLayers")]
    pub measure_layers: MeasureLayers,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            overlay_opacity: 0.5,
            overlay_z_index: 49,
            overlay_background_color: "#000000".to_owned(),
            overlay_css_class: None,
            panel_z_index: 50,
            panel_width: 600.0,
            panel_height: 600.0,
            panel_background_color: "#ffffff".to_owned(),
            panel_css_class: None,
            panel_x_offset: 0.0,
            panel_y_offset: 0.0,
            load_mode: LoadMode::Reshow,
            measure_layers: MeasureLayers::default(),
        }
    }
}

impl ModalConfig {
    pub fn overlay_opacity(mut self, opacity: f64) -> Self {
        self.overlay_opacity = opacity;
        self
    }

    pub fn overlay_css_class(mut self, class: impl Into<String>) -> Self {
        self.overlay_css_class = Some(class.into());
        self
    }

    pub fn panel_css_class(mut self, class: impl Into<String>) -> Self {
        self.panel_css_class = Some(class.into());
        self
    }

    pub fn panel_size(mut self, width: f64, height: f64) -> Self {
        self.panel_width = width;
        self.panel_height = height;
        self
    }

    pub fn panel_offset(mut self, x: f64, y: f64) -> Self {
        self.panel_x_offset = x;
        self.panel_y_offset = y;
        self
    }

    pub fn load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }

    pub fn measure_layers(mut self, layers: MeasureLayers) -> Self {
        self.measure_layers = layers;
        self
    }

    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ModalConfigError> {
        toml::from_str(s).map_err(ModalConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ModalConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ModalConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ModalConfigError> {
        serde_json::from_str(s).map_err(ModalConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModalConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ModalConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&self.overlay_opacity) {
            errors.push(format!(
                "overlay_opacity must be in [0, 1], got {}",
                self.overlay_opacity
            ));
        }
        for (name, value) in [
            ("panel_width", self.panel_width),
            ("panel_height", self.panel_height),
            ("panel_x_offset", self.panel_x_offset),
            ("panel_y_offset", self.panel_y_offset),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be a non-negative number, got {value}"));
            }
        }
        for (name, value) in [
            ("overlay_background_color", &self.overlay_background_color),
            ("panel_background_color", &self.panel_background_color),
        ] {
            if !is_css_color(value) {
                errors.push(format!("{name} is not a CSS colour: {value:?}"));
            }
        }
        for (name, value) in [
            ("overlay_css_class", &self.overlay_css_class),
            ("panel_css_class", &self.panel_css_class),
        ] {
            if let Some(class) = value
                && (class.is_empty() || class.chars().any(char::is_whitespace))
            {
                errors.push(format!("{name} must be a single class name, got {class:?}"));
            }
        }
        errors
    }

    /// Load, then reject configs that fail [`validate`](Self::validate).
    pub fn from_toml_str_validated(s: &str) -> Result<Self, ModalConfigError> {
        let config = Self::from_toml_str(s)?;
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ModalConfigError::Validation(errors))
        }
    }
}

/// `#rgb`, `#rrggbb`, or a bare keyword such as `white`.
fn is_css_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()),
    }
}

/// Per-display overrides supplied with each load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentOptions {
    #[serde(alias = "panelWidth")]
    pub panel_width: Option<f64>,
    #[serde(alias = "panelHeight")]
    pub panel_height: Option<f64>,
    #[serde(alias = "panelXOffset")]
    pub panel_x_offset: Option<f64>,
    #[serde(alias = "panelYOffset")]
    pub panel_y_offset: Option<f64>,
    /// Panel size follows measured content.
    pub autosize: bool,
}

impl ContentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.panel_width = Some(width);
        self.panel_height = Some(height);
        self
    }

    pub fn offset(mut self, x: f64, y: f64) -> Self {
        self.panel_x_offset = Some(x);
        self.panel_y_offset = Some(y);
        self
    }

    pub fn autosize(mut self, autosize: bool) -> Self {
        self.autosize = autosize;
        self
    }

    /// Requested panel size with config fallbacks.
    #[must_use]
    pub fn requested_size(&self, config: &ModalConfig) -> Size {
        Size::new(
            self.panel_width.unwrap_or(config.panel_width),
            self.panel_height.unwrap_or(config.panel_height),
        )
    }

    /// Resolve against the config into a geometry request.
    #[must_use]
    pub fn resolve(&self, config: &ModalConfig) -> PanelRequest {
        let size = self.requested_size(config);
        PanelRequest::new(size.width, size.height).offset(
            self.panel_x_offset.unwrap_or(config.panel_x_offset),
            self.panel_y_offset.unwrap_or(config.panel_y_offset),
        )
    }
}

/// Read access to an instance's fixed options.
pub trait Configurable {
    type Options;

    fn options(&self) -> &Self::Options;
}

/// Errors that can occur when loading a modal configuration.
#[derive(Debug)]
pub enum ModalConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ModalConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ModalConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
