//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`ISOTET_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

use isotet_core::{DegenerateEdge, ExtractorConfig};
use isotet_math::{GridSpec, Gyroid, ImplicitFunction, Plane, Sphere, Torus, Vec3};
use isotet_render::ColorMap;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Input field configuration
    #[serde(default)]
    pub field: FieldConfig,
    /// Vertex coloring configuration
    #[serde(default)]
    pub color: ColorConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`ISOTET_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Optional user overrides
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // ISOTET_EXTRACTION__ISOVALUE=0.25 -> extraction.isovalue = 0.25
        figment = figment.merge(Env::prefixed("ISOTET_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Level of the extracted surface
    pub isovalue: f32,
    /// Write output into GPU vertex buffers instead of host memory
    pub use_external_buffer: bool,
    /// Fail the extraction if any output value is NaN or infinite
    pub validate_output: bool,
    /// Interpolation fallback for edges whose crossing cannot be computed
    pub degenerate_edge: DegenerateEdge,
    /// Worker threads (0 = one per core)
    pub threads: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            isovalue: 0.0,
            use_external_buffer: false,
            validate_output: true,
            degenerate_edge: DegenerateEdge::Midpoint,
            threads: 0,
        }
    }
}

impl ExtractionConfig {
    pub fn to_extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            use_external_buffer: self.use_external_buffer,
            validate_output: self.validate_output,
            degenerate_edge: self.degenerate_edge,
        }
    }
}

/// Implicit function sampled as the input field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Sphere,
    Torus,
    Gyroid,
    Plane,
}

/// Field interpolated onto the output vertices for coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxKind {
    /// The input field itself
    Input,
    /// Distance from the origin
    Radius,
    X,
    Y,
    Z,
}

/// Input field configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Which implicit function to sample
    pub kind: FieldKind,
    /// Field used for vertex scalars
    pub aux_kind: AuxKind,
    /// Grid cubes along x, y, z (each cube is split into 6 tetrahedra)
    pub resolution: [usize; 3],
    /// Minimum corner of the sampled box
    pub bounds_min: [f32; 3],
    /// Maximum corner of the sampled box
    pub bounds_max: [f32; 3],
    /// Sphere radius, or torus major radius
    pub radius: f32,
    /// Torus tube radius
    pub minor_radius: f32,
    /// Gyroid spatial frequency
    pub scale: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            kind: FieldKind::Sphere,
            aux_kind: AuxKind::Z,
            resolution: [32, 32, 32],
            bounds_min: [-1.5, -1.5, -1.5],
            bounds_max: [1.5, 1.5, 1.5],
            radius: 1.0,
            minor_radius: 0.35,
            scale: 3.0,
        }
    }
}

impl FieldConfig {
    /// Grid the field is sampled on
    pub fn grid(&self) -> GridSpec {
        GridSpec::new(self.resolution, Vec3::from(self.bounds_min), Vec3::from(self.bounds_max))
    }

    /// The configured input function
    pub fn function(&self) -> Box<dyn ImplicitFunction> {
        match self.kind {
            FieldKind::Sphere => Box::new(Sphere::new(Vec3::ZERO, self.radius)),
            FieldKind::Torus => Box::new(Torus::new(self.radius, self.minor_radius)),
            FieldKind::Gyroid => Box::new(Gyroid::new(self.scale)),
            FieldKind::Plane => Box::new(Plane::new(Vec3::Z, 0.0)),
        }
    }

    /// The configured auxiliary function, or `None` to reuse the input field
    pub fn aux_function(&self) -> Option<Box<dyn ImplicitFunction>> {
        match self.aux_kind {
            AuxKind::Input => None,
            AuxKind::Radius => Some(Box::new(|p: Vec3| p.length())),
            AuxKind::X => Some(Box::new(|p: Vec3| p.x)),
            AuxKind::Y => Some(Box::new(|p: Vec3| p.y)),
            AuxKind::Z => Some(Box::new(|p: Vec3| p.z)),
        }
    }
}

/// Vertex coloring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Scalar at the low end of the color ramp
    pub min: f32,
    /// Scalar at the high end of the color ramp
    pub max: f32,
    /// Reverse the color ramp
    pub flip: bool,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            min: -1.0,
            max: 1.0,
            flip: false,
        }
    }
}

impl ColorConfig {
    pub fn to_color_map(&self) -> ColorMap {
        ColorMap::new(self.min, self.max).with_flip(self.flip)
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
