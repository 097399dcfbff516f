use ndarray::Array2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Complex spectrum sample
pub type Spectrum = Complex<f64>;

/// 2D reflectance or temperature raster (row x column)
pub type RasterBand = Array2<f32>;

/// 2D bit-flag raster (row x column)
pub type FlagBand = Array2<u16>;

/// Bit positions of the cloud classification flag word.
///
/// CLOUD is derived: it is never set on its own but computed from the
/// enabled sub-tests (see `core::cloud_mask::compose_flags`).
pub mod flags {
    pub const CLOUD: u16 = 1 << 0;
    pub const BRIGHT: u16 = 1 << 1;
    pub const NDVI: u16 = 1 << 2;
    pub const NDSI: u16 = 1 << 3;
    pub const TEMP: u16 = 1 << 4;
}

/// No-data sentinel written into corrected reflectance bands
pub const NO_DATA_VALUE: f32 = 0.0;

/// Supported sensor configurations.
///
/// Each variant carries its own fixed band mapping, resolved once at
/// configuration time rather than re-matched per band name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorVariant {
    /// Landsat 5 Thematic Mapper
    Tm5,
    /// Landsat 7 Enhanced Thematic Mapper+
    Etm7,
}

impl SensorVariant {
    /// Resolve a product-type string to a sensor variant.
    pub fn from_product_type(product_type: &str) -> CorrResult<Self> {
        match product_type {
            s if s.contains("LANDSAT_5") || s.contains("TM5") => Ok(SensorVariant::Tm5),
            s if s.contains("LANDSAT_7") || s.contains("ETM7") => Ok(SensorVariant::Etm7),
            other => Err(CorrError::Configuration(format!(
                "Unrecognized product type: '{}'",
                other
            ))),
        }
    }

    /// Name of the thermal band for this sensor.
    pub fn thermal_band_name(&self) -> &'static str {
        match self {
            SensorVariant::Tm5 => "band6",
            SensorVariant::Etm7 => "band6_vcid_1",
        }
    }
}

impl std::fmt::Display for SensorVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorVariant::Tm5 => write!(f, "TM5"),
            SensorVariant::Etm7 => write!(f, "ETM7"),
        }
    }
}

/// Raster resolution class selecting the matching coefficient-W row set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionClass {
    Full,
    Reduced,
}

/// Rectangular tile window over a scene raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileWindow {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl TileWindow {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Per-pixel scene geometry in degrees.
///
/// Zenith and azimuth rasters must share the dimensions of the tile they
/// describe; `from_scalars` covers the common tie-point case of constant
/// geometry over a tile.
#[derive(Debug, Clone)]
pub struct SceneGeometry {
    pub sun_zenith: Array2<f32>,
    pub view_zenith: Array2<f32>,
    pub relative_azimuth: Array2<f32>,
}

impl SceneGeometry {
    pub fn from_scalars(
        dim: (usize, usize),
        sun_zenith: f32,
        view_zenith: f32,
        relative_azimuth: f32,
    ) -> Self {
        Self {
            sun_zenith: Array2::from_elem(dim, sun_zenith),
            view_zenith: Array2::from_elem(dim, view_zenith),
            relative_azimuth: Array2::from_elem(dim, relative_azimuth),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.sun_zenith.dim()
    }
}

/// Error types for the correction engine
#[derive(Debug, thiserror::Error)]
pub enum CorrError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed table resource: {0}")]
    ResourceFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for correction operations
pub type CorrResult<T> = Result<T, CorrError>;
