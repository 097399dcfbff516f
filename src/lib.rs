//! opticorr: Tile-Based Physical Correction for Optical Satellite Imagery
//!
//! This library provides the core processing engine for per-pixel cloud
//! classification and atmospheric adjacency-effect correction of optical
//! scenes. Product container I/O, metadata handling and UI configuration
//! are external collaborators; the core consumes raster tiles, per-pixel
//! geometry and parsed table resources, and produces flag and corrected
//! reflectance rasters.

pub mod core;
pub mod tables;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    CorrError, CorrResult, FlagBand, RasterBand, ResolutionClass, SceneGeometry, SensorVariant,
    TileWindow,
};

pub use crate::core::{AdjacencyCorrection, AdjacencyParams, CloudClassifier, CloudMaskParams};
pub use crate::tables::{CoeffWTable, FourierTable, FourierTableCache, FresnelTable};
