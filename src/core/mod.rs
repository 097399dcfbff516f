//! Core correction operators

pub mod adjacency;
pub mod cloud_mask;
pub mod dft;
pub mod tiling;

// Re-export main types
pub use adjacency::{AdjacencyCorrection, AdjacencyParams, AerosolOverride};
pub use cloud_mask::{compose_flags, CloudBands, CloudClassifier, CloudMaskParams};
pub use dft::{
    convolve2d, forward_dft, forward_dft_split, inverse_dft, reconstruct_full_spectrum,
};
pub use tiling::{pad_edge_replicate, process_tiles, tile_windows, CancellationToken};
