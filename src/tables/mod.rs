//! Lookup tables driving the adjacency-effect correction

pub mod angle_grid;
pub mod coeff_w;
pub mod defaults;
pub mod fourier;
pub mod fresnel;

// Re-export main types
pub use angle_grid::{nearest_index, upper_index, ANGLE_GRID};
pub use coeff_w::{build_radial_kernel, CoeffWTable};
pub use defaults::{default_source, DefaultTableSource};
pub use fourier::{FourierTable, FourierTableCache, NUM_ORDERS};
pub use fresnel::FresnelTable;

use crate::types::CorrResult;

/// Source of raw table resource text.
///
/// The core performs no file I/O; a collaborator resolves the versioned
/// table assets and hands their content over as text.
pub trait TableSource {
    /// Packed aerosol Fourier table for one aerosol model index.
    fn fourier_table(&self, model: usize) -> CorrResult<String>;
    /// Coefficient-W weight rows for one resolution class.
    fn coeff_w_rows(&self, resolution: crate::types::ResolutionClass) -> CorrResult<String>;
    /// Fresnel angle/coefficient pairs.
    fn fresnel_pairs(&self) -> CorrResult<String>;
}
