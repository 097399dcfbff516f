use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ndarray::Array3;

use crate::tables::angle_grid::{nearest_index, upper_index, ANGLE_GRID};
use crate::tables::TableSource;
use crate::types::{CorrError, CorrResult};

/// Truncation count of the Fourier expansion in relative azimuth
pub const NUM_ORDERS: usize = 3;

/// Number of angle samples per table axis
pub const NUM_ANGLES: usize = ANGLE_GRID.len();

// Zenith angles at the grid edge approach 90 degrees; the slant-path
// secant is kept finite by flooring the cosine.
const MIN_COS: f64 = 1e-3;

/// Fourier-decomposed aerosol scattering coefficients for one aerosol
/// model, sampled as `[order][sun_angle_index][view_angle_index]`, plus
/// the model's extinction coefficient.
///
/// All evaluation methods are deterministic pure functions: identical
/// inputs produce bit-identical outputs. Downstream products are
/// compared against reference fixtures with tight tolerances, so no
/// evaluation may depend on ambient state.
#[derive(Debug, Clone)]
pub struct FourierTable {
    model: usize,
    extinction: f64,
    coefficients: Array3<f64>,
}

impl FourierTable {
    /// Parse the packed text form: the extinction scalar first, then
    /// `NUM_ORDERS * NUM_ANGLES * NUM_ANGLES` coefficients in
    /// order-major, sun-index, view-index order. Whitespace (including
    /// line breaks) separates values.
    pub fn parse(model: usize, text: &str) -> CorrResult<Self> {
        let mut values = text.split_whitespace();

        let extinction: f64 = values
            .next()
            .ok_or_else(|| {
                CorrError::ResourceFormat(format!("Fourier table {}: empty resource", model))
            })?
            .parse()
            .map_err(|_| {
                CorrError::ResourceFormat(format!(
                    "Fourier table {}: non-numeric extinction coefficient",
                    model
                ))
            })?;
        if extinction <= 0.0 {
            return Err(CorrError::ResourceFormat(format!(
                "Fourier table {}: extinction coefficient must be positive, got {}",
                model, extinction
            )));
        }

        let expected = NUM_ORDERS * NUM_ANGLES * NUM_ANGLES;
        let mut flat = Vec::with_capacity(expected);
        for value in values {
            let parsed: f64 = value.parse().map_err(|_| {
                CorrError::ResourceFormat(format!(
                    "Fourier table {}: non-numeric coefficient '{}'",
                    model, value
                ))
            })?;
            flat.push(parsed);
        }
        if flat.len() != expected {
            return Err(CorrError::ResourceFormat(format!(
                "Fourier table {}: expected {} coefficients, found {}",
                model,
                expected,
                flat.len()
            )));
        }

        let coefficients = Array3::from_shape_vec((NUM_ORDERS, NUM_ANGLES, NUM_ANGLES), flat)
            .map_err(|e| {
                CorrError::ResourceFormat(format!("Fourier table {}: {}", model, e))
            })?;

        log::debug!(
            "Loaded Fourier table for aerosol model {} (extinction {:.4})",
            model,
            extinction
        );
        Ok(Self {
            model,
            extinction,
            coefficients,
        })
    }

    pub fn model(&self) -> usize {
        self.model
    }

    pub fn extinction(&self) -> f64 {
        self.extinction
    }

    /// Two-way slant-path transmittance for the given sun and view
    /// zenith angles (degrees) and aerosol optical depth. Unitless,
    /// in (0, 1] for non-negative optical depth.
    pub fn transmittance(&self, sun_zenith: f64, view_zenith: f64, optical_depth: f64) -> f64 {
        let mu_sun = sun_zenith.to_radians().cos().max(MIN_COS);
        let mu_view = view_zenith.to_radians().cos().max(MIN_COS);
        let slant = 1.0 / mu_sun + 1.0 / mu_view;
        (-self.extinction * optical_depth.max(0.0) * slant).exp()
    }

    /// Primary-scattering reflectance at the given geometry.
    ///
    /// Both zenith angles are bracketed on the angle grid and each
    /// Fourier order's coefficient is bilinearly interpolated in
    /// angle-space before the truncated cosine series in relative
    /// azimuth is summed.
    pub fn primary_reflectance(
        &self,
        sun_zenith: f64,
        view_zenith: f64,
        relative_azimuth: f64,
    ) -> f64 {
        let (sun_upper, sun_weight) = bracket(sun_zenith);
        let (view_upper, view_weight) = bracket(view_zenith);
        let phi = relative_azimuth.to_radians();

        let mut sum = 0.0;
        for order in 0..NUM_ORDERS {
            let c00 = self.coefficients[[order, sun_upper - 1, view_upper - 1]];
            let c01 = self.coefficients[[order, sun_upper - 1, view_upper]];
            let c10 = self.coefficients[[order, sun_upper, view_upper - 1]];
            let c11 = self.coefficients[[order, sun_upper, view_upper]];
            let c0 = c00 + view_weight * (c01 - c00);
            let c1 = c10 + view_weight * (c11 - c10);
            let coefficient = c0 + sun_weight * (c1 - c0);
            sum += order_weight(order) * coefficient * (order as f64 * phi).cos();
        }
        sum
    }

    /// Aerosol scattering phase function at a single scattering angle,
    /// evaluated at the nearest grid index without bidirectional
    /// interpolation.
    pub fn phase(&self, scattering_angle: f64) -> f64 {
        let idx = nearest_index(scattering_angle);
        let mut sum = 0.0;
        for order in 0..NUM_ORDERS {
            sum += order_weight(order) * self.coefficients[[order, idx, idx]];
        }
        sum
    }
}

/// Upper bracketing index and the fractional position of `angle` inside
/// the bracket, clamped to [0, 1].
fn bracket(angle: f64) -> (usize, f64) {
    let upper = upper_index(angle);
    let lower_angle = ANGLE_GRID[upper - 1];
    let upper_angle = ANGLE_GRID[upper];
    let weight = ((angle - lower_angle) / (upper_angle - lower_angle)).clamp(0.0, 1.0);
    (upper, weight)
}

/// Cosine-series weight: the zeroth order enters once, higher orders
/// twice (positive and negative frequency term folded together).
fn order_weight(order: usize) -> f64 {
    if order == 0 {
        1.0
    } else {
        2.0
    }
}

/// Load-once cache of Fourier tables keyed by aerosol model index.
///
/// Loading happens under the map lock, so at most one load runs per key
/// (and, coarser, per cache); once loaded, tables are immutable and
/// shared via `Arc`, so concurrent readers need no further locking.
#[derive(Debug, Default)]
pub struct FourierTableCache {
    tables: Mutex<HashMap<usize, Arc<FourierTable>>>,
}

impl FourierTableCache {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Table for `model`, loading it through `source` on first request.
    /// Repeated requests return the cached table without re-parsing.
    pub fn get(&self, model: usize, source: &dyn TableSource) -> CorrResult<Arc<FourierTable>> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| CorrError::Processing("Fourier table cache poisoned".to_string()))?;
        if let Some(table) = tables.get(&model) {
            return Ok(Arc::clone(table));
        }
        log::info!("Loading Fourier table for aerosol model {}", model);
        let text = source.fourier_table(model)?;
        let table = Arc::new(FourierTable::parse(model, &text)?);
        tables.insert(model, Arc::clone(&table));
        Ok(table)
    }
}
