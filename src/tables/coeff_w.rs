use ndarray::Array2;

use crate::tables::TableSource;
use crate::types::{CorrError, CorrResult, ResolutionClass};

/// Per-aerosol-model radial weighting profiles.
///
/// One normalized weight row per aerosol model and resolution class;
/// each row distributes unit weight across its distance bins (a
/// correctness property of the table asset, verified by tests rather
/// than enforced at load time).
#[derive(Debug, Clone)]
pub struct CoeffWTable {
    full: Array2<f64>,
    reduced: Array2<f64>,
}

impl CoeffWTable {
    /// Load both resolution classes through a table source.
    pub fn load(source: &dyn TableSource) -> CorrResult<Self> {
        log::info!("Loading coefficient-W weight rows");
        let full = parse_rows(&source.coeff_w_rows(ResolutionClass::Full)?, "full")?;
        let reduced = parse_rows(&source.coeff_w_rows(ResolutionClass::Reduced)?, "reduced")?;
        if full.nrows() != reduced.nrows() {
            return Err(CorrError::ResourceFormat(format!(
                "Coefficient-W model count mismatch: {} full rows vs {} reduced rows",
                full.nrows(),
                reduced.nrows()
            )));
        }
        Ok(Self { full, reduced })
    }

    /// Weight matrix `[aerosol_model][distance_bin]` for a resolution class.
    pub fn weights_for(&self, resolution: ResolutionClass) -> &Array2<f64> {
        match resolution {
            ResolutionClass::Full => &self.full,
            ResolutionClass::Reduced => &self.reduced,
        }
    }

    /// Radial profile for one aerosol model at the given resolution.
    pub fn profile_for(&self, model: usize, resolution: ResolutionClass) -> CorrResult<Vec<f64>> {
        let weights = self.weights_for(resolution);
        if model >= weights.nrows() {
            return Err(CorrError::Configuration(format!(
                "Aerosol model index {} out of range (table holds {} models)",
                model,
                weights.nrows()
            )));
        }
        Ok(weights.row(model).to_vec())
    }

    pub fn model_count(&self) -> usize {
        self.full.nrows()
    }
}

fn parse_rows(text: &str, class_name: &str) -> CorrResult<Array2<f64>> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut row = Vec::new();
        for field in line.split_whitespace() {
            let value: f64 = field.parse().map_err(|_| {
                CorrError::ResourceFormat(format!(
                    "Coefficient-W {} rows, line {}: non-numeric weight '{}'",
                    class_name,
                    line_no + 1,
                    field
                ))
            })?;
            row.push(value);
        }
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(CorrError::ResourceFormat(format!(
                    "Coefficient-W {} rows, line {}: expected {} bins, found {}",
                    class_name,
                    line_no + 1,
                    first.len(),
                    row.len()
                )));
            }
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(CorrError::ResourceFormat(format!(
            "Coefficient-W {} rows: empty resource",
            class_name
        )));
    }
    let bins = rows[0].len();
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), bins), flat)
        .map_err(|e| CorrError::ResourceFormat(format!("Coefficient-W {} rows: {}", class_name, e)))
}

/// Rasterize a 1-D radial profile of length N into a square
/// `(2N-1) x (2N-1)` kernel by rotating it about its origin.
///
/// The origin sits at `(N-1, N-1)`. Each cell takes the profile value
/// at its rounded integer distance from the origin; cells strictly
/// beyond radius `N-1` (the square's corners among them) are zero.
pub fn build_radial_kernel(profile: &[f64]) -> Array2<f64> {
    let n = profile.len();
    if n == 0 {
        return Array2::zeros((0, 0));
    }
    let side = 2 * n - 1;
    let origin = (n - 1) as f64;
    let max_radius = (n - 1) as f64;

    let mut kernel = Array2::zeros((side, side));
    for i in 0..side {
        for j in 0..side {
            let di = i as f64 - origin;
            let dj = j as f64 - origin;
            let radius = (di * di + dj * dj).sqrt();
            if radius <= max_radius {
                kernel[[i, j]] = profile[radius.round() as usize];
            }
        }
    }
    kernel
}
