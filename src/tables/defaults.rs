//! Built-in table source.
//!
//! Ships physically-shaped default rows so the operators run without the
//! versioned external table assets. The rows are generated
//! deterministically: repeated calls produce byte-identical text, which
//! keeps the downstream evaluations reproducible.

use crate::tables::fourier::{NUM_ANGLES, NUM_ORDERS};
use crate::tables::{TableSource, ANGLE_GRID};
use crate::types::{CorrError, CorrResult, ResolutionClass};

/// Number of aerosol models the default source covers
pub const DEFAULT_MODEL_COUNT: usize = 10;

const FULL_RES_BINS: usize = 12;
const REDUCED_RES_BINS: usize = 6;

/// Refractive index of water used for the default Fresnel pairs
const WATER_REFRACTIVE_INDEX: f64 = 1.34;

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTableSource;

/// The built-in table source.
pub fn default_source() -> DefaultTableSource {
    DefaultTableSource
}

impl TableSource for DefaultTableSource {
    fn fourier_table(&self, model: usize) -> CorrResult<String> {
        if model >= DEFAULT_MODEL_COUNT {
            return Err(CorrError::Configuration(format!(
                "Aerosol model index {} out of range (default source holds {})",
                model, DEFAULT_MODEL_COUNT
            )));
        }
        let extinction = 0.70 + 0.05 * model as f64;
        let mut text = format!("{:.12e}\n", extinction);
        for order in 0..NUM_ORDERS {
            for sun in 0..NUM_ANGLES {
                for view in 0..NUM_ANGLES {
                    // Forward-peaked lobe that flattens with order and
                    // thickens with the model's optical depth bin.
                    let slant = (ANGLE_GRID[sun] + ANGLE_GRID[view]) / 180.0;
                    let value = 0.18 * (1.0 + 0.08 * model as f64) / (1.0 + 2.0 * order as f64)
                        * (-1.5 * slant).exp();
                    text.push_str(&format!("{:.12e}\n", value));
                }
            }
        }
        Ok(text)
    }

    fn coeff_w_rows(&self, resolution: ResolutionClass) -> CorrResult<String> {
        let bins = match resolution {
            ResolutionClass::Full => FULL_RES_BINS,
            ResolutionClass::Reduced => REDUCED_RES_BINS,
        };
        let mut text = String::new();
        for model in 0..DEFAULT_MODEL_COUNT {
            // Exponential fall-off with distance; haze-heavier models
            // spread their weight further out.
            let scale = 1.5 + 0.25 * model as f64;
            let raw: Vec<f64> = (0..bins).map(|d| (-(d as f64) / scale).exp()).collect();
            let total: f64 = raw.iter().sum();
            for (d, value) in raw.iter().enumerate() {
                if d > 0 {
                    text.push(' ');
                }
                text.push_str(&format!("{:.12e}", value / total));
            }
            text.push('\n');
        }
        Ok(text)
    }

    fn fresnel_pairs(&self) -> CorrResult<String> {
        let mut text = String::new();
        for step in 0..=17 {
            let angle = (step * 5) as f64;
            text.push_str(&format!(
                "{:.1} {:.12e}\n",
                angle,
                fresnel_reflectance(angle, WATER_REFRACTIVE_INDEX)
            ));
        }
        text.push_str("90.0 1.000000000000e0\n");
        Ok(text)
    }
}

/// Unpolarized Fresnel reflectance at an air-to-medium interface.
fn fresnel_reflectance(incidence_degrees: f64, refractive_index: f64) -> f64 {
    let theta_i = incidence_degrees.to_radians();
    let sin_t = theta_i.sin() / refractive_index;
    let theta_t = sin_t.asin();
    if theta_i == 0.0 {
        let r = (refractive_index - 1.0) / (refractive_index + 1.0);
        return r * r;
    }
    let r_s = ((theta_i - theta_t).sin() / (theta_i + theta_t).sin()).powi(2);
    let r_p = ((theta_i - theta_t).tan() / (theta_i + theta_t).tan()).powi(2);
    0.5 * (r_s + r_p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{FourierTable, FresnelTable};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_fourier_tables_parse_for_all_models() {
        let source = default_source();
        for model in 0..DEFAULT_MODEL_COUNT {
            let text = source.fourier_table(model).unwrap();
            let table = FourierTable::parse(model, &text).unwrap();
            assert!(table.extinction() > 0.0);
        }
        assert!(source.fourier_table(DEFAULT_MODEL_COUNT).is_err());
    }

    #[test]
    fn test_default_fresnel_pairs_parse() {
        let source = default_source();
        let table = FresnelTable::parse(&source.fresnel_pairs().unwrap()).unwrap();
        // normal incidence on water reflects about 2 percent
        assert_abs_diff_eq!(table.coefficient_for(0.0), 0.0211, epsilon = 1e-3);
        assert_abs_diff_eq!(table.coefficient_for(90.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_default_source_is_deterministic() {
        let source = default_source();
        assert_eq!(
            source.fourier_table(3).unwrap(),
            source.fourier_table(3).unwrap()
        );
        assert_eq!(
            source.coeff_w_rows(ResolutionClass::Full).unwrap(),
            source.coeff_w_rows(ResolutionClass::Full).unwrap()
        );
    }
}
