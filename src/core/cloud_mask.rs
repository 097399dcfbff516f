use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::types::{flags, CorrError, CorrResult, FlagBand, RasterBand, SensorVariant};

/// Cloud classification parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudMaskParams {
    /// Enable the brightness sub-test
    pub bright_enabled: bool,
    /// Enable the vegetation-index sub-test
    pub ndvi_enabled: bool,
    /// Enable the snow-index sub-test
    pub ndsi_enabled: bool,
    /// Enable the temperature sub-test
    pub temp_enabled: bool,
    /// Reflectance above which a pixel counts as bright
    pub brightness_threshold: f32,
    /// NDVI below which a pixel counts as non-vegetated
    pub ndvi_threshold: f32,
    /// NDSI below which a pixel counts as non-snow
    pub ndsi_threshold: f32,
    /// Thermal value (Kelvin) below which a pixel counts as cold
    pub temperature_threshold: f32,
}

impl Default for CloudMaskParams {
    fn default() -> Self {
        Self {
            bright_enabled: true,
            ndvi_enabled: true,
            ndsi_enabled: true,
            temp_enabled: true,
            brightness_threshold: 0.3,
            ndvi_threshold: 0.2,
            ndsi_threshold: 0.3,
            temperature_threshold: 300.0,
        }
    }
}

/// Input reflectance/temperature bands for one tile.
///
/// The fixed ordered set the classifier consumes: two visible bands,
/// two near-infrared bands and the sensor variant's thermal band.
#[derive(Debug, Clone)]
pub struct CloudBands {
    pub band2: RasterBand,
    pub band3: RasterBand,
    pub band4: RasterBand,
    pub band5: RasterBand,
    pub thermal: RasterBand,
}

impl CloudBands {
    fn dim(&self) -> CorrResult<(usize, usize)> {
        let dim = self.band2.dim();
        for (name, band) in [
            ("band3", &self.band3),
            ("band4", &self.band4),
            ("band5", &self.band5),
            ("thermal", &self.thermal),
        ] {
            if band.dim() != dim {
                return Err(CorrError::Processing(format!(
                    "Band dimension mismatch: band2 is {:?} but {} is {:?}",
                    dim,
                    name,
                    band.dim()
                )));
            }
        }
        Ok(dim)
    }
}

/// Combine the four sub-test results and their enable flags into one
/// flag word.
///
/// A disabled sub-test records its own bit as false but is vacuously
/// true for the CLOUD conjunction. CLOUD is false when every sub-test
/// is disabled.
pub fn compose_flags(
    bright: bool,
    ndvi: bool,
    ndsi: bool,
    temp: bool,
    enabled: [bool; 4],
) -> u16 {
    let tests = [bright, ndvi, ndsi, temp];
    let bits = [flags::BRIGHT, flags::NDVI, flags::NDSI, flags::TEMP];

    let mut word = 0u16;
    let mut any_enabled = false;
    let mut all_enabled_true = true;
    for ((&test, &enable), &bit) in tests.iter().zip(enabled.iter()).zip(bits.iter()) {
        if enable {
            any_enabled = true;
            if test {
                word |= bit;
            } else {
                all_enabled_true = false;
            }
        }
    }
    if any_enabled && all_enabled_true {
        word |= flags::CLOUD;
    }
    word
}

/// Tiled per-pixel cloud classifier.
///
/// Pure per-tile function: tiles carry no cross-tile state and the
/// produced flag bands combine losslessly across tiles.
pub struct CloudClassifier {
    params: CloudMaskParams,
    sensor: SensorVariant,
}

impl CloudClassifier {
    /// Resolve the sensor variant from the product type and validate
    /// the parameters; fails fast before any tile is processed.
    pub fn new(product_type: &str, params: CloudMaskParams) -> CorrResult<Self> {
        let sensor = SensorVariant::from_product_type(product_type)?;
        if !(0.0..=1.0).contains(&params.brightness_threshold) {
            return Err(CorrError::Configuration(format!(
                "Brightness threshold {} outside [0, 1]",
                params.brightness_threshold
            )));
        }
        for (name, value) in [
            ("NDVI", params.ndvi_threshold),
            ("NDSI", params.ndsi_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(CorrError::Configuration(format!(
                    "{} threshold {} outside [-1, 1]",
                    name, value
                )));
            }
        }
        if params.temperature_threshold <= 0.0 {
            return Err(CorrError::Configuration(format!(
                "Temperature threshold {} must be positive Kelvin",
                params.temperature_threshold
            )));
        }
        log::debug!(
            "Cloud classifier configured for {} (thermal band {})",
            sensor,
            sensor.thermal_band_name()
        );
        Ok(Self { params, sensor })
    }

    pub fn sensor(&self) -> SensorVariant {
        self.sensor
    }

    /// Classify one tile into a flag band.
    pub fn classify_tile(&self, bands: &CloudBands) -> CorrResult<FlagBand> {
        let dim = bands.dim()?;
        log::debug!("Classifying {}x{} tile", dim.0, dim.1);

        let enabled = [
            self.params.bright_enabled,
            self.params.ndvi_enabled,
            self.params.ndsi_enabled,
            self.params.temp_enabled,
        ];

        let mut flag_band: FlagBand = Array2::zeros(dim);
        for ((i, j), word) in flag_band.indexed_iter_mut() {
            let b2 = bands.band2[[i, j]];
            let b3 = bands.band3[[i, j]];
            let b4 = bands.band4[[i, j]];
            let b5 = bands.band5[[i, j]];
            let thermal = bands.thermal[[i, j]];

            let bright = b3 > self.params.brightness_threshold;
            // NaN ratios (zero denominators) fail their comparison and
            // leave the sub-test false
            let ndvi = (b4 - b3) / (b4 + b3) < self.params.ndvi_threshold;
            let ndsi = (b2 - b5) / (b2 + b5) < self.params.ndsi_threshold;
            let temp = thermal < self.params.temperature_threshold;

            *word = compose_flags(bright, ndvi, ndsi, temp, enabled);
        }
        Ok(flag_band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_disabled_means_no_cloud() {
        let word = compose_flags(true, true, true, true, [false; 4]);
        assert_eq!(word, 0);
    }

    #[test]
    fn test_all_enabled_and_true_sets_cloud() {
        let word = compose_flags(true, true, true, true, [true; 4]);
        assert_eq!(
            word,
            flags::CLOUD | flags::BRIGHT | flags::NDVI | flags::NDSI | flags::TEMP
        );
    }

    #[test]
    fn test_single_failing_enabled_test_clears_cloud() {
        for failing in 0..4 {
            let mut tests = [true; 4];
            tests[failing] = false;
            let word = compose_flags(tests[0], tests[1], tests[2], tests[3], [true; 4]);
            assert_eq!(word & flags::CLOUD, 0, "sub-test {} should block CLOUD", failing);
        }
    }

    #[test]
    fn test_disabled_test_is_vacuously_true() {
        // temperature disabled and failing must not block CLOUD
        let word = compose_flags(true, true, true, false, [true, true, true, false]);
        assert_ne!(word & flags::CLOUD, 0);
        // and its own bit stays clear even when the test would pass
        let word = compose_flags(true, true, true, true, [true, true, true, false]);
        assert_eq!(word & flags::TEMP, 0);
        assert_ne!(word & flags::CLOUD, 0);
    }

    #[test]
    fn test_threshold_validation() {
        let params = CloudMaskParams {
            brightness_threshold: 1.5,
            ..CloudMaskParams::default()
        };
        assert!(CloudClassifier::new("LANDSAT_5_TM", params).is_err());
        assert!(CloudClassifier::new("MODIS", CloudMaskParams::default()).is_err());
    }
}
