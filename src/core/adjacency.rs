use std::sync::Arc;

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::core::dft::convolve2d;
use crate::core::tiling::{pad_edge_replicate, process_tiles, tile_windows, CancellationToken};
use crate::tables::{build_radial_kernel, CoeffWTable, FourierTable, FourierTableCache, FresnelTable, TableSource};
use crate::types::{
    CorrError, CorrResult, RasterBand, ResolutionClass, SceneGeometry, TileWindow, NO_DATA_VALUE,
};

/// User-supplied fixed aerosol description overriding the estimated
/// model: Angstrom exponent and aerosol optical thickness at 550 nm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AerosolOverride {
    pub angstrom: f64,
    pub aot: f64,
}

/// Adjacency-effect correction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjacencyParams {
    /// Estimated aerosol model index (ignored when an override is set)
    pub aerosol_model: usize,
    /// Optional fixed (Angstrom exponent, optical thickness) pair
    pub aerosol_override: Option<AerosolOverride>,
    /// Aerosol optical depth applied when no override is given
    pub optical_depth: f64,
    /// Resolution class selecting the radial weight rows
    pub resolution: ResolutionClass,
}

impl Default for AdjacencyParams {
    fn default() -> Self {
        Self {
            aerosol_model: 0,
            aerosol_override: None,
            optical_depth: 0.2,
            resolution: ResolutionClass::Full,
        }
    }
}

/// Adjacency-effect correction operator.
///
/// For each reflective band the operator convolves the neighbouring
/// top-of-atmosphere reflectances with the aerosol model's radial
/// kernel, scales the neighbourhood excess by the local optical
/// properties and subtracts it from the raw reflectance. All lookup
/// tables are resolved once at construction; correction itself touches
/// only immutable shared state and is safe to run per tile in parallel.
pub struct AdjacencyCorrection {
    params: AdjacencyParams,
    model: usize,
    fourier: Arc<FourierTable>,
    fresnel: FresnelTable,
    kernel: Array2<f64>,
    kernel_radius: usize,
}

impl AdjacencyCorrection {
    /// Resolve tables and build the radial kernel; fails fast on bad
    /// configuration or malformed table assets.
    pub fn new(
        params: AdjacencyParams,
        source: &dyn TableSource,
        cache: &FourierTableCache,
    ) -> CorrResult<Self> {
        let coeff_w = CoeffWTable::load(source)?;

        let model = match params.aerosol_override {
            Some(fixed) => {
                if !(0.0..=4.0).contains(&fixed.angstrom) {
                    return Err(CorrError::Configuration(format!(
                        "Angstrom exponent {} outside [0, 4]",
                        fixed.angstrom
                    )));
                }
                if fixed.aot <= 0.0 || fixed.aot > 2.0 {
                    return Err(CorrError::Configuration(format!(
                        "Aerosol optical thickness {} outside (0, 2]",
                        fixed.aot
                    )));
                }
                let bins = coeff_w.model_count();
                let index = ((fixed.aot / 2.0) * (bins - 1) as f64).round() as usize;
                log::info!(
                    "Aerosol override (angstrom {:.2}, aot {:.3}) mapped to model {}",
                    fixed.angstrom,
                    fixed.aot,
                    index
                );
                index
            }
            None => {
                if params.optical_depth <= 0.0 {
                    return Err(CorrError::Configuration(format!(
                        "Optical depth {} must be positive",
                        params.optical_depth
                    )));
                }
                params.aerosol_model
            }
        };

        let fourier = cache.get(model, source)?;
        let fresnel = FresnelTable::parse(&source.fresnel_pairs()?)?;
        let profile = coeff_w.profile_for(model, params.resolution)?;

        // Rotating the 1-D profile changes its total mass; the kernel is
        // renormalized so a constant neighbourhood averages to itself.
        let mut kernel = build_radial_kernel(&profile);
        let mass: f64 = kernel.sum();
        if mass <= 0.0 {
            return Err(CorrError::ResourceFormat(format!(
                "Radial profile for aerosol model {} has no positive mass",
                model
            )));
        }
        kernel.mapv_inplace(|w| w / mass);
        let kernel_radius = profile.len() - 1;

        log::info!(
            "Adjacency correction ready: model {}, kernel {}x{}, {:?} resolution",
            model,
            kernel.nrows(),
            kernel.ncols(),
            params.resolution
        );
        Ok(Self {
            params,
            model,
            fourier,
            fresnel,
            kernel,
            kernel_radius,
        })
    }

    pub fn model(&self) -> usize {
        self.model
    }

    pub fn kernel_radius(&self) -> usize {
        self.kernel_radius
    }

    /// Optical depth for a band; with a fixed override the Angstrom law
    /// scales the 550 nm thickness to the band wavelength.
    fn band_optical_depth(&self, wavelength_nm: f64) -> f64 {
        match self.params.aerosol_override {
            Some(fixed) => fixed.aot * (wavelength_nm / 550.0).powf(-fixed.angstrom),
            None => self.params.optical_depth,
        }
    }

    /// Correct one tile whose border pixels extend by copying the edge
    /// samples.
    pub fn correct_band(
        &self,
        toa: &RasterBand,
        geometry: &SceneGeometry,
        wavelength_nm: f64,
    ) -> CorrResult<RasterBand> {
        if wavelength_nm <= 0.0 {
            return Err(CorrError::Configuration(format!(
                "Band wavelength {} must be positive",
                wavelength_nm
            )));
        }
        if toa.dim() != geometry.dim() {
            return Err(CorrError::Processing(format!(
                "Geometry dimensions {:?} do not match band dimensions {:?}",
                geometry.dim(),
                toa.dim()
            )));
        }
        let bordered = pad_edge_replicate(toa, self.kernel_radius);
        self.correct_bordered(&bordered, toa, geometry, wavelength_nm)
    }

    /// Correct a tile given its bordered source window (tile extent plus
    /// `kernel_radius` pixels on every side).
    fn correct_bordered(
        &self,
        bordered: &Array2<f32>,
        toa: &RasterBand,
        geometry: &SceneGeometry,
        wavelength_nm: f64,
    ) -> CorrResult<RasterBand> {
        let (height, width) = toa.dim();
        let margin = self.kernel_radius;
        let expected = (height + 2 * margin, width + 2 * margin);
        if bordered.dim() != expected {
            return Err(CorrError::Processing(format!(
                "Bordered window is {:?}, expected {:?}",
                bordered.dim(),
                expected
            )));
        }

        let tau = self.band_optical_depth(wavelength_nm);
        let bordered64 = bordered.mapv(|v| v as f64);
        let convolved = convolve2d(&bordered64, &self.kernel);

        let mut corrected: RasterBand = Array2::zeros((height, width));
        for ((i, j), out) in corrected.indexed_iter_mut() {
            let raw = toa[[i, j]];
            if raw == NO_DATA_VALUE {
                *out = NO_DATA_VALUE;
                continue;
            }
            // kernel origin offset puts the neighbourhood average of
            // tile pixel (i, j) at (i + 2*margin, j + 2*margin)
            let neighbourhood = convolved[[i + 2 * margin, j + 2 * margin]];

            let sun = geometry.sun_zenith[[i, j]] as f64;
            let view = geometry.view_zenith[[i, j]] as f64;
            let azimuth = geometry.relative_azimuth[[i, j]] as f64;
            // the neighbourhood excess reaches the sensor attenuated
            // along the slant path, weighted by the specular surface
            // term plus the aerosol's primary-scattering lobe
            let scale = (self.fourier.transmittance(sun, view, tau)
                * (self.fresnel.coefficient_for(view)
                    + self.fourier.primary_reflectance(sun, view, azimuth)))
            .clamp(0.0, 1.0);

            *out = raw - (scale * (neighbourhood - raw as f64)) as f32;
        }
        Ok(corrected)
    }

    /// Correct a whole scene band tile by tile.
    ///
    /// Each tile requests its own bordered source window (clamped edge
    /// replication at scene borders), so tiles are independent and are
    /// dispatched through the cancellable tile pool.
    pub fn correct_scene(
        &self,
        scene: &RasterBand,
        geometry: &SceneGeometry,
        wavelength_nm: f64,
        tile_size: usize,
        cancel: &CancellationToken,
    ) -> CorrResult<RasterBand> {
        if tile_size == 0 {
            return Err(CorrError::Configuration(
                "Tile size must be positive".to_string(),
            ));
        }
        if scene.dim() != geometry.dim() {
            return Err(CorrError::Processing(format!(
                "Geometry dimensions {:?} do not match scene dimensions {:?}",
                geometry.dim(),
                scene.dim()
            )));
        }
        let (scene_height, scene_width) = scene.dim();
        let windows = tile_windows(scene_width, scene_height, tile_size);

        let tiles = process_tiles(&windows, cancel, |window| {
            let bordered = bordered_window(scene, window, self.kernel_radius);
            let toa = scene
                .slice(s![
                    window.y..window.y + window.height,
                    window.x..window.x + window.width
                ])
                .to_owned();
            let tile_geometry = SceneGeometry {
                sun_zenith: geometry
                    .sun_zenith
                    .slice(s![
                        window.y..window.y + window.height,
                        window.x..window.x + window.width
                    ])
                    .to_owned(),
                view_zenith: geometry
                    .view_zenith
                    .slice(s![
                        window.y..window.y + window.height,
                        window.x..window.x + window.width
                    ])
                    .to_owned(),
                relative_azimuth: geometry
                    .relative_azimuth
                    .slice(s![
                        window.y..window.y + window.height,
                        window.x..window.x + window.width
                    ])
                    .to_owned(),
            };
            let corrected = self.correct_bordered(&bordered, &toa, &tile_geometry, wavelength_nm)?;
            Ok((window, corrected))
        })?;

        let mut output: RasterBand = Array2::zeros(scene.dim());
        for (window, tile) in tiles {
            output
                .slice_mut(s![
                    window.y..window.y + window.height,
                    window.x..window.x + window.width
                ])
                .assign(&tile);
        }
        Ok(output)
    }
}

/// Source window for one tile, extended by `margin` on every side with
/// scene samples where available and edge replication beyond the scene.
fn bordered_window(scene: &RasterBand, window: TileWindow, margin: usize) -> Array2<f32> {
    let (scene_height, scene_width) = scene.dim();
    let height = window.height + 2 * margin;
    let width = window.width + 2 * margin;
    let mut bordered = Array2::zeros((height, width));
    for i in 0..height {
        let src_i = (window.y + i)
            .saturating_sub(margin)
            .min(scene_height - 1);
        for j in 0..width {
            let src_j = (window.x + j)
                .saturating_sub(margin)
                .min(scene_width - 1);
            bordered[[i, j]] = scene[[src_i, src_j]];
        }
    }
    bordered
}
