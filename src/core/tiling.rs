//! Tile iteration, border extension and cancellable dispatch.
//!
//! Tiles of one scene are independent, so they may be processed by
//! separate workers; each worker requests its own bordered source
//! window. Cancellation is cooperative at tile granularity: a tile that
//! already started runs to completion, but no further tiles are
//! dispatched once the token is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::Array2;

use crate::types::{CorrError, CorrResult, TileWindow};

/// Cooperative cancellation token shared between the caller and the
/// tile dispatcher.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Split a scene extent into row-major tile windows of at most
/// `tile_size` per side.
pub fn tile_windows(
    scene_width: usize,
    scene_height: usize,
    tile_size: usize,
) -> Vec<TileWindow> {
    let mut windows = Vec::new();
    if tile_size == 0 {
        return windows;
    }
    for y in (0..scene_height).step_by(tile_size) {
        let height = tile_size.min(scene_height - y);
        for x in (0..scene_width).step_by(tile_size) {
            let width = tile_size.min(scene_width - x);
            windows.push(TileWindow::new(x, y, width, height));
        }
    }
    windows
}

/// Extend a raster by `margin` pixels on every side, replicating the
/// edge samples (copy-extension border policy). Kernel support over the
/// padded raster never reads outside the original data.
pub fn pad_edge_replicate(raster: &Array2<f32>, margin: usize) -> Array2<f32> {
    let (height, width) = raster.dim();
    if margin == 0 || height == 0 || width == 0 {
        return raster.clone();
    }
    let mut padded = Array2::zeros((height + 2 * margin, width + 2 * margin));
    for i in 0..height + 2 * margin {
        let src_i = i.saturating_sub(margin).min(height - 1);
        for j in 0..width + 2 * margin {
            let src_j = j.saturating_sub(margin).min(width - 1);
            padded[[i, j]] = raster[[src_i, src_j]];
        }
    }
    padded
}

/// Run `op` over every tile window, honouring the cancellation token.
///
/// Results come back in window order. The first tile failure fails the
/// whole operation; tiles already completed stay valid at the call
/// site. Dispatch is parallel when the `parallel` feature is active.
pub fn process_tiles<T, F>(
    windows: &[TileWindow],
    cancel: &CancellationToken,
    op: F,
) -> CorrResult<Vec<T>>
where
    T: Send,
    F: Fn(TileWindow) -> CorrResult<T> + Sync,
{
    log::info!("Dispatching {} tiles", windows.len());
    let results = dispatch(windows, cancel, &op)?;
    log::info!("All {} tiles completed", results.len());
    Ok(results)
}

#[cfg(feature = "parallel")]
fn dispatch<T, F>(
    windows: &[TileWindow],
    cancel: &CancellationToken,
    op: &F,
) -> CorrResult<Vec<T>>
where
    T: Send,
    F: Fn(TileWindow) -> CorrResult<T> + Sync,
{
    use rayon::prelude::*;

    windows
        .par_iter()
        .map(|&window| {
            if cancel.is_cancelled() {
                return Err(CorrError::Processing(
                    "Tile processing cancelled".to_string(),
                ));
            }
            op(window)
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn dispatch<T, F>(
    windows: &[TileWindow],
    cancel: &CancellationToken,
    op: &F,
) -> CorrResult<Vec<T>>
where
    T: Send,
    F: Fn(TileWindow) -> CorrResult<T> + Sync,
{
    let mut results = Vec::with_capacity(windows.len());
    for &window in windows {
        if cancel.is_cancelled() {
            return Err(CorrError::Processing(
                "Tile processing cancelled".to_string(),
            ));
        }
        results.push(op(window)?);
    }
    Ok(results)
}
