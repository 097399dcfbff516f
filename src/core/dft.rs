//! Discrete Fourier transform utility.
//!
//! A direct-summation transform over complex or split real/imaginary
//! sample arrays, with Hermitian-symmetry reconstruction of a real
//! signal's full spectrum from its non-redundant half, and a
//! frequency-domain 2-D convolution built on top. Direct summation is
//! deliberate: the spectra feed numeric-reproducibility fixtures, and
//! the evaluation order here is fixed.

use ndarray::Array2;
use num_complex::Complex;

use crate::types::{CorrError, CorrResult, Spectrum};

/// Forward transform `X[k] = sum_n x[n] * exp(-2*pi*i*k*n/N)`.
///
/// With `normalize` set, the spectrum is scaled by `2/sqrt(N)`, the
/// convention of the reference fixtures this implementation is checked
/// against.
pub fn forward_dft(signal: &[Spectrum], normalize: bool) -> Vec<Spectrum> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let scale = if normalize {
        2.0 / (n as f64).sqrt()
    } else {
        1.0
    };
    let step = -2.0 * std::f64::consts::PI / n as f64;

    let mut spectrum = Vec::with_capacity(n);
    for k in 0..n {
        let mut acc = Complex::new(0.0, 0.0);
        for (idx, sample) in signal.iter().enumerate() {
            let angle = step * (k * idx) as f64;
            acc += sample * Complex::new(angle.cos(), angle.sin());
        }
        spectrum.push(acc * scale);
    }
    spectrum
}

/// Forward transform over split real/imaginary arrays.
///
/// Numerically identical to [`forward_dft`] on the interleaved input.
pub fn forward_dft_split(
    real: &[f64],
    imag: &[f64],
    normalize: bool,
) -> CorrResult<Vec<Spectrum>> {
    if real.len() != imag.len() {
        return Err(CorrError::Processing(format!(
            "Split DFT input length mismatch: {} real vs {} imaginary samples",
            real.len(),
            imag.len()
        )));
    }
    let signal: Vec<Spectrum> = real
        .iter()
        .zip(imag.iter())
        .map(|(&re, &im)| Complex::new(re, im))
        .collect();
    Ok(forward_dft(&signal, normalize))
}

/// Inverse transform scaled by `1/N`, so that `inverse_dft(forward_dft(x,
/// false)) == x` up to rounding.
pub fn inverse_dft(spectrum: &[Spectrum]) -> Vec<Spectrum> {
    let n = spectrum.len();
    if n == 0 {
        return Vec::new();
    }
    let scale = 1.0 / n as f64;
    let step = 2.0 * std::f64::consts::PI / n as f64;

    let mut signal = Vec::with_capacity(n);
    for k in 0..n {
        let mut acc = Complex::new(0.0, 0.0);
        for (idx, sample) in spectrum.iter().enumerate() {
            let angle = step * (k * idx) as f64;
            acc += sample * Complex::new(angle.cos(), angle.sin());
        }
        signal.push(acc * scale);
    }
    signal
}

/// Reconstruct the full spectrum of a real-valued signal from its
/// non-negative-frequency half using Hermitian symmetry
/// (`X[N-k] = conj(X[k])`).
///
/// The half-spectrum's own length determines the assumed signal parity:
/// an even half-length implies an odd signal (no Nyquist term, mirror
/// indices `1..=M-1`), an odd half-length implies an even signal whose
/// last entry is the Nyquist term (mirror `1..=M-2`). A length-2 half
/// therefore reconstructs to length 3 and a length-3 half to length 4.
pub fn reconstruct_full_spectrum(half: &[Spectrum]) -> Vec<Spectrum> {
    let m = half.len();
    if m < 2 {
        return half.to_vec();
    }
    let last_mirrored = if m % 2 == 0 { m - 1 } else { m - 2 };
    let mut full = half.to_vec();
    for k in (1..=last_mirrored).rev() {
        full.push(half[k].conj());
    }
    full
}

/// Full linear 2-D convolution of `image` with `kernel` in the
/// frequency domain.
///
/// Both inputs are zero-padded to `image + kernel - 1` per axis (the
/// smallest size at which the circular product equals the linear
/// convolution), transformed, multiplied element-wise and inverse
/// transformed. The result has the padded size; callers crop the region
/// they need.
pub fn convolve2d(image: &Array2<f64>, kernel: &Array2<f64>) -> Array2<f64> {
    let (ih, iw) = image.dim();
    let (kh, kw) = kernel.dim();
    let height = ih + kh - 1;
    let width = iw + kw - 1;

    let mut image_freq = embed(image, height, width);
    let mut kernel_freq = embed(kernel, height, width);
    dft2(&mut image_freq, false);
    dft2(&mut kernel_freq, false);

    for (lhs, rhs) in image_freq.iter_mut().zip(kernel_freq.iter()) {
        *lhs *= rhs;
    }
    dft2(&mut image_freq, true);

    image_freq.mapv(|value| value.re)
}

fn embed(data: &Array2<f64>, height: usize, width: usize) -> Array2<Spectrum> {
    let mut padded = Array2::from_elem((height, width), Complex::new(0.0, 0.0));
    for ((i, j), &value) in data.indexed_iter() {
        padded[[i, j]] = Complex::new(value, 0.0);
    }
    padded
}

/// In-place 2-D transform: 1-D transforms along every row, then every
/// column.
fn dft2(data: &mut Array2<Spectrum>, inverse: bool) {
    let (height, width) = data.dim();
    for i in 0..height {
        let row: Vec<Spectrum> = data.row(i).to_vec();
        let transformed = if inverse {
            inverse_dft(&row)
        } else {
            forward_dft(&row, false)
        };
        for (j, value) in transformed.into_iter().enumerate() {
            data[[i, j]] = value;
        }
    }
    for j in 0..width {
        let column: Vec<Spectrum> = data.column(j).to_vec();
        let transformed = if inverse {
            inverse_dft(&column)
        } else {
            forward_dft(&column, false)
        };
        for (i, value) in transformed.into_iter().enumerate() {
            data[[i, j]] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn impulse_train() -> Vec<Spectrum> {
        let mut signal = vec![Complex::new(0.0, 0.0); 8];
        signal[2] = Complex::new(2.0, 0.0);
        signal[3] = Complex::new(3.0, 0.0);
        signal[4] = Complex::new(4.0, 0.0);
        signal
    }

    #[test]
    fn test_forward_dft_impulse_train_fixture() {
        let spectrum = forward_dft(&impulse_train(), true);
        assert_abs_diff_eq!(spectrum[0].re, 6.363, epsilon = 1e-3);
        assert_abs_diff_eq!(spectrum[0].im, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(spectrum[1].re, -4.328, epsilon = 1e-3);
        assert_abs_diff_eq!(spectrum[1].im, -2.914, epsilon = 1e-3);
    }

    #[test]
    fn test_real_signal_spectrum_is_hermitian() {
        let spectrum = forward_dft(&impulse_train(), true);
        let n = spectrum.len();
        for k in 1..n {
            let mirror = spectrum[n - k].conj();
            assert_abs_diff_eq!(spectrum[k].re, mirror.re, epsilon = 1e-9);
            assert_abs_diff_eq!(spectrum[k].im, mirror.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_split_and_complex_forms_agree() {
        let signal = impulse_train();
        let real: Vec<f64> = signal.iter().map(|c| c.re).collect();
        let imag: Vec<f64> = signal.iter().map(|c| c.im).collect();
        let from_complex = forward_dft(&signal, true);
        let from_split = forward_dft_split(&real, &imag, true).unwrap();
        for (a, b) in from_complex.iter().zip(from_split.iter()) {
            assert_eq!(a.re.to_bits(), b.re.to_bits());
            assert_eq!(a.im.to_bits(), b.im.to_bits());
        }
    }

    #[test]
    fn test_split_form_rejects_length_mismatch() {
        assert!(forward_dft_split(&[1.0, 2.0], &[0.0], false).is_err());
    }

    #[test]
    fn test_round_trip_is_identity() {
        let signal = impulse_train();
        let restored = inverse_dft(&forward_dft(&signal, false));
        for (a, b) in signal.iter().zip(restored.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-9);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_reconstruct_full_spectrum_lengths() {
        let half2 = [Complex::new(1.0, 0.0), Complex::new(2.0, -1.0)];
        let full3 = reconstruct_full_spectrum(&half2);
        assert_eq!(full3.len(), 3);
        assert_eq!(full3[2], half2[1].conj());

        let half3 = [
            Complex::new(1.0, 0.0),
            Complex::new(2.0, -1.0),
            Complex::new(0.5, 0.0),
        ];
        let full4 = reconstruct_full_spectrum(&half3);
        assert_eq!(full4.len(), 4);
        assert_eq!(full4[3], half3[1].conj());
    }

    #[test]
    fn test_convolve2d_matches_direct_convolution() {
        let image =
            Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let kernel = Array2::from_shape_vec((2, 2), vec![1.0, 0.5, 0.25, 0.0]).unwrap();

        let via_dft = convolve2d(&image, &kernel);

        let (ih, iw) = image.dim();
        let (kh, kw) = kernel.dim();
        let mut direct = Array2::zeros((ih + kh - 1, iw + kw - 1));
        for (ii, jj) in ndarray::indices(image.dim()) {
            for (ki, kj) in ndarray::indices(kernel.dim()) {
                direct[[ii + ki, jj + kj]] += image[[ii, jj]] * kernel[[ki, kj]];
            }
        }

        assert_eq!(via_dft.dim(), direct.dim());
        for (a, b) in via_dft.iter().zip(direct.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }
}
