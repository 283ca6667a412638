// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Floating-point image planes and the small convolution toolkit the metric
// engine is built from: sparse kernels, reflective borders, Laplacian and
// Sobel operators.

use image::GrayImage;

/// A single-channel image of `f64` samples, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Plane {
    /// Lift an 8-bit grayscale image into floating point.
    pub fn from_gray(gray: &GrayImage) -> Self {
        Self {
            width: gray.width() as usize,
            height: gray.height() as usize,
            data: gray.as_raw().iter().map(|&v| v as f64).collect(),
        }
    }

    /// Build a plane from raw samples. Returns `None` on a size mismatch.
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Sample with out-of-range coordinates folded back by `border`.
    fn get_folded(&self, x: isize, y: isize, border: Border) -> f64 {
        let fx = border.fold(x, self.width);
        let fy = border.fold(y, self.height);
        self.data[fy * self.width + fx]
    }

    /// Apply `f` to every sample.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two planes of equal size sample by sample.
    pub fn zip_with(&self, other: &Plane, f: impl Fn(f64, f64) -> f64) -> Option<Self> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        Some(Self {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Arithmetic mean; `None` for an empty plane.
    pub fn mean(&self) -> Option<f64> {
        if self.data.is_empty() {
            return None;
        }
        Some(self.data.iter().sum::<f64>() / self.data.len() as f64)
    }

    /// Population variance; `None` for an empty plane.
    pub fn variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        let sum_sq: f64 = self.data.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some(sum_sq / self.data.len() as f64)
    }

    /// Fraction of samples satisfying `pred`; `None` for an empty plane.
    pub fn fraction(&self, pred: impl Fn(f64) -> bool) -> Option<f64> {
        if self.data.is_empty() {
            return None;
        }
        let hits = self.data.iter().filter(|&&v| pred(v)).count();
        Some(hits as f64 / self.data.len() as f64)
    }
}

/// How samples outside the plane are synthesised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// `dcb|abcd|cba` — mirror without repeating the edge sample.
    Reflect101,
    /// `cba|abcd|dcb` — mirror repeating the edge sample.
    Symmetric,
}

impl Border {
    /// Map a possibly out-of-range index into `0..len`.
    fn fold(self, index: isize, len: usize) -> usize {
        let n = len as isize;
        if (0..n).contains(&index) {
            return index as usize;
        }
        match self {
            Self::Symmetric => {
                let period = 2 * n;
                let m = index.rem_euclid(period);
                (if m < n { m } else { period - 1 - m }) as usize
            }
            Self::Reflect101 => {
                if n == 1 {
                    return 0;
                }
                let period = 2 * n - 2;
                let m = index.rem_euclid(period);
                (if m < n { m } else { period - m }) as usize
            }
        }
    }
}

/// A 2-D kernel stored as its non-zero taps.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    width: usize,
    height: usize,
    /// `(row, column, weight)` for every non-zero entry.
    taps: Vec<(usize, usize, f64)>,
}

impl Kernel {
    /// Build from a dense row-major weight matrix.
    pub fn from_rows<const W: usize>(rows: &[[f64; W]]) -> Self {
        let taps = rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, w)| **w != 0.0)
                    .map(move |(c, w)| (r, c, *w))
            })
            .collect();
        Self {
            width: W,
            height: rows.len(),
            taps,
        }
    }

    /// `size x size` kernel: -1 down the first column, +1 down the last.
    pub fn column_edges(size: usize) -> Self {
        let mut taps = Vec::with_capacity(size * 2);
        for r in 0..size {
            taps.push((r, 0, -1.0));
            taps.push((r, size - 1, 1.0));
        }
        Self {
            width: size,
            height: size,
            taps,
        }
    }

    /// `size x size` kernel: -1 along the first row, +1 along the last.
    pub fn row_edges(size: usize) -> Self {
        let mut taps = Vec::with_capacity(size * 2);
        for c in 0..size {
            taps.push((0, c, -1.0));
            taps.push((size - 1, c, 1.0));
        }
        Self {
            width: size,
            height: size,
            taps,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The kernel rotated by 180 degrees, turning correlation into convolution.
    fn flipped(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            taps: self
                .taps
                .iter()
                .map(|&(r, c, w)| (self.height - 1 - r, self.width - 1 - c, w))
                .collect(),
        }
    }
}

/// Correlate `plane` with `kernel`, anchored at the kernel centre, producing
/// an output the size of the input.
pub fn correlate_same(plane: &Plane, kernel: &Kernel, border: Border) -> Plane {
    let anchor_x = (kernel.width / 2) as isize;
    let anchor_y = (kernel.height / 2) as isize;
    let mut out = Vec::with_capacity(plane.data.len());
    for y in 0..plane.height as isize {
        for x in 0..plane.width as isize {
            let acc = kernel
                .taps
                .iter()
                .map(|&(r, c, w)| {
                    w * plane.get_folded(x + c as isize - anchor_x, y + r as isize - anchor_y, border)
                })
                .sum();
            out.push(acc);
        }
    }
    Plane {
        width: plane.width,
        height: plane.height,
        data: out,
    }
}

/// True 2-D convolution with `same`-sized output and the given border.
pub fn convolve_same(plane: &Plane, kernel: &Kernel, border: Border) -> Plane {
    correlate_same(plane, &kernel.flipped(), border)
}

/// True 2-D convolution restricted to positions where one operand lies
/// entirely inside the other.
///
/// When the kernel is at least as large as the plane on both axes the roles
/// swap, since convolution commutes. Returns `None` when neither operand
/// covers the other.
pub fn convolve_valid(plane: &Plane, kernel: &Kernel) -> Option<Plane> {
    if plane.width < kernel.width || plane.height < kernel.height {
        if plane.width <= kernel.width && plane.height <= kernel.height {
            return Some(convolve_valid_swapped(plane, kernel));
        }
        return None;
    }
    let flipped = kernel.flipped();
    let out_w = plane.width - kernel.width + 1;
    let out_h = plane.height - kernel.height + 1;
    let mut out = Vec::with_capacity(out_w * out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let acc = flipped
                .taps
                .iter()
                .map(|&(r, c, w)| w * plane.get(x + c, y + r))
                .sum();
            out.push(acc);
        }
    }
    Some(Plane {
        width: out_w,
        height: out_h,
        data: out,
    })
}

/// `convolve_valid` for a kernel covering the plane: the plane slides over
/// the kernel.
fn convolve_valid_swapped(plane: &Plane, kernel: &Kernel) -> Plane {
    let out_w = kernel.width - plane.width + 1;
    let out_h = kernel.height - plane.height + 1;
    let mut data = vec![0.0; out_w * out_h];
    for y in 0..out_h {
        for x in 0..out_w {
            let mut acc = 0.0;
            for &(r, c, w) in &kernel.taps {
                let (Some(py), Some(px)) = (
                    (y + plane.height - 1).checked_sub(r),
                    (x + plane.width - 1).checked_sub(c),
                ) else {
                    continue;
                };
                if py < plane.height && px < plane.width {
                    acc += w * plane.get(px, py);
                }
            }
            data[y * out_w + x] = acc;
        }
    }
    Plane {
        width: out_w,
        height: out_h,
        data,
    }
}

/// 4-neighbour Laplacian (`[0 1 0; 1 -4 1; 0 1 0]`) with mirrored borders.
pub fn laplacian(plane: &Plane) -> Plane {
    let kernel = Kernel::from_rows(&[[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]]);
    correlate_same(plane, &kernel, Border::Reflect101)
}

/// Horizontal 3x3 Sobel derivative (responds to vertical edges).
pub fn sobel_x(plane: &Plane) -> Plane {
    let kernel = Kernel::from_rows(&[[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]]);
    correlate_same(plane, &kernel, Border::Reflect101)
}

/// Vertical 3x3 Sobel derivative (responds to horizontal edges).
pub fn sobel_y(plane: &Plane) -> Plane {
    let kernel = Kernel::from_rows(&[[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]]);
    correlate_same(plane, &kernel, Border::Reflect101)
}

/// 8-neighbour sharpening ring: centre 8, every neighbour -1.
pub fn ring_kernel() -> Kernel {
    Kernel::from_rows(&[[-1.0, -1.0, -1.0], [-1.0, 8.0, -1.0], [-1.0, -1.0, -1.0]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(width: usize, height: usize, data: &[f64]) -> Plane {
        Plane::from_vec(width, height, data.to_vec()).unwrap()
    }

    #[test]
    fn reflect101_folds_without_repeating_edge() {
        assert_eq!(Border::Reflect101.fold(-1, 5), 1);
        assert_eq!(Border::Reflect101.fold(-2, 5), 2);
        assert_eq!(Border::Reflect101.fold(5, 5), 3);
        assert_eq!(Border::Reflect101.fold(6, 5), 2);
        assert_eq!(Border::Reflect101.fold(-3, 1), 0);
    }

    #[test]
    fn symmetric_folds_repeating_edge() {
        assert_eq!(Border::Symmetric.fold(-1, 5), 0);
        assert_eq!(Border::Symmetric.fold(-2, 5), 1);
        assert_eq!(Border::Symmetric.fold(5, 5), 4);
        assert_eq!(Border::Symmetric.fold(6, 5), 3);
        assert_eq!(Border::Symmetric.fold(-1, 1), 0);
    }

    #[test]
    fn laplacian_of_constant_is_zero() {
        let p = plane(4, 3, &[7.0; 12]);
        assert!(laplacian(&p).samples().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn laplacian_of_single_spike() {
        let mut data = vec![0.0; 25];
        data[12] = 1.0;
        let lap = laplacian(&plane(5, 5, &data));
        assert_eq!(lap.get(2, 2), -4.0);
        assert_eq!(lap.get(1, 2), 1.0);
        assert_eq!(lap.get(2, 1), 1.0);
        assert_eq!(lap.get(1, 1), 0.0);
    }

    #[test]
    fn sobel_x_on_horizontal_ramp() {
        // Each column one brighter than the last: d/dx = 1 everywhere inside.
        let data: Vec<f64> = (0..16).map(|i| (i % 4) as f64).collect();
        let gx = sobel_x(&plane(4, 4, &data));
        // 1 * (1 + 2 + 1) * (x+1 - (x-1)) = 8 in the interior.
        assert_eq!(gx.get(1, 1), 8.0);
        assert_eq!(gx.get(2, 2), 8.0);
        let gy = sobel_y(&plane(4, 4, &data));
        assert!(gy.samples().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn valid_convolution_shrinks_output() {
        let p = plane(10, 9, &[1.0; 90]);
        let out = convolve_valid(&p, &Kernel::column_edges(8)).unwrap();
        assert_eq!((out.width(), out.height()), (3, 2));
        assert!(out.samples().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn valid_convolution_needs_one_operand_to_cover_the_other() {
        let p = plane(4, 10, &[0.0; 40]);
        assert!(convolve_valid(&p, &Kernel::row_edges(8)).is_none());
    }

    #[test]
    fn oversized_kernel_swaps_operands() {
        let small = [[1.0, 2.0], [3.0, 4.0]];
        let big = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let big_plane = plane(3, 3, &big.concat());
        let small_plane = plane(2, 2, &small.concat());

        let direct = convolve_valid(&big_plane, &Kernel::from_rows(&small)).unwrap();
        let swapped = convolve_valid(&small_plane, &Kernel::from_rows(&big)).unwrap();
        assert_eq!((swapped.width(), swapped.height()), (2, 2));
        assert_eq!(swapped.samples(), direct.samples());
        // 1*4 + 2*3 + 4*2 + 5*1 at the top-left.
        assert_eq!(swapped.get(0, 0), 23.0);
    }

    #[test]
    fn column_edge_kernel_measures_left_minus_right() {
        // Convolution flips the kernel, so +1 lands on the leftmost column.
        let data: Vec<f64> = (0..9).map(|i| (i % 3) as f64 * 10.0).collect();
        let out = convolve_valid(&plane(3, 3, &data), &Kernel::column_edges(3)).unwrap();
        assert_eq!(out.get(0, 0), 3.0 * (0.0 - 20.0));
    }

    #[test]
    fn variance_and_fraction() {
        let p = plane(2, 2, &[0.0, 0.0, 10.0, 10.0]);
        assert_eq!(p.mean(), Some(5.0));
        assert_eq!(p.variance(), Some(25.0));
        assert_eq!(p.fraction(|v| v > 5.0), Some(0.5));
        assert_eq!(Plane::from_vec(0, 0, vec![]).unwrap().variance(), None);
    }
}
