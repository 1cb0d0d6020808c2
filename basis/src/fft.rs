//! Three-dimensional complex FFT assembled from rustfft one-dimensional plans.

use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Unnormalized 3D transforms on data laid out with the first axis fastest.
///
/// `forward` applies `exp(-2 pi i m.n / s)`, `inverse` applies `exp(+2 pi i m.n / s)`;
/// neither divides by the number of points.
pub struct Fft3d {
    shape: [usize; 3],
    forward: [Arc<dyn Fft<f64>>; 3],
    inverse: [Arc<dyn Fft<f64>>; 3],
    line_starts: [Vec<usize>; 3],
}

impl Fft3d {
    pub fn new(shape: [usize; 3]) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let forward = shape.map(|n| planner.plan_fft_forward(n));
        let inverse = shape.map(|n| planner.plan_fft_inverse(n));
        let line_starts = [0, 1, 2].map(|axis| line_starts(shape, axis));
        Fft3d {
            shape,
            forward,
            inverse,
            line_starts,
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn forward(&self, data: &mut [Complex64]) {
        self.transform(data, &self.forward);
    }

    pub fn inverse(&self, data: &mut [Complex64]) {
        self.transform(data, &self.inverse);
    }

    fn transform(&self, data: &mut [Complex64], plans: &[Arc<dyn Fft<f64>>; 3]) {
        assert_eq!(
            data.len(),
            self.len(),
            "FFT buffer has {} points, grid has {}",
            data.len(),
            self.len()
        );

        // axis 0 is contiguous
        data.par_chunks_mut(self.shape[0])
            .for_each(|line| plans[0].process(line));

        for axis in 1..3 {
            let n = self.shape[axis];
            let stride = self.stride(axis);
            let starts = &self.line_starts[axis];

            let mut lines = vec![Complex64::default(); data.len()];
            {
                let src: &[Complex64] = data;
                lines
                    .par_chunks_mut(n)
                    .zip(starts.par_iter())
                    .for_each(|(line, &start)| {
                        for (k, value) in line.iter_mut().enumerate() {
                            *value = src[start + k * stride];
                        }
                        plans[axis].process(line);
                    });
            }
            for (line, &start) in lines.chunks(n).zip(starts.iter()) {
                for (k, value) in line.iter().enumerate() {
                    data[start + k * stride] = *value;
                }
            }
        }
    }

    fn stride(&self, axis: usize) -> usize {
        self.shape[..axis].iter().product()
    }
}

/// First index of every line running along `axis`.
fn line_starts(shape: [usize; 3], axis: usize) -> Vec<usize> {
    let len: usize = shape.iter().product();
    let stride: usize = shape[..axis].iter().product();
    (0..len)
        .filter(|idx| (idx / stride) % shape[axis] == 0)
        .collect()
}
