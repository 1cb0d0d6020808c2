//! Real-space sampling grid, its reciprocal G vectors and the truncated basis.

use crate::lattice::Lattice;
use itertools::iproduct;
use nalgebra::Vector3;

/// Uniform real-space grid of `shape[0] x shape[1] x shape[2]` points covering one cell.
///
/// Points are stored with the first index running fastest:
/// `idx = m0 + s0 * (m1 + s1 * m2)`.
#[derive(Clone, Debug)]
pub struct FftGrid {
    shape: [usize; 3],
    points: Vec<Vector3<f64>>,
    miller: Vec<[i32; 3]>,
    gvectors: Vec<Vector3<f64>>,
    g2: Vec<f64>,
}

impl FftGrid {
    pub fn new(lattice: &Lattice, shape: [usize; 3]) -> Self {
        assert!(shape.iter().all(|&s| s > 0), "grid shape must be positive: {:?}", shape);
        let len = shape.iter().product();

        let mut points = Vec::with_capacity(len);
        let mut miller = Vec::with_capacity(len);
        let mut gvectors = Vec::with_capacity(len);
        let mut g2 = Vec::with_capacity(len);

        // iproduct! runs its last iterator fastest
        for (m2, m1, m0) in iproduct!(0..shape[2], 0..shape[1], 0..shape[0]) {
            let m = [m0, m1, m2];
            let frac = Vector3::from_fn(|k, _| m[k] as f64 / shape[k] as f64);
            points.push(lattice.to_cartesian(&frac));

            let n = [0, 1, 2].map(|k| wrap_frequency(m[k], shape[k]));
            let g = lattice.reciprocal_translation(n);
            miller.push(n);
            g2.push(g.norm_squared());
            gvectors.push(g);
        }

        FftGrid {
            shape,
            points,
            miller,
            gvectors,
            g2,
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Number of grid points N.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn linear_index(&self, m: [usize; 3]) -> usize {
        m[0] + self.shape[0] * (m[1] + self.shape[1] * m[2])
    }

    /// Cartesian sample points r.
    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    /// Integer frequencies of each grid index, wrapped to the symmetric range.
    pub fn miller(&self) -> &[[i32; 3]] {
        &self.miller
    }

    pub fn gvectors(&self) -> &[Vector3<f64>] {
        &self.gvectors
    }

    pub fn g2(&self) -> &[f64] {
        &self.g2
    }

    /// True when index `idx` sits on an unpaired Nyquist plane (`n_k == s_k / 2`
    /// for an even `s_k`), i.e. its -G partner is not representable on the grid.
    pub fn is_nyquist(&self, idx: usize) -> bool {
        let n = self.miller[idx];
        (0..3).any(|k| self.shape[k] % 2 == 0 && 2 * n[k] == self.shape[k] as i32)
    }
}

fn wrap_frequency(m: usize, s: usize) -> i32 {
    if 2 * m > s {
        m as i32 - s as i32
    } else {
        m as i32
    }
}

/// Plane waves kept in the orbital expansion: every grid G with `|G|^2 / 2 <= ecut`.
#[derive(Clone, Debug)]
pub struct BasisIndexSet {
    ecut: f64,
    indices: Vec<usize>,
    g2: Vec<f64>,
}

impl BasisIndexSet {
    pub fn new(grid: &FftGrid, ecut: f64) -> Self {
        let indices: Vec<usize> = grid
            .g2()
            .iter()
            .enumerate()
            .filter(|(_, &g2)| g2 <= 2.0 * ecut)
            .map(|(idx, _)| idx)
            .collect();
        let g2 = indices.iter().map(|&idx| grid.g2()[idx]).collect();
        BasisIndexSet { ecut, indices, g2 }
    }

    pub fn ecut(&self) -> f64 {
        self.ecut
    }

    /// Number of plane waves in the basis.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Full-grid index of each basis function, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn g2(&self) -> &[f64] {
        &self.g2
    }
}
