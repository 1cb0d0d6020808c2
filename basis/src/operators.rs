//! Linear operators of the plane-wave formalism.
//!
//! Every operator acts column by column on a complex matrix whose rows are either
//! the truncated basis (`n_basis` rows) or the full FFT grid (`n_grid` rows):
//!
//! | op     | maps                              | definition                      |
//! |--------|-----------------------------------|---------------------------------|
//! | `O`    | any -> same                       | `Omega * W`                     |
//! | `L`    | any -> same                       | `-Omega * \|G\|^2 * W`          |
//! | `Linv` | reciprocal grid -> same           | inverse of `L`, G = 0 dropped   |
//! | `I`    | basis or reciprocal grid -> real  | `sum_G W_G exp(iG.r)`           |
//! | `Idag` | real grid -> basis                | adjoint of `I`                  |
//! | `J`    | real grid -> reciprocal grid      | `I^-1 = FFT / N`                |
//! | `Jdag` | reciprocal grid -> real grid      | adjoint of `J`                  |
//!
//! Passing a matrix with any other row count is a programming error and panics.

use crate::fft::Fft3d;
use crate::grid::{BasisIndexSet, FftGrid};
use crate::lattice::Lattice;
use nalgebra::DMatrix;
use num_complex::Complex64;

pub type CMatrix = DMatrix<Complex64>;

pub struct PlaneWaveOperators {
    lattice: Lattice,
    grid: FftGrid,
    basis: BasisIndexSet,
    fft: Fft3d,
}

impl PlaneWaveOperators {
    pub fn new(lattice: &Lattice, shape: [usize; 3], ecut: f64) -> Self {
        let grid = FftGrid::new(lattice, shape);
        let basis = BasisIndexSet::new(&grid, ecut);
        PlaneWaveOperators {
            lattice: lattice.clone(),
            grid,
            basis,
            fft: Fft3d::new(shape),
        }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn grid(&self) -> &FftGrid {
        &self.grid
    }

    pub fn basis(&self) -> &BasisIndexSet {
        &self.basis
    }

    /// Cell volume Omega.
    pub fn omega(&self) -> f64 {
        self.lattice.volume()
    }

    pub fn n_grid(&self) -> usize {
        self.grid.len()
    }

    pub fn n_basis(&self) -> usize {
        self.basis.len()
    }

    /// Overlap operator `O`.
    pub fn o(&self, w: &CMatrix) -> CMatrix {
        w * Complex64::new(self.omega(), 0.0)
    }

    /// Laplacian `L`, diagonal in reciprocal space.
    pub fn l(&self, w: &CMatrix) -> CMatrix {
        let g2 = self.g2_for_rows(w.nrows());
        let omega = self.omega();
        CMatrix::from_fn(w.nrows(), w.ncols(), |i, j| w[(i, j)] * (-omega * g2[i]))
    }

    /// Inverse Laplacian on the full reciprocal grid; the G = 0 row is zeroed.
    pub fn l_inv(&self, w: &CMatrix) -> CMatrix {
        self.assert_grid_rows(w, "Linv");
        let g2 = self.grid.g2();
        let omega = self.omega();
        CMatrix::from_fn(w.nrows(), w.ncols(), |i, j| {
            if g2[i] == 0.0 {
                Complex64::default()
            } else {
                w[(i, j)] / (-omega * g2[i])
            }
        })
    }

    /// Expansion of reciprocal coefficients onto real-space grid values.
    pub fn i(&self, w: &CMatrix) -> CMatrix {
        let mut out = if w.nrows() == self.n_basis() && w.nrows() != self.n_grid() {
            self.scatter_basis(w)
        } else {
            self.assert_grid_rows(w, "I");
            w.clone()
        };
        self.for_each_column(&mut out, |fft, column| fft.inverse(column));
        out
    }

    /// Adjoint of `I`: real-space values projected onto the basis coefficients.
    pub fn i_dag(&self, x: &CMatrix) -> CMatrix {
        self.assert_grid_rows(x, "Idag");
        let mut full = x.clone();
        self.for_each_column(&mut full, |fft, column| fft.forward(column));
        self.gather_basis(&full)
    }

    /// Real-space grid values to reciprocal-grid coefficients.
    pub fn j(&self, x: &CMatrix) -> CMatrix {
        self.assert_grid_rows(x, "J");
        let mut out = x.clone();
        self.for_each_column(&mut out, |fft, column| fft.forward(column));
        out / Complex64::new(self.n_grid() as f64, 0.0)
    }

    /// Adjoint of `J`: reciprocal-grid coefficients to real-space grid values.
    pub fn j_dag(&self, w: &CMatrix) -> CMatrix {
        self.assert_grid_rows(w, "Jdag");
        let mut out = w.clone();
        self.for_each_column(&mut out, |fft, column| fft.inverse(column));
        out / Complex64::new(self.n_grid() as f64, 0.0)
    }

    /// Embed basis-shaped coefficients into a zero-padded reciprocal grid.
    pub fn scatter_basis(&self, w: &CMatrix) -> CMatrix {
        assert_eq!(
            w.nrows(),
            self.n_basis(),
            "expected {} basis rows, got {}",
            self.n_basis(),
            w.nrows()
        );
        let mut full = CMatrix::zeros(self.n_grid(), w.ncols());
        for (row, &idx) in self.basis.indices().iter().enumerate() {
            for col in 0..w.ncols() {
                full[(idx, col)] = w[(row, col)];
            }
        }
        full
    }

    /// Keep only the rows of a reciprocal-grid matrix that belong to the basis.
    pub fn gather_basis(&self, full: &CMatrix) -> CMatrix {
        self.assert_grid_rows(full, "gather");
        let indices = self.basis.indices();
        CMatrix::from_fn(indices.len(), full.ncols(), |row, col| full[(indices[row], col)])
    }

    fn g2_for_rows(&self, rows: usize) -> &[f64] {
        if rows == self.n_basis() {
            self.basis.g2()
        } else if rows == self.n_grid() {
            self.grid.g2()
        } else {
            panic!(
                "operand has {} rows; expected {} (basis) or {} (grid)",
                rows,
                self.n_basis(),
                self.n_grid()
            )
        }
    }

    fn assert_grid_rows(&self, m: &CMatrix, op: &str) {
        assert_eq!(
            m.nrows(),
            self.n_grid(),
            "{} expects {} grid rows, got {}",
            op,
            self.n_grid(),
            m.nrows()
        );
    }

    fn for_each_column<F>(&self, m: &mut CMatrix, f: F)
    where
        F: Fn(&Fft3d, &mut [Complex64]),
    {
        let rows = m.nrows();
        if rows == 0 {
            return;
        }
        // column-major storage: each column is one contiguous chunk
        for column in m.as_mut_slice().chunks_mut(rows) {
            f(&self.fft, column);
        }
    }
}

/// Lift a real field into a single-column complex matrix.
pub fn complex_column(values: &[f64]) -> CMatrix {
    CMatrix::from_iterator(values.len(), 1, values.iter().map(|&v| Complex64::new(v, 0.0)))
}
