//! Statistics calculated from spectra.

use std::fmt;

pub mod d;
pub use d::D;

use super::Sfs;

/// Hudson's estimator of Fst, as a ratio of averages.
///
/// See Bhatia et al. (2013).
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Fst(pub f64);

impl Fst {
    /// Calculates Fst from a two-dimensional spectrum.
    pub fn from_sfs(sfs: &Sfs) -> Result<Self, DimensionError> {
        if sfs.dimensions() == 2 {
            Ok(Self::from_sfs_unchecked(sfs))
        } else {
            Err(DimensionError {
                expected: 2,
                actual: sfs.dimensions(),
            })
        }
    }

    fn from_sfs_unchecked(sfs: &Sfs) -> Self {
        // Only the polymorphic part of the spectrum contributes, so the first and last
        // elements are dropped
        let polymorphic_iter = sfs
            .array
            .iter()
            .zip(sfs.iter_frequencies())
            .take(sfs.elements() - 1)
            .skip(1);

        let shape = sfs.shape();
        let n_i_sub = (shape[0] - 2) as f64;
        let n_j_sub = (shape[1] - 2) as f64;

        let (num, denom) = polymorphic_iter
            .map(|(v, fs)| {
                let f_i = fs[0];
                let f_j = fs[1];
                let g_i = 1. - f_i;
                let g_j = 1. - f_j;

                let num = (f_i - f_j).powi(2) - f_i * g_i / n_i_sub - f_j * g_j / n_j_sub;
                let denom = f_i * g_j + f_j * g_i;
                (v * num, v * denom)
            })
            .fold((0., 0.), |(n_sum, d_sum), (n, d)| (n_sum + n, d_sum + d));

        Self(num / denom)
    }
}

/// An error associated with a spectrum of the wrong dimensionality for a statistic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DimensionError {
    pub(crate) expected: usize,
    pub(crate) actual: usize,
}

impl fmt::Display for DimensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let &DimensionError { expected, actual } = self;
        write!(
            f,
            "expected spectrum with dimension {expected}, found spectrum with dimension {actual}"
        )
    }
}

impl std::error::Error for DimensionError {}
