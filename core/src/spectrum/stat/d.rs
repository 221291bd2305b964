//! Tajima's D.

use crate::utils::{harmonic, p_harmonic};

/// Tajima's D statistic.
///
/// See Tajima (1989), Durrett (2008) pp. 65-66.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct D(pub f64);

impl D {
    /// Calculates Tajima's D for `n` samples from the average number of pairwise differences
    /// and the number of segregating sites.
    ///
    /// With no segregating sites, the statistic is undefined and NaN is returned.
    pub fn from_parts(n: usize, pi: f64, s: f64) -> Self {
        if s == 0.0 || n < 2 {
            return Self(f64::NAN);
        }

        let a1 = harmonic(n as u64);
        let a2 = p_harmonic(n as u64, 2);

        let b1 = (n + 1) as f64 / (3 * (n - 1)) as f64;
        let b2 = (2 * (n.pow(2) + n + 3)) as f64 / (9 * n * (n - 1)) as f64;

        let c1 = b1 - 1.0 / a1;
        let c2 = b2 - (n + 2) as f64 / (a1 * n as f64) + a2 / a1.powi(2);

        let e1 = c1 / a1;
        let e2 = c2 / (a1.powi(2) + a2);

        let var = (e1 * s + e2 * s * (s - 1.0)).sqrt();

        Self((pi - s / a1) / var)
    }
}
