//! Small numeric helpers used by Tajima's D.

/// Returns the sum of the first n - 1 terms of the harmonic series
pub fn harmonic(n: u64) -> f64 {
    p_harmonic(n, 1)
}

/// Returns the sum of the first n - 1 terms of the p-harmonic series
pub fn p_harmonic(n: u64, p: u32) -> f64 {
    (1..n).map(|i| 1.0 / (i as f64).powi(p as i32)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harmonic() {
        assert_approx_eq!(harmonic(1), 0.0);
        assert_approx_eq!(harmonic(2), 1.0);
        assert_approx_eq!(harmonic(7), 2.45);
    }

    #[test]
    fn test_p_harmonic() {
        assert_approx_eq!(p_harmonic(4, 2), 1.0 + 0.25 + 1.0 / 9.0);
    }
}
