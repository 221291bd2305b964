//! Illustrative parameter distributions.
//!
//! Uniform priors over population sizes, summarised as text histograms. These are for exploring
//! plausible parameter ranges and do not feed into [`crate::simulate`].

use std::{error::Error, fmt};

use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// A uniform distribution over a parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Prior {
    /// Name of the parameter.
    pub name: String,
    /// Inclusive lower bound.
    pub low: f64,
    /// Exclusive upper bound.
    pub high: f64,
    /// Number of draws.
    pub draws: usize,
}

impl Prior {
    /// Creates a prior with one draw per unit of its range.
    pub fn new(name: &str, low: f64, high: f64) -> Self {
        Self {
            name: name.to_string(),
            low,
            high,
            draws: (high - low).max(0.0) as usize,
        }
    }

    /// Draws samples from the prior.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Result<Vec<f64>, PriorError> {
        let uniform = Uniform::new(self.low, self.high).map_err(|_| PriorError::InvalidRange {
            low: self.low,
            high: self.high,
        })?;

        Ok(uniform.sample_iter(rng).take(self.draws).collect())
    }
}

/// Named values drawn from a prior.
#[derive(Clone, Debug, PartialEq)]
pub struct Draws {
    /// Name of the parameter.
    pub name: String,
    /// The drawn values.
    pub values: Vec<f64>,
}

/// Draws the population size priors of the split model.
///
/// Returns, in order, the size of `N1` (uniform on `[50 000, 200 000)`), the size of `N2` as the
/// same draws divided by 30, and an alternative direct prior on the size of `N2` (uniform on
/// `[1 666, 6 666)`).
pub fn draw_size_priors<R: Rng>(rng: &mut R) -> Result<Vec<Draws>, PriorError> {
    let n1 = Prior::new("N1", 50_000., 200_000.).sample(rng)?;
    let n2 = n1.iter().map(|&size| size / 30.).collect();

    let alternative = Prior::new("N2 (alternative)", 1_666., 6_666.);
    let alternative_values = alternative.sample(rng)?;

    Ok(vec![
        Draws {
            name: String::from("N1"),
            values: n1,
        },
        Draws {
            name: String::from("N2 = N1/30"),
            values: n2,
        },
        Draws {
            name: alternative.name,
            values: alternative_values,
        },
    ])
}

/// A histogram of values over equal-width bins.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    min: f64,
    max: f64,
    counts: Vec<usize>,
}

impl Histogram {
    /// Bins values into a histogram spanning their range.
    pub fn new(values: &[f64], bins: usize) -> Result<Self, PriorError> {
        if values.is_empty() || bins == 0 {
            return Err(PriorError::EmptyHistogram);
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = (max - min) / bins as f64;

        let mut counts = vec![0; bins];
        for &value in values {
            let bin = if width > 0.0 {
                (((value - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }

        Ok(Self { min, max, counts })
    }

    /// Returns the count in each bin.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Returns the edges of each bin.
    pub fn edges(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let width = (self.max - self.min) / self.counts.len() as f64;
        (0..self.counts.len()).map(move |i| {
            let lo = self.min + i as f64 * width;
            (lo, lo + width)
        })
    }
}

const BAR_WIDTH: usize = 40;

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let highest = self.counts.iter().copied().max().unwrap_or(0).max(1);

        for ((lo, hi), &count) in self.edges().zip(self.counts.iter()) {
            let bar = "#".repeat(count * BAR_WIDTH / highest);
            writeln!(f, "{lo:>12.1} {hi:>12.1} {count:>8} {bar}")?;
        }

        Ok(())
    }
}

/// An error associated with drawing from priors.
#[derive(Clone, Debug, PartialEq)]
pub enum PriorError {
    /// The bounds of a prior do not form a non-empty range.
    InvalidRange {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
    /// No values or no bins in a histogram.
    EmptyHistogram,
}

impl fmt::Display for PriorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorError::InvalidRange { low, high } => {
                write!(f, "invalid uniform range [{low}, {high})")
            }
            PriorError::EmptyHistogram => write!(f, "histogram requires values and bins"),
        }
    }
}

impl Error for PriorError {}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_draw_size_priors() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1234);
        let draws = draw_size_priors(&mut rng).unwrap();

        let names = draws.iter().map(|d| d.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["N1", "N2 = N1/30", "N2 (alternative)"]);

        let counts = draws.iter().map(|d| d.values.len()).collect::<Vec<_>>();
        assert_eq!(counts, vec![150_000, 150_000, 5_000]);

        assert!(draws[0].values.iter().all(|v| (50_000.0..200_000.0).contains(v)));
        assert!(draws[2].values.iter().all(|v| (1_666.0..6_666.0).contains(v)));
    }

    #[test]
    fn test_n2_scales_the_n1_draws() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let draws = draw_size_priors(&mut rng).unwrap();

        for (n1, n2) in draws[0].values.iter().zip(draws[1].values.iter()) {
            assert_approx_eq!(*n2, n1 / 30.);
        }
    }

    #[test]
    fn test_sample_within_bounds() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let prior = Prior::new("N2 (alternative)", 1_666., 6_666.);
        let values = prior.sample(&mut rng).unwrap();

        assert_eq!(values.len(), 5_000);
        assert!(values.iter().all(|&v| (1_666.0..6_666.0).contains(&v)));
    }

    #[test]
    fn test_sample_invalid_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let prior = Prior::new("bad", 5., 1.);

        assert_eq!(
            prior.sample(&mut rng),
            Err(PriorError::InvalidRange { low: 5., high: 1. })
        );
    }

    #[test]
    fn test_histogram() {
        let histogram = Histogram::new(&[0., 1., 1.5, 2., 4.], 4).unwrap();

        assert_eq!(histogram.counts(), &[1, 2, 1, 1]);
        assert_eq!(
            histogram.edges().collect::<Vec<_>>(),
            vec![(0., 1.), (1., 2.), (2., 3.), (3., 4.)]
        );
    }

    #[test]
    fn test_histogram_constant() {
        let histogram = Histogram::new(&[3., 3., 3.], 5).unwrap();

        assert_eq!(histogram.counts(), &[3, 0, 0, 0, 0]);
    }

    #[test]
    fn test_histogram_empty() {
        assert_eq!(Histogram::new(&[], 5), Err(PriorError::EmptyHistogram));
    }

    #[test]
    fn test_display_histogram() {
        let histogram = Histogram::new(&[0., 1., 1.5, 2., 4.], 4).unwrap();
        let text = histogram.to_string();
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with(&"#".repeat(40)));
        assert!(lines[0].ends_with(&format!("1 {}", "#".repeat(20))));
    }
}
