//! Site-based summary statistics on tree sequences.
//!
//! All statistics are computed from the variants at each site, over all samples unless sample
//! sets are given.

use std::{error::Error, fmt};

use crate::{
    spectrum::stat::{DimensionError, D},
    tree_sequence::{NodeId, TreeSequence},
    Scs,
};

impl TreeSequence {
    /// Returns the mean number of pairwise differences per unit of sequence.
    pub fn diversity(&self) -> f64 {
        self.pairwise_differences() / self.sequence_length() as f64
    }

    fn pairwise_differences(&self) -> f64 {
        let n = self.num_samples() as f64;
        if n < 2.0 {
            return 0.0;
        }

        self.variants()
            .map(|variant| {
                let homozygous = variant
                    .allele_counts()
                    .into_iter()
                    .map(|c| (c * c) as f64)
                    .sum::<f64>();
                (n * n - homozygous) / (n * (n - 1.0))
            })
            .sum()
    }

    /// Returns the number of segregating sites.
    ///
    /// A site with `k` alleles present in the samples counts as `k - 1` segregating sites.
    pub fn segregating_sites(&self) -> f64 {
        self.variants()
            .map(|variant| {
                let present = variant.allele_counts().iter().filter(|&&c| c > 0).count();
                present.saturating_sub(1) as f64
            })
            .sum()
    }

    /// Returns Tajima's D over all samples.
    ///
    /// NaN if there are no segregating sites.
    pub fn tajimas_d(&self) -> f64 {
        D::from_parts(
            self.num_samples(),
            self.pairwise_differences(),
            self.segregating_sites(),
        )
        .0
    }

    /// Returns the allele frequency spectrum over all samples.
    ///
    /// The spectrum has one element per possible number of carriers, zero through the number of
    /// samples. If polarised, each non-ancestral allele at each site adds one to the element
    /// matching the number of samples carrying it; otherwise, the spectrum is folded.
    pub fn allele_frequency_spectrum(&self, polarised: bool) -> Scs {
        let n = self.num_samples();
        let mut scs = Scs::from_zeros(n + 1);

        for variant in self.variants() {
            for &count in variant.allele_counts().iter().skip(1) {
                scs[[count]] += 1.0;
            }
        }

        if polarised {
            scs
        } else {
            // One-dimensional by construction
            scs.fold().unwrap_or(scs)
        }
    }

    /// Returns the polarised joint allele frequency spectrum of two sample sets.
    pub fn joint_allele_frequency_spectrum(
        &self,
        first: &[NodeId],
        second: &[NodeId],
    ) -> Result<Scs, StatisticError> {
        let first = self.sample_indices(first)?;
        let second = self.sample_indices(second)?;

        let mut scs = Scs::from_zeros([first.len() + 1, second.len() + 1]);
        for variant in self.variants() {
            let first_counts = variant.allele_counts_in(&first);
            let second_counts = variant.allele_counts_in(&second);

            for (&i, &j) in first_counts.iter().zip(second_counts.iter()).skip(1) {
                scs[[i, j]] += 1.0;
            }
        }

        Ok(scs)
    }

    /// Returns Hudson's Fst between the samples of two populations, given by name.
    pub fn fst(&self, first: &str, second: &str) -> Result<f64, StatisticError> {
        let first = self.population_samples(first)?;
        let second = self.population_samples(second)?;

        let scs = self.joint_allele_frequency_spectrum(&first, &second)?;
        Ok(scs.fst()?)
    }

    fn population_samples(&self, name: &str) -> Result<Vec<NodeId>, StatisticError> {
        let id = self
            .population_id(name)
            .ok_or_else(|| StatisticError::UnknownPopulation(name.to_string()))?;
        let samples = self.samples_in(id);

        if samples.len() < 2 {
            Err(StatisticError::TooFewSamples {
                population: name.to_string(),
                samples: samples.len(),
            })
        } else {
            Ok(samples)
        }
    }

    fn sample_indices(&self, nodes: &[NodeId]) -> Result<Vec<usize>, StatisticError> {
        nodes
            .iter()
            .map(|&u| {
                self.samples()
                    .iter()
                    .position(|&v| v == u)
                    .ok_or(StatisticError::NotASample(u))
            })
            .collect()
    }
}

/// An error associated with calculating a statistic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StatisticError {
    /// No population with this name exists in the tree sequence.
    UnknownPopulation(String),
    /// Too few samples in a population for the statistic.
    TooFewSamples {
        /// Population name.
        population: String,
        /// Number of samples found.
        samples: usize,
    },
    /// A node in a sample set is not a sample.
    NotASample(NodeId),
    /// Spectrum of the wrong dimension.
    Dimension(DimensionError),
}

impl fmt::Display for StatisticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatisticError::UnknownPopulation(name) => write!(f, "unknown population '{name}'"),
            StatisticError::TooFewSamples {
                population,
                samples,
            } => write!(
                f,
                "population '{population}' has {samples} samples, at least two required"
            ),
            StatisticError::NotASample(u) => write!(f, "node {u} is not a sample"),
            StatisticError::Dimension(e) => write!(f, "{e}"),
        }
    }
}

impl Error for StatisticError {}

impl From<DimensionError> for StatisticError {
    fn from(e: DimensionError) -> Self {
        Self::Dimension(e)
    }
}
