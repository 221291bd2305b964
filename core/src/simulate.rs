//! Repeated simulation of a split model.
//!
//! Each iteration builds the demography, simulates ancestry and mutations with seeds drawn from
//! an iteration-local generator, and summarises the result.

use std::{error::Error, fmt};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    ancestry::{self, AncestryError},
    demography::{Demography, DemographyError, SplitModel},
    mutation::{sim_mutations, MutationError},
    tree_sequence::TreeSequence,
    Scs,
};

/// Seeds passed on to the simulators are drawn from `[0, MAX_SEED)`.
pub const MAX_SEED: u64 = 99_999_999;

/// Parameters of a repeated simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParameters {
    /// Mutation rate per unit of sequence per generation.
    pub mutation_rate: f64,
    /// Number of individuals sampled from each derived population.
    pub sample_size: usize,
    /// Sequence length.
    pub sequence_length: u64,
    /// Recombination rate per unit of sequence per generation.
    pub recombination_rate: f64,
    /// Number of simulations.
    pub num_simulations: usize,
    /// Base seed; iteration `i` is seeded with `seed + i`. Seeded from entropy if `None`.
    pub seed: Option<u64>,
    /// Number of sample nodes per individual.
    pub ploidy: usize,
    /// Demographic model.
    pub model: SplitModel,
    /// Whether to keep the ancestry before mutation in each result.
    pub keep_ancestry: bool,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            mutation_rate: 3.5e-9,
            sample_size: 10,
            sequence_length: 1000,
            recombination_rate: 8.4e-4,
            num_simulations: 1,
            seed: Some(4710),
            ploidy: 1,
            model: SplitModel::default(),
            keep_ancestry: false,
        }
    }
}

/// The outcome of a single simulation.
#[derive(Debug)]
pub struct SimulationResult {
    /// The mutated tree sequence.
    pub tree_sequence: TreeSequence,
    /// The tree sequence before mutation, if requested.
    pub ancestry: Option<TreeSequence>,
    /// Diversity per unit of sequence.
    pub diversity: f64,
    /// Tajima's D, NaN without segregating sites.
    pub tajimas_d: f64,
    /// Polarised allele frequency spectrum.
    pub allele_frequency_spectrum: Scs,
}

/// An iterator over simulation results.
///
/// Yields exactly `num_simulations` results in iteration order, or stops after the first error.
#[derive(Debug)]
pub struct Runner<'a> {
    parameters: &'a SimulationParameters,
    index: usize,
    failed: bool,
}

impl<'a> Runner<'a> {
    /// Creates a new runner.
    pub fn new(parameters: &'a SimulationParameters) -> Self {
        Self {
            parameters,
            index: 0,
            failed: false,
        }
    }

    fn run_one(&self, index: usize) -> Result<SimulationResult, SimulationError> {
        let parameters = self.parameters;

        let mut rng = match parameters.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(index as u64)),
            None => Xoshiro256PlusPlus::from_seed(rand::rng().random()),
        };

        let demography = Demography::from_split(&parameters.model)?;
        let samples = parameters
            .model
            .derived_names()
            .into_iter()
            .map(|name| (name, parameters.sample_size));

        let ancestry_seed = rng.random_range(0..MAX_SEED);
        let ancestry = ancestry::Builder::new(&demography)
            .set_samples(samples)
            .set_sequence_length(parameters.sequence_length)
            .set_recombination_rate(parameters.recombination_rate)
            .set_ploidy(parameters.ploidy)
            .set_seed(ancestry_seed)
            .simulate()?;

        let mutation_seed = rng.random_range(0..MAX_SEED);
        let tree_sequence = sim_mutations(&ancestry, parameters.mutation_rate, Some(mutation_seed))?;

        let diversity = tree_sequence.diversity();
        let tajimas_d = tree_sequence.tajimas_d();
        let allele_frequency_spectrum = tree_sequence.allele_frequency_spectrum(true);

        log::debug!(
            "Simulation {index}: {} trees, {} sites, diversity {diversity:.3e}, Tajima's D {tajimas_d:.4}",
            tree_sequence.num_trees(),
            tree_sequence.num_sites(),
        );

        Ok(SimulationResult {
            tree_sequence,
            ancestry: parameters.keep_ancestry.then_some(ancestry),
            diversity,
            tajimas_d,
            allele_frequency_spectrum,
        })
    }
}

impl<'a> Iterator for Runner<'a> {
    type Item = Result<SimulationResult, SimulationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.parameters.num_simulations {
            return None;
        }

        let result = self.run_one(self.index);
        self.index += 1;
        self.failed = result.is_err();

        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.parameters.num_simulations.saturating_sub(self.index);
        (0, Some(remaining))
    }
}

/// Runs all simulations, collecting their results.
///
/// The first error aborts the run.
pub fn repeat_simulations(
    parameters: &SimulationParameters,
) -> Result<Vec<SimulationResult>, SimulationError> {
    Runner::new(parameters).collect()
}

/// An error associated with running a simulation.
#[derive(Debug)]
pub enum SimulationError {
    /// Invalid demographic model.
    Demography(DemographyError),
    /// Ancestry simulation failed.
    Ancestry(AncestryError),
    /// Mutation simulation failed.
    Mutation(MutationError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Demography(e) => write!(f, "invalid demography: {e}"),
            SimulationError::Ancestry(e) => write!(f, "ancestry simulation failed: {e}"),
            SimulationError::Mutation(e) => write!(f, "mutation simulation failed: {e}"),
        }
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimulationError::Demography(e) => Some(e),
            SimulationError::Ancestry(e) => Some(e),
            SimulationError::Mutation(e) => Some(e),
        }
    }
}

impl From<DemographyError> for SimulationError {
    fn from(e: DemographyError) -> Self {
        Self::Demography(e)
    }
}

impl From<AncestryError> for SimulationError {
    fn from(e: AncestryError) -> Self {
        Self::Ancestry(e)
    }
}

impl From<MutationError> for SimulationError {
    fn from(e: MutationError) -> Self {
        Self::Mutation(e)
    }
}
