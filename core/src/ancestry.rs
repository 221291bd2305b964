//! Coalescent simulation of ancestry.
//!
//! Simulates the genealogies of a sample under Hudson's coalescent with recombination, given a
//! [`Demography`]. The result is a [`TreeSequence`] without sites or mutations; see
//! [`crate::mutation`] for overlaying those.

use std::{error::Error, fmt};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    demography::{Demography, PopulationId},
    tree_sequence::{TableCollection, TableError, TreeSequence},
};

mod fenwick;
mod overlap;

mod simulator;
use simulator::Simulator;

/// A builder to configure and run an ancestry simulation.
#[derive(Clone, Debug)]
pub struct Builder<'a> {
    demography: &'a Demography,
    samples: Vec<(String, usize)>,
    sequence_length: u64,
    recombination_rate: f64,
    ploidy: usize,
    seed: Option<u64>,
}

impl<'a> Builder<'a> {
    /// Creates a new builder for a demography.
    ///
    /// By default, no samples are taken, the sequence length is one, there is no recombination,
    /// and genomes are haploid.
    pub fn new(demography: &'a Demography) -> Self {
        Self {
            demography,
            samples: Vec::new(),
            sequence_length: 1,
            recombination_rate: 0.0,
            ploidy: 1,
            seed: None,
        }
    }

    /// Sets the number of individuals to sample from each named population.
    pub fn set_samples<I, S>(mut self, samples: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: ToString,
    {
        self.samples = samples
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        self
    }

    /// Sets the sequence length.
    pub fn set_sequence_length(mut self, sequence_length: u64) -> Self {
        self.sequence_length = sequence_length;
        self
    }

    /// Sets the recombination rate per unit of sequence per generation.
    pub fn set_recombination_rate(mut self, recombination_rate: f64) -> Self {
        self.recombination_rate = recombination_rate;
        self
    }

    /// Sets the number of sample nodes per individual.
    pub fn set_ploidy(mut self, ploidy: usize) -> Self {
        self.ploidy = ploidy;
        self
    }

    /// Sets the random seed.
    ///
    /// If unset, the simulation is seeded from entropy.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn check(&self) -> Result<Vec<(PopulationId, usize)>, AncestryError> {
        if self.sequence_length == 0 {
            return Err(AncestryError::InvalidSequenceLength);
        }
        if !(self.recombination_rate.is_finite() && self.recombination_rate >= 0.0) {
            return Err(AncestryError::InvalidRecombinationRate(self.recombination_rate));
        }
        if self.ploidy == 0 {
            return Err(AncestryError::InvalidPloidy);
        }

        let samples = self
            .samples
            .iter()
            .map(|(name, count)| {
                let id = self
                    .demography
                    .population_id(name)
                    .ok_or_else(|| AncestryError::UnknownPopulation(name.clone()))?;

                if self.demography.is_extant(id) {
                    Ok((id, count * self.ploidy))
                } else {
                    Err(AncestryError::InactivePopulation(name.clone()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total = samples.iter().map(|(_, count)| count).sum::<usize>();
        if total < 2 {
            return Err(AncestryError::TooFewSamples(total));
        }

        Ok(samples)
    }

    /// Runs the simulation.
    pub fn simulate(self) -> Result<TreeSequence, AncestryError> {
        let samples = self.check()?;

        let rng = match self.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_seed(rand::rng().random()),
        };

        let mut tables = TableCollection::new(self.sequence_length)?;
        let mut sizes = Vec::with_capacity(self.demography.num_populations());
        for (_, population) in self.demography.populations() {
            tables.add_population(population.name())?;
            sizes.push(population.initial_size());
        }

        log::debug!(
            "Simulating ancestry of {} sample nodes over {} bases",
            samples.iter().map(|(_, count)| count).sum::<usize>(),
            self.sequence_length
        );

        let mut simulator = Simulator::new(
            tables,
            sizes,
            self.demography.events(),
            self.recombination_rate,
            self.ploidy,
            rng,
        );
        simulator.add_samples(&samples)?;

        let tables = simulator.run()?;
        Ok(tables.into_tree_sequence()?)
    }
}

/// An error associated with simulating ancestry.
#[derive(Debug)]
pub enum AncestryError {
    /// Sequence length is zero.
    InvalidSequenceLength,
    /// Recombination rate is negative or not finite.
    InvalidRecombinationRate(f64),
    /// Ploidy is zero.
    InvalidPloidy,
    /// Samples requested from a population not in the demography.
    UnknownPopulation(String),
    /// Samples requested from a population that does not exist at time zero.
    InactivePopulation(String),
    /// Fewer than two sample nodes.
    TooFewSamples(usize),
    /// Lineages remain, but no further event can occur.
    InfiniteWaitingTime {
        /// Time at which the simulation stalled.
        time: f64,
        /// Number of lineages remaining.
        lineages: usize,
    },
    /// The simulated tables are invalid.
    Tables(TableError),
}

impl fmt::Display for AncestryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AncestryError::InvalidSequenceLength => write!(f, "sequence length must be positive"),
            AncestryError::InvalidRecombinationRate(rate) => {
                write!(f, "invalid recombination rate {rate}")
            }
            AncestryError::InvalidPloidy => write!(f, "ploidy must be positive"),
            AncestryError::UnknownPopulation(name) => {
                write!(f, "cannot sample from unknown population '{name}'")
            }
            AncestryError::InactivePopulation(name) => write!(
                f,
                "cannot sample from population '{name}', which is not active at time zero"
            ),
            AncestryError::TooFewSamples(n) => {
                write!(f, "at least two sample nodes required, found {n}")
            }
            AncestryError::InfiniteWaitingTime { time, lineages } => write!(
                f,
                "infinite waiting time at time {time} with {lineages} lineages remaining"
            ),
            AncestryError::Tables(e) => write!(f, "{e}"),
        }
    }
}

impl Error for AncestryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AncestryError::Tables(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TableError> for AncestryError {
    fn from(e: TableError) -> Self {
        Self::Tables(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tskit::{prelude::StreamingIterator, TreeFlags};

    use crate::demography::SplitModel;

    fn split_demography() -> Demography {
        Demography::from_split(&SplitModel::default()).unwrap()
    }

    fn single_population(size: f64) -> Demography {
        let mut demography = Demography::new();
        demography.add_population("A", size).unwrap();
        demography
    }

    #[test]
    fn test_simulate_single_tree() {
        let demography = single_population(100.);
        let ts = Builder::new(&demography)
            .set_samples([("A", 6)])
            .set_sequence_length(100)
            .set_seed(1)
            .simulate()
            .unwrap();

        assert_eq!(ts.num_samples(), 6);
        assert_eq!(ts.num_trees(), 1);
        // A binary tree on n leaves has n - 1 internal nodes
        assert_eq!(ts.num_nodes(), 11);
        assert_eq!(ts.num_edges(), 10);
        assert_eq!(ts.num_sites(), 0);
    }

    #[test]
    fn test_simulate_all_samples_share_root() {
        let demography = single_population(50.);
        let ts = Builder::new(&demography)
            .set_samples([("A", 8)])
            .set_sequence_length(200)
            .set_recombination_rate(1e-3)
            .set_seed(7)
            .simulate()
            .unwrap();

        assert!(ts.num_trees() > 1);

        let mut trees = ts.as_tskit().tree_iterator(TreeFlags::default()).unwrap();
        let mut visited = 0;
        while let Some(tree) = trees.next() {
            let roots = ts
                .samples()
                .iter()
                .map(|&u| tree.parents(u).last().unwrap())
                .collect::<Vec<_>>();
            assert!(roots.windows(2).all(|w| w[0] == w[1]));
            visited += 1;
        }
        assert_eq!(visited, ts.num_trees());
    }

    #[test]
    fn test_simulate_deterministic() {
        let demography = split_demography();
        let simulate = || {
            Builder::new(&demography)
                .set_samples([("N1", 5), ("N2", 5)])
                .set_sequence_length(1000)
                .set_recombination_rate(1e-8)
                .set_seed(4710)
                .simulate()
                .unwrap()
        };

        assert_eq!(simulate(), simulate());
    }

    #[test]
    fn test_simulate_split_populations() {
        let demography = split_demography();
        let ts = Builder::new(&demography)
            .set_samples([("N1", 3), ("N2", 2)])
            .set_sequence_length(10)
            .set_ploidy(2)
            .set_seed(3)
            .simulate()
            .unwrap();

        let n1 = ts.population_id("N1").unwrap();
        let n2 = ts.population_id("N2").unwrap();
        assert_eq!(ts.num_samples(), 10);
        assert_eq!(ts.samples_in(n1).len(), 6);
        assert_eq!(ts.samples_in(n2).len(), 4);
        assert_eq!(ts.num_populations(), 3);

        // Lineages from both populations can only meet in the ancestor, before the split
        let root = ts.nodes().iter().map(|node| node.time).fold(0., f64::max);
        assert!(root > SplitModel::default().time);
    }

    fn root_time(ts: &TreeSequence) -> f64 {
        ts.nodes().iter().map(|node| node.time).fold(0., f64::max)
    }

    #[test]
    fn test_simulate_bottleneck() {
        // A population of 1000 that was only 10 strong before time 100. For two haploid
        // samples, E[T] = 1000 (1 - exp(-0.1)) + 10 exp(-0.1), roughly 104.2
        let mut demography = single_population(1_000.);
        demography
            .add_population_parameters_change(100., "A", 10.)
            .unwrap();

        let replicates = 500;
        let times = (0..replicates)
            .map(|seed| {
                let ts = Builder::new(&demography)
                    .set_samples([("A", 2)])
                    .set_seed(seed)
                    .simulate()
                    .unwrap();
                root_time(&ts)
            })
            .collect::<Vec<_>>();

        let mean = times.iter().sum::<f64>() / replicates as f64;
        let expected = 1_000. * (1. - (-0.1f64).exp()) + 10. * (-0.1f64).exp();
        assert!((mean - expected).abs() < 5., "mean {mean}, expected {expected}");

        // Lineages that reach the bottleneck coalesce soon after
        let older = times.iter().filter(|&&t| t > 100.).count() as f64 / replicates as f64;
        assert!((older - (-0.1f64).exp()).abs() < 0.05, "{older}");
        assert!(times.iter().all(|&t| t < 300.));
    }

    #[test]
    fn test_simulate_without_bottleneck_is_slower() {
        let demography = single_population(1_000.);

        let mean = (0..200)
            .map(|seed| {
                let ts = Builder::new(&demography)
                    .set_samples([("A", 2)])
                    .set_seed(seed)
                    .simulate()
                    .unwrap();
                root_time(&ts)
            })
            .sum::<f64>()
            / 200.;

        assert!(mean > 500., "{mean}");
    }

    #[test]
    fn test_simulate_errors() {
        let demography = split_demography();
        let builder = || Builder::new(&demography).set_sequence_length(10).set_seed(1);

        assert!(matches!(
            builder().set_samples([("N1", 0), ("N2", 0)]).simulate(),
            Err(AncestryError::TooFewSamples(0))
        ));
        assert!(matches!(
            builder().set_samples([("AFR", 2)]).simulate(),
            Err(AncestryError::UnknownPopulation(name)) if name == "AFR"
        ));
        assert!(matches!(
            builder().set_samples([("ANC", 2)]).simulate(),
            Err(AncestryError::InactivePopulation(name)) if name == "ANC"
        ));
        assert!(matches!(
            builder()
                .set_samples([("N1", 2)])
                .set_sequence_length(0)
                .simulate(),
            Err(AncestryError::InvalidSequenceLength)
        ));
        assert!(matches!(
            builder()
                .set_samples([("N1", 2)])
                .set_recombination_rate(-1.)
                .simulate(),
            Err(AncestryError::InvalidRecombinationRate(rate)) if rate == -1.
        ));
        assert!(matches!(
            builder().set_samples([("N1", 2)]).set_ploidy(0).simulate(),
            Err(AncestryError::InvalidPloidy)
        ));
    }

    #[test]
    fn test_simulate_infinite_waiting_time() {
        let mut demography = Demography::new();
        demography.add_population("A", 100.).unwrap();
        demography.add_population("B", 100.).unwrap();

        let result = Builder::new(&demography)
            .set_samples([("A", 1), ("B", 1)])
            .set_sequence_length(10)
            .set_seed(1)
            .simulate();

        assert!(matches!(
            result,
            Err(AncestryError::InfiniteWaitingTime { lineages: 2, .. })
        ));
    }
}
