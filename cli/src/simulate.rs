use std::io;

use anyhow::Error;

use clap::Parser;

use popsim_core::{demography::SplitModel, SimulationParameters};

use crate::model::ModelArgs;

mod runner;
use runner::Runner;

/// Repeatedly simulate the split model and summarise each run.
///
/// Prints one delimited row per simulation with the number of trees and sites, diversity,
/// Tajima's D, and the polarised allele frequency spectrum as space-separated counts.
#[derive(Debug, Parser)]
pub struct Simulate {
    #[command(flatten)]
    model: ModelArgs,

    /// Mutation rate per base per generation.
    #[arg(short = 'm', long, default_value_t = 3.5e-9, value_name = "FLOAT")]
    mutation_rate: f64,

    /// Recombination rate per base per generation.
    #[arg(short = 'r', long, default_value_t = 8.4e-4, value_name = "FLOAT")]
    recombination_rate: f64,

    /// Number of individuals sampled from each derived population.
    #[arg(short = 's', long, default_value_t = 10, value_name = "INT")]
    sample_size: usize,

    /// Sequence length in bases.
    #[arg(short = 'l', long, default_value_t = 1000, value_name = "INT")]
    sequence_length: u64,

    /// Number of sampled genomes per individual.
    #[arg(long, default_value_t = 1, value_name = "INT")]
    ploidy: usize,

    /// Number of simulations.
    #[arg(short = 'n', long, default_value_t = 1, value_name = "INT")]
    num_simulations: usize,

    /// Base random seed.
    ///
    /// Simulation `i` is seeded from the base seed plus `i`.
    #[arg(long, default_value_t = 4710, value_name = "INT", conflicts_with = "random_seed")]
    seed: u64,

    /// Seed each simulation from entropy rather than the base seed.
    #[arg(long)]
    random_seed: bool,

    /// Delimiter between fields.
    #[arg(short = 'd', long, default_value_t = ',', value_name = "CHAR")]
    delimiter: char,

    /// Include a header with the names of fields.
    #[arg(short = 'H', long)]
    header: bool,

    /// Precision to use when printing diversity and Tajima's D.
    #[arg(short = 'p', long, default_value_t = 6, value_name = "INT")]
    precision: usize,
}

impl From<&Simulate> for SimulationParameters {
    fn from(args: &Simulate) -> Self {
        Self {
            mutation_rate: args.mutation_rate,
            sample_size: args.sample_size,
            sequence_length: args.sequence_length,
            recombination_rate: args.recombination_rate,
            num_simulations: args.num_simulations,
            seed: (!args.random_seed).then_some(args.seed),
            ploidy: args.ploidy,
            model: SplitModel::from(&args.model),
            keep_ancestry: false,
        }
    }
}

impl Simulate {
    pub fn run(self) -> Result<(), Error> {
        let parameters = SimulationParameters::from(&self);

        log::info!(
            "Running {} simulations of {} bases with {} samples per population",
            parameters.num_simulations,
            parameters.sequence_length,
            parameters.sample_size
        );

        let mut runner = Runner::new(
            io::stdout().lock(),
            parameters,
            self.header,
            self.delimiter,
            self.precision,
        );
        runner.run()
    }
}
