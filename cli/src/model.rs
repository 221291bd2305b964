use clap::Args;

use popsim_core::demography::{PopulationConfig, SplitModel};

/// Options for the split model shared by subcommands.
#[derive(Args, Clone, Debug, PartialEq)]
pub struct ModelArgs {
    /// Effective size of the first derived population, N1.
    #[arg(long, default_value_t = 100_000., value_name = "FLOAT")]
    pub n1_size: f64,

    /// Effective size of the second derived population, N2.
    #[arg(long, default_value_t = 100_000. / 3., value_name = "FLOAT")]
    pub n2_size: f64,

    /// Effective size of the ancestral population, ANC.
    #[arg(long, default_value_t = 7_000_000., value_name = "FLOAT")]
    pub ancestral_size: f64,

    /// Time of the split in generations.
    #[arg(short = 't', long, default_value_t = 5_000., value_name = "FLOAT")]
    pub split_time: f64,
}

impl From<&ModelArgs> for SplitModel {
    fn from(args: &ModelArgs) -> Self {
        Self {
            derived: vec![
                PopulationConfig::new("N1", args.n1_size),
                PopulationConfig::new("N2", args.n2_size),
            ],
            ancestral: PopulationConfig::new("ANC", args.ancestral_size),
            time: args.split_time,
        }
    }
}
