use std::io::{self, Write};

use anyhow::Error;

use clap::Parser;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use popsim_core::prior::{draw_size_priors, Histogram};

/// Draw from illustrative priors on population sizes and print histograms.
///
/// The size of N1 is uniform on [50000, 200000), and the size of N2 is the same draws divided by
/// 30; an alternative prior draws the size of N2 uniformly on [1666, 6666). Each uniform prior is
/// sampled once per unit of its range.
#[derive(Debug, Parser)]
pub struct Priors {
    /// Number of histogram bins.
    #[arg(short = 'b', long, default_value_t = 50, value_name = "INT")]
    bins: usize,

    /// Random seed.
    #[arg(long, default_value_t = 1234, value_name = "INT")]
    seed: u64,
}

impl Priors {
    pub fn run(self) -> Result<(), Error> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut writer = io::stdout().lock();

        for draws in draw_size_priors(&mut rng)? {
            let histogram = Histogram::new(&draws.values, self.bins)?;

            log::debug!("Drew {} values for {}", draws.values.len(), draws.name);

            writeln!(writer, "{} ({} draws)", draws.name, draws.values.len())?;
            writeln!(writer, "{histogram}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::tests::parse_subcmd;

    #[test]
    fn test_defaults() {
        let args = parse_subcmd::<Priors>("popsim priors");

        assert_eq!(args.bins, 50);
        assert_eq!(args.seed, 1234);
    }
}
