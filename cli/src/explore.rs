use std::io::{self, Write};

use anyhow::Error;

use clap::Parser;

use popsim_core::{
    ancestry, demography::SplitModel, mutation::sim_mutations,
    spectrum::io::text::write_spectrum, Demography, TreeSequence,
};

use crate::model::ModelArgs;

/// Simulate the split model once and print a detailed report.
///
/// The report contains the demography, a summary of the tree sequence, its sites, variants and
/// haplotypes, the unpolarised allele frequency spectrum, and Fst between two populations.
#[derive(Debug, Parser)]
pub struct Explore {
    #[command(flatten)]
    model: ModelArgs,

    /// Number of individuals sampled from each derived population.
    #[arg(short = 's', long, default_value_t = 10, value_name = "INT")]
    sample_size: usize,

    /// Sequence length in bases.
    #[arg(short = 'l', long, default_value_t = 1000, value_name = "INT")]
    sequence_length: u64,

    /// Recombination rate per base per generation.
    #[arg(short = 'r', long, default_value_t = 8.4e-9, value_name = "FLOAT")]
    recombination_rate: f64,

    /// Mutation rate per base per generation.
    #[arg(short = 'm', long, default_value_t = 3.5e-9, value_name = "FLOAT")]
    mutation_rate: f64,

    /// Random seed, used for both ancestry and mutations.
    #[arg(long, default_value_t = 1234, value_name = "INT")]
    seed: u64,

    /// Populations between which to calculate Fst.
    #[arg(
        long,
        default_value = "N1,N2",
        value_parser = parse_pair,
        value_name = "POP,POP"
    )]
    fst_populations: (String, String),

    /// Precision to use when printing Fst.
    #[arg(short = 'p', long, default_value_t = 6, value_name = "INT")]
    precision: usize,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once(',') {
        Some((first, second)) if !first.is_empty() && !second.is_empty() => {
            Ok((first.to_string(), second.to_string()))
        }
        _ => Err(format!("expected two comma-separated population names, found '{s}'")),
    }
}

struct Report {
    demography: Demography,
    ts: TreeSequence,
    fst: f64,
}

impl Explore {
    fn simulate(&self) -> Result<Report, Error> {
        let model = SplitModel::from(&self.model);
        let demography = Demography::from_split(&model)?;

        let samples = model
            .derived_names()
            .into_iter()
            .map(|name| (name, self.sample_size));
        let ts = ancestry::Builder::new(&demography)
            .set_samples(samples)
            .set_sequence_length(self.sequence_length)
            .set_recombination_rate(self.recombination_rate)
            .set_seed(self.seed)
            .simulate()?;
        let ts = sim_mutations(&ts, self.mutation_rate, Some(self.seed))?;

        let (first, second) = &self.fst_populations;
        let fst = ts.fst(first, second)?;

        Ok(Report {
            demography,
            ts,
            fst,
        })
    }

    fn write_report<W>(&self, writer: &mut W, report: &Report) -> Result<(), Error>
    where
        W: Write,
    {
        let Report {
            demography,
            ts,
            fst,
        } = report;

        writeln!(writer, "{demography}")?;
        writeln!(writer, "{ts}")?;
        writeln!(writer, "{}", ts.site_table())?;

        for variant in ts.variants() {
            writeln!(writer, "{variant}")?;
        }
        writeln!(writer)?;

        for (id, (&node, haplotype)) in ts.samples().iter().zip(ts.haplotypes()).enumerate() {
            let population = ts
                .node(node)
                .and_then(|node| ts.population_name(node.population))
                .unwrap_or("?");
            writeln!(writer, "Sample {id:<2} ({population:^5}): {haplotype}")?;
        }
        writeln!(writer)?;

        write_spectrum(writer, &ts.allele_frequency_spectrum(false), 0)?;
        writeln!(writer)?;

        let (first, second) = &self.fst_populations;
        let precision = self.precision;
        writeln!(writer, "Fst({first}, {second}) = {fst:.precision$}")?;

        Ok(())
    }

    pub fn run(self) -> Result<(), Error> {
        // Everything is computed before printing, so that failures leave stdout empty
        let report = self.simulate()?;

        self.write_report(&mut io::stdout().lock(), &report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::error::ErrorKind as ClapErrorKind;

    use crate::tests::{parse_subcmd, try_parse_subcmd};

    #[test]
    fn test_parse_fst_populations() {
        let args = parse_subcmd::<Explore>("popsim explore --fst-populations AFR,EUR");

        assert_eq!(
            args.fst_populations,
            (String::from("AFR"), String::from("EUR"))
        );
    }

    #[test]
    fn test_parse_fst_populations_invalid() {
        let result = try_parse_subcmd::<Explore>("popsim explore --fst-populations N1");

        assert_eq!(result.unwrap_err().kind(), ClapErrorKind::ValueValidation);
    }

    #[test]
    fn test_undeclared_fst_populations_fail() {
        let args = parse_subcmd::<Explore>("popsim explore --fst-populations AFR,EUR");

        assert!(args.simulate().is_err());
    }

    #[test]
    fn test_report() {
        let args = parse_subcmd::<Explore>("popsim explore -s 3 -m 1e-7");
        let report = args.simulate().unwrap();

        let mut dest = Vec::new();
        args.write_report(&mut dest, &report).unwrap();
        let text = String::from_utf8(dest).unwrap();

        assert!(text.starts_with("Demography\n"));
        assert!(text.contains("Sample 0  ( N1  ): "));
        assert!(text.contains("Sample 5  ( N2  ): "));
        assert!(text.contains("#SHAPE=<7>\n"));
        assert!(text.contains("Fst(N1, N2) = "));
    }
}
