use std::{fmt, io};

use anyhow::Error;

use indicatif::{ProgressBar, ProgressStyle};

use popsim_core::{
    simulate, spectrum::io::text::format_spectrum, SimulationParameters, SimulationResult,
};

const FIELDS: [&str; 6] = [
    "simulation",
    "trees",
    "sites",
    "diversity",
    "tajimas_d",
    "afs",
];

#[derive(Debug)]
pub struct Runner<W> {
    writer: W,
    parameters: SimulationParameters,
    header: bool,
    delimiter: char,
    precision: usize,
}

impl<W> Runner<W>
where
    W: io::Write,
{
    pub fn new(
        writer: W,
        parameters: SimulationParameters,
        header: bool,
        delimiter: char,
        precision: usize,
    ) -> Self {
        Self {
            writer,
            parameters,
            header,
            delimiter,
            precision,
        }
    }

    pub fn run(&mut self) -> Result<(), Error> {
        let progress = ProgressBar::new(self.parameters.num_simulations as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );

        self.run_with_progress(&progress)
    }

    fn run_with_progress(&mut self, progress: &ProgressBar) -> Result<(), Error> {
        let written = self.write_results(progress);

        // Cleared on failure too, before the error reaches the terminal
        progress.finish_and_clear();

        written
    }

    fn write_results(&mut self, progress: &ProgressBar) -> Result<(), Error> {
        if self.header {
            self.write_with_delimiter(FIELDS)?;
        }

        let parameters = self.parameters.clone();
        for (i, result) in simulate::Runner::new(&parameters).enumerate() {
            let result = result?;
            self.write_result(i, &result)?;
            progress.inc(1);
        }

        Ok(())
    }

    fn write_result(&mut self, index: usize, result: &SimulationResult) -> Result<(), Error> {
        let ts = &result.tree_sequence;
        let precision = self.precision;

        let fields = [
            index.to_string(),
            ts.num_trees().to_string(),
            ts.num_sites().to_string(),
            format!("{:.precision$}", result.diversity),
            format!("{:.precision$}", result.tajimas_d),
            format_spectrum(&result.allele_frequency_spectrum, " ", 0),
        ];

        self.write_with_delimiter(fields)
    }

    fn write_with_delimiter<I>(&mut self, items: I) -> Result<(), Error>
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        for (i, x) in items.into_iter().enumerate() {
            if i > 0 {
                write!(self.writer, "{}", self.delimiter)?;
            }
            write!(self.writer, "{x}")?;
        }
        writeln!(self.writer)?;

        Ok(())
    }
}
