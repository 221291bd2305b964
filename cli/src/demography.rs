use anyhow::Error;

use clap::Parser;

use popsim_core::demography::SplitModel;

use crate::model::ModelArgs;

/// Print the demography of the split model.
#[derive(Debug, Parser)]
pub struct Demography {
    #[command(flatten)]
    model: ModelArgs,
}

impl Demography {
    pub fn run(self) -> Result<(), Error> {
        let model = SplitModel::from(&self.model);
        let demography = popsim_core::Demography::from_split(&model)?;

        print!("{demography}");

        Ok(())
    }
}
