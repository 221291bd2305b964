use super::{Demography, DemographyError};

/// A named population and its size.
#[derive(Clone, Debug, PartialEq)]
pub struct PopulationConfig {
    /// Population name.
    pub name: String,
    /// Effective population size.
    pub initial_size: f64,
}

impl PopulationConfig {
    /// Creates a new population configuration.
    pub fn new(name: &str, initial_size: f64) -> Self {
        Self {
            name: name.to_string(),
            initial_size,
        }
    }
}

/// A model of derived populations splitting from a single ancestral population.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitModel {
    /// Derived populations, extant at time zero.
    pub derived: Vec<PopulationConfig>,
    /// Ancestral population, active from the split time onwards.
    pub ancestral: PopulationConfig,
    /// Split time in generations.
    pub time: f64,
}

impl SplitModel {
    /// Returns the names of the derived populations.
    pub fn derived_names(&self) -> Vec<&str> {
        self.derived.iter().map(|p| p.name.as_str()).collect()
    }
}

impl Default for SplitModel {
    fn default() -> Self {
        Self {
            derived: vec![
                PopulationConfig::new("N1", 100_000.),
                PopulationConfig::new("N2", 100_000. / 3.),
            ],
            ancestral: PopulationConfig::new("ANC", 7_000_000.),
            time: 5_000.,
        }
    }
}

impl Demography {
    /// Builds the demography of a split model.
    pub fn from_split(model: &SplitModel) -> Result<Self, DemographyError> {
        let mut demography = Self::new();

        for population in model.derived.iter() {
            demography.add_population(&population.name, population.initial_size)?;
        }
        demography.add_population(&model.ancestral.name, model.ancestral.initial_size)?;
        demography.add_population_split(model.time, &model.derived_names(), &model.ancestral.name)?;

        Ok(demography)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::demography::PopulationId;

    #[test]
    fn test_default_split_model() {
        let demography = Demography::from_split(&SplitModel::default()).unwrap();

        let names = demography
            .populations()
            .map(|(_, p)| p.name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["N1", "N2", "ANC"]);

        assert_eq!(demography.events().len(), 1);
        assert_eq!(demography.events()[0].time(), 5_000.);
        assert_eq!(demography.split_time(PopulationId(0)), Some(5_000.));
        assert_eq!(demography.split_time(PopulationId(1)), Some(5_000.));
        assert!(!demography.is_extant(PopulationId(2)));
        assert_approx_eq!(
            demography.population(PopulationId(1)).unwrap().initial_size(),
            33_333.333333
        );
    }

    #[test]
    fn test_split_model_name_clash() {
        let model = SplitModel {
            ancestral: PopulationConfig::new("N1", 10.),
            ..SplitModel::default()
        };

        assert_eq!(
            Demography::from_split(&model),
            Err(DemographyError::DuplicatePopulation(String::from("N1")))
        );
    }

    #[test]
    fn test_split_model_is_reproducible() {
        let model = SplitModel::default();

        assert_eq!(
            Demography::from_split(&model).unwrap(),
            Demography::from_split(&model).unwrap()
        );
    }
}
