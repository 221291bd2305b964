use super::{Demography, PopulationId};

/// A demographic event.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A population split.
    Split(PopulationSplit),
    /// A change of population size.
    ParametersChange(PopulationParametersChange),
}

impl Event {
    /// Returns the time of the event in generations.
    pub fn time(&self) -> f64 {
        match self {
            Event::Split(split) => split.time,
            Event::ParametersChange(change) => change.time,
        }
    }

    pub(super) fn kind(&self) -> &'static str {
        match self {
            Event::Split(_) => "Population Split",
            Event::ParametersChange(_) => "Population Change",
        }
    }

    pub(super) fn describe(&self, demography: &Demography) -> String {
        let name = |id: PopulationId| {
            demography
                .population(id)
                .map(|population| format!("'{}'", population.name()))
                .unwrap_or_else(|| format!("#{id}"))
        };

        match self {
            Event::Split(split) => {
                let derived = split.derived.iter().map(|&id| name(id)).collect::<Vec<_>>();
                let derived = match derived.split_last() {
                    Some((last, init)) if !init.is_empty() => {
                        format!("{} and {last}", init.join(", "))
                    }
                    _ => derived.join(""),
                };

                format!(
                    "Moves all lineages from derived populations {derived} to the ancestral {} \
                    population. Derived populations become inactive, the ancestral population \
                    becomes active.",
                    name(split.ancestral),
                )
            }
            Event::ParametersChange(change) => format!(
                "Population {}: initial_size -> {}",
                name(change.population),
                change.initial_size
            ),
        }
    }
}

/// A split of one or more derived populations from an ancestral population.
#[derive(Clone, Debug, PartialEq)]
pub struct PopulationSplit {
    pub(super) time: f64,
    pub(super) derived: Vec<PopulationId>,
    pub(super) ancestral: PopulationId,
}

impl PopulationSplit {
    /// Returns the ids of the derived populations.
    pub fn derived(&self) -> &[PopulationId] {
        &self.derived
    }

    /// Returns the id of the ancestral population.
    pub fn ancestral(&self) -> PopulationId {
        self.ancestral
    }
}

/// An instantaneous change of a population's size.
#[derive(Clone, Debug, PartialEq)]
pub struct PopulationParametersChange {
    pub(super) time: f64,
    pub(super) population: PopulationId,
    pub(super) initial_size: f64,
}

impl PopulationParametersChange {
    /// Returns the id of the population that changes.
    pub fn population(&self) -> PopulationId {
        self.population
    }

    /// Returns the new size of the population, in effect further back in time than the event.
    pub fn initial_size(&self) -> f64 {
        self.initial_size
    }
}
