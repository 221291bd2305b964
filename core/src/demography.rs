//! Demographic models.
//!
//! A [`Demography`] is a set of named populations with sizes, and a time-ordered list of events
//! that change them going backwards in time. Time is measured in generations before the present.

use std::fmt;

use indexmap::IndexMap;

mod event;
pub use event::{Event, PopulationParametersChange, PopulationSplit};

mod model;
pub use model::{PopulationConfig, SplitModel};

/// The index of a population in a [`Demography`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PopulationId(pub usize);

impl fmt::Display for PopulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A population with a name and an effective size.
#[derive(Clone, Debug, PartialEq)]
pub struct Population {
    name: String,
    initial_size: f64,
}

impl Population {
    /// Returns the name of the population.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the effective size of the population at time zero.
    pub fn initial_size(&self) -> f64 {
        self.initial_size
    }
}

/// A demographic model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Demography {
    populations: IndexMap<String, Population>,
    events: Vec<Event>,
}

impl Demography {
    /// Creates an empty demography.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a population, returning its id.
    pub fn add_population(
        &mut self,
        name: &str,
        initial_size: f64,
    ) -> Result<PopulationId, DemographyError> {
        if self.populations.contains_key(name) {
            return Err(DemographyError::DuplicatePopulation(name.to_string()));
        }
        check_size(name, initial_size)?;

        let (index, _) = self.populations.insert_full(
            name.to_string(),
            Population {
                name: name.to_string(),
                initial_size,
            },
        );

        Ok(PopulationId(index))
    }

    /// Adds a split, at which all lineages in the derived populations move to the ancestral
    /// population going backwards in time.
    ///
    /// After the split, the derived populations are inactive. Before it, the ancestral
    /// population is inactive.
    pub fn add_population_split(
        &mut self,
        time: f64,
        derived: &[&str],
        ancestral: &str,
    ) -> Result<(), DemographyError> {
        if !(time.is_finite() && time > 0.0) {
            return Err(DemographyError::InvalidTime(time));
        }
        if derived.is_empty() {
            return Err(DemographyError::EmptySplit(ancestral.to_string()));
        }

        let ancestral_id = self.require(ancestral)?;
        let derived_ids = derived
            .iter()
            .map(|name| self.require(name))
            .collect::<Result<Vec<_>, _>>()?;

        for (&name, &id) in derived.iter().zip(derived_ids.iter()) {
            if id == ancestral_id {
                return Err(DemographyError::SelfSplit(name.to_string()));
            }
            if self.split_time(id).is_some()
                || derived_ids.iter().filter(|&&other| other == id).count() > 1
            {
                return Err(DemographyError::AlreadyDerived(name.to_string()));
            }
            // A derived population that is itself formed by an older-in-time split must be
            // formed before it merges into its ancestor
            if self.activation_time(id) >= time {
                return Err(DemographyError::InactivePopulation {
                    population: name.to_string(),
                    time,
                });
            }
            if let Some(change_time) = self.last_change_time(id) {
                if change_time >= time {
                    return Err(DemographyError::InactivePopulation {
                        population: name.to_string(),
                        time: change_time,
                    });
                }
            }
        }

        if let Some(ancestral_split) = self.split_time(ancestral_id) {
            if ancestral_split <= time {
                return Err(DemographyError::InactivePopulation {
                    population: ancestral.to_string(),
                    time,
                });
            }
        }

        self.push_event(Event::Split(PopulationSplit {
            time,
            derived: derived_ids,
            ancestral: ancestral_id,
        }));

        Ok(())
    }

    /// Adds an instantaneous change of a population's size.
    pub fn add_population_parameters_change(
        &mut self,
        time: f64,
        population: &str,
        initial_size: f64,
    ) -> Result<(), DemographyError> {
        if !(time.is_finite() && time >= 0.0) {
            return Err(DemographyError::InvalidTime(time));
        }
        let id = self.require(population)?;
        check_size(population, initial_size)?;

        if self.split_time(id).is_some_and(|split| split <= time) {
            return Err(DemographyError::InactivePopulation {
                population: population.to_string(),
                time,
            });
        }

        self.push_event(Event::ParametersChange(PopulationParametersChange {
            time,
            population: id,
            initial_size,
        }));

        Ok(())
    }

    /// Returns the time at which a population becomes active going backwards in time.
    ///
    /// This is zero, unless the population is the ancestral population of a split.
    pub fn activation_time(&self, id: PopulationId) -> f64 {
        self.events
            .iter()
            .find_map(|event| match event {
                Event::Split(split) if split.ancestral == id => Some(split.time),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// Returns the events in time order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns true if lineages may be sampled from the population at time zero.
    pub fn is_extant(&self, id: PopulationId) -> bool {
        self.activation_time(id) == 0.0
    }

    fn last_change_time(&self, id: PopulationId) -> Option<f64> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::ParametersChange(change) if change.population == id => Some(change.time),
                _ => None,
            })
            .last()
    }

    /// Returns the population with the given id.
    pub fn population(&self, id: PopulationId) -> Option<&Population> {
        self.populations.get_index(id.0).map(|(_, population)| population)
    }

    /// Returns the id of the population with the given name.
    pub fn population_id(&self, name: &str) -> Option<PopulationId> {
        self.populations.get_index_of(name).map(PopulationId)
    }

    /// Returns the populations in the order they were added.
    pub fn populations(&self) -> impl Iterator<Item = (PopulationId, &Population)> {
        self.populations
            .values()
            .enumerate()
            .map(|(i, population)| (PopulationId(i), population))
    }

    /// Returns the number of populations.
    pub fn num_populations(&self) -> usize {
        self.populations.len()
    }

    fn push_event(&mut self, event: Event) {
        self.events.push(event);
        // Stable, so simultaneous events apply in insertion order
        self.events
            .sort_by(|a, b| a.time().total_cmp(&b.time()));
    }

    fn require(&self, name: &str) -> Result<PopulationId, DemographyError> {
        self.population_id(name)
            .ok_or_else(|| DemographyError::UnknownPopulation(name.to_string()))
    }

    /// Returns the time at which a population splits from its ancestor, if it is derived.
    pub fn split_time(&self, id: PopulationId) -> Option<f64> {
        self.events.iter().find_map(|event| match event {
            Event::Split(split) if split.derived.contains(&id) => Some(split.time),
            _ => None,
        })
    }
}

fn check_size(name: &str, size: f64) -> Result<(), DemographyError> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(DemographyError::InvalidSize {
            population: name.to_string(),
            size,
        })
    }
}

impl fmt::Display for Demography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .populations
            .keys()
            .map(|name| name.len())
            .chain(std::iter::once("name".len()))
            .max()
            .unwrap_or(0);

        writeln!(f, "Demography")?;
        writeln!(f, "Populations")?;
        writeln!(
            f,
            "  {:<4} {:<name_width$} {:>14} {:>14} {:>7}",
            "id", "name", "initial_size", "sampling_time", "extant"
        )?;
        for (id, population) in self.populations() {
            writeln!(
                f,
                "  {:<4} {:<name_width$} {:>14.1} {:>14} {:>7}",
                id.0,
                population.name,
                population.initial_size,
                self.activation_time(id),
                self.is_extant(id),
            )?;
        }

        writeln!(f, "Events")?;
        if self.events.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for event in self.events.iter() {
            writeln!(
                f,
                "  {:>10} {:<20} {}",
                event.time(),
                event.kind(),
                event.describe(self)
            )?;
        }

        Ok(())
    }
}

/// An error associated with building a demography.
#[derive(Clone, Debug, PartialEq)]
pub enum DemographyError {
    /// A population was added twice.
    DuplicatePopulation(String),
    /// A referenced population was never added.
    UnknownPopulation(String),
    /// A population size was not positive and finite.
    InvalidSize {
        /// Population name.
        population: String,
        /// Invalid size.
        size: f64,
    },
    /// An event time was invalid.
    InvalidTime(f64),
    /// A split had no derived populations.
    EmptySplit(String),
    /// A population was both derived and ancestral in the same split.
    SelfSplit(String),
    /// A population was derived in more than one split.
    AlreadyDerived(String),
    /// An event referenced a population at a time when it is not active.
    InactivePopulation {
        /// Population name.
        population: String,
        /// Time of the event.
        time: f64,
    },
}

impl fmt::Display for DemographyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemographyError::DuplicatePopulation(name) => {
                write!(f, "population '{name}' already defined")
            }
            DemographyError::UnknownPopulation(name) => {
                write!(f, "population '{name}' not defined in demography")
            }
            DemographyError::InvalidSize { population, size } => write!(
                f,
                "population '{population}' must have positive, finite size (found {size})"
            ),
            DemographyError::InvalidTime(time) => {
                write!(f, "invalid event time {time}")
            }
            DemographyError::EmptySplit(name) => {
                write!(f, "split into ancestral population '{name}' has no derived populations")
            }
            DemographyError::SelfSplit(name) => {
                write!(f, "population '{name}' cannot be derived from itself")
            }
            DemographyError::AlreadyDerived(name) => {
                write!(f, "population '{name}' is already derived in another split")
            }
            DemographyError::InactivePopulation { population, time } => {
                write!(f, "population '{population}' is not active at time {time}")
            }
        }
    }
}

impl std::error::Error for DemographyError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_populations() -> Demography {
        let mut demography = Demography::new();
        demography.add_population("A", 1_000.).unwrap();
        demography.add_population("B", 500.).unwrap();
        demography
    }

    #[test]
    fn test_add_population_ids() {
        let mut demography = two_populations();

        assert_eq!(
            demography.add_population("C", 10.),
            Ok(PopulationId(2))
        );
        assert_eq!(demography.population_id("B"), Some(PopulationId(1)));
        assert_eq!(demography.population_id("D"), None);
    }

    #[test]
    fn test_duplicate_population() {
        let mut demography = two_populations();

        assert_eq!(
            demography.add_population("A", 10.),
            Err(DemographyError::DuplicatePopulation(String::from("A")))
        );
    }

    #[test]
    fn test_invalid_size() {
        let mut demography = Demography::new();

        assert!(matches!(
            demography.add_population("A", 0.),
            Err(DemographyError::InvalidSize { .. })
        ));
        assert!(matches!(
            demography.add_population("A", f64::NAN),
            Err(DemographyError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_split_undeclared_population() {
        let mut demography = two_populations();

        assert_eq!(
            demography.add_population_split(100., &["A", "EUR"], "B"),
            Err(DemographyError::UnknownPopulation(String::from("EUR")))
        );
        assert_eq!(
            demography.add_population_split(100., &["A"], "ANC"),
            Err(DemographyError::UnknownPopulation(String::from("ANC")))
        );
    }

    #[test]
    fn test_split_time_must_be_positive() {
        let mut demography = two_populations();
        demography.add_population("C", 10.).unwrap();

        assert_eq!(
            demography.add_population_split(0., &["A", "B"], "C"),
            Err(DemographyError::InvalidTime(0.))
        );
        assert_eq!(
            demography.add_population_split(-5., &["A", "B"], "C"),
            Err(DemographyError::InvalidTime(-5.))
        );
    }

    #[test]
    fn test_split_into_self() {
        let mut demography = two_populations();

        assert_eq!(
            demography.add_population_split(10., &["A"], "A"),
            Err(DemographyError::SelfSplit(String::from("A")))
        );
    }

    #[test]
    fn test_derived_twice() {
        let mut demography = two_populations();
        demography.add_population("C", 10.).unwrap();
        demography.add_population("D", 10.).unwrap();
        demography.add_population_split(10., &["A"], "C").unwrap();

        assert_eq!(
            demography.add_population_split(20., &["A"], "D"),
            Err(DemographyError::AlreadyDerived(String::from("A")))
        );
    }

    #[test]
    fn test_activation_and_extant() {
        let mut demography = two_populations();
        let c = demography.add_population("C", 10.).unwrap();
        demography.add_population_split(50., &["A", "B"], "C").unwrap();

        assert!(demography.is_extant(PopulationId(0)));
        assert!(demography.is_extant(PopulationId(1)));
        assert!(!demography.is_extant(c));
        assert_eq!(demography.activation_time(c), 50.);
        assert_eq!(demography.split_time(PopulationId(0)), Some(50.));
        assert_eq!(demography.split_time(c), None);
    }

    #[test]
    fn test_nested_splits_must_be_ordered() {
        let mut demography = two_populations();
        demography.add_population("C", 10.).unwrap();
        demography.add_population("D", 10.).unwrap();
        demography.add_population_split(50., &["A", "B"], "C").unwrap();

        // C only exists further back in time than 50 generations
        assert!(matches!(
            demography.add_population_split(40., &["C"], "D"),
            Err(DemographyError::InactivePopulation { .. })
        ));
        assert!(demography.add_population_split(60., &["C"], "D").is_ok());
    }

    #[test]
    fn test_parameters_change_after_split() {
        let mut demography = two_populations();
        demography.add_population("C", 10.).unwrap();
        demography.add_population_split(50., &["A", "B"], "C").unwrap();

        assert!(demography
            .add_population_parameters_change(20., "A", 100.)
            .is_ok());
        assert!(matches!(
            demography.add_population_parameters_change(60., "A", 100.),
            Err(DemographyError::InactivePopulation { .. })
        ));
        assert!(demography
            .add_population_parameters_change(60., "C", 100.)
            .is_ok());
    }

    #[test]
    fn test_events_sorted_by_time() {
        let mut demography = two_populations();
        demography.add_population("C", 10.).unwrap();
        demography.add_population_split(50., &["A", "B"], "C").unwrap();
        demography
            .add_population_parameters_change(20., "A", 100.)
            .unwrap();

        let times = demography
            .events()
            .iter()
            .map(|event| event.time())
            .collect::<Vec<_>>();

        assert_eq!(times, vec![20., 50.]);
    }

    #[test]
    fn test_display() {
        let mut demography = two_populations();
        demography.add_population("C", 10.).unwrap();
        demography.add_population_split(50., &["A", "B"], "C").unwrap();

        let display = demography.to_string();

        assert!(display.starts_with("Demography\nPopulations\n"));
        assert!(display.contains("Population Split"));
        assert!(display.contains("'A' and 'B'"));
    }
}
