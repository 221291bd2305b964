#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Coalescent simulation and summary statistics for population splits.
//!
//! This serves as the core library implementation for the `popsim` CLI, but can also be used as
//! a free-standing library.
//!
//! # Overview
//!
//! A [`Demography`] describes named populations and the events relating them back in time. The
//! [`ancestry`] module simulates the genealogy of a sample under the coalescent with
//! recombination, producing a [`TreeSequence`], and [`mutation`] overlays mutations onto it.
//! Summary statistics such as diversity, Tajima's D, allele frequency spectra and Fst are
//! defined directly on a [`TreeSequence`]. Spectra are represented as a [`Spectrum`], backed by
//! an N-dimensional [`Array`], and may be normalized ([`Sfs`]) or counts ([`Scs`]).
//!
//! Repeated simulation of a split model is provided by [`repeat_simulations`].
//!
//! # Example
//!
//! Simulate a small sample from a single population, add mutations, and count sites.
//!
//! ```
//! use popsim_core::{ancestry, mutation::sim_mutations, Demography};
//!
//! let mut demography = Demography::new();
//! demography.add_population("A", 1_000.)?;
//!
//! let ts = ancestry::Builder::new(&demography)
//!     .set_samples([("A", 4)])
//!     .set_sequence_length(1_000)
//!     .set_seed(1)
//!     .simulate()?;
//! let ts = sim_mutations(&ts, 1e-5, Some(1))?;
//!
//! assert_eq!(ts.num_samples(), 4);
//! assert_eq!(ts.allele_frequency_spectrum(true).elements(), 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(test)]
#[macro_use]
pub(crate) mod approx;

pub mod ancestry;
pub use ancestry::AncestryError;

pub mod array;
pub use array::Array;

pub mod demography;
pub use demography::{Demography, DemographyError, SplitModel};

pub mod mutation;
pub use mutation::MutationError;

pub mod prior;

pub mod simulate;
pub use simulate::{repeat_simulations, SimulationError, SimulationParameters, SimulationResult};

pub mod spectrum;
pub use spectrum::{Scs, Sfs, Spectrum};

pub mod stats;
pub use stats::StatisticError;

pub mod tree_sequence;
pub use tree_sequence::TreeSequence;

pub mod utils;
