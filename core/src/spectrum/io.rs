//! Writing spectra.

pub mod text;
