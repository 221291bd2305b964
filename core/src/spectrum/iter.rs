//! Iteration over the allele frequencies of spectrum elements.

use std::iter::FusedIterator;

use crate::array::iter::IndicesIter;

use super::{Spectrum, State};

/// An iterator over the derived allele frequencies of each element of a spectrum.
///
/// For a spectrum of shape `[n + 1, m + 1]`, the element `[i, j]` has frequencies `[i/n, j/m]`.
#[derive(Debug)]
pub struct FrequenciesIter<'a> {
    inner: IndicesIter<'a>,
}

impl<'a> FrequenciesIter<'a> {
    pub(super) fn new<S: State>(spectrum: &'a Spectrum<S>) -> Self {
        Self {
            inner: spectrum.array.iter_indices(),
        }
    }
}

impl<'a> Iterator for FrequenciesIter<'a> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let shape = self.inner.shape();

        self.inner.next().map(|index| {
            index
                .into_iter()
                .zip(shape.iter())
                .map(|(i, &n)| i as f64 / (n - 1) as f64)
                .collect()
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> ExactSizeIterator for FrequenciesIter<'a> {}

impl<'a> FusedIterator for FrequenciesIter<'a> {}
