//! Site frequency spectra.

use std::{
    fmt,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

pub mod io;

pub mod iter;
use iter::FrequenciesIter;

pub mod stat;
use stat::{DimensionError, Fst};

use crate::array::{Array, Shape, ShapeError};

mod seal {
    #![deny(missing_docs)]
    pub trait Sealed {}
}
use seal::Sealed;

/// The state of a spectrum, either frequencies or counts.
pub trait State: Sealed {
    #[doc(hidden)]
    fn debug_name() -> &'static str;
}

/// Marker for a spectrum normalized to frequencies.
#[derive(Copy, Clone, Debug)]
pub struct Frequencies;
impl Sealed for Frequencies {}
impl State for Frequencies {
    fn debug_name() -> &'static str {
        "Sfs"
    }
}

/// Marker for a spectrum of site counts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Counts;
impl Sealed for Counts {}
impl State for Counts {
    fn debug_name() -> &'static str {
        "Scs"
    }
}

/// A site frequency spectrum.
pub type Sfs = Spectrum<Frequencies>;

/// A site count spectrum, the unnormalized allele frequency spectrum.
pub type Scs = Spectrum<Counts>;

/// An N-dimensional spectrum, where the element at index `[i, j, ...]` refers to the sites with
/// `i` derived alleles in the first sample set, `j` in the second, and so on.
#[derive(PartialEq)]
pub struct Spectrum<S: State> {
    array: Array<f64>,
    state: PhantomData<S>,
}

impl<S: State> Spectrum<S> {
    /// Returns the number of dimensions, i.e. the number of sample sets.
    pub fn dimensions(&self) -> usize {
        self.array.dimensions()
    }

    /// Returns the number of elements.
    pub fn elements(&self) -> usize {
        self.array.elements()
    }

    /// Returns the underlying array.
    pub fn inner(&self) -> &Array<f64> {
        &self.array
    }

    /// Normalizes the spectrum to frequencies.
    pub fn into_normalized(mut self) -> Sfs {
        self.normalize();
        self.into_state_unchecked()
    }

    fn into_state_unchecked<R: State>(self) -> Spectrum<R> {
        Spectrum {
            array: self.array,
            state: PhantomData,
        }
    }

    /// Returns an iterator over the allele frequencies corresponding to each element.
    pub fn iter_frequencies(&self) -> FrequenciesIter<'_> {
        FrequenciesIter::new(self)
    }

    /// Normalizes the spectrum in place so that it sums to one.
    pub fn normalize(&mut self) {
        let sum = self.sum();
        self.array.iter_mut().for_each(|x| *x /= sum);
    }

    /// Returns the shape of the spectrum.
    pub fn shape(&self) -> &Shape {
        self.array.shape()
    }

    /// Returns the sum of the spectrum.
    pub fn sum(&self) -> f64 {
        self.array.iter().sum::<f64>()
    }
}

impl Scs {
    /// Creates a new count spectrum, checking that the data fits the shape.
    pub fn new<D, S>(data: D, shape: S) -> Result<Self, ShapeError>
    where
        Vec<f64>: From<D>,
        Shape: From<S>,
    {
        Array::new(data, shape).map(Self::from)
    }

    /// Creates a one-dimensional count spectrum from counts.
    pub fn from_vec<D>(data: D) -> Self
    where
        Vec<f64>: From<D>,
    {
        let data: Vec<f64> = Vec::from(data);
        let shape = Shape::from(data.len());

        Self::from(Array::new_unchecked(data, shape))
    }

    /// Creates a count spectrum of zeros.
    pub fn from_zeros<S>(shape: S) -> Self
    where
        Shape: From<S>,
    {
        Self::from(Array::from_zeros(shape))
    }

    /// Folds a one-dimensional spectrum onto its minor allele counts.
    ///
    /// Counts at index `n - i` are added to index `i`; the upper half is zeroed. For an even
    /// number of samples, the middle element is kept as is.
    pub fn fold(&self) -> Result<Self, DimensionError> {
        if self.dimensions() != 1 {
            return Err(DimensionError {
                expected: 1,
                actual: self.dimensions(),
            });
        }

        let src = self.array.as_slice();
        let n = src.len();
        let mut folded = vec![0.0; n];

        for (i, rev_i) in (0..n).zip((0..n).rev()) {
            if i < rev_i {
                folded[i] = src[i] + src[rev_i];
            } else if i == rev_i {
                folded[i] = src[i];
            }
        }

        Ok(Self::from_vec(folded))
    }

    /// Returns Hudson's estimator of Fst from a two-dimensional spectrum.
    pub fn fst(&self) -> Result<f64, DimensionError> {
        Fst::from_sfs(&self.clone().into_normalized()).map(|fst| fst.0)
    }
}

impl<S: State> Clone for Spectrum<S> {
    fn clone(&self) -> Self {
        Self {
            array: self.array.clone(),
            state: PhantomData,
        }
    }
}

impl<S: State> fmt::Debug for Spectrum<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(S::debug_name())
            .field("array", &self.array)
            .finish()
    }
}

impl From<Array<f64>> for Scs {
    fn from(array: Array<f64>) -> Self {
        Self {
            array,
            state: PhantomData,
        }
    }
}

impl<I, S: State> Index<I> for Spectrum<S>
where
    I: AsRef<[usize]>,
{
    type Output = f64;

    fn index(&self, index: I) -> &Self::Output {
        self.array.index(index)
    }
}

impl<I, S: State> IndexMut<I> for Spectrum<S>
where
    I: AsRef<[usize]>,
{
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        self.array.index_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let sfs = Scs::from_vec([2., 1., 1., 0.]).into_normalized();

        assert_approx_eq!(sfs.inner().as_slice().to_vec(), vec![0.5, 0.25, 0.25, 0.]);
    }

    #[test]
    fn test_new_checks_shape() {
        assert!(Scs::new([5., 1., 2., 3., 4., 6.], [2, 3]).is_ok());
        assert!(Scs::new([5., 1., 2.], [2, 3]).is_err());
    }

    #[test]
    fn test_from_vec_one_dimensional() {
        let scs = Scs::from_vec(vec![1., 2., 3.]);

        assert_eq!(scs.dimensions(), 1);
        assert_eq!(scs.elements(), 3);
        assert_eq!(scs[[2]], 3.);
    }

    #[test]
    fn test_fold_odd() {
        let scs = Scs::from_vec([0., 1., 2., 3., 4.]);

        assert_eq!(
            scs.fold().unwrap(),
            Scs::from_vec([4., 4., 2., 0., 0.])
        );
    }

    #[test]
    fn test_fold_even() {
        let scs = Scs::from_vec([0., 1., 2., 3.]);

        assert_eq!(scs.fold().unwrap(), Scs::from_vec([3., 3., 0., 0.]));
    }

    #[test]
    fn test_fold_2d_fails() {
        let scs = Scs::from_zeros([2, 2]);

        assert!(scs.fold().is_err());
    }
}
