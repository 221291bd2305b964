//! Array shapes and row-major strides.

use std::{fmt, ops::Deref};

/// The shape of an [`Array`](super::Array).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Shape(pub Vec<usize>);

impl Shape {
    /// Returns the number of elements in an array of this shape.
    pub fn elements(&self) -> usize {
        self.iter().product()
    }

    pub(crate) fn index_from_flat_unchecked(&self, mut flat: usize) -> Vec<usize> {
        let mut n = self.elements();
        let mut index = vec![0; self.len()];
        for (i, v) in self.iter().enumerate() {
            n /= v;
            index[i] = flat / n;
            flat %= n;
        }
        index
    }

    pub(crate) fn strides(&self) -> Strides {
        let mut strides = vec![1; self.len()];

        for (i, v) in self.iter().enumerate().skip(1).rev() {
            strides.iter_mut().take(i).for_each(|stride| *stride *= v)
        }

        Strides(strides)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<usize>> for Shape {
    fn from(shape: Vec<usize>) -> Self {
        Self(shape)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(shape: [usize; N]) -> Self {
        Self(shape.to_vec())
    }
}

impl From<usize> for Shape {
    fn from(shape: usize) -> Self {
        Self(vec![shape])
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.iter();
        if let Some(first) = iter.next() {
            write!(f, "{first}")?;
        }
        for v in iter {
            write!(f, "/{v}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Strides(pub Vec<usize>);

impl Strides {
    pub fn flat_index(&self, shape: &Shape, index: &[usize]) -> Option<usize> {
        index
            .iter()
            .zip(shape.iter())
            .zip(self.0.iter())
            .try_fold(0, |flat, ((&i, &n), &stride)| {
                (i < n).then_some(flat + i * stride)
            })
    }
}
