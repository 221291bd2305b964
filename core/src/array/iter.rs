//! Iteration over array indices.

use std::iter::FusedIterator;

use super::{Array, Shape};

/// An iterator over the indices of an [`Array`] in row-major order.
#[derive(Debug)]
pub struct IndicesIter<'a> {
    shape: &'a Shape,
    index: usize,
    total: usize,
}

impl<'a> IndicesIter<'a> {
    pub(crate) fn shape(&self) -> &'a Shape {
        self.shape
    }

    pub(super) fn new<T>(array: &'a Array<T>) -> Self {
        Self {
            shape: array.shape(),
            index: 0,
            total: array.elements(),
        }
    }
}

impl<'a> Iterator for IndicesIter<'a> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        (self.index < self.total).then(|| {
            self.index += 1;
            self.shape.index_from_flat_unchecked(self.index - 1)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.total - self.index;
        (len, Some(len))
    }
}

impl<'a> ExactSizeIterator for IndicesIter<'a> {}

impl<'a> FusedIterator for IndicesIter<'a> {}
