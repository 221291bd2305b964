//! N-dimensional arrays in row-major order.

use std::{
    fmt,
    ops::{Index, IndexMut},
};

pub mod iter;
use iter::IndicesIter;

pub mod shape;
use shape::Strides;
pub use shape::Shape;

/// An N-dimensional array.
#[derive(Clone, Debug, PartialEq)]
pub struct Array<T> {
    data: Vec<T>,
    shape: Shape,
    strides: Strides,
}

impl<T> Array<T> {
    /// Returns the underlying data as a flat slice in row-major order.
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    /// Returns the number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.shape.len()
    }

    /// Returns the total number of elements.
    pub fn elements(&self) -> usize {
        self.data.len()
    }

    /// Creates an array filled with a single element.
    pub fn from_element<S>(element: T, shape: S) -> Self
    where
        T: Clone,
        Shape: From<S>,
    {
        let shape = Shape::from(shape);
        let elements = shape.elements();

        Self::new_unchecked(vec![element; elements], shape)
    }

    /// Returns a reference to an element, or `None` if the index is out of bounds or has the
    /// wrong number of dimensions.
    pub fn get<I>(&self, index: I) -> Option<&T>
    where
        I: AsRef<[usize]>,
    {
        let index = index.as_ref();

        if index.len() == self.dimensions() {
            self.strides
                .flat_index(&self.shape, index)
                .and_then(|flat| self.data.get(flat))
        } else {
            None
        }
    }

    /// Returns a mutable reference to an element, or `None` if the index is out of bounds or has
    /// the wrong number of dimensions.
    pub fn get_mut<I>(&mut self, index: I) -> Option<&mut T>
    where
        I: AsRef<[usize]>,
    {
        let index = index.as_ref();

        if index.len() == self.dimensions() {
            self.strides
                .flat_index(&self.shape, index)
                .and_then(|flat| self.data.get_mut(flat))
        } else {
            None
        }
    }

    /// Returns an iterator over the elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Returns an iterator over the indices of the array in row-major order.
    pub fn iter_indices(&self) -> IndicesIter<'_> {
        IndicesIter::new(self)
    }

    /// Returns a mutable iterator over the elements in row-major order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Creates a new array, checking that the data fits the shape.
    pub fn new<D, S>(data: D, shape: S) -> Result<Self, ShapeError>
    where
        Vec<T>: From<D>,
        Shape: From<S>,
    {
        let data = Vec::from(data);
        let shape = Shape::from(shape);

        if data.len() == shape.elements() {
            Ok(Self::new_unchecked(data, shape))
        } else {
            Err(ShapeError {
                shape,
                n: data.len(),
            })
        }
    }

    pub(crate) fn new_unchecked(data: Vec<T>, shape: Shape) -> Self {
        Self {
            data,
            strides: shape.strides(),
            shape,
        }
    }

    /// Returns the shape of the array.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

impl Array<f64> {
    /// Creates an array of zeros.
    pub fn from_zeros<S>(shape: S) -> Self
    where
        Shape: From<S>,
    {
        Self::from_element(0.0, shape)
    }
}

impl<T, I> Index<I> for Array<T>
where
    I: AsRef<[usize]>,
{
    type Output = T;

    fn index(&self, index: I) -> &Self::Output {
        self.get(index)
            .expect("index invalid dimension or out of bounds")
    }
}

impl<T, I> IndexMut<I> for Array<T>
where
    I: AsRef<[usize]>,
{
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        self.get_mut(index)
            .expect("index invalid dimension or out of bounds")
    }
}

/// An error associated with constructing an array from data that does not fit its shape.
#[derive(Debug)]
pub struct ShapeError {
    shape: Shape,
    n: usize,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ShapeError { shape, n } = self;
        write!(
            f,
            "cannot construct array with shape {shape} from {n} elements"
        )
    }
}

impl std::error::Error for ShapeError {}
