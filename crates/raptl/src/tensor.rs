//! Named-index tensors
//!
//! The base primitive every fact is built on: an n-dimensional array with
//! one name per axis. Storage is an [`ndarray::ArrayD`]; contraction lives
//! in [`crate::einsum`].

use ndarray::{ArrayD, IxDyn, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{RaptlError, RaptlResult};

/// Values whose sparsity can be measured
pub trait Nonzero {
    /// Whether this element counts towards `nnz`
    fn is_nonzero(&self) -> bool;
}

impl Nonzero for f64 {
    #[inline]
    fn is_nonzero(&self) -> bool {
        *self != 0.0
    }
}

impl Nonzero for bool {
    #[inline]
    fn is_nonzero(&self) -> bool {
        *self
    }
}

/// An n-dimensional array keyed by named indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawTensor<V>",
    bound(deserialize = "V: Deserialize<'de> + Clone")
)]
pub struct Tensor<V> {
    indices: Vec<String>,
    data: ArrayD<V>,
}

/// Wire form of [`Tensor`]; decoded values go through [`Tensor::new`]
#[derive(Deserialize)]
struct RawTensor<V> {
    indices: Vec<String>,
    data: ArrayD<V>,
}

impl<V: Clone> TryFrom<RawTensor<V>> for Tensor<V> {
    type Error = RaptlError;

    fn try_from(raw: RawTensor<V>) -> RaptlResult<Self> {
        Tensor::new(raw.indices, raw.data)
    }
}

/// Fail with the first axis on which `left` and `right` disagree.
///
/// `names` labels the axes of `left`.
pub(crate) fn ensure_shapes_match(
    names: &[String],
    left: &[usize],
    right: &[usize],
) -> RaptlResult<()> {
    if left.len() != right.len() {
        return Err(RaptlError::shape("rank", left.len(), right.len()));
    }
    for (axis, (l, r)) in left.iter().zip(right).enumerate() {
        if l != r {
            let name = names
                .get(axis)
                .cloned()
                .unwrap_or_else(|| format!("axis {}", axis));
            return Err(RaptlError::shape(name, *l, *r));
        }
    }
    Ok(())
}

impl<V: Clone> Tensor<V> {
    /// Wrap existing storage; one name is required per axis
    pub fn new<S: Into<String>>(
        indices: impl IntoIterator<Item = S>,
        data: ArrayD<V>,
    ) -> RaptlResult<Self> {
        let indices: Vec<String> = indices.into_iter().map(Into::into).collect();
        if indices.len() != data.ndim() {
            return Err(RaptlError::InvalidSpec(format!(
                "{} index names for a rank-{} array",
                indices.len(),
                data.ndim()
            )));
        }
        Ok(Self { indices, data })
    }

    /// Build from row-major values
    pub fn from_vec<S: Into<String>>(
        indices: impl IntoIterator<Item = S>,
        shape: &[usize],
        values: Vec<V>,
    ) -> RaptlResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(RaptlError::shape("elements", expected, values.len()));
        }
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|e| RaptlError::InvalidSpec(e.to_string()))?;
        Self::new(indices, data)
    }

    /// Tensor with every element set to `value`
    pub fn filled<S: Into<String>>(
        indices: impl IntoIterator<Item = S>,
        shape: &[usize],
        value: V,
    ) -> RaptlResult<Self> {
        Self::new(indices, ArrayD::from_elem(IxDyn(shape), value))
    }

    /// Axis names, in axis order
    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    /// Underlying array
    pub fn data(&self) -> &ArrayD<V> {
        &self.data
    }

    /// Extent of each axis
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Number of axes
    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Total element count
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when some axis has extent zero
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at a multi-index, `None` when out of bounds
    pub fn get(&self, index: &[usize]) -> Option<&V> {
        self.data.get(index)
    }

    /// Overwrite one element
    pub fn set(&mut self, index: &[usize], value: V) -> RaptlResult<()> {
        let shape = self.shape().to_vec();
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RaptlError::IndexOutOfBounds {
                index: index.to_vec(),
                shape,
            }),
        }
    }

    /// Elementwise map into a tensor with the same axis names
    pub fn map<W, F>(&self, f: F) -> Tensor<W>
    where
        F: Fn(&V) -> W,
    {
        Tensor {
            indices: self.indices.clone(),
            data: self.data.map(f),
        }
    }

    /// Fail unless `other` has exactly this tensor's shape
    pub fn check_same_shape<W>(&self, other: &Tensor<W>) -> RaptlResult<()> {
        ensure_shapes_match(&self.indices, self.data.shape(), other.data.shape())
    }

    /// Elementwise combination of two equally shaped tensors.
    ///
    /// Axis names are taken from `self`. Shapes must agree exactly; there is
    /// no broadcasting.
    pub fn zip_with<W, F>(&self, other: &Tensor<V>, f: F) -> RaptlResult<Tensor<W>>
    where
        F: Fn(&V, &V) -> W,
    {
        self.check_same_shape(other)?;
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|a, b| f(a, b));
        Ok(Tensor {
            indices: self.indices.clone(),
            data,
        })
    }

    /// Rename axes without touching the data
    pub fn with_indices<S: Into<String>>(
        self,
        indices: impl IntoIterator<Item = S>,
    ) -> RaptlResult<Self> {
        Self::new(indices, self.data)
    }
}

impl<V: Nonzero> Tensor<V> {
    /// Number of non-zero elements
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|v| v.is_nonzero()).count()
    }
}

impl Tensor<f64> {
    /// All-zero tensor
    pub fn zeros<S: Into<String>>(
        indices: impl IntoIterator<Item = S>,
        shape: &[usize],
    ) -> RaptlResult<Self> {
        Self::filled(indices, shape, 0.0)
    }

    /// All-one tensor
    pub fn ones<S: Into<String>>(
        indices: impl IntoIterator<Item = S>,
        shape: &[usize],
    ) -> RaptlResult<Self> {
        Self::filled(indices, shape, 1.0)
    }

    /// Tensor of uniform samples in `[0, 1)`
    pub fn random<S: Into<String>>(
        indices: impl IntoIterator<Item = S>,
        shape: &[usize],
    ) -> RaptlResult<Self> {
        let mut rng = rand::rng();
        let len: usize = shape.iter().product();
        let values = (0..len).map(|_| rng.random::<f64>()).collect();
        Self::from_vec(indices, shape, values)
    }

    /// Mean of all elements, `None` for an empty tensor
    pub fn mean(&self) -> Option<f64> {
        self.data.mean()
    }
}
