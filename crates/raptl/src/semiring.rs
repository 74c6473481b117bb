//! Semirings for generalized contraction.
//!
//! A semiring (S, ⊕, ⊗, 0, 1) provides:
//! - Additive monoid (S, ⊕, 0)
//! - Multiplicative monoid (S, ⊗, 1)
//!
//! Swapping the semiring changes what a contraction means: Boolean gives one
//! step of reachability, Counting ordinary matrix multiplication, Viterbi
//! best-path scores and MinPlus shortest paths.

use std::fmt::{self, Debug};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::einsum::semiring_einsum;
use crate::error::{RaptlError, RaptlResult};
use crate::tensor::Tensor;

/// A two-operation algebra plugged into [`semiring_einsum`].
///
/// Associativity of ⊕ and ⊗ and the identity laws are not checked at
/// runtime; every shipped instance satisfies them over its intended domain.
pub trait Semiring {
    /// Element type
    type Value: Clone + Debug + PartialEq;

    /// Registry name
    const NAME: &'static str;

    /// Additive identity: x ⊕ 0 = 0 ⊕ x = x
    fn zero() -> Self::Value;

    /// Multiplicative identity: x ⊗ 1 = 1 ⊗ x = x
    fn one() -> Self::Value;

    /// Semiring addition (⊕)
    fn add(a: &Self::Value, b: &Self::Value) -> Self::Value;

    /// Semiring multiplication (⊗)
    fn mul(a: &Self::Value, b: &Self::Value) -> Self::Value;

    /// Lift a plain number into the carrier
    fn from_number(x: f64) -> Self::Value;

    /// Project an element back to a plain number
    fn to_number(v: &Self::Value) -> f64;
}

// ============================================================================
// Shipped instances
// ============================================================================

/// OR / AND over `bool`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Boolean;

impl Semiring for Boolean {
    type Value = bool;
    const NAME: &'static str = "boolean";

    #[inline]
    fn zero() -> bool {
        false
    }

    #[inline]
    fn one() -> bool {
        true
    }

    #[inline]
    fn add(a: &bool, b: &bool) -> bool {
        *a || *b
    }

    #[inline]
    fn mul(a: &bool, b: &bool) -> bool {
        *a && *b
    }

    #[inline]
    fn from_number(x: f64) -> bool {
        x != 0.0
    }

    #[inline]
    fn to_number(v: &bool) -> f64 {
        if *v {
            1.0
        } else {
            0.0
        }
    }
}

/// Ordinary + / × over `f64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Counting;

impl Semiring for Counting {
    type Value = f64;
    const NAME: &'static str = "counting";

    #[inline]
    fn zero() -> f64 {
        0.0
    }

    #[inline]
    fn one() -> f64 {
        1.0
    }

    #[inline]
    fn add(a: &f64, b: &f64) -> f64 {
        a + b
    }

    #[inline]
    fn mul(a: &f64, b: &f64) -> f64 {
        a * b
    }

    #[inline]
    fn from_number(x: f64) -> f64 {
        x
    }

    #[inline]
    fn to_number(v: &f64) -> f64 {
        *v
    }
}

/// max / + over log-scores; zero is −∞
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viterbi;

impl Semiring for Viterbi {
    type Value = f64;
    const NAME: &'static str = "viterbi";

    #[inline]
    fn zero() -> f64 {
        f64::NEG_INFINITY
    }

    #[inline]
    fn one() -> f64 {
        0.0
    }

    #[inline]
    fn add(a: &f64, b: &f64) -> f64 {
        a.max(*b)
    }

    #[inline]
    fn mul(a: &f64, b: &f64) -> f64 {
        a + b
    }

    #[inline]
    fn from_number(x: f64) -> f64 {
        x
    }

    #[inline]
    fn to_number(v: &f64) -> f64 {
        *v
    }
}

/// min / + over path lengths; zero is +∞
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MinPlus;

impl Semiring for MinPlus {
    type Value = f64;
    const NAME: &'static str = "minplus";

    #[inline]
    fn zero() -> f64 {
        f64::INFINITY
    }

    #[inline]
    fn one() -> f64 {
        0.0
    }

    #[inline]
    fn add(a: &f64, b: &f64) -> f64 {
        a.min(*b)
    }

    #[inline]
    fn mul(a: &f64, b: &f64) -> f64 {
        a + b
    }

    #[inline]
    fn from_number(x: f64) -> f64 {
        x
    }

    #[inline]
    fn to_number(v: &f64) -> f64 {
        *v
    }
}

/// Noisy-OR / × over probabilities in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Probabilistic;

impl Semiring for Probabilistic {
    type Value = f64;
    const NAME: &'static str = "probabilistic";

    #[inline]
    fn zero() -> f64 {
        0.0
    }

    #[inline]
    fn one() -> f64 {
        1.0
    }

    #[inline]
    fn add(a: &f64, b: &f64) -> f64 {
        a + b - a * b
    }

    #[inline]
    fn mul(a: &f64, b: &f64) -> f64 {
        a * b
    }

    #[inline]
    fn from_number(x: f64) -> f64 {
        x.clamp(0.0, 1.0)
    }

    #[inline]
    fn to_number(v: &f64) -> f64 {
        *v
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Runtime handle on one of the shipped semirings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemiringKind {
    /// [`Boolean`]
    Boolean,
    /// [`Counting`]
    Counting,
    /// [`Viterbi`]
    Viterbi,
    /// [`MinPlus`]
    MinPlus,
    /// [`Probabilistic`]
    Probabilistic,
}

/// Every shipped semiring, in registration order
pub static SEMIRING_REGISTRY: [SemiringKind; 5] = [
    SemiringKind::Boolean,
    SemiringKind::Counting,
    SemiringKind::Viterbi,
    SemiringKind::MinPlus,
    SemiringKind::Probabilistic,
];

impl SemiringKind {
    /// Registry name
    pub fn name(self) -> &'static str {
        match self {
            SemiringKind::Boolean => Boolean::NAME,
            SemiringKind::Counting => Counting::NAME,
            SemiringKind::Viterbi => Viterbi::NAME,
            SemiringKind::MinPlus => MinPlus::NAME,
            SemiringKind::Probabilistic => Probabilistic::NAME,
        }
    }

    /// Case-insensitive registry lookup
    pub fn from_name(name: &str) -> RaptlResult<Self> {
        SEMIRING_REGISTRY
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| RaptlError::UnknownSemiring(name.to_string()))
    }

    /// Contract real-valued tensors under this semiring.
    ///
    /// Operands are lifted with `from_number`, contracted, and projected back
    /// with `to_number`.
    pub fn einsum(self, spec: &str, tensors: &[&Tensor<f64>]) -> RaptlResult<Tensor<f64>> {
        match self {
            SemiringKind::Boolean => numeric_einsum::<Boolean>(spec, tensors),
            SemiringKind::Counting => numeric_einsum::<Counting>(spec, tensors),
            SemiringKind::Viterbi => numeric_einsum::<Viterbi>(spec, tensors),
            SemiringKind::MinPlus => numeric_einsum::<MinPlus>(spec, tensors),
            SemiringKind::Probabilistic => numeric_einsum::<Probabilistic>(spec, tensors),
        }
    }
}

impl fmt::Display for SemiringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SemiringKind {
    type Err = RaptlError;

    fn from_str(s: &str) -> RaptlResult<Self> {
        Self::from_name(s)
    }
}

fn numeric_einsum<S: Semiring>(spec: &str, tensors: &[&Tensor<f64>]) -> RaptlResult<Tensor<f64>> {
    let lifted: Vec<Tensor<S::Value>> = tensors.iter().map(|t| t.map(|x| S::from_number(*x))).collect();
    let refs: Vec<&Tensor<S::Value>> = lifted.iter().collect();
    let out = semiring_einsum::<S>(spec, &refs)?;
    Ok(out.map(S::to_number))
}
