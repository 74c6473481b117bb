//! PLN truth values
//!
//! A truth value is a `(strength, confidence)` pair. Strength is the graded
//! degree of belief, confidence the weight of evidence behind it. Both live
//! in `[0, 1]`; constructors clamp rather than reject.

use ndarray::{ArrayD, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{RaptlError, RaptlResult};
use crate::tensor::{ensure_shapes_match, Tensor};

/// Evidence-weighted belief
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTruth")]
pub struct TruthValue {
    strength: f64,
    confidence: f64,
}

/// Wire form of [`TruthValue`]; decoding clamps like [`TruthValue::new`]
#[derive(Deserialize)]
struct RawTruth {
    strength: f64,
    confidence: f64,
}

impl From<RawTruth> for TruthValue {
    fn from(raw: RawTruth) -> Self {
        TruthValue::new(raw.strength, raw.confidence)
    }
}

impl TruthValue {
    /// Create a truth value, clamping both components into `[0, 1]`
    pub fn new(strength: f64, confidence: f64) -> Self {
        Self {
            strength: clamp_unit(strength),
            confidence: clamp_unit(confidence),
        }
    }

    /// Certain truth
    pub fn certain() -> Self {
        Self::new(1.0, 1.0)
    }

    /// No evidence either way
    pub fn unknown() -> Self {
        Self::new(0.5, 0.0)
    }

    /// From evidence counts: `s = positive / total`, `c = total / (total + k)`
    pub fn from_evidence(positive: f64, total: f64, k: f64) -> Self {
        if total <= 0.0 {
            return Self::new(0.5, 0.0);
        }
        Self::new(positive / total, total / (total + k))
    }

    /// Strength component
    pub fn strength(&self) -> f64 {
        self.strength
    }

    /// Confidence component
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Confidence-weighted strength, pulled towards 0.5 as evidence vanishes
    pub fn expectation(&self) -> f64 {
        self.confidence * self.strength + (1.0 - self.confidence) * 0.5
    }
}

impl Default for TruthValue {
    fn default() -> Self {
        Self::unknown()
    }
}

fn clamp_unit(x: f64) -> f64 {
    // NaN is left alone so degenerate revision stays observable
    if x.is_nan() {
        x
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Conjunction under an independence assumption
pub fn conjunction(a: &TruthValue, b: &TruthValue) -> TruthValue {
    TruthValue::new(a.strength * b.strength, a.confidence * b.confidence)
}

/// Inclusion–exclusion disjunction; confidence bounded by the weaker premise
pub fn disjunction(a: &TruthValue, b: &TruthValue) -> TruthValue {
    TruthValue::new(
        a.strength + b.strength - a.strength * b.strength,
        a.confidence.min(b.confidence),
    )
}

/// Negation flips strength and keeps confidence
pub fn negation(a: &TruthValue) -> TruthValue {
    TruthValue::new(1.0 - a.strength, a.confidence)
}

/// Merge two independent bodies of evidence about the same statement.
///
/// Strength is the confidence-weighted mean. Confidence is
/// `(c1 + c2) / (c1 + c2 + 1)`, which approaches but never reaches 1.
/// With both confidences zero the strength is NaN; callers must guard.
pub fn revision(a: &TruthValue, b: &TruthValue) -> TruthValue {
    let weight = a.confidence + b.confidence;
    TruthValue {
        strength: (a.strength * a.confidence + b.strength * b.confidence) / weight,
        confidence: weight / (weight + 1.0),
    }
}

/// One deduction hop: `rule` applied to `premise`.
///
/// Confidence is discounted by `discount` on every hop, so a chain of
/// inferences is never more certain than its weakest link.
pub fn deduction(rule: &TruthValue, premise: &TruthValue, discount: f64) -> TruthValue {
    TruthValue::new(
        rule.strength * premise.strength,
        rule.confidence * premise.confidence * discount,
    )
}

// ============================================================================
// Tensor-valued truth
// ============================================================================

/// Confidence attached to a [`PlnTensor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Confidence {
    /// One confidence for every element
    Uniform(f64),
    /// One confidence per element, shaped like the strengths
    PerElement(ArrayD<f64>),
}

/// A tensor of strengths with parallel confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlnTensor")]
pub struct PlnTensor {
    strengths: Tensor<f64>,
    confidence: Confidence,
}

#[derive(Deserialize)]
struct RawPlnTensor {
    strengths: Tensor<f64>,
    confidence: Confidence,
}

impl TryFrom<RawPlnTensor> for PlnTensor {
    type Error = RaptlError;

    fn try_from(raw: RawPlnTensor) -> RaptlResult<Self> {
        match raw.confidence {
            Confidence::Uniform(c) => Ok(PlnTensor::uniform(raw.strengths, c)),
            Confidence::PerElement(cs) => PlnTensor::per_element(raw.strengths, cs),
        }
    }
}

impl PlnTensor {
    /// Uniform-confidence tensor; strengths and confidence are clamped
    pub fn uniform(strengths: Tensor<f64>, confidence: f64) -> Self {
        Self {
            strengths: strengths.map(|s| clamp_unit(*s)),
            confidence: Confidence::Uniform(clamp_unit(confidence)),
        }
    }

    /// Per-element confidence; shapes must agree
    pub fn per_element(strengths: Tensor<f64>, confidence: ArrayD<f64>) -> RaptlResult<Self> {
        ensure_shapes_match(strengths.indices(), strengths.shape(), confidence.shape())?;
        Ok(Self {
            strengths: strengths.map(|s| clamp_unit(*s)),
            confidence: Confidence::PerElement(confidence.mapv(clamp_unit)),
        })
    }

    /// Strength tensor
    pub fn strengths(&self) -> &Tensor<f64> {
        &self.strengths
    }

    /// Confidence representation
    pub fn confidence(&self) -> &Confidence {
        &self.confidence
    }

    /// Truth value of one element
    pub fn truth_at(&self, index: &[usize]) -> Option<TruthValue> {
        let strength = *self.strengths.get(index)?;
        let confidence = match &self.confidence {
            Confidence::Uniform(c) => *c,
            Confidence::PerElement(cs) => *cs.get(index)?,
        };
        Some(TruthValue::new(strength, confidence))
    }

    /// Mean strength and mean confidence; `unknown` for an empty tensor
    pub fn summary(&self) -> TruthValue {
        let Some(strength) = self.strengths.mean() else {
            return TruthValue::unknown();
        };
        let confidence = match &self.confidence {
            Confidence::Uniform(c) => *c,
            Confidence::PerElement(cs) => cs.mean().unwrap_or(0.0),
        };
        TruthValue::new(strength, confidence)
    }
}

/// Elementwise conjunction of two truth tensors
pub fn pln_tensor_conjunction(a: &PlnTensor, b: &PlnTensor) -> RaptlResult<PlnTensor> {
    let strengths = a.strengths.zip_with(&b.strengths, |x, y| x * y)?;
    let confidence = match (&a.confidence, &b.confidence) {
        (Confidence::Uniform(x), Confidence::Uniform(y)) => Confidence::Uniform(x * y),
        (Confidence::Uniform(x), Confidence::PerElement(ys))
        | (Confidence::PerElement(ys), Confidence::Uniform(x)) => {
            Confidence::PerElement(ys.mapv(|y| x * y))
        }
        (Confidence::PerElement(xs), Confidence::PerElement(ys)) => {
            Confidence::PerElement(Zip::from(xs).and(ys).map_collect(|x, y| x * y))
        }
    };
    Ok(PlnTensor {
        strengths,
        confidence,
    })
}
