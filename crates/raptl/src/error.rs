//! Error types for the RAPTL engine

use thiserror::Error;

use crate::modal::Modality;

/// Result type for RAPTL operations
pub type RaptlResult<T> = Result<T, RaptlError>;

/// Errors that can occur while building or combining facts
#[derive(Error, Debug)]
pub enum RaptlError {
    /// Two operands disagree on the extent of a shared axis
    #[error("Shape mismatch on '{index}': {left} vs {right}")]
    ShapeMismatch {
        /// Axis letter or description of the disagreeing dimension
        index: String,
        /// Extent seen first
        left: usize,
        /// Conflicting extent
        right: usize,
    },

    /// Malformed contraction spec or operand/rank disagreement
    #[error("Invalid einsum spec: {0}")]
    InvalidSpec(String),

    /// Element access outside the tensor's shape
    #[error("Index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds {
        /// Requested multi-index
        index: Vec<usize>,
        /// Shape of the tensor
        shape: Vec<usize>,
    },

    /// Registry lookup by a name that is not shipped
    #[error("Unknown semiring: {0}")]
    UnknownSemiring(String),

    /// `use` on a value whose single permitted use is already spent
    #[error("Use after consume: {0:?} value already consumed")]
    UseAfterConsume(Modality),

    /// `discard` on an unused linear value
    #[error("Linear value must be used exactly once and cannot be discarded")]
    LinearMustBeUsed,

    /// Second commitment on a `with` choice
    #[error("Choice already made")]
    ChoiceAlreadyMade,

    /// `discard` on a modality without weakening
    #[error("Discard not allowed for {0:?} values")]
    DiscardNotAllowed(Modality),

    /// Estimated cost exceeds the configured budget
    #[error("Resource budget exceeded: {resource} {estimated} > {limit}")]
    BudgetExceeded {
        /// Which dimension of the budget was exceeded
        resource: &'static str,
        /// Estimated consumption
        estimated: u64,
        /// Configured limit
        limit: u64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// TOML configuration could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl RaptlError {
    /// Helper to create a `ShapeMismatch` error.
    pub fn shape(index: impl Into<String>, left: usize, right: usize) -> Self {
        RaptlError::ShapeMismatch {
            index: index.into(),
            left,
            right,
        }
    }

    /// Whether the error comes from the linear-logic usage discipline.
    pub fn is_modality_violation(&self) -> bool {
        matches!(
            self,
            RaptlError::UseAfterConsume(_)
                | RaptlError::LinearMustBeUsed
                | RaptlError::ChoiceAlreadyMade
                | RaptlError::DiscardNotAllowed(_)
        )
    }
}
