//! # RAPTL - Resource-Aware Probabilistic Tensor Logic
//!
//! Every value computed by this crate carries three orthogonal facets:
//!
//! - **Logic**: a tensor whose contraction is parameterized by a semiring
//! - **Uncertainty**: a PLN `(strength, confidence)` truth value
//! - **Resources**: a static cost estimate, plus a linear-logic modality
//!   governing how many times the value may be consumed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RAPTL FACTS                            │
//! │   conjunction │ disjunction │ implication │ threshold       │
//! └─────────────────────────────────────────────────────────────┘
//!        │                  │                    │
//!        ▼                  ▼                    ▼
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐
//! │  SEMIRING    │  │  PLN TRUTH   │  │  RESOURCE PROFILE    │
//! │  EINSUM      │  │  VALUES      │  │  seq / par combine   │
//! └──────────────┘  └──────────────┘  └──────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              MODAL WRAPPER (linear/affine/!/&)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use raptl::{create_raptl_fact, raptl_grandparent, Modality, Tensor};
//!
//! // A -> B, B -> C
//! let parent = Tensor::from_vec(
//!     ["x", "y"],
//!     &[3, 3],
//!     vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
//! )
//! .unwrap();
//! let fact = create_raptl_fact("parent", parent, 0.95, 0.9, Modality::Linear);
//!
//! let grandparent = raptl_grandparent(&fact).unwrap();
//! assert_eq!(grandparent.logic().get(&[0, 2]), Some(&1.0));
//! assert!(grandparent.uncertainty().confidence() < 0.9);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod einsum;
pub mod fact;
pub mod modal;
pub mod pln;
pub mod resources;
pub mod semiring;
pub mod tensor;

mod config;
mod error;

pub use config::RaptlConfig;
pub use einsum::{semiring_einsum, EinsumSpec};
pub use error::{RaptlError, RaptlResult};
pub use fact::{
    create_raptl_fact, raptl_conjunction, raptl_disjunction, raptl_grandparent,
    raptl_implication, raptl_threshold, RaptlFact, Reasoner,
};
pub use modal::{ModalValue, Modality, UsageState};
pub use pln::{PlnTensor, TruthValue};
pub use resources::{ResourceBudget, ResourceProfile};
pub use semiring::{Semiring, SemiringKind, SEMIRING_REGISTRY};
pub use tensor::Tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::RaptlConfig;
    pub use crate::error::{RaptlError, RaptlResult};
    pub use crate::fact::{RaptlFact, Reasoner};
    pub use crate::modal::{ModalValue, Modality};
    pub use crate::pln::{PlnTensor, TruthValue};
    pub use crate::resources::{ResourceBudget, ResourceProfile};
    pub use crate::semiring::{
        Boolean, Counting, MinPlus, Probabilistic, Semiring, SemiringKind, Viterbi,
    };
    pub use crate::tensor::Tensor;
}
