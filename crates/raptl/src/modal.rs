//! Linear-logic usage disciplines
//!
//! A [`ModalValue`] wraps one value and tracks how often it may still be
//! consumed:
//!
//! | modality | `use_value`            | `discard`         |
//! |----------|------------------------|-------------------|
//! | linear   | once                   | never while unused|
//! | affine   | at most once           | allowed once      |
//! | bang     | unlimited, deep copies | not allowed       |
//! | with     | commits a choice, once | allowed once      |
//!
//! `use_value` is not idempotent; a wrapper must have a single owner.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{RaptlError, RaptlResult};

/// Usage discipline tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Exactly once
    #[default]
    Linear,
    /// At most once
    Affine,
    /// Any number of times (`!A`)
    Bang,
    /// Internal choice (`A & B`), committed on use
    With,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modality::Linear => "linear",
            Modality::Affine => "affine",
            Modality::Bang => "bang",
            Modality::With => "with",
        };
        f.write_str(name)
    }
}

/// Lifecycle state of a [`ModalValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageState {
    /// Not yet used
    Available,
    /// Used or discarded
    Consumed,
    /// Bang values never change state
    Unlimited,
}

/// A value under a usage discipline
pub struct ModalValue<T> {
    value: Option<T>,
    modality: Modality,
    state: UsageState,
}

impl<T> ModalValue<T> {
    /// Wrap `value` under `modality`
    pub fn new(value: T, modality: Modality) -> Self {
        let state = match modality {
            Modality::Bang => UsageState::Unlimited,
            _ => UsageState::Available,
        };
        Self {
            value: Some(value),
            modality,
            state,
        }
    }

    /// Must be used exactly once
    pub fn linear(value: T) -> Self {
        Self::new(value, Modality::Linear)
    }

    /// May be used once or dropped
    pub fn affine(value: T) -> Self {
        Self::new(value, Modality::Affine)
    }

    /// Unlimited reuse; each use yields a copy
    pub fn bang(value: T) -> Self {
        Self::new(value, Modality::Bang)
    }

    /// An unresolved choice
    pub fn with_choice(value: T) -> Self {
        Self::new(value, Modality::With)
    }

    /// Discipline tag
    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Current lifecycle state
    pub fn state(&self) -> UsageState {
        self.state
    }

    /// Whether `use_value` would succeed. Pure query.
    pub fn can_use(&self) -> bool {
        self.state != UsageState::Consumed
    }

    /// Peek without consuming
    pub fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Drop the value without using it.
    ///
    /// Only affine and with values support weakening.
    pub fn discard(&mut self) -> RaptlResult<()> {
        match (self.modality, self.state) {
            (Modality::Bang, _) => Err(RaptlError::DiscardNotAllowed(Modality::Bang)),
            (Modality::Linear, UsageState::Available) => Err(RaptlError::LinearMustBeUsed),
            (Modality::With, UsageState::Consumed) => Err(RaptlError::ChoiceAlreadyMade),
            (modality, UsageState::Consumed) => Err(RaptlError::UseAfterConsume(modality)),
            (modality, _) => {
                trace!(%modality, "Discarding modal value");
                self.value = None;
                self.state = UsageState::Consumed;
                Ok(())
            }
        }
    }

    /// Move the value out, ending the wrapper.
    ///
    /// Counts as the single use for linear, affine and with values.
    pub fn into_inner(mut self) -> RaptlResult<T> {
        self.check_usable()?;
        self.state = match self.modality {
            Modality::Bang => UsageState::Unlimited,
            _ => UsageState::Consumed,
        };
        self.value
            .take()
            .ok_or(RaptlError::UseAfterConsume(self.modality))
    }

    fn check_usable(&self) -> RaptlResult<()> {
        match (self.modality, self.state) {
            (Modality::With, UsageState::Consumed) => Err(RaptlError::ChoiceAlreadyMade),
            (modality, UsageState::Consumed) => Err(RaptlError::UseAfterConsume(modality)),
            _ => Ok(()),
        }
    }
}

impl<T: Clone> ModalValue<T> {
    /// Consume the value according to the discipline.
    ///
    /// Bang values hand out an independent clone and stay usable; the others
    /// move their value out and become consumed.
    pub fn use_value(&mut self) -> RaptlResult<T> {
        self.check_usable()?;
        match self.modality {
            Modality::Bang => self
                .value
                .clone()
                .ok_or(RaptlError::UseAfterConsume(Modality::Bang)),
            modality => {
                trace!(%modality, "Using modal value");
                self.state = UsageState::Consumed;
                self.value.take().ok_or(RaptlError::UseAfterConsume(modality))
            }
        }
    }
}

impl<T> Drop for ModalValue<T> {
    fn drop(&mut self) {
        if self.modality == Modality::Linear && self.state == UsageState::Available {
            warn!("Linear value dropped without being used");
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ModalValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalValue")
            .field("modality", &self.modality)
            .field("state", &self.state)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_exactly_once() {
        let mut v = ModalValue::linear(42);
        assert!(v.can_use());
        assert_eq!(v.use_value().unwrap(), 42);
        assert!(!v.can_use());
        assert!(matches!(
            v.use_value(),
            Err(RaptlError::UseAfterConsume(Modality::Linear))
        ));
    }

    #[test]
    fn test_linear_cannot_be_discarded() {
        let mut v = ModalValue::linear("token".to_string());
        assert!(matches!(v.discard(), Err(RaptlError::LinearMustBeUsed)));
        assert_eq!(v.state(), UsageState::Available);
        assert_eq!(v.use_value().unwrap(), "token");
    }

    #[test]
    fn test_affine_discard() {
        let mut v = ModalValue::affine(1.5);
        v.discard().unwrap();
        assert_eq!(v.state(), UsageState::Consumed);
        assert!(v.peek().is_none());
        assert!(v.use_value().is_err());
        assert!(v.discard().is_err());
    }

    #[test]
    fn test_affine_single_use() {
        let mut v = ModalValue::affine(7);
        assert_eq!(v.use_value().unwrap(), 7);
        assert!(matches!(
            v.use_value(),
            Err(RaptlError::UseAfterConsume(Modality::Affine))
        ));
    }

    #[test]
    fn test_bang_copies_are_independent() {
        let mut v = ModalValue::bang(vec![1, 2, 3]);
        let mut first = v.use_value().unwrap();
        first.push(4);
        let mut second = v.use_value().unwrap();
        assert_eq!(second, vec![1, 2, 3]);
        second.clear();
        let third = v.use_value().unwrap();
        assert_eq!(third, vec![1, 2, 3]);
        assert_eq!(v.state(), UsageState::Unlimited);
        assert!(matches!(
            v.discard(),
            Err(RaptlError::DiscardNotAllowed(Modality::Bang))
        ));
    }

    #[test]
    fn test_with_choice_commits_once() {
        let mut v = ModalValue::with_choice('a');
        assert_eq!(v.use_value().unwrap(), 'a');
        assert!(matches!(v.use_value(), Err(RaptlError::ChoiceAlreadyMade)));

        let mut w = ModalValue::with_choice('b');
        w.discard().unwrap();
        assert!(matches!(w.discard(), Err(RaptlError::ChoiceAlreadyMade)));
    }

    #[test]
    fn test_into_inner_moves_value() {
        let v = ModalValue::linear(String::from("moved"));
        assert_eq!(v.into_inner().unwrap(), "moved");

        let mut w = ModalValue::affine(3);
        w.discard().unwrap();
        assert!(w.into_inner().is_err());
    }

    #[test]
    fn test_dropping_unused_linear_does_not_panic() {
        let v = ModalValue::linear(0u8);
        drop(v);
    }
}
