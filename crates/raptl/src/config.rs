//! Reasoner configuration

use serde::{Deserialize, Serialize};

use crate::error::{RaptlError, RaptlResult};
use crate::modal::Modality;
use crate::resources::ResourceBudget;

/// Tunables for [`crate::Reasoner`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaptlConfig {
    /// Fraction of confidence lost when a fact is binarized
    pub threshold_penalty: f64,

    /// Confidence multiplier applied on every deduction hop
    pub deduction_discount: f64,

    /// Modality given to facts created without an explicit one
    pub default_modality: Modality,

    /// Optional cost ceiling checked before each derivation
    pub budget: Option<ResourceBudget>,
}

impl Default for RaptlConfig {
    fn default() -> Self {
        Self {
            threshold_penalty: 0.05,
            deduction_discount: 0.9,
            default_modality: Modality::Linear,
            budget: None,
        }
    }
}

impl RaptlConfig {
    /// Budgeted configuration for constrained hosts
    pub fn strict() -> Self {
        Self {
            budget: Some(ResourceBudget::new(1 << 24, 64 << 20)),
            ..Self::default()
        }
    }

    /// Load configuration from TOML
    pub fn from_toml(content: &str) -> RaptlResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> RaptlResult<()> {
        if !(self.threshold_penalty > 0.0 && self.threshold_penalty < 1.0) {
            return Err(RaptlError::InvalidConfig(
                "threshold_penalty must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }
        if !(self.deduction_discount > 0.0 && self.deduction_discount < 1.0) {
            return Err(RaptlError::InvalidConfig(
                "deduction_discount must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RaptlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_modality, Modality::Linear);
        assert!(config.budget.is_none());
    }

    #[test]
    fn test_strict_config() {
        let config = RaptlConfig::strict();
        assert!(config.validate().is_ok());
        assert!(config.budget.is_some());
    }

    #[test]
    fn test_validation() {
        let mut config = RaptlConfig::default();
        config.threshold_penalty = 0.0;
        assert!(config.validate().is_err());

        config = RaptlConfig::default();
        config.deduction_discount = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = RaptlConfig::strict();
        let toml = config.to_toml().unwrap();
        let parsed = RaptlConfig::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml() {
        let parsed = RaptlConfig::from_toml(
            r#"
            threshold_penalty = 0.2
            default_modality = "affine"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.threshold_penalty, 0.2);
        assert_eq!(parsed.default_modality, Modality::Affine);
        assert_eq!(parsed.deduction_discount, 0.9);

        assert!(RaptlConfig::from_toml("threshold_penalty = 1.5").is_err());
    }
}
