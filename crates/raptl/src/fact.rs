//! RAPTL facts and the derivation rules over them
//!
//! A fact is a triple product: a logic-valued tensor, a PLN truth value and
//! a resource profile, tagged with a usage modality. Facts are immutable;
//! every rule below returns a new fact and leaves its inputs untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::RaptlConfig;
use crate::error::RaptlResult;
use crate::modal::{ModalValue, Modality};
use crate::pln::{self, PlnTensor, TruthValue};
use crate::resources::{
    combine_resources_sequential, estimate_einsum_resources, estimate_tensor_resources,
    ResourceProfile,
};
use crate::semiring::SemiringKind;
use crate::tensor::Tensor;

/// Spec used by [`Reasoner::grandparent`]: compose a relation with itself
pub const TWO_HOP_SPEC: &str = "xy,yz->xz";

/// A logic tensor with its uncertainty, cost and usage discipline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaptlFact {
    id: String,
    logic: Tensor<f64>,
    uncertainty: TruthValue,
    resources: ResourceProfile,
    modality: Modality,
    depth: usize,
}

impl RaptlFact {
    /// Derivation label
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Logic-valued tensor
    pub fn logic(&self) -> &Tensor<f64> {
        &self.logic
    }

    /// PLN truth value of the whole fact
    pub fn uncertainty(&self) -> TruthValue {
        self.uncertainty
    }

    /// Estimated cost of producing this fact
    pub fn resources(&self) -> &ResourceProfile {
        &self.resources
    }

    /// Usage discipline
    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Inference hops between this fact and its base facts
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Per-element view: logic scaled by strength, uniform confidence
    pub fn to_pln_tensor(&self) -> PlnTensor {
        let strength = self.uncertainty.strength();
        PlnTensor::uniform(
            self.logic.map(|x| x * strength),
            self.uncertainty.confidence(),
        )
    }

    /// Wrap the fact under its own modality
    pub fn into_modal(self) -> ModalValue<RaptlFact> {
        let modality = self.modality;
        ModalValue::new(self, modality)
    }

    /// Render as JSON for diagnostics
    pub fn to_json(&self) -> RaptlResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Builds facts and derives new ones under a [`RaptlConfig`]
#[derive(Debug, Clone, Default)]
pub struct Reasoner {
    config: RaptlConfig,
}

impl Reasoner {
    /// Create a reasoner; the configuration is validated first
    pub fn new(config: RaptlConfig) -> RaptlResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &RaptlConfig {
        &self.config
    }

    /// Base fact under the configured default modality
    pub fn create_fact(
        &self,
        id: impl Into<String>,
        logic: Tensor<f64>,
        strength: f64,
        confidence: f64,
    ) -> RaptlFact {
        create_raptl_fact(id, logic, strength, confidence, self.config.default_modality)
    }

    /// Both facts hold: elementwise product, independent PLN conjunction
    pub fn conjunction(&self, f1: &RaptlFact, f2: &RaptlFact) -> RaptlResult<RaptlFact> {
        trace!(left = %f1.id, right = %f2.id, "Conjunction");
        f1.logic.check_same_shape(&f2.logic)?;
        let mut resources = self.charge(
            &combine_resources_sequential(&f1.resources, &f2.resources),
            ResourceProfile::elementwise_pass(&f1.logic),
        )?;
        let logic = f1.logic.zip_with(&f2.logic, |a, b| a * b)?;
        measure(&mut resources, &logic);
        Ok(self.derived(
            format!("{}∧{}", f1.id, f2.id),
            logic,
            pln::conjunction(&f1.uncertainty, &f2.uncertainty),
            resources,
            self.joint_modality(f1.modality, f2.modality),
            f1.depth.max(f2.depth),
        ))
    }

    /// Either fact holds. The result is an unresolved choice, so it is
    /// always tagged [`Modality::With`].
    pub fn disjunction(&self, f1: &RaptlFact, f2: &RaptlFact) -> RaptlResult<RaptlFact> {
        trace!(left = %f1.id, right = %f2.id, "Disjunction");
        f1.logic.check_same_shape(&f2.logic)?;
        let mut resources = self.charge(
            &combine_resources_sequential(&f1.resources, &f2.resources),
            ResourceProfile::elementwise_pass(&f1.logic),
        )?;
        let logic = f1.logic.zip_with(&f2.logic, |a, b| a + b)?;
        measure(&mut resources, &logic);
        Ok(self.derived(
            format!("{}∨{}", f1.id, f2.id),
            logic,
            pln::disjunction(&f1.uncertainty, &f2.uncertainty),
            resources,
            Modality::With,
            f1.depth.max(f2.depth),
        ))
    }

    /// Apply `rule` to `antecedent` by contracting them under `semiring`.
    ///
    /// The budget, if any, is checked against the estimated cost before any
    /// contraction happens. Confidence is discounted once per hop.
    pub fn implication(
        &self,
        rule: &RaptlFact,
        antecedent: &RaptlFact,
        spec: &str,
        semiring: SemiringKind,
    ) -> RaptlResult<RaptlFact> {
        trace!(rule = %rule.id, antecedent = %antecedent.id, spec, %semiring, "Implication");
        let operands = [&rule.logic, &antecedent.logic];
        let contraction = estimate_einsum_resources(spec, &operands)?;
        let mut resources = self.charge(
            &combine_resources_sequential(&rule.resources, &antecedent.resources),
            contraction,
        )?;

        let logic = semiring.einsum(spec, &operands)?;
        measure(&mut resources, &logic);

        Ok(self.derived(
            format!("{}⇒{}", antecedent.id, rule.id),
            logic,
            pln::deduction(
                &rule.uncertainty,
                &antecedent.uncertainty,
                self.config.deduction_discount,
            ),
            resources,
            self.joint_modality(rule.modality, antecedent.modality),
            rule.depth.max(antecedent.depth) + 1,
        ))
    }

    /// Binarize at `cutoff`: 1 where the logic value is at least `cutoff`.
    ///
    /// Strength becomes the fraction of ones; confidence pays the configured
    /// information-loss penalty.
    pub fn threshold(&self, fact: &RaptlFact, cutoff: f64) -> RaptlResult<RaptlFact> {
        trace!(fact = %fact.id, cutoff, "Threshold");
        let mut resources =
            self.charge(&fact.resources, ResourceProfile::elementwise_pass(&fact.logic))?;
        let logic = fact.logic.map(|&x| if x >= cutoff { 1.0 } else { 0.0 });
        measure(&mut resources, &logic);
        let strength = logic
            .mean()
            .unwrap_or_else(|| fact.uncertainty.strength());
        let confidence = fact.uncertainty.confidence() * (1.0 - self.config.threshold_penalty);
        Ok(self.derived(
            format!("H({})", fact.id),
            logic,
            TruthValue::new(strength, confidence),
            resources,
            fact.modality,
            fact.depth,
        ))
    }

    /// Two-hop composition of a binary relation with itself, under the
    /// Boolean semiring.
    pub fn grandparent(&self, parent: &RaptlFact) -> RaptlResult<RaptlFact> {
        let mut fact = self.implication(parent, parent, TWO_HOP_SPEC, SemiringKind::Boolean)?;
        fact.id = format!("grandparent({})", parent.id);
        Ok(fact)
    }

    /// Sequentially add `marginal` to `upstream` after checking the budget
    fn charge(
        &self,
        upstream: &ResourceProfile,
        marginal: ResourceProfile,
    ) -> RaptlResult<ResourceProfile> {
        let total = combine_resources_sequential(upstream, &marginal);
        if let Some(budget) = &self.config.budget {
            budget.check(&total)?;
        }
        Ok(total)
    }

    fn joint_modality(&self, a: Modality, b: Modality) -> Modality {
        if a == b {
            a
        } else {
            self.config.default_modality
        }
    }

    fn derived(
        &self,
        id: String,
        logic: Tensor<f64>,
        uncertainty: TruthValue,
        resources: ResourceProfile,
        modality: Modality,
        depth: usize,
    ) -> RaptlFact {
        debug!(
            id = %id,
            strength = uncertainty.strength(),
            confidence = uncertainty.confidence(),
            flops = resources.flops,
            hbm_bytes = resources.hbm_bytes,
            depth,
            "Derived fact"
        );
        RaptlFact {
            id,
            logic,
            uncertainty,
            resources,
            modality,
            depth,
        }
    }
}

/// Replace the assumed-dense sparsity of `resources` with that of `output`
fn measure(resources: &mut ResourceProfile, output: &Tensor<f64>) {
    let measured = estimate_tensor_resources(output);
    resources.density = measured.density;
    resources.nnz = measured.nnz;
}

/// Base fact; resources are seeded from the tensor's storage profile
pub fn create_raptl_fact(
    id: impl Into<String>,
    logic: Tensor<f64>,
    strength: f64,
    confidence: f64,
    modality: Modality,
) -> RaptlFact {
    let resources = estimate_tensor_resources(&logic);
    RaptlFact {
        id: id.into(),
        logic,
        uncertainty: TruthValue::new(strength, confidence),
        resources,
        modality,
        depth: 0,
    }
}

/// [`Reasoner::conjunction`] with the default configuration
pub fn raptl_conjunction(f1: &RaptlFact, f2: &RaptlFact) -> RaptlResult<RaptlFact> {
    Reasoner::default().conjunction(f1, f2)
}

/// [`Reasoner::disjunction`] with the default configuration
pub fn raptl_disjunction(f1: &RaptlFact, f2: &RaptlFact) -> RaptlResult<RaptlFact> {
    Reasoner::default().disjunction(f1, f2)
}

/// [`Reasoner::implication`] with the default configuration
pub fn raptl_implication(
    rule: &RaptlFact,
    antecedent: &RaptlFact,
    spec: &str,
    semiring: SemiringKind,
) -> RaptlResult<RaptlFact> {
    Reasoner::default().implication(rule, antecedent, spec, semiring)
}

/// [`Reasoner::threshold`] with the default configuration
pub fn raptl_threshold(fact: &RaptlFact, cutoff: f64) -> RaptlResult<RaptlFact> {
    Reasoner::default().threshold(fact, cutoff)
}

/// [`Reasoner::grandparent`] with the default configuration
pub fn raptl_grandparent(parent: &RaptlFact) -> RaptlResult<RaptlFact> {
    Reasoner::default().grandparent(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RaptlError;
    use crate::resources::ResourceBudget;

    fn vector(id: &str, values: Vec<f64>, s: f64, c: f64) -> RaptlFact {
        let n = values.len();
        create_raptl_fact(
            id,
            Tensor::from_vec(["x"], &[n], values).unwrap(),
            s,
            c,
            Modality::Linear,
        )
    }

    #[test]
    fn test_create_seeds_resources() {
        let f = vector("p", vec![1.0, 0.0, 1.0, 1.0], 0.9, 0.8);
        assert_eq!(f.resources().hbm_bytes, 32);
        assert_eq!(f.resources().nnz, 3);
        assert_eq!(f.resources().flops, 0);
        assert_eq!(f.depth(), 0);
        assert_eq!(f.modality(), Modality::Linear);
    }

    #[test]
    fn test_conjunction() {
        let a = vector("a", vec![1.0, 0.5, 0.0], 0.9, 0.8);
        let b = vector("b", vec![1.0, 1.0, 1.0], 0.5, 0.5);
        let ab = raptl_conjunction(&a, &b).unwrap();
        assert_eq!(ab.id(), "a∧b");
        assert_eq!(ab.logic().get(&[1]), Some(&0.5));
        assert!((ab.uncertainty().strength() - 0.45).abs() < 1e-12);
        assert!((ab.uncertainty().confidence() - 0.4).abs() < 1e-12);
        assert_eq!(ab.resources().flops, 3);
        // inputs untouched
        assert_eq!(a.logic().get(&[1]), Some(&0.5));
        assert_eq!(a.uncertainty().strength(), 0.9);
    }

    #[test]
    fn test_conjunction_shape_mismatch() {
        let a = vector("a", vec![1.0, 0.5], 0.9, 0.8);
        let b = vector("b", vec![1.0, 1.0, 1.0], 0.5, 0.5);
        assert!(matches!(
            raptl_conjunction(&a, &b),
            Err(RaptlError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_disjunction_is_a_choice() {
        let a = vector("a", vec![1.0, 0.0], 0.5, 0.9);
        let b = vector("b", vec![0.0, 1.0], 0.5, 0.3);
        let ab = raptl_disjunction(&a, &b).unwrap();
        assert_eq!(ab.id(), "a∨b");
        assert_eq!(ab.modality(), Modality::With);
        assert!((ab.uncertainty().strength() - 0.75).abs() < 1e-12);
        assert_eq!(ab.uncertainty().confidence(), 0.3);

        let mut choice = ab.into_modal();
        assert!(choice.use_value().is_ok());
        assert!(matches!(choice.use_value(), Err(RaptlError::ChoiceAlreadyMade)));
    }

    #[test]
    fn test_threshold() {
        let f = vector("f", vec![0.2, 0.7, 0.9, 0.4], 0.6, 0.8);
        let h = raptl_threshold(&f, 0.5).unwrap();
        assert_eq!(h.id(), "H(f)");
        assert_eq!(
            h.logic().data().iter().copied().collect::<Vec<_>>(),
            vec![0.0, 1.0, 1.0, 0.0]
        );
        assert!((h.uncertainty().strength() - 0.5).abs() < 1e-12);
        assert!(h.uncertainty().confidence() < f.uncertainty().confidence());
    }

    #[test]
    fn test_implication_compounds_uncertainty() {
        let rule = create_raptl_fact(
            "r",
            Tensor::from_vec(["x", "y"], &[2, 2], vec![1.0, 0.0, 0.0, 1.0]).unwrap(),
            1.0,
            1.0,
            Modality::Bang,
        );
        let ante = create_raptl_fact(
            "a",
            Tensor::from_vec(["y"], &[2], vec![0.0, 1.0]).unwrap(),
            1.0,
            1.0,
            Modality::Bang,
        );
        let out = raptl_implication(&rule, &ante, "xy,y->x", SemiringKind::Counting).unwrap();
        assert_eq!(out.logic().get(&[1]), Some(&1.0));
        assert!(out.uncertainty().confidence() < 1.0);
        assert_eq!(out.depth(), 1);
        assert_eq!(out.modality(), Modality::Bang);
        // 2 * 2 points, 3 ops each
        assert_eq!(out.resources().flops, 12);
    }

    #[test]
    fn test_budget_rejects_before_contracting() {
        let reasoner = Reasoner::new(RaptlConfig {
            budget: Some(ResourceBudget::new(10, u64::MAX)),
            ..RaptlConfig::default()
        })
        .unwrap();
        let rel = reasoner.create_fact("p", Tensor::ones(["x", "y"], &[3, 3]).unwrap(), 1.0, 1.0);
        assert!(matches!(
            reasoner.grandparent(&rel),
            Err(RaptlError::BudgetExceeded { resource: "flops", .. })
        ));
    }

    #[test]
    fn test_elementwise_rules_charge_budget_first() {
        let reasoner = Reasoner::new(RaptlConfig {
            budget: Some(ResourceBudget::new(2, u64::MAX)),
            ..RaptlConfig::default()
        })
        .unwrap();
        let a = vector("a", vec![1.0, 0.5, 0.0], 0.9, 0.8);
        let b = vector("b", vec![1.0, 1.0, 1.0], 0.5, 0.5);

        for result in [
            reasoner.conjunction(&a, &b),
            reasoner.disjunction(&a, &b),
            reasoner.threshold(&a, 0.5),
        ] {
            assert!(matches!(
                result,
                Err(RaptlError::BudgetExceeded { resource: "flops", estimated: 3, limit: 2 })
            ));
        }

        // shape errors win over budget errors
        let short = vector("s", vec![1.0, 0.0], 0.5, 0.5);
        assert!(matches!(
            reasoner.conjunction(&a, &short),
            Err(RaptlError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_elementwise_rules_measure_output_sparsity() {
        let a = vector("a", vec![1.0, 0.5, 0.0], 0.9, 0.8);
        let b = vector("b", vec![1.0, 0.0, 1.0], 0.5, 0.5);
        let ab = raptl_conjunction(&a, &b).unwrap();
        assert_eq!(ab.resources().nnz, 1);
        assert!((ab.resources().density - 1.0 / 3.0).abs() < 1e-12);

        let h = raptl_threshold(&a, 0.75).unwrap();
        assert_eq!(h.resources().nnz, 1);
        assert_eq!(h.resources().flops, 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RaptlConfig {
            threshold_penalty: 2.0,
            ..RaptlConfig::default()
        };
        assert!(Reasoner::new(config).is_err());
    }

    #[test]
    fn test_to_json() {
        let f = vector("p", vec![1.0], 0.9, 0.8);
        let json = f.to_json().unwrap();
        assert!(json.contains("\"id\":\"p\""));
        assert!(json.contains("\"modality\":\"linear\""));
    }
}
