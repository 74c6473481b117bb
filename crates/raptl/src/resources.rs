//! Static resource estimates
//!
//! Coarse upper bounds on compute and memory, attached to every fact. These
//! are estimates derived from shapes, not measurements.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::einsum::EinsumSpec;
use crate::error::{RaptlError, RaptlResult};
use crate::tensor::{Nonzero, Tensor};

/// Bytes charged per tensor element
pub const BYTES_PER_ELEMENT: u64 = 8;

/// Cost vector of a value or an operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    /// Arithmetic operations
    pub flops: u64,
    /// Memory footprint in bytes
    pub hbm_bytes: u64,
    /// `nnz / elements`; 1.0 when unmeasured
    pub density: f64,
    /// Number of indices
    pub rank: usize,
    /// Non-zero element count
    pub nnz: u64,
}

impl Default for ResourceProfile {
    fn default() -> Self {
        Self {
            flops: 0,
            hbm_bytes: 0,
            density: 1.0,
            rank: 0,
            nnz: 0,
        }
    }
}

impl ResourceProfile {
    /// Cost of one elementwise pass over a tensor shaped like `operand`.
    ///
    /// Depends only on the shape, so it can be charged before the pass runs.
    /// The output is assumed dense.
    pub fn elementwise_pass<V: Clone>(operand: &Tensor<V>) -> Self {
        let elements = operand.len() as u64;
        Self {
            flops: elements,
            hbm_bytes: elements.saturating_mul(BYTES_PER_ELEMENT),
            density: 1.0,
            rank: operand.rank(),
            nnz: elements,
        }
    }
}

/// Storage profile of a tensor; computing it is free, so `flops` is zero
pub fn estimate_tensor_resources<V: Nonzero + Clone>(t: &Tensor<V>) -> ResourceProfile {
    let elements = t.len() as u64;
    let nnz = t.count_nonzero() as u64;
    ResourceProfile {
        flops: 0,
        hbm_bytes: elements.saturating_mul(BYTES_PER_ELEMENT),
        density: if elements == 0 {
            1.0
        } else {
            nnz as f64 / elements as f64
        },
        rank: t.rank(),
        nnz,
    }
}

/// Cost of contracting `tensors` according to `spec`.
///
/// Every point of the full iteration space costs one multiply per operand
/// plus one add. Memory is every operand plus the output. The output is
/// assumed dense.
pub fn estimate_einsum_resources<V: Nonzero + Clone>(
    spec: &str,
    tensors: &[&Tensor<V>],
) -> RaptlResult<ResourceProfile> {
    let parsed = EinsumSpec::parse(spec)?;
    let shapes: Vec<&[usize]> = tensors.iter().map(|t| t.shape()).collect();
    let extents = parsed.extents(&shapes)?;
    let letters = parsed.letters();

    // Iteration spaces easily exceed u64; saturate so budgets still reject them
    let points = saturating_product(extents.iter().map(|&e| e as u64));
    let per_point = (tensors.len() as u64).saturating_add(1);

    let input_bytes = tensors.iter().fold(0u64, |acc, t| {
        acc.saturating_add((t.len() as u64).saturating_mul(BYTES_PER_ELEMENT))
    });
    let output_elements = saturating_product(
        parsed
            .output()
            .iter()
            .filter_map(|l| letters.iter().position(|m| m == l))
            .map(|slot| extents[slot] as u64),
    );

    Ok(ResourceProfile {
        flops: points.saturating_mul(per_point),
        hbm_bytes: input_bytes
            .saturating_add(output_elements.saturating_mul(BYTES_PER_ELEMENT)),
        density: 1.0,
        rank: parsed.output().len(),
        nnz: output_elements,
    })
}

fn saturating_product(factors: impl Iterator<Item = u64>) -> u64 {
    factors.fold(1u64, |acc, f| acc.saturating_mul(f))
}

/// `a` then `b`: work adds up, memory peaks.
///
/// Earlier buffers are assumed freed, so the footprint is the larger of the
/// two. Sparsity and rank describe the final step's output.
pub fn combine_resources_sequential(a: &ResourceProfile, b: &ResourceProfile) -> ResourceProfile {
    ResourceProfile {
        flops: a.flops.saturating_add(b.flops),
        hbm_bytes: a.hbm_bytes.max(b.hbm_bytes),
        density: b.density,
        rank: b.rank,
        nnz: b.nnz,
    }
}

/// `a` alongside `b`: bound by the slower branch, both buffers coexist
pub fn combine_resources_parallel(a: &ResourceProfile, b: &ResourceProfile) -> ResourceProfile {
    let hbm_bytes = a.hbm_bytes.saturating_add(b.hbm_bytes);
    let density = if hbm_bytes == 0 {
        1.0
    } else {
        (a.density * a.hbm_bytes as f64 + b.density * b.hbm_bytes as f64) / hbm_bytes as f64
    };
    ResourceProfile {
        flops: a.flops.max(b.flops),
        hbm_bytes,
        density,
        rank: a.rank.max(b.rank),
        nnz: a.nnz.saturating_add(b.nnz),
    }
}

/// Ceiling on estimated cost, checked before an operation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceBudget {
    /// Maximum operations, unlimited when `None`
    pub max_flops: Option<u64>,
    /// Maximum bytes, unlimited when `None`
    pub max_hbm_bytes: Option<u64>,
}

impl ResourceBudget {
    /// Budget with both limits set
    pub fn new(max_flops: u64, max_hbm_bytes: u64) -> Self {
        Self {
            max_flops: Some(max_flops),
            max_hbm_bytes: Some(max_hbm_bytes),
        }
    }

    /// Fail if `profile` exceeds either limit
    pub fn check(&self, profile: &ResourceProfile) -> RaptlResult<()> {
        if let Some(limit) = self.max_flops {
            if profile.flops > limit {
                debug!(estimated = profile.flops, limit, "Flop budget exceeded");
                return Err(RaptlError::BudgetExceeded {
                    resource: "flops",
                    estimated: profile.flops,
                    limit,
                });
            }
        }
        if let Some(limit) = self.max_hbm_bytes {
            if profile.hbm_bytes > limit {
                debug!(estimated = profile.hbm_bytes, limit, "Memory budget exceeded");
                return Err(RaptlError::BudgetExceeded {
                    resource: "hbm_bytes",
                    estimated: profile.hbm_bytes,
                    limit,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(flops: u64, hbm_bytes: u64) -> ResourceProfile {
        ResourceProfile {
            flops,
            hbm_bytes,
            ..ResourceProfile::default()
        }
    }

    #[test]
    fn test_tensor_estimate() {
        let t = Tensor::from_vec(["i", "j"], &[2, 3], vec![0.0, 1.0, 0.0, 2.0, 0.0, 0.0]).unwrap();
        let r = estimate_tensor_resources(&t);
        assert_eq!(r.hbm_bytes, 48);
        assert_eq!(r.nnz, 2);
        assert_eq!(r.rank, 2);
        assert!((r.density - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(r.flops, 0);
    }

    #[test]
    fn test_einsum_estimate() {
        let a = Tensor::<f64>::ones(["i", "j"], &[2, 3]).unwrap();
        let b = Tensor::<f64>::ones(["j", "k"], &[3, 4]).unwrap();
        let r = estimate_einsum_resources("ij,jk->ik", &[&a, &b]).unwrap();
        // 2 * 3 * 4 points, 2 multiplies + 1 add each
        assert_eq!(r.flops, 72);
        assert_eq!(r.hbm_bytes, (6 + 12 + 8) * 8);
        assert_eq!(r.rank, 2);
    }

    #[test]
    fn test_einsum_estimate_rejects_mismatch() {
        let a = Tensor::<f64>::ones(["i", "j"], &[2, 3]).unwrap();
        let b = Tensor::<f64>::ones(["j", "k"], &[2, 4]).unwrap();
        assert!(estimate_einsum_resources("ij,jk->ik", &[&a, &b]).is_err());
    }

    #[test]
    fn test_einsum_estimate_saturates_huge_iteration_space() {
        // five independent 8192-long axes: 2^65 points
        let v = Tensor::<f64>::ones(["i"], &[8192]).unwrap();
        let r = estimate_einsum_resources("a,b,c,d,e->", &[&v, &v, &v, &v, &v]).unwrap();
        assert_eq!(r.flops, u64::MAX);
        assert_eq!(r.hbm_bytes, 5 * 8192 * 8 + 8);

        let budget = ResourceBudget::new(u64::MAX - 1, u64::MAX);
        assert!(matches!(
            budget.check(&r),
            Err(RaptlError::BudgetExceeded { resource: "flops", .. })
        ));
    }

    #[test]
    fn test_elementwise_pass_is_shape_only() {
        let t = Tensor::from_vec(["i"], &[4], vec![0.0, 0.0, 1.0, 0.0]).unwrap();
        let r = ResourceProfile::elementwise_pass(&t);
        assert_eq!(r.flops, 4);
        assert_eq!(r.hbm_bytes, 32);
        assert_eq!(r.nnz, 4);
    }

    #[test]
    fn test_sequential_fixture() {
        let r = combine_resources_sequential(&profile(100, 800), &profile(50, 1600));
        assert_eq!(r.flops, 150);
        assert_eq!(r.hbm_bytes, 1600);
    }

    #[test]
    fn test_sequential_flops_associative() {
        let (a, b, c) = (profile(7, 10), profile(11, 30), profile(13, 20));
        let left = combine_resources_sequential(&combine_resources_sequential(&a, &b), &c);
        let right = combine_resources_sequential(&a, &combine_resources_sequential(&b, &c));
        assert_eq!(left.flops, right.flops);
        assert_eq!(left.flops, 31);
        assert_eq!(left.hbm_bytes, right.hbm_bytes);
    }

    #[test]
    fn test_parallel_fixture() {
        let r = combine_resources_parallel(&profile(100, 800), &profile(50, 1600));
        assert_eq!(r.flops, 100);
        assert_eq!(r.hbm_bytes, 2400);
    }

    #[test]
    fn test_budget() {
        let budget = ResourceBudget::new(100, 1000);
        assert!(budget.check(&profile(100, 1000)).is_ok());
        assert!(matches!(
            budget.check(&profile(101, 10)),
            Err(RaptlError::BudgetExceeded { resource: "flops", .. })
        ));
        assert!(matches!(
            budget.check(&profile(1, 1001)),
            Err(RaptlError::BudgetExceeded { resource: "hbm_bytes", .. })
        ));
        assert!(ResourceBudget::default().check(&profile(u64::MAX, u64::MAX)).is_ok());
    }
}
