//! Einstein summation over an arbitrary semiring
//!
//! `"ij,jk->ik"` reads: operand 0 is indexed by `i, j`, operand 1 by `j, k`,
//! the result by `i, k`. Letters shared between operands are joined with ⊗;
//! letters missing from the output are summed out with ⊕.

use ndarray::{ArrayD, IxDyn};
use tracing::trace;

use crate::error::{RaptlError, RaptlResult};
use crate::semiring::Semiring;
use crate::tensor::Tensor;

/// A parsed contraction spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EinsumSpec {
    inputs: Vec<Vec<char>>,
    output: Vec<char>,
}

impl EinsumSpec {
    /// Parse an index string.
    ///
    /// Without `->` the output is every letter that occurs exactly once
    /// across the inputs, in alphabetical order.
    pub fn parse(spec: &str) -> RaptlResult<Self> {
        let compact: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
        let (lhs, rhs) = match compact.split_once("->") {
            Some((lhs, rhs)) => (lhs, Some(rhs)),
            None => (compact.as_str(), None),
        };

        let inputs: Vec<Vec<char>> = lhs.split(',').map(|g| g.chars().collect()).collect();
        for letter in inputs.iter().flatten() {
            if !letter.is_ascii_alphabetic() {
                return Err(RaptlError::InvalidSpec(format!(
                    "'{}' is not an index letter in \"{}\"",
                    letter, spec
                )));
            }
        }

        let output: Vec<char> = match rhs {
            Some(rhs) => {
                let output: Vec<char> = rhs.chars().collect();
                for (pos, letter) in output.iter().enumerate() {
                    if !inputs.iter().flatten().any(|l| l == letter) {
                        return Err(RaptlError::InvalidSpec(format!(
                            "output index '{}' does not appear in any input of \"{}\"",
                            letter, spec
                        )));
                    }
                    if output[..pos].contains(letter) {
                        return Err(RaptlError::InvalidSpec(format!(
                            "output index '{}' repeated in \"{}\"",
                            letter, spec
                        )));
                    }
                }
                output
            }
            None => {
                let mut once: Vec<char> = inputs
                    .iter()
                    .flatten()
                    .copied()
                    .filter(|l| inputs.iter().flatten().filter(|m| *m == l).count() == 1)
                    .collect();
                once.sort_unstable();
                once
            }
        };

        Ok(Self { inputs, output })
    }

    /// Index letters of each operand
    pub fn inputs(&self) -> &[Vec<char>] {
        &self.inputs
    }

    /// Index letters of the result
    pub fn output(&self) -> &[char] {
        &self.output
    }

    /// Every distinct letter, in order of first appearance
    pub fn letters(&self) -> Vec<char> {
        let mut letters = Vec::new();
        for &l in self.inputs.iter().flatten() {
            if !letters.contains(&l) {
                letters.push(l);
            }
        }
        letters
    }

    /// Resolve the extent of every letter against concrete operand shapes.
    ///
    /// Returns extents aligned with [`EinsumSpec::letters`]. Fails when the
    /// operand count or an operand's rank disagrees with the index string, or when a
    /// shared letter is bound to two different extents.
    pub fn extents(&self, shapes: &[&[usize]]) -> RaptlResult<Vec<usize>> {
        if shapes.len() != self.inputs.len() {
            return Err(RaptlError::InvalidSpec(format!(
                "spec has {} operands but {} tensors were given",
                self.inputs.len(),
                shapes.len()
            )));
        }

        let letters = self.letters();
        let mut extents: Vec<Option<usize>> = vec![None; letters.len()];
        for (group, shape) in self.inputs.iter().zip(shapes) {
            if group.len() != shape.len() {
                return Err(RaptlError::InvalidSpec(format!(
                    "operand indexed by \"{}\" has rank {}",
                    group.iter().collect::<String>(),
                    shape.len()
                )));
            }
            for (letter, &extent) in group.iter().zip(shape.iter()) {
                let slot = slot_of(&letters, *letter);
                match extents[slot] {
                    Some(seen) if seen != extent => {
                        return Err(RaptlError::shape(letter.to_string(), seen, extent));
                    }
                    _ => extents[slot] = Some(extent),
                }
            }
        }
        Ok(extents.into_iter().map(|e| e.unwrap_or(0)).collect())
    }

    /// Contract `tensors` under semiring `S`
    pub fn contract<S: Semiring>(
        &self,
        tensors: &[&Tensor<S::Value>],
    ) -> RaptlResult<Tensor<S::Value>> {
        let shapes: Vec<&[usize]> = tensors.iter().map(|t| t.shape()).collect();
        let extents = self.extents(&shapes)?;
        let letters = self.letters();

        let operand_slots: Vec<Vec<usize>> = self
            .inputs
            .iter()
            .map(|group| group.iter().map(|l| slot_of(&letters, *l)).collect())
            .collect();
        let output_slots: Vec<usize> = self.output.iter().map(|l| slot_of(&letters, *l)).collect();
        let output_shape: Vec<usize> = output_slots.iter().map(|&s| extents[s]).collect();

        let mut out = ArrayD::from_elem(IxDyn(&output_shape), S::zero());

        trace!(
            semiring = S::NAME,
            operands = tensors.len(),
            points = extents.iter().fold(1usize, |acc, &e| acc.saturating_mul(e)),
            "Contracting"
        );

        if extents.iter().all(|&e| e > 0) {
            let mut point = vec![0usize; letters.len()];
            let mut operand_index: Vec<Vec<usize>> =
                operand_slots.iter().map(|s| vec![0; s.len()]).collect();
            let mut output_index = vec![0usize; output_slots.len()];

            loop {
                let mut product = S::one();
                for ((tensor, slots), index) in tensors
                    .iter()
                    .zip(&operand_slots)
                    .zip(operand_index.iter_mut())
                {
                    for (axis, &slot) in slots.iter().enumerate() {
                        index[axis] = point[slot];
                    }
                    // extents were validated above
                    if let Some(v) = tensor.get(index.as_slice()) {
                        product = S::mul(&product, v);
                    }
                }

                for (axis, &slot) in output_slots.iter().enumerate() {
                    output_index[axis] = point[slot];
                }
                let cell = &mut out[IxDyn(&output_index)];
                *cell = S::add(&*cell, &product);

                if !advance(&mut point, &extents) {
                    break;
                }
            }
        }

        Tensor::new(self.output.iter().map(|c| c.to_string()), out)
    }
}

/// Contract `tensors` according to `spec` under semiring `S`.
///
/// Iterates the Cartesian product of every letter's extent in a fixed order,
/// so identical inputs always produce identical outputs.
pub fn semiring_einsum<S: Semiring>(
    spec: &str,
    tensors: &[&Tensor<S::Value>],
) -> RaptlResult<Tensor<S::Value>> {
    EinsumSpec::parse(spec)?.contract::<S>(tensors)
}

fn slot_of(letters: &[char], letter: char) -> usize {
    letters.iter().position(|&l| l == letter).unwrap_or(0)
}

/// Odometer step over `extents`; returns false after the last point
fn advance(point: &mut [usize], extents: &[usize]) -> bool {
    for axis in (0..point.len()).rev() {
        point[axis] += 1;
        if point[axis] < extents[axis] {
            return true;
        }
        point[axis] = 0;
    }
    false
}
