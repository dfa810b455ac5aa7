//! Key material, proof objects and the sparse accumulation helpers shared by
//! the generator, specializer, prover and verifier.

use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::PrimeField;
use ark_relations::r1cs::ConstraintMatrices;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Valid};

use crate::circuit::CircuitLayout;

use super::error::SnarkError;

/// Base-plus-deltas representation of `base + Σ s_i · Δ_i` for sparse scalar
/// vectors, precomputed in affine form for multi-scalar multiplication.
#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct AccumulationVector<G: CurveGroup> {
    pub base: G::Affine,
    pub deltas: Vec<G::Affine>,
}

impl<G: CurveGroup> AccumulationVector<G> {
    pub fn new(base: G::Affine, deltas: Vec<G::Affine>) -> Self {
        Self { base, deltas }
    }

    /// Number of delta columns (the base is not counted).
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn accumulate(&self, scalars: &[G::ScalarField]) -> Result<G, SnarkError> {
        if scalars.len() != self.deltas.len() {
            return Err(SnarkError::LengthMismatch {
                expected: self.deltas.len(),
                got: scalars.len(),
            });
        }
        Ok(self.base.into_group() + G::msm_unchecked(&self.deltas, scalars))
    }
}

/// Knowledge commitment `(g2, g1)`: the same scalar under both source groups.
#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct KnowledgeCommitment<E: Pairing> {
    pub g2: E::G2,
    pub g1: E::G1,
}

/// Query vector in knowledge-commitment form, stored as parallel G2/G1
/// columns so each side can feed a multi-scalar multiplication directly.
#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct KnowledgeCommitmentVec<E: Pairing> {
    pub g2: Vec<E::G2Affine>,
    pub g1: Vec<E::G1Affine>,
}

impl<E: Pairing> KnowledgeCommitmentVec<E> {
    pub fn len(&self) -> usize {
        self.g1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.g1.is_empty()
    }

    /// MSM over both columns starting at `offset`.
    pub fn msm(
        &self,
        offset: usize,
        scalars: &[E::ScalarField],
    ) -> Result<KnowledgeCommitment<E>, SnarkError> {
        let end = offset + scalars.len();
        if end > self.g1.len() || self.g1.len() != self.g2.len() {
            return Err(SnarkError::LengthMismatch {
                expected: self.g1.len().saturating_sub(offset),
                got: scalars.len(),
            });
        }
        Ok(KnowledgeCommitment {
            g2: E::G2::msm_unchecked(&self.g2[offset..end], scalars),
            g1: E::G1::msm_unchecked(&self.g1[offset..end], scalars),
        })
    }
}

/// Proving key of the universal scheme.
///
/// The (possibly A/B-swapped) constraint matrices ride along so the prover
/// can recompute the quotient polynomial without the original circuit.
pub struct ProvingKey<E: Pairing> {
    pub alpha_g1: E::G1Affine,
    pub beta_g1: E::G1Affine,
    pub beta_g2: E::G2Affine,
    pub delta_g1: E::G1Affine,
    pub delta_g2: E::G2Affine,
    pub delta_prime_g1: E::G1Affine,
    pub a_query: Vec<E::G1Affine>,
    pub b_query: KnowledgeCommitmentVec<E>,
    pub h_query: Vec<E::G1Affine>,
    pub witness_query: Vec<E::G1Affine>,
    pub aux_query: Vec<E::G1Affine>,
    pub gamma_stmt_g1: AccumulationVector<E::G1>,
    pub matrices: ConstraintMatrices<E::ScalarField>,
    pub layout: CircuitLayout,
}

impl<E: Pairing> ProvingKey<E> {
    pub fn num_g1_elements(&self) -> usize {
        4 + self.a_query.len()
            + self.b_query.len()
            + self.h_query.len()
            + self.witness_query.len()
            + self.aux_query.len()
            + self.gamma_stmt_g1.len()
            + 1
    }

    pub fn num_g2_elements(&self) -> usize {
        2 + self.b_query.len()
    }
}

/// Key held by the computation specifier. Verifiers do not need it, which is
/// why it is split off from the verification key.
#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct SpecificationKey<E: Pairing> {
    pub gamma_spec_g1: AccumulationVector<E::G1>,
}

impl<E: Pairing> SpecificationKey<E> {
    pub fn num_g1_elements(&self) -> usize {
        1 + self.gamma_spec_g1.len()
    }
}

#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct VerifyingKey<E: Pairing> {
    pub alpha_g1_beta_g2: PairingOutput<E>,
    pub gamma_g2: E::G2Affine,
    pub delta_g2: E::G2Affine,
    pub delta_prime_g2: E::G2Affine,
    pub gamma_stmt_g1: AccumulationVector<E::G1>,
    pub gamma_rnd_g1: AccumulationVector<E::G1>,
}

impl<E: Pairing> VerifyingKey<E> {
    pub fn num_g1_elements(&self) -> usize {
        self.gamma_stmt_g1.len() + self.gamma_rnd_g1.len()
    }

    pub fn num_g2_elements(&self) -> usize {
        3
    }

    pub fn num_gt_elements(&self) -> usize {
        1
    }
}

/// Output of one trusted setup: proving, specification and verification keys.
pub struct KeyTriple<E: Pairing> {
    pub pk: ProvingKey<E>,
    pub spec_key: SpecificationKey<E>,
    pub vk: VerifyingKey<E>,
}

/// Per-specialization key derived from a spec-wire assignment without any
/// trusted party: the folded spec commitment for the verifier plus the two
/// partial evaluations reused by the prover.
#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct DerivedKey<E: Pairing> {
    pub gamma_spec_g1_computed: E::G1,
    pub evaluation_at_spec: E::G1,
    pub evaluation_bt_spec: KnowledgeCommitment<E>,
}

/// First-stage prover output: the witness commitment and its blinding scalar,
/// fixed before any randomness is derived.
#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Stage1Material<E: Pairing> {
    pub kappa3: E::ScalarField,
    pub comm_witness_g1: E::G1,
    pub comm_stmt_g1: E::G1,
    pub comm_g1: E::G1,
}

#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Proof<E: Pairing> {
    pub a: E::G1Affine,
    pub b: E::G2Affine,
    pub c: E::G1Affine,
    pub comm_witness: E::G1Affine,
}

impl<E: Pairing> Proof<E> {
    pub fn num_g1_elements(&self) -> usize {
        3
    }

    pub fn num_g2_elements(&self) -> usize {
        1
    }

    /// Curve and subgroup membership of all four proof points.
    pub fn is_well_formed(&self) -> bool {
        self.a.check().is_ok()
            && self.b.check().is_ok()
            && self.c.check().is_ok()
            && self.comm_witness.check().is_ok()
    }
}

/// Row-by-row check that `(A·z)(B·z) = C·z` holds for every constraint.
pub fn is_satisfied<F: PrimeField>(matrices: &ConstraintMatrices<F>, assignment: &[F]) -> bool {
    if assignment.len() != matrices.num_instance_variables + matrices.num_witness_variables {
        return false;
    }
    for row in 0..matrices.num_constraints {
        let a = eval_sparse_row(&matrices.a[row], assignment);
        let b = eval_sparse_row(&matrices.b[row], assignment);
        let c = eval_sparse_row(&matrices.c[row], assignment);
        if a * b != c {
            return false;
        }
    }
    true
}

fn eval_sparse_row<F: PrimeField>(row: &[(F, usize)], assignment: &[F]) -> F {
    row.iter()
        .fold(F::zero(), |acc, (coeff, index)| acc + *coeff * assignment[*index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Bn254, Fr, G1Projective};
    use ark_ec::Group;
    use ark_ff::UniformRand;
    use ark_std::test_rng;

    #[test]
    fn accumulation_matches_naive_sum() {
        let mut rng = test_rng();
        let base = G1Projective::rand(&mut rng);
        let deltas: Vec<G1Projective> = (0..5).map(|_| G1Projective::rand(&mut rng)).collect();
        let scalars: Vec<Fr> = (0..5).map(|_| Fr::rand(&mut rng)).collect();
        let vector = AccumulationVector::<G1Projective>::new(
            base.into_affine(),
            G1Projective::normalize_batch(&deltas),
        );
        let expected = deltas
            .iter()
            .zip(&scalars)
            .fold(base, |acc, (delta, scalar)| acc + *delta * scalar);
        assert_eq!(vector.accumulate(&scalars).unwrap(), expected);
    }

    #[test]
    fn accumulation_rejects_wrong_length() {
        let vector = AccumulationVector::<G1Projective>::new(
            G1Projective::generator().into_affine(),
            vec![G1Projective::generator().into_affine(); 3],
        );
        assert!(vector.accumulate(&[Fr::from(1u64); 2]).is_err());
    }

    #[test]
    fn knowledge_vector_offsets_slice_both_columns() {
        let mut rng = test_rng();
        let g1: Vec<G1Projective> = (0..4).map(|_| G1Projective::rand(&mut rng)).collect();
        let g2: Vec<ark_bn254::G2Projective> =
            (0..4).map(|_| ark_bn254::G2Projective::rand(&mut rng)).collect();
        let vector = KnowledgeCommitmentVec::<Bn254> {
            g1: G1Projective::normalize_batch(&g1),
            g2: ark_bn254::G2Projective::normalize_batch(&g2),
        };
        let scalars: Vec<Fr> = (0..2).map(|_| Fr::rand(&mut rng)).collect();
        let commitment = vector.msm(2, &scalars).unwrap();
        assert_eq!(commitment.g1, g1[2] * scalars[0] + g1[3] * scalars[1]);
        assert_eq!(commitment.g2, g2[2] * scalars[0] + g2[3] * scalars[1]);
        assert!(vector.msm(3, &scalars).is_err());
    }
}
