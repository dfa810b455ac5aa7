//! Two-stage prover.
//!
//! Stage 1 commits to the witness block (and the statement accumulation)
//! before any randomness exists; the commitment seeds the randomness oracle.
//! Stage 2 runs once the circuit has been evaluated under that randomness and
//! assembles the final proof.

use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{UniformRand, Zero};
use ark_groth16::r1cs_to_qap::{LibsnarkReduction, R1CSToQAP};
use ark_poly::GeneralEvaluationDomain;
use ark_std::rand::{CryptoRng, RngCore};

use crate::circuit::Assignment;

use super::data_structures::{DerivedKey, Proof, ProvingKey, Stage1Material};
use super::error::SnarkError;

const LOG_TARGET: &str = "universal_snark::prover";

/// Stage 1: sample the commitment blinder and commit to the witness values.
///
/// The statement values here are the ones loaded from the inputs file; wires
/// that only get their statement value during evaluation contribute nothing
/// yet. The commitment must be fixed before the randomness is derived.
#[tracing::instrument(target = LOG_TARGET, skip_all)]
pub fn prove_stage1<E, R>(
    pk: &ProvingKey<E>,
    stmt_input: &[E::ScalarField],
    witness_input: &[E::ScalarField],
    rng: &mut R,
) -> Result<Stage1Material<E>, SnarkError>
where
    E: Pairing,
    R: RngCore + CryptoRng,
{
    if witness_input.len() != pk.witness_query.len() {
        return Err(SnarkError::LengthMismatch {
            expected: pk.witness_query.len(),
            got: witness_input.len(),
        });
    }
    let kappa3 = E::ScalarField::rand(rng);
    let eval_witness = E::G1::msm_unchecked(&pk.witness_query, witness_input);
    let comm_witness_g1 = pk.delta_g1 * kappa3 + eval_witness;
    let comm_stmt_g1 = pk.gamma_stmt_g1.accumulate(stmt_input)?;
    let comm_g1 = comm_witness_g1 + comm_stmt_g1;
    Ok(Stage1Material {
        kappa3,
        comm_witness_g1,
        comm_stmt_g1,
        comm_g1,
    })
}

/// Stage 2: computes the quotient coefficients for the full assignment and
/// assembles `(A, B, C, comm_witness)`.
#[tracing::instrument(target = LOG_TARGET, skip_all)]
pub fn prove<E, R>(
    pk: &ProvingKey<E>,
    ck: &DerivedKey<E>,
    assignment: &Assignment<E::ScalarField>,
    stage1: &Stage1Material<E>,
    rng: &mut R,
) -> Result<Proof<E>, SnarkError>
where
    E: Pairing,
    R: RngCore + CryptoRng,
{
    let layout = &pk.layout;
    let z = assignment.to_variable_vec();
    if z.len() != pk.a_query.len() || z.len() != pk.b_query.len() {
        return Err(SnarkError::LengthMismatch {
            expected: pk.a_query.len(),
            got: z.len(),
        });
    }

    let h = LibsnarkReduction::witness_map_from_matrices::<
        E::ScalarField,
        GeneralEvaluationDomain<E::ScalarField>,
    >(
        &pk.matrices,
        pk.matrices.num_instance_variables,
        pk.matrices.num_constraints,
        &z,
    )?;
    // the quotient has degree two below the domain size; the trailing
    // coefficient must already be zero and is not consumed
    debug_assert!(h.last().map_or(true, Zero::is_zero));
    if h.len() != pk.h_query.len() + 1 {
        return Err(SnarkError::LengthMismatch {
            expected: pk.h_query.len() + 1,
            got: h.len(),
        });
    }

    let kappa1 = E::ScalarField::rand(rng);
    let kappa2 = E::ScalarField::rand(rng);

    // spec columns are already folded into the derived key
    let offset = 1 + layout.n_spec;
    let eval_a = E::G1::msm_unchecked(&pk.a_query[offset..], &z[offset..]);
    let eval_b = pk.b_query.msm(offset, &z[offset..])?;
    let eval_h = E::G1::msm_unchecked(&pk.h_query, &h[..h.len() - 1]);
    let eval_aux = E::G1::msm_unchecked(&pk.aux_query, &z[layout.aux_range()]);

    let delta_g1 = pk.delta_g1.into_group();
    let a1 = pk.alpha_g1.into_group() + eval_a + ck.evaluation_at_spec + delta_g1 * kappa1;
    let b1 = pk.beta_g1.into_group() + eval_b.g1 + ck.evaluation_bt_spec.g1 + delta_g1 * kappa2;
    let b2 = pk.beta_g2.into_group()
        + eval_b.g2
        + ck.evaluation_bt_spec.g2
        + pk.delta_g2.into_group() * kappa2;
    let c1 = eval_h + eval_aux + a1 * kappa2 + b1 * kappa1
        - delta_g1 * (kappa1 * kappa2)
        - pk.delta_prime_g1.into_group() * stage1.kappa3;

    Ok(Proof {
        a: a1.into_affine(),
        b: b2.into_affine(),
        c: c1.into_affine(),
        comm_witness: stage1.comm_witness_g1.into_affine(),
    })
}
