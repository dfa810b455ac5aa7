//! Verification: rebuild the stage-1 commitment from the statement, rederive
//! the randomness, fold the public linear parts and run the pairing check.

use ark_ec::pairing::{MillerLoopOutput, Pairing};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::Field;

use super::data_structures::{DerivedKey, Proof, VerifyingKey};
use super::error::SnarkError;
use super::randomness::rnd_gen;

const LOG_TARGET: &str = "universal_snark::verifier";

/// Checks a proof against a statement under a derived key.
///
/// A failed pairing equation yields `Ok(false)`; errors are reserved for
/// structurally unusable inputs.
#[tracing::instrument(target = LOG_TARGET, skip_all)]
pub fn verify<E: Pairing>(
    vk: &VerifyingKey<E>,
    ck: &DerivedKey<E>,
    stmt_input: &[E::ScalarField],
    proof: &Proof<E>,
) -> Result<bool, SnarkError> {
    let comm_stmt = vk.gamma_stmt_g1.accumulate(stmt_input)?;
    let comm = proof.comm_witness.into_group() + comm_stmt;
    let rnd_input = rnd_gen::<E>(
        vk.gamma_rnd_g1.len(),
        &(comm + ck.gamma_spec_g1_computed),
    );
    let comm_rnd = vk.gamma_rnd_g1.accumulate(&rnd_input)?;

    // every gamma-side linear contribution: spec, statement and randomness
    let folded_public = comm_rnd + comm_stmt + ck.gamma_spec_g1_computed;

    let left = E::multi_miller_loop(
        [
            proof.a,
            (-proof.comm_witness.into_group()).into_affine(),
        ],
        [proof.b, vk.delta_prime_g2],
    );
    let right = E::multi_miller_loop(
        [folded_public.into_affine(), proof.c],
        [vk.gamma_g2, vk.delta_g2],
    );
    let ratio = left.0
        * right
            .0
            .inverse()
            .ok_or(SnarkError::DegeneratePairing)?;
    let result =
        E::final_exponentiation(MillerLoopOutput(ratio)).ok_or(SnarkError::DegeneratePairing)?;

    let accepted = result == vk.alpha_g1_beta_g2;
    tracing::debug!(target: LOG_TARGET, accepted, "pairing check finished");
    Ok(accepted)
}
