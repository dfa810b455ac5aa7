//! Per-circuit customization: folds a spec-wire assignment into the derived
//! key used by both the prover and the verifier. No trusted party is
//! involved; anyone holding the keys can specialize.

use ark_ec::pairing::Pairing;
use ark_ec::VariableBaseMSM;
use ark_ff::One;

use super::data_structures::{DerivedKey, KeyTriple};
use super::error::SnarkError;

const LOG_TARGET: &str = "universal_snark::specializer";

/// Produces the derived key for one spec-wire assignment.
///
/// Besides the folded commitment `gamma_spec_g1_computed`, the prover's
/// partial A and B evaluations over the `[one, spec..]` block are
/// precomputed here so stage 2 can skip those columns.
#[tracing::instrument(target = LOG_TARGET, skip_all)]
pub fn customize_key<E: Pairing>(
    keys: &KeyTriple<E>,
    spec_input: &[E::ScalarField],
) -> Result<DerivedKey<E>, SnarkError> {
    let gamma_spec_g1_computed = keys.spec_key.gamma_spec_g1.accumulate(spec_input)?;

    let mut assignment = Vec::with_capacity(1 + spec_input.len());
    assignment.push(E::ScalarField::one());
    assignment.extend_from_slice(spec_input);

    if keys.pk.a_query.len() < assignment.len() {
        return Err(SnarkError::LengthMismatch {
            expected: assignment.len(),
            got: keys.pk.a_query.len(),
        });
    }
    let evaluation_at_spec =
        E::G1::msm_unchecked(&keys.pk.a_query[..assignment.len()], &assignment);
    let evaluation_bt_spec = keys.pk.b_query.msm(0, &assignment)?;

    Ok(DerivedKey {
        gamma_spec_g1_computed,
        evaluation_at_spec,
        evaluation_bt_spec,
    })
}
