//! Trusted setup: samples the toxic scalars, evaluates the constraint system
//! as a quadratic arithmetic program at a secret point and batch-exponentiates
//! the query vectors into the three keys.

use ark_ec::pairing::Pairing;
use ark_ec::scalar_mul::fixed_base::FixedBase;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, PrimeField, UniformRand};
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
use ark_relations::r1cs::{ConstraintMatrices, ConstraintSystemRef, SynthesisError};
use ark_std::rand::{CryptoRng, RngCore};

use crate::circuit::CircuitLayout;

use super::data_structures::{
    AccumulationVector, KeyTriple, KnowledgeCommitmentVec, ProvingKey, SpecificationKey,
    VerifyingKey,
};
use super::error::SnarkError;

const LOG_TARGET: &str = "universal_snark::generator";

/// Runs the setup for a translated universal circuit.
///
/// The toxic scalars `t, α, β, γ, δ, δ'` are sampled here and never leave
/// this function.
#[tracing::instrument(target = LOG_TARGET, skip_all)]
pub fn generate<E, R>(
    cs: ConstraintSystemRef<E::ScalarField>,
    layout: &CircuitLayout,
    rng: &mut R,
) -> Result<KeyTriple<E>, SnarkError>
where
    E: Pairing,
    R: RngCore + CryptoRng,
{
    cs.finalize();
    let mut matrices = cs.to_matrices().ok_or(SnarkError::MatricesUnavailable)?;
    if matrices.num_instance_variables != layout.num_instance_variables()
        || matrices.num_instance_variables + matrices.num_witness_variables
            != layout.num_variables()
    {
        return Err(SnarkError::LayoutMismatch(format!(
            "{} instance + {} witness variables for {} wires",
            matrices.num_instance_variables,
            matrices.num_witness_variables,
            layout.num_variables(),
        )));
    }
    maybe_swap_sides(&mut matrices, layout);

    let t = E::ScalarField::rand(rng);
    let alpha = E::ScalarField::rand(rng);
    let beta = E::ScalarField::rand(rng);
    let gamma = E::ScalarField::rand(rng);
    let delta = E::ScalarField::rand(rng);
    let delta_prime = E::ScalarField::rand(rng);
    let gamma_inverse = gamma
        .inverse()
        .ok_or(SynthesisError::UnexpectedIdentity)
        .map_err(SnarkError::from)?;
    let delta_inverse = delta
        .inverse()
        .ok_or(SynthesisError::UnexpectedIdentity)
        .map_err(SnarkError::from)?;
    let delta_prime_inverse = delta_prime
        .inverse()
        .ok_or(SynthesisError::UnexpectedIdentity)
        .map_err(SnarkError::from)?;

    let (a, b, c, zt, domain_size) = evaluate_qap(&matrices, &t)?;
    let num_variables = a.len();

    // mu_i = beta*A_i(t) + alpha*B_i(t) + C_i(t), split by wire group and
    // blinded by the inverse matching each group's key side.
    let mu: Vec<E::ScalarField> = (0..num_variables)
        .map(|i| beta * a[i] + alpha * b[i] + c[i])
        .collect();
    let scaled = |range: core::ops::Range<usize>, inverse: E::ScalarField| -> Vec<E::ScalarField> {
        mu[range].iter().map(|m| *m * inverse).collect()
    };
    let mut gamma_spec = vec![mu[0] * gamma_inverse];
    gamma_spec.extend(scaled(layout.spec_range(), gamma_inverse));
    let gamma_stmt = scaled(layout.stmt_range(), gamma_inverse);
    let gamma_rnd = scaled(layout.rnd_range(), gamma_inverse);
    let witness_t = scaled(layout.witness_range(), delta_prime_inverse);
    let aux_t = scaled(layout.aux_range(), delta_inverse);

    // H query holds Z(t)/delta times powers of t. The reduction produces a
    // degree-(d) vector but the scheme consumes two fewer coefficients.
    let zt_over_delta = zt * delta_inverse;
    let h_scalars: Vec<E::ScalarField> = (0..domain_size - 1)
        .map(|i| zt_over_delta * t.pow([i as u64]))
        .collect();

    let g1_generator = E::G1::rand(rng);
    let g2_generator = E::G2::rand(rng);

    let scalar_bits = E::ScalarField::MODULUS_BIT_SIZE as usize;
    let g1_scalar_count =
        2 * num_variables + h_scalars.len() + gamma_spec.len() + gamma_stmt.len() + gamma_rnd.len()
            + witness_t.len()
            + aux_t.len();
    let g1_window = FixedBase::get_mul_window_size(g1_scalar_count);
    let g1_table = FixedBase::get_window_table::<E::G1>(scalar_bits, g1_window, g1_generator);
    let g1_batch = |scalars: &[E::ScalarField]| -> Vec<E::G1Affine> {
        E::G1::normalize_batch(&FixedBase::msm::<E::G1>(
            scalar_bits,
            g1_window,
            &g1_table,
            scalars,
        ))
    };

    let g2_window = FixedBase::get_mul_window_size(num_variables);
    let g2_table = FixedBase::get_window_table::<E::G2>(scalar_bits, g2_window, g2_generator);

    let a_query = g1_batch(&a);
    let b_g1_query = g1_batch(&b);
    let b_g2_query = E::G2::normalize_batch(&FixedBase::msm::<E::G2>(
        scalar_bits,
        g2_window,
        &g2_table,
        &b,
    ));
    let h_query = g1_batch(&h_scalars);
    let witness_query = g1_batch(&witness_t);
    let aux_query = g1_batch(&aux_t);
    let mut gamma_spec_g1 = g1_batch(&gamma_spec);
    let gamma_stmt_g1 = g1_batch(&gamma_stmt);
    let gamma_rnd_g1 = g1_batch(&gamma_rnd);

    let alpha_g1 = (g1_generator * alpha).into_affine();
    let beta_g1 = (g1_generator * beta).into_affine();
    let beta_g2 = (g2_generator * beta).into_affine();
    let delta_g1 = (g1_generator * delta).into_affine();
    let delta_g2 = (g2_generator * delta).into_affine();
    let delta_prime_g1 = (g1_generator * delta_prime).into_affine();
    let delta_prime_g2 = (g2_generator * delta_prime).into_affine();
    let gamma_g2 = (g2_generator * gamma).into_affine();

    let gamma_spec_base = gamma_spec_g1.remove(0);

    let zero = E::G1Affine::zero();
    let pk = ProvingKey {
        alpha_g1,
        beta_g1,
        beta_g2,
        delta_g1,
        delta_g2,
        delta_prime_g1,
        a_query,
        b_query: KnowledgeCommitmentVec {
            g2: b_g2_query,
            g1: b_g1_query,
        },
        h_query,
        witness_query,
        aux_query,
        gamma_stmt_g1: AccumulationVector::new(zero, gamma_stmt_g1.clone()),
        matrices,
        layout: *layout,
    };
    let spec_key = SpecificationKey {
        gamma_spec_g1: AccumulationVector::new(gamma_spec_base, gamma_spec_g1),
    };
    let vk = VerifyingKey {
        alpha_g1_beta_g2: E::pairing(alpha_g1, beta_g2),
        gamma_g2,
        delta_g2,
        delta_prime_g2,
        gamma_stmt_g1: AccumulationVector::new(zero, gamma_stmt_g1),
        gamma_rnd_g1: AccumulationVector::new(zero, gamma_rnd_g1),
    };

    tracing::info!(
        target: LOG_TARGET,
        pk_g1 = pk.num_g1_elements(),
        pk_g2 = pk.num_g2_elements(),
        spec_g1 = spec_key.num_g1_elements(),
        vk_g1 = vk.num_g1_elements(),
        vk_g2 = vk.num_g2_elements(),
        vk_gt = vk.num_gt_elements(),
        "setup complete"
    );
    Ok(KeyTriple { pk, spec_key, vk })
}

/// Swaps the A and B sides when that lowers the number of per-proof G2
/// entries. Statement and witness wires vary with every proof; spec and rnd
/// columns are free once the derived key is fixed. Satisfiability is
/// unaffected by the swap.
fn maybe_swap_sides<F: PrimeField>(matrices: &mut ConstraintMatrices<F>, layout: &CircuitLayout) {
    let expensive = layout.stmt_range().start..layout.witness_range().end;
    let cost = |side: &[Vec<(F, usize)>]| -> usize {
        side.iter()
            .flat_map(|row| row.iter())
            .filter(|(_, index)| expensive.contains(index))
            .count()
    };
    let cost_a = cost(&matrices.a);
    let cost_b = cost(&matrices.b);
    if cost_b > cost_a {
        std::mem::swap(&mut matrices.a, &mut matrices.b);
        std::mem::swap(
            &mut matrices.a_num_non_zero,
            &mut matrices.b_num_non_zero,
        );
        tracing::debug!(
            target: LOG_TARGET,
            cost_a,
            cost_b,
            "swapped constraint sides to cut G2 work"
        );
    }
}

/// Evaluates the A/B/C polynomials of every variable at `t`, together with the
/// vanishing polynomial.
///
/// The domain covers the constraints plus one consistency row per instance
/// variable, matching the witness-side reduction the prover uses on the same
/// matrices.
fn evaluate_qap<F: PrimeField>(
    matrices: &ConstraintMatrices<F>,
    t: &F,
) -> Result<(Vec<F>, Vec<F>, Vec<F>, F, usize), SnarkError> {
    let domain = GeneralEvaluationDomain::<F>::new(
        matrices.num_constraints + matrices.num_instance_variables,
    )
    .ok_or(SnarkError::Synthesis(
        SynthesisError::PolynomialDegreeTooLarge,
    ))?;
    let domain_size = domain.size();
    let zt = domain.evaluate_vanishing_polynomial(*t);
    let lagrange = domain.evaluate_all_lagrange_coefficients(*t);

    let num_variables = matrices.num_instance_variables + matrices.num_witness_variables;
    let mut a = vec![F::zero(); num_variables];
    let mut b = vec![F::zero(); num_variables];
    let mut c = vec![F::zero(); num_variables];

    // input consistency rows keep the instance polynomials linearly
    // independent on the A side
    for i in 0..matrices.num_instance_variables {
        a[i] = lagrange[matrices.num_constraints + i];
    }
    for (row, coeff_at_row) in lagrange.iter().enumerate().take(matrices.num_constraints) {
        for (coeff, index) in &matrices.a[row] {
            a[*index] += *coeff_at_row * coeff;
        }
        for (coeff, index) in &matrices.b[row] {
            b[*index] += *coeff_at_row * coeff;
        }
        for (coeff, index) in &matrices.c[row] {
            c[*index] += *coeff_at_row * coeff;
        }
    }
    Ok((a, b, c, zt, domain_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    fn layout() -> CircuitLayout {
        CircuitLayout {
            n_spec: 0,
            n_stmt: 1,
            n_witness: 1,
            n_rnd: 0,
            n_aux: 0,
        }
    }

    fn matrices(
        a: Vec<Vec<(Fr, usize)>>,
        b: Vec<Vec<(Fr, usize)>>,
        c: Vec<Vec<(Fr, usize)>>,
    ) -> ConstraintMatrices<Fr> {
        let count = |m: &[Vec<(Fr, usize)>]| m.iter().map(Vec::len).sum();
        ConstraintMatrices {
            num_instance_variables: 2,
            num_witness_variables: 1,
            num_constraints: a.len(),
            a_num_non_zero: count(&a),
            b_num_non_zero: count(&b),
            c_num_non_zero: count(&c),
            a,
            b,
            c,
        }
    }

    #[test]
    fn swap_moves_expensive_columns_off_the_g2_side() {
        // statement variable 1 and witness variable 2 are expensive; they
        // appear twice in B and once in A, so the sides must swap.
        let a = vec![vec![(Fr::from(1u64), 0usize)], vec![(Fr::from(1u64), 1usize)]];
        let b = vec![vec![(Fr::from(1u64), 1usize)], vec![(Fr::from(1u64), 2usize)]];
        let c = vec![vec![(Fr::from(1u64), 2usize)], vec![(Fr::from(1u64), 0usize)]];
        let mut m = matrices(a.clone(), b.clone(), c);
        maybe_swap_sides(&mut m, &layout());
        assert_eq!(m.a, b);
        assert_eq!(m.b, a);
    }

    #[test]
    fn swap_keeps_the_cheaper_orientation() {
        let a = vec![vec![(Fr::from(1u64), 1usize)]];
        let b = vec![vec![(Fr::from(1u64), 0usize)]];
        let c = vec![vec![(Fr::from(1u64), 2usize)]];
        let mut m = matrices(a.clone(), b.clone(), c);
        maybe_swap_sides(&mut m, &layout());
        assert_eq!(m.a, a);
        assert_eq!(m.b, b);
    }

    #[test]
    fn qap_evaluation_covers_every_variable() {
        let a = vec![vec![(Fr::from(1u64), 1usize)]];
        let b = vec![vec![(Fr::from(1u64), 2usize)]];
        let c = vec![vec![(Fr::from(1u64), 2usize)]];
        let m = matrices(a, b, c);
        let t = Fr::from(7u64);
        let (at, bt, ct, zt, domain_size) = evaluate_qap(&m, &t).unwrap();
        assert_eq!(at.len(), 3);
        assert_eq!(bt.len(), 3);
        assert_eq!(ct.len(), 3);
        // domain of size 1 constraint + 2 instance rows, rounded to a power
        // of two
        assert_eq!(domain_size, 4);
        let domain = GeneralEvaluationDomain::<Fr>::new(3).unwrap();
        assert_eq!(zt, domain.evaluate_vanishing_polynomial(t));
        // constraint row contributions land on the constrained variables
        let lagrange = domain.evaluate_all_lagrange_coefficients(t);
        assert_eq!(bt[2], lagrange[0]);
        assert_eq!(ct[2], lagrange[0]);
        // instance rows 1 and 2 carry the consistency coefficients
        assert_eq!(at[0], lagrange[1]);
        assert_eq!(at[1], lagrange[0] + lagrange[2]);
    }
}
