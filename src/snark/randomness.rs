//! Fiat–Shamir derivation of the circuit's randomness wires from a stage-1
//! commitment.
//!
//! Each value hashes the decimal wire counter concatenated with the text form
//! of the binding group element. Only the first 29 digest bytes are kept and
//! read as a little-endian integer, so the map into the field is not uniform.
//! That truncation is part of the wire format and must not change.

use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

/// Bytes of the SHA-256 digest kept per derived element.
pub const RND_DIGEST_BYTES: usize = 29;

/// Derives `count` field elements bound to `binding`.
///
/// The prover calls this on the stage-1 commitment plus the folded spec
/// commitment; the verifier rebuilds the same point, so both sides must see
/// bit-identical hash input.
pub fn rnd_gen<E: Pairing>(count: usize, binding: &E::G1) -> Vec<E::ScalarField> {
    let encoded = encode_point::<E>(binding);
    (0..count)
        .map(|i| {
            let mut hasher = Sha256::new();
            hasher.update(i.to_string().as_bytes());
            hasher.update(encoded.as_bytes());
            let digest = hasher.finalize();
            E::ScalarField::from_le_bytes_mod_order(&digest[..RND_DIGEST_BYTES])
        })
        .collect()
}

/// Canonical text form of a G1 element: decimal affine coordinates.
fn encode_point<E: Pairing>(point: &E::G1) -> String {
    match point.into_affine().xy() {
        Some((x, y)) => format!("({x}, {y})"),
        None => "infinity".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Bn254, Fr, G1Projective};
    use ark_ec::Group;
    use ark_ff::{Field, UniformRand};
    use ark_std::test_rng;

    #[test]
    fn derivation_is_deterministic() {
        let binding = G1Projective::generator() * Fr::from(42u64);
        let first = rnd_gen::<Bn254>(4, &binding);
        let second = rnd_gen::<Bn254>(4, &binding);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn distinct_indices_give_distinct_values() {
        let binding = G1Projective::generator();
        let values = rnd_gen::<Bn254>(8, &binding);
        for i in 0..values.len() {
            for j in i + 1..values.len() {
                assert_ne!(values[i], values[j]);
            }
        }
    }

    #[test]
    fn binding_point_changes_the_output() {
        let mut rng = test_rng();
        let one = rnd_gen::<Bn254>(1, &G1Projective::rand(&mut rng));
        let other = rnd_gen::<Bn254>(1, &G1Projective::rand(&mut rng));
        assert_ne!(one, other);
    }

    #[test]
    fn truncation_keeps_values_below_the_29_byte_bound() {
        // 29 bytes is 232 bits, strictly below the modulus, so the reduction
        // never wraps and every derived value fits in 232 bits.
        let values = rnd_gen::<Bn254>(16, &G1Projective::generator());
        let bound = Fr::from(2u64).pow([232u64]);
        for value in values {
            assert!(value < bound);
        }
    }
}
