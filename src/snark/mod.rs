//! Universal Groth16-style backend, partitioned across an extra commitment
//! group element so the witness can be committed before the in-circuit
//! randomness is derived.

pub mod data_structures;
pub mod error;
pub mod generator;
pub mod prover;
pub mod randomness;
pub mod specializer;
pub mod verifier;

pub use data_structures::{
    is_satisfied, AccumulationVector, DerivedKey, KeyTriple, KnowledgeCommitment,
    KnowledgeCommitmentVec, Proof, ProvingKey, SpecificationKey, Stage1Material, VerifyingKey,
};
pub use error::SnarkError;
pub use generator::generate;
pub use prover::{prove, prove_stage1};
pub use randomness::{rnd_gen, RND_DIGEST_BYTES};
pub use specializer::customize_key;
pub use verifier::verify;
