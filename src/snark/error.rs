use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnarkError {
    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("scalar vector length {got} does not match query length {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("wire layout does not match the constraint system: {0}")]
    LayoutMismatch(String),

    #[error("constraint matrices are unavailable")]
    MatricesUnavailable,

    #[error("degenerate pairing value")]
    DegeneratePairing,
}
