use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CircuitError {
    #[error("unable to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: wire {wire} out of range (total {total})")]
    WireOutOfRange { line: usize, wire: usize, total: usize },

    #[error("line {line}: wire {wire} already has a group declaration")]
    DuplicateDeclaration { line: usize, wire: usize },

    #[error("line {line}: `{op}` arity mismatch: {detail}")]
    Arity {
        line: usize,
        op: String,
        detail: String,
    },

    #[error("inputs line {line}: {message}")]
    Inputs { line: usize, message: String },

    #[error("expected {expected} randomness values, got {got}")]
    RandomnessCount { expected: usize, got: usize },

    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}
