pub mod circuit;
pub mod snark;

pub use circuit::{ArithCircuit, Assignment, CircuitError, CircuitLayout, CircuitReader};
pub use snark::*;
