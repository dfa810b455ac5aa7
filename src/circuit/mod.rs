//! Arithmetic-circuit frontend: file grammar, constraint translation and
//! gate evaluation.

pub mod ast;
pub mod error;
pub mod reader;

pub use ast::{field_from_hex, ArithCircuit, Gate, GateOp, Statement, Wire, WireGroup};
pub use error::CircuitError;
pub use reader::{Assignment, CircuitReader};

use core::ops::Range;

/// Wire-group census of a translated circuit. Variable indices are laid out
/// as `[one, spec.., stmt.., witness.., rnd.., aux..]`; the ranges below index
/// into that ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircuitLayout {
    pub n_spec: usize,
    pub n_stmt: usize,
    pub n_witness: usize,
    pub n_rnd: usize,
    pub n_aux: usize,
}

impl CircuitLayout {
    /// Total variable count, including the constant-one slot at index 0.
    pub fn num_variables(&self) -> usize {
        1 + self.n_spec + self.n_stmt + self.n_witness + self.n_rnd + self.n_aux
    }

    /// Instance variables of the underlying constraint system: one, spec, stmt.
    pub fn num_instance_variables(&self) -> usize {
        1 + self.n_spec + self.n_stmt
    }

    pub fn spec_range(&self) -> Range<usize> {
        1..1 + self.n_spec
    }

    pub fn stmt_range(&self) -> Range<usize> {
        let start = self.spec_range().end;
        start..start + self.n_stmt
    }

    pub fn witness_range(&self) -> Range<usize> {
        let start = self.stmt_range().end;
        start..start + self.n_witness
    }

    pub fn rnd_range(&self) -> Range<usize> {
        let start = self.witness_range().end;
        start..start + self.n_rnd
    }

    pub fn aux_range(&self) -> Range<usize> {
        let start = self.rnd_range().end;
        start..start + self.n_aux
    }
}
