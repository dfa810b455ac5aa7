//! Translation of a parsed circuit into rank-1 constraints, plus the gate
//! evaluator that fills in wire values.
//!
//! Linear gates (`add`, `pack`, `const-mul-*`) never allocate variables.
//! Their outputs live as linear combinations over already-allocated
//! variables, shared through reference-counted cells until the last consumer
//! takes the combination by move. Only multiplicative and non-linear gates
//! force wires into fresh constraint-system variables.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use ark_ff::{BigInteger, PrimeField};
use ark_relations::r1cs::{
    ConstraintSystem, ConstraintSystemRef, LinearCombination, OptimizationGoal, SynthesisError,
    SynthesisMode, Variable,
};

use super::ast::{field_from_hex, ArithCircuit, Gate, GateOp, Statement, Wire, WireGroup};
use super::error::CircuitError;
use super::CircuitLayout;

const LOG_TARGET: &str = "universal_snark::circuit::reader";

type SharedLc<F> = Rc<LinearCombination<F>>;

/// Variable values grouped by wire class, as produced by [`CircuitReader::eval`].
/// The full assignment vector is `[1, spec.., stmt.., witness.., rnd.., aux..]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment<F: PrimeField> {
    pub spec: Vec<F>,
    pub stmt: Vec<F>,
    pub witness: Vec<F>,
    pub rnd: Vec<F>,
    pub aux: Vec<F>,
}

impl<F: PrimeField> Assignment<F> {
    /// Flattens the groups into the variable ordering used by the constraint
    /// matrices, with the constant one at index 0.
    pub fn to_variable_vec(&self) -> Vec<F> {
        let mut z = Vec::with_capacity(
            1 + self.spec.len() + self.stmt.len() + self.witness.len() + self.rnd.len()
                + self.aux.len(),
        );
        z.push(F::one());
        z.extend_from_slice(&self.spec);
        z.extend_from_slice(&self.stmt);
        z.extend_from_slice(&self.witness);
        z.extend_from_slice(&self.rnd);
        z.extend_from_slice(&self.aux);
        z
    }
}

/// Single-use translator from a parsed circuit to an R1CS instance.
///
/// `translate` emits the constraints, `read_inputs` loads the statement and
/// witness values, and `eval` (consuming) computes every wire and returns the
/// grouped variable assignment. Evaluating releases all fused-combination
/// state, so a second evaluation requires re-parsing the circuit.
#[derive(Debug)]
pub struct CircuitReader<F: PrimeField> {
    circuit: ArithCircuit<F>,
    cs: ConstraintSystemRef<F>,
    wire_values: Vec<F>,
    wire_lcs: Vec<Option<SharedLc<F>>>,
    use_counts: Vec<usize>,
    var_map: BTreeMap<Wire, Variable>,
    zerop_aux: Vec<(Variable, SharedLc<F>)>,
    spec_wires: Vec<Wire>,
    stmt_wires: Vec<Wire>,
    witness_wires: Vec<Wire>,
    rnd_wires: Vec<Wire>,
    spec_values: Vec<F>,
    stmt_values: Vec<F>,
    witness_values: Vec<F>,
}

impl<F: PrimeField> CircuitReader<F> {
    /// Opens and translates a circuit file, then loads its inputs file.
    pub fn open(arith_path: &Path, inputs_path: &Path) -> Result<Self, CircuitError> {
        let circuit = ArithCircuit::load(arith_path)?;
        let mut reader = Self::translate(circuit)?;
        reader.read_inputs_file(inputs_path)?;
        Ok(reader)
    }

    /// Runs the two translation passes: tally wire groups and use counts,
    /// then allocate variables and emit constraints.
    #[tracing::instrument(target = LOG_TARGET, skip_all)]
    pub fn translate(circuit: ArithCircuit<F>) -> Result<Self, CircuitError> {
        let total = circuit.total_wires;

        let mut declared = vec![false; total];
        let mut spec_wires = Vec::new();
        let mut stmt_wires = Vec::new();
        let mut witness_wires = Vec::new();
        let mut rnd_wires = Vec::new();
        let mut use_counts = vec![0usize; total];
        for statement in &circuit.statements {
            match statement {
                Statement::Declare { group, wire, line } => {
                    if declared[*wire] {
                        return Err(CircuitError::DuplicateDeclaration {
                            line: *line,
                            wire: *wire,
                        });
                    }
                    declared[*wire] = true;
                    match group {
                        WireGroup::Spec => spec_wires.push(*wire),
                        WireGroup::Stmt => stmt_wires.push(*wire),
                        WireGroup::Witness => witness_wires.push(*wire),
                        WireGroup::Rnd => rnd_wires.push(*wire),
                    }
                }
                Statement::Gate(gate) => {
                    for &wire in &gate.inputs {
                        use_counts[wire] += 1;
                    }
                    // The assert output is consumed as the constraint's
                    // third operand, so it counts as a use.
                    if matches!(gate.op, GateOp::Assert) {
                        use_counts[gate.outputs[0]] += 1;
                    }
                }
            }
        }

        let cs = ConstraintSystem::<F>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Setup);

        let mut reader = Self {
            circuit,
            cs,
            wire_values: vec![F::zero(); total],
            wire_lcs: vec![None; total],
            use_counts,
            var_map: BTreeMap::new(),
            zerop_aux: Vec::new(),
            spec_wires,
            stmt_wires,
            witness_wires,
            rnd_wires,
            spec_values: Vec::new(),
            stmt_values: Vec::new(),
            witness_values: Vec::new(),
        };
        reader.allocate_declared_variables()?;
        reader.emit_constraints()?;

        let layout = reader.layout();
        tracing::debug!(
            target: LOG_TARGET,
            n_spec = layout.n_spec,
            n_stmt = layout.n_stmt,
            n_witness = layout.n_witness,
            n_rnd = layout.n_rnd,
            n_aux = layout.n_aux,
            constraints = reader.cs.num_constraints(),
            "constraint translation done"
        );
        Ok(reader)
    }

    /// Loads a `<wireId> <hexValue>` assignment file and captures the spec,
    /// statement and witness values in declaration order.
    pub fn read_inputs_file(&mut self, path: &Path) -> Result<(), CircuitError> {
        let text = fs::read_to_string(path).map_err(|source| CircuitError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.read_inputs(&text)
    }

    pub fn read_inputs(&mut self, text: &str) -> Result<(), CircuitError> {
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut tokens = trimmed.split_whitespace();
            let (Some(id), Some(value)) = (tokens.next(), tokens.next()) else {
                return Err(CircuitError::Inputs {
                    line,
                    message: format!("expected `<wireId> <hexValue>`, found `{trimmed}`"),
                });
            };
            let wire: Wire = id.parse().map_err(|_| CircuitError::Inputs {
                line,
                message: format!("bad wire id `{id}`"),
            })?;
            if wire >= self.circuit.total_wires {
                return Err(CircuitError::WireOutOfRange {
                    line,
                    wire,
                    total: self.circuit.total_wires,
                });
            }
            self.wire_values[wire] = field_from_hex(value).ok_or(CircuitError::Inputs {
                line,
                message: format!("bad hex value `{value}`"),
            })?;
        }
        self.spec_values = self.group_values(&self.spec_wires);
        self.stmt_values = self.group_values(&self.stmt_wires);
        self.witness_values = self.group_values(&self.witness_wires);
        Ok(())
    }

    /// Evaluates every gate, consuming the reader. Randomness values are
    /// assigned to `rnd` wires in declaration order; each `zerop` auxiliary
    /// variable is set to the inverse of its tested combination, or zero.
    #[tracing::instrument(target = LOG_TARGET, skip_all)]
    pub fn eval(mut self, rnd_values: &[F]) -> Result<Assignment<F>, CircuitError> {
        if rnd_values.len() != self.rnd_wires.len() {
            return Err(CircuitError::RandomnessCount {
                expected: self.rnd_wires.len(),
                got: rnd_values.len(),
            });
        }
        let statements = std::mem::take(&mut self.circuit.statements);
        let mut next_rnd = 0;
        for statement in &statements {
            match statement {
                Statement::Declare {
                    group: WireGroup::Rnd,
                    wire,
                    ..
                } => {
                    self.wire_values[*wire] = rnd_values[next_rnd];
                    next_rnd += 1;
                }
                Statement::Declare { .. } => {}
                Statement::Gate(gate) => eval_gate(gate, &mut self.wire_values),
            }
        }

        let layout = self.layout();
        let num_instance = layout.num_instance_variables();
        let mut z = vec![F::zero(); layout.num_variables()];
        z[0] = F::one();
        for (&wire, &var) in &self.var_map {
            z[variable_index(var, num_instance)] = self.wire_values[wire];
        }
        for (var, lc) in &self.zerop_aux {
            let tested = eval_lc(lc, &z, num_instance);
            z[variable_index(*var, num_instance)] = match tested.inverse() {
                Some(inverse) => inverse,
                None => F::zero(),
            };
        }
        Ok(Assignment {
            spec: z[layout.spec_range()].to_vec(),
            stmt: z[layout.stmt_range()].to_vec(),
            witness: z[layout.witness_range()].to_vec(),
            rnd: z[layout.rnd_range()].to_vec(),
            aux: z[layout.aux_range()].to_vec(),
        })
    }

    pub fn constraint_system(&self) -> ConstraintSystemRef<F> {
        self.cs.clone()
    }

    pub fn layout(&self) -> CircuitLayout {
        CircuitLayout {
            n_spec: self.spec_wires.len(),
            n_stmt: self.stmt_wires.len(),
            n_witness: self.witness_wires.len(),
            n_rnd: self.rnd_wires.len(),
            n_aux: self.cs.num_witness_variables()
                - self.witness_wires.len()
                - self.rnd_wires.len(),
        }
    }

    pub fn spec_values(&self) -> &[F] {
        &self.spec_values
    }

    pub fn stmt_values(&self) -> &[F] {
        &self.stmt_values
    }

    pub fn witness_values(&self) -> &[F] {
        &self.witness_values
    }

    // ------------------------------------------------------------------
    // Pass 2: variable allocation and constraint emission
    // ------------------------------------------------------------------

    fn allocate_declared_variables(&mut self) -> Result<(), CircuitError> {
        for &wire in &self.spec_wires {
            let var = self
                .cs
                .new_input_variable(|| Err(SynthesisError::AssignmentMissing))?;
            self.var_map.insert(wire, var);
        }
        for &wire in &self.stmt_wires {
            let var = self
                .cs
                .new_input_variable(|| Err(SynthesisError::AssignmentMissing))?;
            self.var_map.insert(wire, var);
        }
        for &wire in &self.witness_wires {
            let var = self
                .cs
                .new_witness_variable(|| Err(SynthesisError::AssignmentMissing))?;
            self.var_map.insert(wire, var);
        }
        for &wire in &self.rnd_wires {
            let var = self
                .cs
                .new_witness_variable(|| Err(SynthesisError::AssignmentMissing))?;
            self.var_map.insert(wire, var);
        }
        Ok(())
    }

    fn emit_constraints(&mut self) -> Result<(), CircuitError> {
        let statements = std::mem::take(&mut self.circuit.statements);
        for statement in &statements {
            if let Statement::Gate(gate) = statement {
                self.emit_gate(gate)?;
            }
        }
        self.circuit.statements = statements;
        Ok(())
    }

    fn emit_gate(&mut self, gate: &Gate<F>) -> Result<(), CircuitError> {
        match &gate.op {
            GateOp::Add => self.fuse_addition(gate),
            GateOp::Pack => self.fuse_pack(gate),
            GateOp::ConstMul(constant) => self.fuse_const_mul(gate, *constant),
            GateOp::Mul => self.constrain_mul(gate),
            GateOp::Xor => self.constrain_xor(gate),
            GateOp::Or => self.constrain_or(gate),
            GateOp::Assert => self.constrain_assert(gate),
            GateOp::Split => self.constrain_split(gate),
            GateOp::Zerop => self.constrain_zerop(gate),
        }
    }

    /// Looks up the linear combination for a wire, charging one use.
    ///
    /// The last charge takes the stored combination by move. A non-final
    /// consumer gets the shared pointer, or a deep copy when it intends to
    /// edit. Wires without a stored combination resolve to their variable,
    /// allocating a fresh one on first demand.
    fn find(&mut self, wire: Wire, intention_to_edit: bool) -> Result<SharedLc<F>, CircuitError> {
        self.use_counts[wire] -= 1;
        let exhausted = self.use_counts[wire] == 0;
        match self.wire_lcs[wire].take() {
            Some(lc) => {
                if exhausted {
                    Ok(lc)
                } else {
                    let shared = if intention_to_edit {
                        Rc::new((*lc).clone())
                    } else {
                        Rc::clone(&lc)
                    };
                    self.wire_lcs[wire] = Some(lc);
                    Ok(shared)
                }
            }
            None => {
                let var = self.variable_for(wire)?;
                Ok(Rc::new(lc_of(var)))
            }
        }
    }

    fn variable_for(&mut self, wire: Wire) -> Result<Variable, CircuitError> {
        if let Some(var) = self.var_map.get(&wire) {
            return Ok(*var);
        }
        let var = self
            .cs
            .new_witness_variable(|| Err(SynthesisError::AssignmentMissing))?;
        self.var_map.insert(wire, var);
        Ok(var)
    }

    fn fuse_addition(&mut self, gate: &Gate<F>) -> Result<(), CircuitError> {
        let mut sum = take_owned(self.find(gate.inputs[0], true)?);
        for &wire in &gate.inputs[1..] {
            let lc = self.find(wire, false)?;
            lc_add_scaled(&mut sum, F::one(), &lc);
        }
        self.wire_lcs[gate.outputs[0]] = Some(Rc::new(sum));
        Ok(())
    }

    fn fuse_pack(&mut self, gate: &Gate<F>) -> Result<(), CircuitError> {
        let mut sum = take_owned(self.find(gate.inputs[0], true)?);
        let mut power = F::one();
        for &wire in &gate.inputs[1..] {
            let lc = self.find(wire, false)?;
            power.double_in_place();
            lc_add_scaled(&mut sum, power, &lc);
        }
        self.wire_lcs[gate.outputs[0]] = Some(Rc::new(sum));
        Ok(())
    }

    fn fuse_const_mul(&mut self, gate: &Gate<F>, constant: F) -> Result<(), CircuitError> {
        let mut lc = take_owned(self.find(gate.inputs[0], true)?);
        lc_scale(&mut lc, constant);
        self.wire_lcs[gate.outputs[0]] = Some(Rc::new(lc));
        Ok(())
    }

    fn constrain_mul(&mut self, gate: &Gate<F>) -> Result<(), CircuitError> {
        let l1 = self.find(gate.inputs[0], false)?;
        let l2 = self.find(gate.inputs[1], false)?;
        let out = self.variable_for(gate.outputs[0])?;
        self.cs
            .enforce_constraint((*l1).clone(), (*l2).clone(), lc_of(out))?;
        Ok(())
    }

    fn constrain_xor(&mut self, gate: &Gate<F>) -> Result<(), CircuitError> {
        let l1 = (*self.find(gate.inputs[0], false)?).clone();
        let l2 = (*self.find(gate.inputs[1], false)?).clone();
        let out = self.variable_for(gate.outputs[0])?;
        let mut doubled = l1.clone();
        lc_scale(&mut doubled, F::from(2u64));
        let mut recombined = l1;
        lc_add_scaled(&mut recombined, F::one(), &l2);
        recombined += (-F::one(), out);
        self.cs.enforce_constraint(doubled, l2, recombined)?;
        Ok(())
    }

    fn constrain_or(&mut self, gate: &Gate<F>) -> Result<(), CircuitError> {
        let l1 = (*self.find(gate.inputs[0], false)?).clone();
        let l2 = (*self.find(gate.inputs[1], false)?).clone();
        let out = self.variable_for(gate.outputs[0])?;
        let mut recombined = l1.clone();
        lc_add_scaled(&mut recombined, F::one(), &l2);
        recombined += (-F::one(), out);
        self.cs.enforce_constraint(l1, l2, recombined)?;
        Ok(())
    }

    /// `assert` constrains `w1 * w2 = o` over existing wires; the output is
    /// consumed like an input and no variable is allocated for it.
    fn constrain_assert(&mut self, gate: &Gate<F>) -> Result<(), CircuitError> {
        let l1 = self.find(gate.inputs[0], false)?;
        let l2 = self.find(gate.inputs[1], false)?;
        let l3 = self.find(gate.outputs[0], false)?;
        self.cs
            .enforce_constraint((*l1).clone(), (*l2).clone(), (*l3).clone())?;
        Ok(())
    }

    fn constrain_split(&mut self, gate: &Gate<F>) -> Result<(), CircuitError> {
        let input = self.find(gate.inputs[0], false)?;
        let mut sum = LinearCombination(Vec::new());
        let mut power = F::one();
        for &bit_wire in &gate.outputs {
            let bit = self.variable_for(bit_wire)?;
            // booleanity: b * (1 - b) = 0
            let mut one_minus_bit = lc_one::<F>();
            one_minus_bit += (-F::one(), bit);
            self.cs
                .enforce_constraint(lc_of(bit), one_minus_bit, LinearCombination(Vec::new()))?;
            sum += (power, bit);
            power.double_in_place();
        }
        self.cs
            .enforce_constraint((*input).clone(), lc_one::<F>(), sum)?;
        Ok(())
    }

    /// `zerop` proves `o2 = (w != 0)` with a fresh inverse variable `m`:
    /// `L * (1 - o2) = 0` and `L * m = o2`. The first declared output wire
    /// is unused by the constraint system.
    fn constrain_zerop(&mut self, gate: &Gate<F>) -> Result<(), CircuitError> {
        let tested = self.find(gate.inputs[0], false)?;
        let out = self.variable_for(gate.outputs[1])?;
        let inverse = self
            .cs
            .new_witness_variable(|| Err(SynthesisError::AssignmentMissing))?;
        let mut one_minus_out = lc_one::<F>();
        one_minus_out += (-F::one(), out);
        self.cs
            .enforce_constraint((*tested).clone(), one_minus_out, LinearCombination(Vec::new()))?;
        self.cs
            .enforce_constraint((*tested).clone(), lc_of(inverse), lc_of(out))?;
        self.zerop_aux.push((inverse, Rc::clone(&tested)));
        Ok(())
    }

    fn group_values(&self, wires: &[Wire]) -> Vec<F> {
        wires.iter().map(|&wire| self.wire_values[wire]).collect()
    }
}

fn take_owned<F: PrimeField>(lc: SharedLc<F>) -> LinearCombination<F> {
    Rc::try_unwrap(lc).unwrap_or_else(|shared| (*shared).clone())
}

fn lc_of<F: PrimeField>(var: Variable) -> LinearCombination<F> {
    LinearCombination(vec![(F::one(), var)])
}

fn lc_one<F: PrimeField>() -> LinearCombination<F> {
    lc_of(Variable::One)
}

/// `acc += factor * other`, term by term.
fn lc_add_scaled<F: PrimeField>(
    acc: &mut LinearCombination<F>,
    factor: F,
    other: &LinearCombination<F>,
) {
    for (coeff, var) in &other.0 {
        *acc += (factor * coeff, *var);
    }
}

fn lc_scale<F: PrimeField>(lc: &mut LinearCombination<F>, factor: F) {
    for (coeff, _) in &mut lc.0 {
        *coeff *= factor;
    }
}

fn variable_index(var: Variable, num_instance: usize) -> usize {
    match var {
        Variable::One => 0,
        Variable::Instance(i) => i,
        Variable::Witness(j) => num_instance + j,
        Variable::Zero | Variable::SymbolicLc(_) => {
            unreachable!("the reader emits only concrete variables")
        }
    }
}

fn eval_lc<F: PrimeField>(lc: &LinearCombination<F>, z: &[F], num_instance: usize) -> F {
    lc.0.iter().fold(F::zero(), |acc, (coeff, var)| {
        acc + *coeff * z[variable_index(*var, num_instance)]
    })
}

fn eval_gate<F: PrimeField>(gate: &Gate<F>, wire_values: &mut [F]) {
    match &gate.op {
        GateOp::Add => {
            wire_values[gate.outputs[0]] = gate
                .inputs
                .iter()
                .fold(F::zero(), |acc, &wire| acc + wire_values[wire]);
        }
        GateOp::Mul => {
            wire_values[gate.outputs[0]] =
                wire_values[gate.inputs[0]] * wire_values[gate.inputs[1]];
        }
        GateOp::Xor => {
            wire_values[gate.outputs[0]] =
                if wire_values[gate.inputs[0]] == wire_values[gate.inputs[1]] {
                    F::zero()
                } else {
                    F::one()
                };
        }
        GateOp::Or => {
            wire_values[gate.outputs[0]] = if wire_values[gate.inputs[0]].is_zero()
                && wire_values[gate.inputs[1]].is_zero()
            {
                F::zero()
            } else {
                F::one()
            };
        }
        GateOp::Assert => {}
        GateOp::ConstMul(constant) => {
            wire_values[gate.outputs[0]] = *constant * wire_values[gate.inputs[0]];
        }
        GateOp::Zerop => {
            wire_values[gate.outputs[1]] = if wire_values[gate.inputs[0]].is_zero() {
                F::zero()
            } else {
                F::one()
            };
        }
        GateOp::Split => {
            let bits = wire_values[gate.inputs[0]].into_bigint();
            for (i, &bit_wire) in gate.outputs.iter().enumerate() {
                wire_values[bit_wire] = if bits.get_bit(i) { F::one() } else { F::zero() };
            }
        }
        GateOp::Pack => {
            let mut sum = F::zero();
            let mut power = F::one();
            for &wire in &gate.inputs {
                sum += power * wire_values[wire];
                power.double_in_place();
            }
            wire_values[gate.outputs[0]] = sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snark::is_satisfied;
    use ark_bn254::Fr;

    fn reader_for(arith: &str, inputs: &str) -> CircuitReader<Fr> {
        let circuit = ArithCircuit::parse_str(arith).unwrap();
        let mut reader = CircuitReader::translate(circuit).unwrap();
        reader.read_inputs(inputs).unwrap();
        reader
    }

    fn satisfied(reader: CircuitReader<Fr>, rnd: &[Fr]) -> (bool, Assignment<Fr>) {
        let cs = reader.constraint_system();
        let assignment = reader.eval(rnd).unwrap();
        cs.finalize();
        let matrices = cs.to_matrices().unwrap();
        (
            is_satisfied(&matrices, &assignment.to_variable_vec()),
            assignment,
        )
    }

    #[test]
    fn identity_circuit_has_no_constraints() {
        let reader = reader_for("total 2\nstmt 0\nstmt 1\nadd in 1 <0> out 1 <1>\n", "0 0x1\n");
        let layout = reader.layout();
        assert_eq!(layout.n_stmt, 2);
        assert_eq!(layout.n_aux, 0);
        assert_eq!(reader.constraint_system().num_constraints(), 0);
        let (ok, assignment) = satisfied(reader, &[]);
        assert!(ok);
        assert_eq!(assignment.stmt, vec![Fr::from(1u64); 2]);
    }

    #[test]
    fn multiplication_gate_evaluates_and_satisfies() {
        let reader = reader_for(
            "total 3\nstmt 0\nstmt 1\nstmt 2\nmul in 2 <0 1> out 1 <2>\n",
            "0 0x3\n1 0x5\n",
        );
        assert_eq!(reader.constraint_system().num_constraints(), 1);
        let (ok, assignment) = satisfied(reader, &[]);
        assert!(ok);
        assert_eq!(
            assignment.stmt,
            vec![Fr::from(3u64), Fr::from(5u64), Fr::from(15u64)]
        );
    }

    #[test]
    fn linear_chain_fuses_into_one_constraint() {
        // add, const-mul and pack outputs stay linear combinations; only the
        // final mul emits a constraint.
        let reader = reader_for(
            "total 8\n\
             stmt 0\nstmt 1\nstmt 2\n\
             add in 2 <0 1> out 1 <3>\n\
             const-mul-3 in 1 <3> out 1 <4>\n\
             pack in 2 <4 2> out 1 <5>\n\
             mul in 2 <5 0> out 1 <6>\n",
            "0 0x2\n1 0x3\n2 0x1\n",
        );
        assert_eq!(reader.constraint_system().num_constraints(), 1);
        let layout = reader.layout();
        // only the mul output wire becomes an auxiliary variable
        assert_eq!(layout.n_aux, 1);
        let (ok, assignment) = satisfied(reader, &[]);
        assert!(ok);
        // (2 + 3) * 3 + 2 * 1 = 17, times stmt 0
        assert_eq!(assignment.aux, vec![Fr::from(34u64)]);
    }

    #[test]
    fn group_variable_ranges_are_contiguous() {
        let circuit = ArithCircuit::<Fr>::parse_str(
            "total 8\n\
             spec 0\n\
             stmt 1\nstmt 2\n\
             witness 3\n\
             rnd 4\n\
             mul in 2 <0 3> out 1 <5>\n\
             mul in 2 <5 4> out 1 <6>\n\
             assert in 2 <6 1> out 1 <2>\n",
        )
        .unwrap();
        let reader = CircuitReader::translate(circuit).unwrap();
        let layout = reader.layout();
        assert_eq!(
            (layout.n_spec, layout.n_stmt, layout.n_witness, layout.n_rnd, layout.n_aux),
            (1, 2, 1, 1, 2)
        );
        let num_instance = layout.num_instance_variables();
        let index = |wire: Wire| variable_index(reader.var_map[&wire], num_instance);
        assert_eq!(index(0), 1);
        assert_eq!(index(1), 2);
        assert_eq!(index(2), 3);
        assert_eq!(index(3), 4);
        assert_eq!(index(4), 5);
        assert_eq!(index(5), 6);
        assert_eq!(index(6), 7);
    }

    #[test]
    fn zerop_handles_zero_and_nonzero_inputs() {
        let arith = "total 4\nstmt 0\nwitness 1\nzerop in 1 <0> out 2 <2 3>\n";
        for (input, expected) in [("0 0x0\n", Fr::from(0u64)), ("0 0x7\n", Fr::from(1u64))] {
            let reader = reader_for(arith, input);
            let (ok, assignment) = satisfied(reader, &[]);
            assert!(ok);
            // aux holds [o2, inverse]
            assert_eq!(assignment.aux[0], expected);
        }
    }

    #[test]
    fn split_then_pack_restores_the_input() {
        // wire 9 packs the split bits of wire 0; wire 10 carries the
        // constant one used by the closing assert.
        let arith = "total 11\n\
             stmt 0\nstmt 10\n\
             split in 1 <0> out 8 <1 2 3 4 5 6 7 8>\n\
             pack in 8 <1 2 3 4 5 6 7 8> out 1 <9>\n\
             assert in 2 <0 10> out 1 <9>\n";
        for value in [0u64, 1, 0xa5, 0xff] {
            let reader = reader_for(arith, &format!("0 {value:#x}\n10 0x1\n"));
            let (ok, _) = satisfied(reader, &[]);
            assert!(ok);
        }
    }

    #[test]
    fn missing_statement_value_breaks_satisfaction() {
        let reader = reader_for(
            "total 4\nstmt 0\nstmt 1\nstmt 2\nmul in 2 <0 1> out 1 <3>\nassert in 2 <3 1> out 1 <2>\n",
            "0 0x3\n1 0x2\n",
        );
        // wire 2 should equal 12 but defaults to zero
        let (ok, _) = satisfied(reader, &[]);
        assert!(!ok);
    }

    #[test]
    fn malformed_input_lines_are_fatal() {
        let fresh = || {
            let circuit = ArithCircuit::<Fr>::parse_str("total 2\nstmt 0\nstmt 1\n").unwrap();
            CircuitReader::translate(circuit).unwrap()
        };
        let err = fresh().read_inputs("5 0x1\n").unwrap_err();
        assert!(matches!(err, CircuitError::WireOutOfRange { wire: 5, .. }));
        let err = fresh().read_inputs("0\n").unwrap_err();
        assert!(matches!(err, CircuitError::Inputs { line: 1, .. }));
        let err = fresh().read_inputs("0 0xzz\n").unwrap_err();
        assert!(matches!(err, CircuitError::Inputs { line: 1, .. }));
        let err = fresh().read_inputs("x 0x1\n").unwrap_err();
        assert!(matches!(err, CircuitError::Inputs { line: 1, .. }));
    }

    #[test]
    fn duplicate_declaration_is_fatal() {
        let circuit =
            ArithCircuit::<Fr>::parse_str("total 2\nstmt 0\nwitness 0\n").unwrap();
        let err = CircuitReader::translate(circuit).unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateDeclaration { wire: 0, .. }));
    }

    #[test]
    fn translation_is_deterministic() {
        let arith = "total 6\n\
             stmt 0\nstmt 1\n\
             add in 2 <0 1> out 1 <2>\n\
             mul in 2 <2 0> out 1 <3>\n\
             xor in 2 <0 1> out 1 <4>\n\
             or in 2 <0 1> out 1 <5>\n";
        let build = || {
            let circuit = ArithCircuit::<Fr>::parse_str(arith).unwrap();
            let reader = CircuitReader::translate(circuit).unwrap();
            let cs = reader.constraint_system();
            cs.finalize();
            cs.to_matrices().unwrap()
        };
        let (m1, m2) = (build(), build());
        assert_eq!(m1.a, m2.a);
        assert_eq!(m1.b, m2.b);
        assert_eq!(m1.c, m2.c);
    }
}
