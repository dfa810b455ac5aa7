//! Grammar of the arithmetic circuit file and the parsed statement list.
//!
//! The file is line oriented. The first significant line is `total <N>`,
//! declaring the dense wire-id space `0..N`. Every following line is either a
//! `#` comment, a wire-group declaration (`spec <w>`, `stmt <w>`,
//! `witness <w>`, `rnd <w>`) or a gate statement of the form
//! `<op> in <k> <w_1 .. w_k> out <m> <u_1 .. u_m>`.

use ark_ff::PrimeField;
use std::fs;
use std::path::Path;

use super::error::CircuitError;

/// Dense wire identifier, `0..total`.
pub type Wire = usize;

/// Group a wire is declared into. Wires first seen as gate outputs with no
/// declaration become auxiliary and carry no tag here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireGroup {
    Spec,
    Stmt,
    Witness,
    Rnd,
}

/// Gate operator. Constant multiplications carry the parsed field constant,
/// already negated for the `const-mul-neg-` spelling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateOp<F: PrimeField> {
    Add,
    Mul,
    Xor,
    Or,
    Assert,
    ConstMul(F),
    Zerop,
    Split,
    Pack,
}

#[derive(Clone, Debug)]
pub struct Gate<F: PrimeField> {
    pub op: GateOp<F>,
    pub inputs: Vec<Wire>,
    pub outputs: Vec<Wire>,
    pub line: usize,
}

#[derive(Clone, Debug)]
pub enum Statement<F: PrimeField> {
    Declare {
        group: WireGroup,
        wire: Wire,
        line: usize,
    },
    Gate(Gate<F>),
}

/// A fully parsed circuit file. The statement list preserves file order; the
/// reader walks it once per pass instead of re-reading the file.
#[derive(Clone, Debug)]
pub struct ArithCircuit<F: PrimeField> {
    pub total_wires: usize,
    pub statements: Vec<Statement<F>>,
}

impl<F: PrimeField> ArithCircuit<F> {
    pub fn load(path: &Path) -> Result<Self, CircuitError> {
        let text = fs::read_to_string(path).map_err(|source| CircuitError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_str(&text)
    }

    pub fn parse_str(text: &str) -> Result<Self, CircuitError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (header_no, header) = lines.next().ok_or(CircuitError::Parse {
            line: 1,
            message: "empty circuit file".into(),
        })?;
        let total_wires = parse_total(header_no, header)?;

        let mut statements = Vec::new();
        for (line_no, line) in lines {
            let statement = parse_statement(line_no, line, total_wires)?;
            statements.push(statement);
        }
        Ok(Self {
            total_wires,
            statements,
        })
    }
}

fn parse_total(line_no: usize, line: &str) -> Result<usize, CircuitError> {
    let count = line
        .strip_prefix("total ")
        .and_then(|rest| rest.trim().parse::<usize>().ok());
    count.ok_or(CircuitError::Parse {
        line: line_no,
        message: format!("expected `total <N>`, found `{line}`"),
    })
}

fn parse_statement<F: PrimeField>(
    line_no: usize,
    line: &str,
    total: usize,
) -> Result<Statement<F>, CircuitError> {
    for (keyword, group) in [
        ("spec", WireGroup::Spec),
        ("stmt", WireGroup::Stmt),
        ("witness", WireGroup::Witness),
        ("rnd", WireGroup::Rnd),
    ] {
        if let Some(rest) = line.strip_prefix(keyword) {
            if let Ok(wire) = rest.trim().parse::<Wire>() {
                check_wire(line_no, wire, total)?;
                return Ok(Statement::Declare {
                    group,
                    wire,
                    line: line_no,
                });
            }
        }
    }
    parse_gate(line_no, line, total).map(Statement::Gate)
}

fn parse_gate<F: PrimeField>(
    line_no: usize,
    line: &str,
    total: usize,
) -> Result<Gate<F>, CircuitError> {
    let malformed = |message: String| CircuitError::Parse {
        line: line_no,
        message,
    };
    let (op_str, rest) = line
        .split_once(" in ")
        .ok_or_else(|| malformed(format!("unrecognized statement `{line}`")))?;
    let (in_part, out_part) = rest
        .split_once(" out ")
        .ok_or_else(|| malformed(format!("missing `out` list in `{line}`")))?;

    let op_str = op_str.trim();
    let op = parse_op::<F>(line_no, op_str)?;
    let inputs = parse_wire_list(line_no, op_str, in_part, total)?;
    let outputs = parse_wire_list(line_no, op_str, out_part, total)?;
    check_arity(line_no, &op, op_str, inputs.len(), outputs.len())?;

    Ok(Gate {
        op,
        inputs,
        outputs,
        line: line_no,
    })
}

fn parse_op<F: PrimeField>(line_no: usize, op: &str) -> Result<GateOp<F>, CircuitError> {
    let constant = |digits: &str| {
        field_from_hex::<F>(digits).ok_or(CircuitError::Parse {
            line: line_no,
            message: format!("bad hex constant in `{op}`"),
        })
    };
    match op {
        "add" => Ok(GateOp::Add),
        "mul" => Ok(GateOp::Mul),
        "xor" => Ok(GateOp::Xor),
        "or" => Ok(GateOp::Or),
        "assert" => Ok(GateOp::Assert),
        "zerop" => Ok(GateOp::Zerop),
        "split" => Ok(GateOp::Split),
        "pack" => Ok(GateOp::Pack),
        _ => {
            if let Some(digits) = op.strip_prefix("const-mul-neg-") {
                Ok(GateOp::ConstMul(-constant(digits)?))
            } else if let Some(digits) = op.strip_prefix("const-mul-") {
                Ok(GateOp::ConstMul(constant(digits)?))
            } else {
                Err(CircuitError::Parse {
                    line: line_no,
                    message: format!("unrecognized operator `{op}`"),
                })
            }
        }
    }
}

/// Parses `<k> '<' w_1 .. w_k '>'`, checking the declared count against the
/// list and every id against the wire space.
fn parse_wire_list(
    line_no: usize,
    op: &str,
    part: &str,
    total: usize,
) -> Result<Vec<Wire>, CircuitError> {
    let malformed = |message: String| CircuitError::Parse {
        line: line_no,
        message,
    };
    let (count, rest) = part
        .split_once('<')
        .ok_or_else(|| malformed("missing `<` in wire list".into()))?;
    let count: usize = count
        .trim()
        .parse()
        .map_err(|_| malformed(format!("bad wire count `{}`", count.trim())))?;
    let (list, _) = rest
        .split_once('>')
        .ok_or_else(|| malformed("missing `>` in wire list".into()))?;

    let mut wires = Vec::with_capacity(count);
    for token in list.split_whitespace() {
        let wire: Wire = token
            .parse()
            .map_err(|_| malformed(format!("bad wire id `{token}`")))?;
        check_wire(line_no, wire, total)?;
        wires.push(wire);
    }
    if wires.len() != count {
        return Err(CircuitError::Arity {
            line: line_no,
            op: op.into(),
            detail: format!("declared {count} wires, listed {}", wires.len()),
        });
    }
    Ok(wires)
}

fn check_arity<F: PrimeField>(
    line_no: usize,
    op: &GateOp<F>,
    op_str: &str,
    num_in: usize,
    num_out: usize,
) -> Result<(), CircuitError> {
    let ok = match op {
        GateOp::Add => num_in >= 1 && num_out == 1,
        GateOp::Mul | GateOp::Xor | GateOp::Or | GateOp::Assert => num_in == 2 && num_out == 1,
        GateOp::ConstMul(_) => num_in == 1 && num_out == 1,
        GateOp::Zerop => num_in == 1 && num_out == 2,
        GateOp::Split => num_in == 1 && num_out >= 1,
        GateOp::Pack => num_in >= 1 && num_out == 1,
    };
    if ok {
        Ok(())
    } else {
        Err(CircuitError::Arity {
            line: line_no,
            op: op_str.into(),
            detail: format!("{num_in} inputs, {num_out} outputs"),
        })
    }
}

fn check_wire(line_no: usize, wire: Wire, total: usize) -> Result<(), CircuitError> {
    if wire < total {
        Ok(())
    } else {
        Err(CircuitError::WireOutOfRange {
            line: line_no,
            wire,
            total,
        })
    }
}

/// Decodes a hex field element, with or without a `0x` prefix, of any digit
/// count, reducing modulo the field order.
pub fn field_from_hex<F: PrimeField>(text: &str) -> Option<F> {
    let digits = text.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    if digits.is_empty() {
        return None;
    }
    let bytes = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}")).ok()?
    } else {
        hex::decode(digits).ok()?
    };
    Some(F::from_be_bytes_mod_order(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn parses_declarations_and_gates() {
        let circuit = ArithCircuit::<Fr>::parse_str(
            "total 4\n\
             # a comment\n\
             stmt 0\n\
             stmt 1\n\
             \n\
             mul in 2 <0 1> out 1 <2>\n\
             const-mul-neg-2 in 1 <2> out 1 <3>\n",
        )
        .unwrap();
        assert_eq!(circuit.total_wires, 4);
        assert_eq!(circuit.statements.len(), 4);
        match &circuit.statements[3] {
            Statement::Gate(gate) => {
                assert_eq!(gate.op, GateOp::ConstMul(-Fr::from(2u64)));
                assert_eq!(gate.inputs, vec![2]);
                assert_eq!(gate.outputs, vec![3]);
            }
            other => panic!("expected a gate, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_header() {
        let err = ArithCircuit::<Fr>::parse_str("count 3\n").unwrap_err();
        assert!(matches!(err, CircuitError::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_unknown_operator() {
        let err =
            ArithCircuit::<Fr>::parse_str("total 2\nnand in 2 <0 0> out 1 <1>\n").unwrap_err();
        assert!(matches!(err, CircuitError::Parse { line: 2, .. }));
    }

    #[test]
    fn rejects_arity_mismatch() {
        let err = ArithCircuit::<Fr>::parse_str("total 3\nmul in 1 <0> out 1 <2>\n").unwrap_err();
        assert!(matches!(err, CircuitError::Arity { .. }));
        let err = ArithCircuit::<Fr>::parse_str("total 3\nadd in 2 <0 1> out 1 <2 1>\n");
        assert!(err.is_err());
    }

    #[test]
    fn rejects_out_of_range_wire() {
        let err = ArithCircuit::<Fr>::parse_str("total 2\nmul in 2 <0 5> out 1 <1>\n").unwrap_err();
        assert!(matches!(
            err,
            CircuitError::WireOutOfRange { wire: 5, total: 2, .. }
        ));
    }

    #[test]
    fn hex_decoding_handles_odd_lengths_and_prefix() {
        assert_eq!(field_from_hex::<Fr>("f"), Some(Fr::from(15u64)));
        assert_eq!(field_from_hex::<Fr>("0x10"), Some(Fr::from(16u64)));
        assert_eq!(field_from_hex::<Fr>("1ff"), Some(Fr::from(511u64)));
        assert_eq!(field_from_hex::<Fr>(""), None);
        assert_eq!(field_from_hex::<Fr>("zz"), None);
    }
}
