use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Identifies a wire by position. Input wires are numbered first (Alice's,
/// then Bob's), followed by one id per gate output, in the order gates
/// appear in [`Circuit::gates`].
pub type WireId = u32;

/// The boolean operation a [`Gate`] computes. `Xor`/`Xnor` garble for free
/// under the free-XOR scheme; every other variant needs a garbled table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateOp {
    Not,
    And,
    Or,
    Xor,
    Xnor,
    Nand,
}

impl GateOp {
    /// Evaluates this gate's truth table on clear bits. `b` is ignored for `Not`.
    pub fn eval(self, a: bool, b: bool) -> bool {
        match self {
            GateOp::Not => !a,
            GateOp::And => a && b,
            GateOp::Or => a || b,
            GateOp::Xor => a ^ b,
            GateOp::Xnor => !(a ^ b),
            GateOp::Nand => !(a && b),
        }
    }

    /// Whether this gate garbles for free under free-XOR (needs no table row).
    pub fn is_free(self) -> bool {
        matches!(self, GateOp::Xor | GateOp::Xnor)
    }

    /// Number of input wires this operation reads (1 for `Not`, 2 otherwise).
    pub fn arity(self) -> usize {
        match self {
            GateOp::Not => 1,
            _ => 2,
        }
    }
}

/// A single gate: its output wire id, operation, and one or two input wire ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub id: WireId,
    pub op: GateOp,
    pub inputs: Vec<WireId>,
}

/// An immutable boolean circuit: named input wires partitioned by owner, a
/// topologically-ordered gate list, and the wire ids whose final values are
/// the circuit's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    pub name: String,
    pub n_bits: u32,
    pub alice_inputs: Vec<WireId>,
    pub bob_inputs: Vec<WireId>,
    pub outputs: Vec<WireId>,
    pub gates: Vec<Gate>,
}

impl Circuit {
    /// Checks that every gate reads only from wires already defined (an
    /// input, or an earlier gate's output), that no wire id is produced
    /// twice, and that every declared output wire actually exists. Returns
    /// `Err(ProtocolError::Malformed)` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        let mut defined: HashSet<WireId> = HashSet::new();
        for &wire in self.alice_inputs.iter().chain(self.bob_inputs.iter()) {
            if !defined.insert(wire) {
                return Err(ProtocolError::Malformed(format!(
                    "input wire {wire} declared more than once"
                )));
            }
        }

        for gate in &self.gates {
            if gate.inputs.len() != gate.op.arity() {
                return Err(ProtocolError::Malformed(format!(
                    "gate {} ({:?}) expects {} input(s), got {}",
                    gate.id,
                    gate.op,
                    gate.op.arity(),
                    gate.inputs.len()
                )));
            }
            for &input in &gate.inputs {
                if !defined.contains(&input) {
                    return Err(ProtocolError::Malformed(format!(
                        "gate {} reads undefined wire {input}",
                        gate.id
                    )));
                }
            }
            if !defined.insert(gate.id) {
                return Err(ProtocolError::Malformed(format!(
                    "wire {} produced more than once",
                    gate.id
                )));
            }
        }

        if self.outputs.is_empty() {
            return Err(ProtocolError::Malformed(
                "circuit declares no output wires".to_string(),
            ));
        }
        for &output in &self.outputs {
            if !defined.contains(&output) {
                return Err(ProtocolError::Malformed(format!(
                    "output wire {output} is never produced"
                )));
            }
        }

        Ok(())
    }

    /// Total number of wires the circuit defines (inputs plus gate outputs).
    pub fn wire_count(&self) -> usize {
        self.alice_inputs.len() + self.bob_inputs.len() + self.gates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_circuit() -> Circuit {
        Circuit {
            name: "xor2".to_string(),
            n_bits: 1,
            alice_inputs: vec![0],
            bob_inputs: vec![1],
            outputs: vec![2],
            gates: vec![Gate {
                id: 2,
                op: GateOp::Xor,
                inputs: vec![0, 1],
            }],
        }
    }

    #[test]
    fn well_formed_circuit_validates() {
        assert!(xor_circuit().validate().is_ok());
    }

    #[test]
    fn gate_reading_undefined_wire_is_rejected() {
        let mut c = xor_circuit();
        c.gates[0].inputs = vec![0, 99];
        assert!(matches!(c.validate(), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn duplicate_wire_id_is_rejected() {
        let mut c = xor_circuit();
        c.gates.push(Gate {
            id: 2,
            op: GateOp::Not,
            inputs: vec![0],
        });
        assert!(matches!(c.validate(), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn dangling_output_is_rejected() {
        let mut c = xor_circuit();
        c.outputs = vec![42];
        assert!(matches!(c.validate(), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn gate_eval_matches_truth_tables() {
        assert!(GateOp::And.eval(true, true));
        assert!(!GateOp::And.eval(true, false));
        assert!(GateOp::Or.eval(true, false));
        assert!(!GateOp::Or.eval(false, false));
        assert!(GateOp::Xor.eval(true, false));
        assert!(GateOp::Xnor.eval(true, true));
        assert!(GateOp::Nand.eval(false, false));
        assert!(!GateOp::Not.eval(true, false));
    }
}
