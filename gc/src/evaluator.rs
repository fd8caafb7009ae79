//! Gate-by-gate evaluation of a garbled circuit. The evaluator never learns
//! a logical bit mid-circuit — only labels — until the final
//! [`crate::garbler::OutputDecodingTable`] lookup on the declared outputs.

use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressStyle};

use crate::circuit::{Circuit, WireId};
use crate::crypto;
use crate::error::{ProtocolError, Result};
use crate::garbler::GarbledCircuit;
use crate::label::WireLabel;

fn row_index(input_labels: &[WireLabel]) -> usize {
    input_labels
        .iter()
        .enumerate()
        .fold(0usize, |acc, (i, label)| acc | ((label.select_bit() as usize) << i))
}

/// Evaluates `garbled` over `circuit`'s topology, starting from `input_labels`
/// (the labels the evaluator holds for every input wire — its own, delivered
/// directly, and the garbler's, delivered via oblivious transfer). Returns
/// the label computed for every wire in the circuit, keyed by wire id, so a
/// caller can look up any declared output.
pub fn evaluate_circuit(
    circuit: &Circuit,
    garbled: &GarbledCircuit,
    input_labels: &HashMap<WireId, WireLabel>,
) -> Result<HashMap<WireId, WireLabel>> {
    if garbled.gates.len() != circuit.gates.len() {
        return Err(ProtocolError::Malformed(
            "garbled gate count does not match circuit gate count".to_string(),
        ));
    }

    let mut values = input_labels.clone();

    let pb = ProgressBar::new(circuit.gates.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("evaluating gates");

    for (gate, garbled_gate) in circuit.gates.iter().zip(&garbled.gates) {
        pb.inc(1);
        if gate.id != garbled_gate.id {
            return Err(ProtocolError::Malformed(format!(
                "garbled gate id {} does not match circuit gate id {}",
                garbled_gate.id, gate.id
            )));
        }

        let input_labels: Vec<WireLabel> = gate
            .inputs
            .iter()
            .map(|wire| {
                values.get(wire).copied().ok_or_else(|| {
                    ProtocolError::Malformed(format!("wire {wire} evaluated before its producer"))
                })
            })
            .collect::<Result<_>>()?;

        let out_label = match &garbled_gate.rows {
            None => {
                // Free-XOR gate: XOR the input labels directly, no table needed.
                input_labels
                    .iter()
                    .skip(1)
                    .fold(input_labels[0], |acc, l| acc.xor(l))
            }
            Some(rows) => {
                let idx = row_index(&input_labels);
                let row = rows.get(idx).ok_or_else(|| {
                    ProtocolError::Malformed(format!(
                        "garbled table for gate {} has no row {idx}",
                        gate.id
                    ))
                })?;
                crypto::aead_decrypt(&input_labels, gate.id, row)?
            }
        };

        values.insert(gate.id, out_label);
    }
    pb.finish_and_clear();

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::build_signed_comparator;
    use crate::garbler::garble_circuit;
    use crate::reference::to_signed_bits;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn rejects_gate_count_mismatch() {
        let circuit = build_signed_comparator(4);
        let mut rng = ChaCha12Rng::from_seed([1u8; 32]);
        let (_labels, mut garbled, _decoding) = garble_circuit(&circuit, &mut rng);
        garbled.gates.pop();
        let empty = HashMap::new();
        assert!(matches!(
            evaluate_circuit(&circuit, &garbled, &empty),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn missing_input_label_is_malformed_not_a_panic() {
        let circuit = build_signed_comparator(4);
        let mut rng = ChaCha12Rng::from_seed([2u8; 32]);
        let (_labels, garbled, _decoding) = garble_circuit(&circuit, &mut rng);
        let empty = HashMap::new();
        assert!(matches!(
            evaluate_circuit(&circuit, &garbled, &empty),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn full_evaluation_is_deterministic_given_labels() {
        let circuit = build_signed_comparator(6);
        let mut rng = ChaCha12Rng::from_seed([6u8; 32]);
        let (labels, garbled, _decoding) = garble_circuit(&circuit, &mut rng);
        let a_bits = to_signed_bits(10, circuit.n_bits);
        let b_bits = to_signed_bits(-10, circuit.n_bits);
        let mut input_labels = HashMap::new();
        for (&wire, bit) in circuit.alice_inputs.iter().zip(a_bits) {
            input_labels.insert(wire, labels.label_for(wire, bit).unwrap());
        }
        for (&wire, bit) in circuit.bob_inputs.iter().zip(b_bits) {
            input_labels.insert(wire, labels.label_for(wire, bit).unwrap());
        }
        let first = evaluate_circuit(&circuit, &garbled, &input_labels).unwrap();
        let second = evaluate_circuit(&circuit, &garbled, &input_labels).unwrap();
        assert_eq!(first, second);
    }
}
