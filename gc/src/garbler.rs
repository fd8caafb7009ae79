//! The garbling engine: generates wire labels for a circuit and produces
//! the garbled gate tables and output decoding table sent to the evaluator.
//! Free-XOR gates (`Xor`/`Xnor`) contribute no table row at all — their
//! output label falls out of XORing the two input labels — so only
//! `And`/`Or`/`Nand`/`Not` gates carry [`Ciphertext`] rows here.

use indicatif::{ProgressBar, ProgressStyle};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::circuit::{Circuit, WireId};
use crate::crypto::{self, Ciphertext};
use crate::error::{ProtocolError, Result};
use crate::label::{WireLabel, WireLabels};

/// A garbled gate's table rows, point-and-permute indexed: row `i` is keyed
/// by the input labels whose select bits, read as a little-endian integer,
/// equal `i`. `None` marks a free-XOR gate, which needs no row at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarbledGateRows {
    pub id: WireId,
    pub rows: Option<Vec<Ciphertext>>,
}

/// The full set of garbled tables for a circuit, in the same order as the
/// (separately shared, public) [`Circuit`]'s gate list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarbledCircuit {
    pub gates: Vec<GarbledGateRows>,
}

/// Lets the evaluator translate a final output wire's label into a bit
/// without ever learning the garbler's label table: for each output wire,
/// a hash of each of its two labels, tagged with the wire id so a label
/// from one wire can't be mistaken for a match on another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDecodingTable {
    entries: Vec<OutputEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OutputEntry {
    wire: WireId,
    hash0: [u8; 32],
    hash1: [u8; 32],
}

fn output_commitment(wire: WireId, label: &WireLabel) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update(wire.to_le_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

impl OutputDecodingTable {
    fn build(circuit: &Circuit, labels: &WireLabels) -> Self {
        let entries = circuit
            .outputs
            .iter()
            .map(|&wire| {
                let (l0, l1) = labels
                    .both(wire)
                    .expect("output wire must have labels generated for it");
                OutputEntry {
                    wire,
                    hash0: output_commitment(wire, &l0),
                    hash1: output_commitment(wire, &l1),
                }
            })
            .collect();
        OutputDecodingTable { entries }
    }

    /// Decodes `label`, the final label the evaluator computed for `wire`,
    /// into its logical bit. Fails with [`ProtocolError::Crypto`] if `label`
    /// matches neither commitment — evaluation went wrong somewhere upstream.
    pub fn decode(&self, wire: WireId, label: &WireLabel) -> Result<bool> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.wire == wire)
            .ok_or_else(|| ProtocolError::Malformed(format!("wire {wire} is not a declared output")))?;
        let hash = output_commitment(wire, label);
        if hash == entry.hash0 {
            Ok(false)
        } else if hash == entry.hash1 {
            Ok(true)
        } else {
            Err(ProtocolError::Crypto)
        }
    }
}

fn row_index(input_labels: &[WireLabel]) -> usize {
    input_labels
        .iter()
        .enumerate()
        .fold(0usize, |acc, (i, label)| acc | ((label.select_bit() as usize) << i))
}

fn garble_gate(circuit_gate: &crate::circuit::Gate, labels: &WireLabels) -> GarbledGateRows {
    if circuit_gate.op.is_free() {
        return GarbledGateRows {
            id: circuit_gate.id,
            rows: None,
        };
    }

    let arity = circuit_gate.op.arity();
    let num_rows = 1usize << arity;
    let mut rows: Vec<Option<Ciphertext>> = vec![None; num_rows];

    for combo in 0..num_rows {
        let bits: Vec<bool> = (0..arity).map(|i| (combo >> i) & 1 == 1).collect();
        let input_labels: Vec<WireLabel> = circuit_gate
            .inputs
            .iter()
            .zip(&bits)
            .map(|(&wire, &bit)| {
                labels
                    .label_for(wire, bit)
                    .expect("every gate input wire must have labels generated for it")
            })
            .collect();
        let idx = row_index(&input_labels);
        let out_bit = circuit_gate.op.eval(bits[0], *bits.get(1).unwrap_or(&false));
        let out_label = labels
            .label_for(circuit_gate.id, out_bit)
            .expect("gate output wire must have labels generated for it");
        rows[idx] = Some(crypto::aead_encrypt(&input_labels, circuit_gate.id, &out_label));
    }

    GarbledGateRows {
        id: circuit_gate.id,
        rows: Some(
            rows.into_iter()
                .map(|r| r.expect("every row index is covered by exactly one input combination"))
                .collect(),
        ),
    }
}

/// Garbles `circuit`: generates a fresh label table and delta, builds every
/// gate's garbled rows (skipping free-XOR gates), and derives the output
/// decoding table. Returns the label table (which the garbler keeps to pick
/// input labels and which zeroizes on drop), the garbled tables (sent to
/// the evaluator), and the decoding table (also sent to the evaluator).
pub fn garble_circuit(
    circuit: &Circuit,
    rng: &mut ChaCha12Rng,
) -> (WireLabels, GarbledCircuit, OutputDecodingTable) {
    let labels = WireLabels::generate(circuit, rng);

    let pb = ProgressBar::new(circuit.gates.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("garbling gates");

    let gates = circuit
        .gates
        .iter()
        .map(|gate| {
            pb.inc(1);
            garble_gate(gate, &labels)
        })
        .collect();
    pb.finish_and_clear();

    let decoding = OutputDecodingTable::build(circuit, &labels);
    (labels, GarbledCircuit { gates }, decoding)
}
