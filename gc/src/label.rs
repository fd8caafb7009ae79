use std::collections::HashMap;

use rand::RngCore;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::circuit::{Circuit, WireId};
use crate::constants::LABEL_BYTES;

/// A 128-bit wire label. `Lb` on a given wire encodes logical value `b`; the
/// label's least-significant bit is its select bit, which the garbled-table
/// row layout is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct WireLabel([u8; LABEL_BYTES]);

impl WireLabel {
    /// Builds a label from raw bytes.
    pub fn new(bytes: [u8; LABEL_BYTES]) -> Self {
        WireLabel(bytes)
    }

    /// Draws a uniformly random label from `rng`.
    pub fn random(rng: &mut ChaCha12Rng) -> Self {
        let mut bytes = [0u8; LABEL_BYTES];
        rng.fill_bytes(&mut bytes);
        WireLabel(bytes)
    }

    /// XORs this label with `other`.
    pub fn xor(&self, other: &WireLabel) -> WireLabel {
        let mut result = [0u8; LABEL_BYTES];
        for i in 0..LABEL_BYTES {
            result[i] = self.0[i] ^ other.0[i];
        }
        WireLabel(result)
    }

    /// The label's select bit, exposed to whoever holds the label.
    pub fn select_bit(&self) -> bool {
        self.0[LABEL_BYTES - 1] & 1 == 1
    }

    /// Raw bytes, used as key-derivation and encryption input.
    pub fn as_bytes(&self) -> &[u8; LABEL_BYTES] {
        &self.0
    }

    /// Builds the free-XOR global delta: a random label with its select bit
    /// forced to 1, guaranteeing `L0.select_bit() != L1.select_bit()` on
    /// every wire whose labels are derived from it.
    pub fn random_delta(rng: &mut ChaCha12Rng) -> Self {
        let mut delta = Self::random(rng);
        delta.0[LABEL_BYTES - 1] |= 1;
        delta
    }
}

/// Per-wire label material: a free-XOR base label plus an independent random
/// polarity bit deciding which of `{base, base ^ delta}` encodes 0 versus 1.
#[derive(Debug, Clone, Copy)]
struct WireEntry {
    base: WireLabel,
    polarity: bool,
}

/// The garbler's exclusive mapping from wire id to both of that wire's
/// labels. Never serialized or shared with the evaluator directly — only
/// individual labels (picked per the protocol's input- and OT-delivery
/// steps) and the derived [`crate::garbler::OutputDecodingTable`] leave this
/// structure.
#[derive(Debug)]
pub struct WireLabels {
    entries: HashMap<WireId, WireEntry>,
    delta: WireLabel,
}

impl WireLabels {
    /// Generates a fresh label table for every wire in `circuit` (its inputs
    /// and every gate's output wire), plus a session-wide free-XOR delta.
    ///
    /// Input wires and table-garbled gate outputs get an independent random
    /// base label and polarity bit. A free-XOR gate's output (`Xor`/`Xnor`)
    /// does not: its base is fixed to the XOR of its input bases and its
    /// polarity to the XOR of its input polarities (flipped once more for
    /// `Xnor`), which is exactly what lets the evaluator compute that gate's
    /// output label by XORing the two labels it's holding, with no garbled
    /// table row at all. Gates are assumed topologically ordered, as
    /// [`Circuit::validate`] requires.
    pub fn generate(circuit: &Circuit, rng: &mut ChaCha12Rng) -> Self {
        let delta = WireLabel::random_delta(rng);
        let mut entries = HashMap::new();

        for &wire in circuit
            .alice_inputs
            .iter()
            .chain(circuit.bob_inputs.iter())
        {
            entries.insert(
                wire,
                WireEntry {
                    base: WireLabel::random(rng),
                    polarity: rng.next_u32() & 1 == 1,
                },
            );
        }
        for gate in &circuit.gates {
            let entry = if gate.op.is_free() {
                let a = entries[&gate.inputs[0]];
                let b = entries[&gate.inputs[1]];
                let is_xnor = gate.op == crate::circuit::GateOp::Xnor;
                WireEntry {
                    base: a.base.xor(&b.base),
                    polarity: a.polarity ^ b.polarity ^ is_xnor,
                }
            } else {
                WireEntry {
                    base: WireLabel::random(rng),
                    polarity: rng.next_u32() & 1 == 1,
                }
            };
            entries.insert(gate.id, entry);
        }

        WireLabels { entries, delta }
    }

    /// The session-wide free-XOR delta.
    pub fn delta(&self) -> WireLabel {
        self.delta
    }

    /// The label on `wire` encoding `bit`, or `None` if `wire` isn't part of
    /// this table (an unknown or dangling wire id).
    pub fn label_for(&self, wire: WireId, bit: bool) -> Option<WireLabel> {
        let entry = self.entries.get(&wire)?;
        let flip = bit ^ entry.polarity;
        Some(if flip {
            entry.base.xor(&self.delta)
        } else {
            entry.base
        })
    }

    /// Both labels `(L0, L1)` for `wire`.
    pub fn both(&self, wire: WireId) -> Option<(WireLabel, WireLabel)> {
        Some((self.label_for(wire, false)?, self.label_for(wire, true)?))
    }

    /// Overwrites every wire's label material and the delta with zero bytes.
    pub fn zeroize(&mut self) {
        for entry in self.entries.values_mut() {
            entry.base.zeroize();
        }
        self.delta.zeroize();
    }
}

impl Drop for WireLabels {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_label_xor_is_involutive() {
        let a = WireLabel::new([0x11; LABEL_BYTES]);
        let b = WireLabel::new([0x22; LABEL_BYTES]);
        assert_eq!(a.xor(&b).xor(&b), a);
    }

    #[test]
    fn delta_select_bit_is_one() {
        let mut rng = ChaCha12Rng::from_seed_for_test();
        let delta = WireLabel::random_delta(&mut rng);
        assert!(delta.select_bit());
    }

    #[test]
    fn label_pair_has_complementary_select_bits() {
        let mut rng = ChaCha12Rng::from_seed_for_test();
        let circuit = crate::comparator::build_signed_comparator(4);
        let labels = WireLabels::generate(&circuit, &mut rng);
        for &wire in circuit.alice_inputs.iter().chain(circuit.bob_inputs.iter()) {
            let (l0, l1) = labels.both(wire).unwrap();
            assert_ne!(l0.select_bit(), l1.select_bit());
        }
    }

    trait SeedForTest {
        fn from_seed_for_test() -> Self;
    }
    impl SeedForTest for ChaCha12Rng {
        fn from_seed_for_test() -> Self {
            use rand::SeedableRng;
            ChaCha12Rng::from_seed([7u8; 32])
        }
    }
}
