use crate::circuit::{Circuit, Gate, GateOp, WireId};

/// Builds a balanced reduction tree over `wires` using `op` (`And` or `Or`),
/// appending the needed gates to `gates` and returning the final wire id.
/// `wires` must be non-empty. A depth-`log2(n)` tree keeps garbling and
/// evaluation work parallel-friendly instead of chaining a single long ladder.
fn reduce_tree(wires: Vec<WireId>, op: GateOp, gates: &mut Vec<Gate>, next_id: &mut WireId) -> WireId {
    let mut level = wires;
    while level.len() > 1 {
        let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
        let mut iter = level.chunks(2);
        for pair in &mut iter {
            if pair.len() == 2 {
                let id = *next_id;
                *next_id += 1;
                gates.push(Gate {
                    id,
                    op,
                    inputs: vec![pair[0], pair[1]],
                });
                next_level.push(id);
            } else {
                next_level.push(pair[0]);
            }
        }
        level = next_level;
    }
    level[0]
}

/// Builds a signed two's-complement `n_bits`-wide comparator circuit.
///
/// Alice's operand occupies wire ids `0..n_bits`, Bob's `n_bits..2*n_bits`,
/// bit 0 the least significant, bit `n_bits - 1` the sign bit. The circuit
/// exposes two output wires `[is_gt, is_lt]`: `(true, false)` means Alice's
/// operand is strictly greater, `(false, true)` means Bob's is, and
/// `(false, false)` means they're equal. `(true, true)` is unreachable.
///
/// Signed ordering is reduced to unsigned ordering by flipping each
/// operand's sign bit (standard two's-complement trick), then comparing
/// unsigned via a prefix-equality ladder: for each bit position, a running
/// AND of the more-significant bits' equality gates the "strictly greater
/// at this position" signal, and the per-bit candidates are combined with a
/// balanced OR-tree into the final `is_gt`.
pub fn build_signed_comparator(n_bits: u32) -> Circuit {
    assert!(n_bits >= 2, "comparator needs at least 2 bits for a sign bit plus one magnitude bit");

    let alice_inputs: Vec<WireId> = (0..n_bits).collect();
    let bob_inputs: Vec<WireId> = (n_bits..2 * n_bits).collect();
    let mut gates = Vec::new();
    let mut next_id = 2 * n_bits;

    let push = |op: GateOp, inputs: Vec<WireId>, gates: &mut Vec<Gate>, next_id: &mut WireId| -> WireId {
        let id = *next_id;
        *next_id += 1;
        gates.push(Gate { id, op, inputs });
        id
    };

    let top = n_bits - 1;
    let a_top = push(GateOp::Not, vec![alice_inputs[top as usize]], &mut gates, &mut next_id);
    let b_top = push(GateOp::Not, vec![bob_inputs[top as usize]], &mut gates, &mut next_id);

    // Sign-adjusted operand bits: identical to the raw input below the sign bit.
    let a_adj: Vec<WireId> = (0..n_bits)
        .map(|i| if i == top { a_top } else { alice_inputs[i as usize] })
        .collect();
    let b_adj: Vec<WireId> = (0..n_bits)
        .map(|i| if i == top { b_top } else { bob_inputs[i as usize] })
        .collect();

    // Per-bit equality, most significant first.
    let xnor: Vec<WireId> = (0..n_bits)
        .rev()
        .map(|i| push(GateOp::Xnor, vec![a_adj[i as usize], b_adj[i as usize]], &mut gates, &mut next_id))
        .collect();

    // prefix_eq[k] = AND of the k+1 most significant bits' equality (xnor[0..=k]).
    let mut prefix_eq: Vec<WireId> = Vec::with_capacity(n_bits as usize);
    prefix_eq.push(xnor[0]);
    for k in 1..xnor.len() {
        let id = push(GateOp::And, vec![prefix_eq[k - 1], xnor[k]], &mut gates, &mut next_id);
        prefix_eq.push(id);
    }

    // gt_i, most significant bit first: strictly greater at bit i given every
    // more significant bit matched (or, for the sign bit, unconditionally).
    let mut gt_terms = Vec::with_capacity(n_bits as usize);
    for i in (0..n_bits).rev() {
        let a_i = a_adj[i as usize];
        let b_i = b_adj[i as usize];
        let not_b_i = push(GateOp::Not, vec![b_i], &mut gates, &mut next_id);
        let a_gt_here = push(GateOp::And, vec![a_i, not_b_i], &mut gates, &mut next_id);
        let gt_i = if i == top {
            a_gt_here
        } else {
            // prefix_eq index for "all bits above i equal" is xnor/prefix_eq
            // position (n_bits - 1 - i) - 1, i.e. the ladder entry covering
            // bits top..=i+1.
            let above_idx = (n_bits - 1 - i) as usize - 1;
            push(GateOp::And, vec![a_gt_here, prefix_eq[above_idx]], &mut gates, &mut next_id)
        };
        gt_terms.push(gt_i);
    }

    let is_gt = reduce_tree(gt_terms, GateOp::Or, &mut gates, &mut next_id);
    let is_eq = reduce_tree(xnor, GateOp::And, &mut gates, &mut next_id);
    let not_gt = push(GateOp::Not, vec![is_gt], &mut gates, &mut next_id);
    let not_eq = push(GateOp::Not, vec![is_eq], &mut gates, &mut next_id);
    let is_lt = push(GateOp::And, vec![not_gt, not_eq], &mut gates, &mut next_id);

    Circuit {
        name: format!("signed-comparator-{n_bits}"),
        n_bits,
        alice_inputs,
        bob_inputs,
        outputs: vec![is_gt, is_lt],
        gates,
    }
}
