//! In-the-clear verdict computation, used by tests and by `gc-cli --verify`
//! to sanity-check a garbled run without trusting the protocol itself.

use crate::protocol::Verdict;

/// Decomposes `value` into `n_bits` two's-complement bits, least significant
/// first — the same wire order [`crate::comparator::build_signed_comparator`]
/// assigns to each party's input wires.
pub fn to_signed_bits(value: i64, n_bits: u32) -> Vec<bool> {
    let mask: u64 = if n_bits >= 64 {
        u64::MAX
    } else {
        (1u64 << n_bits) - 1
    };
    let raw = (value as u64) & mask;
    (0..n_bits).map(|i| (raw >> i) & 1 == 1).collect()
}

/// Recomposes a little-endian two's-complement bit vector into a signed value.
pub fn from_signed_bits(bits: &[bool]) -> i64 {
    let n_bits = bits.len() as u32;
    let mut raw: u64 = 0;
    for (i, &b) in bits.iter().enumerate() {
        if b {
            raw |= 1u64 << i;
        }
    }
    if n_bits < 64 && (raw >> (n_bits - 1)) & 1 == 1 {
        let sign_extension = !0u64 << n_bits;
        (raw | sign_extension) as i64
    } else {
        raw as i64
    }
}

/// Computes the verdict a correct garbled run must produce: each party's
/// maximum, compared.
pub fn plain_verdict(alice_values: &[i64], bob_values: &[i64]) -> Verdict {
    let alice_max = alice_values.iter().copied().max().expect("non-empty input set");
    let bob_max = bob_values.iter().copied().max().expect("non-empty input set");
    match alice_max.cmp(&bob_max) {
        std::cmp::Ordering::Greater => Verdict::AliceMax,
        std::cmp::Ordering::Less => Verdict::BobMax,
        std::cmp::Ordering::Equal => Verdict::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_signed_values() {
        for n_bits in [4u32, 8, 16, 32] {
            let max = 1i64 << (n_bits - 1);
            for v in [0i64, 1, -1, max - 1, -max, max / 2, -(max / 2)] {
                let bits = to_signed_bits(v, n_bits);
                assert_eq!(from_signed_bits(&bits), v, "n_bits={n_bits} v={v}");
            }
        }
    }

    #[test]
    fn plain_verdict_picks_larger_maximum() {
        assert_eq!(plain_verdict(&[1, 5, 3], &[2, 4]), Verdict::AliceMax);
        assert_eq!(plain_verdict(&[1, 2], &[9, -1]), Verdict::BobMax);
        assert_eq!(plain_verdict(&[7, -2], &[7, 7]), Verdict::Equal);
    }
}
