//! Authenticated encryption for garbled-table rows, built from SHA-256 —
//! this crate's only hashing dependency. There is no AEAD construction in
//! the label-encryption path of a Yao garbling scheme (the "plaintext" is
//! always exactly one wire label), so we build encrypt-then-MAC directly:
//! a keystream derived from the pair of input labels masks the output
//! label, and an HMAC-SHA256 tag over the ciphertext catches a wrong key.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::constants::LABEL_BYTES;
use crate::error::{ProtocolError, Result};
use crate::label::WireLabel;

const HMAC_BLOCK_SIZE: usize = 64;
const TAG_BYTES: usize = 16;

/// A garbled-table ciphertext row: a masked label plus a truncated HMAC tag
/// the evaluator uses to recognize the one row its labels decrypt correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ciphertext {
    pub masked: [u8; LABEL_BYTES],
    pub tag: [u8; TAG_BYTES],
}

/// Derives the per-row encryption key from a gate's input labels and id,
/// the same construction the teacher's ungeneralized AND-only garbler used
/// under the name `garbling_hash`, generalized here to any gate arity.
fn derive_key(input_labels: &[WireLabel], gate_id: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for label in input_labels {
        hasher.update(label.as_bytes());
    }
    hasher.update(gate_id.to_le_bytes());
    let digest = hasher.finalize();
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut effective_key = [0u8; HMAC_BLOCK_SIZE];
    if key.len() > HMAC_BLOCK_SIZE {
        let mut hasher = Sha256::new();
        hasher.update(key);
        let hash = hasher.finalize();
        effective_key[..32].copy_from_slice(&hash);
    } else {
        effective_key[..key.len()].copy_from_slice(key);
    }

    let mut i_key_pad = [0x36u8; HMAC_BLOCK_SIZE];
    let mut o_key_pad = [0x5cu8; HMAC_BLOCK_SIZE];
    for i in 0..HMAC_BLOCK_SIZE {
        i_key_pad[i] ^= effective_key[i];
        o_key_pad[i] ^= effective_key[i];
    }

    let mut inner_hasher = Sha256::new();
    inner_hasher.update(i_key_pad);
    inner_hasher.update(message);
    let inner_hash = inner_hasher.finalize();

    let mut outer_hasher = Sha256::new();
    outer_hasher.update(o_key_pad);
    outer_hasher.update(inner_hash);
    let outer_hash = outer_hasher.finalize();

    let mut tag = [0u8; 32];
    tag.copy_from_slice(&outer_hash);
    tag
}

fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Expands `key` into `LABEL_BYTES` of keystream, domain-separated from the
/// MAC key derived from the same `key` by a leading tag byte.
fn keystream(key: &[u8; 32]) -> [u8; LABEL_BYTES] {
    let mut hasher = Sha256::new();
    hasher.update([0u8]);
    hasher.update(key);
    let digest = hasher.finalize();
    let mut out = [0u8; LABEL_BYTES];
    out.copy_from_slice(&digest[..LABEL_BYTES]);
    out
}

fn mac_key(key: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([1u8]);
    hasher.update(key);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Encrypts `plaintext` (an output wire label) under the key derived from a
/// gate's input labels: XOR-mask with a keystream, then MAC the ciphertext.
pub fn aead_encrypt(input_labels: &[WireLabel], gate_id: u32, plaintext: &WireLabel) -> Ciphertext {
    let key = derive_key(input_labels, gate_id);
    let ks = keystream(&key);
    let mut masked = [0u8; LABEL_BYTES];
    for i in 0..LABEL_BYTES {
        masked[i] = plaintext.as_bytes()[i] ^ ks[i];
    }
    let full_tag = hmac_sha256(&mac_key(&key), &masked);
    let mut tag = [0u8; TAG_BYTES];
    tag.copy_from_slice(&full_tag[..TAG_BYTES]);
    Ciphertext { masked, tag }
}

/// Decrypts `ciphertext` under the key derived from the same input labels,
/// rejecting it with [`ProtocolError::Crypto`] if the tag doesn't match —
/// the evaluator's signal that this wasn't the row its labels select.
pub fn aead_decrypt(input_labels: &[WireLabel], gate_id: u32, ciphertext: &Ciphertext) -> Result<WireLabel> {
    let key = derive_key(input_labels, gate_id);
    let full_tag = hmac_sha256(&mac_key(&key), &ciphertext.masked);
    if !secure_compare(&full_tag[..TAG_BYTES], &ciphertext.tag) {
        return Err(ProtocolError::Crypto);
    }
    let ks = keystream(&key);
    let mut plain = [0u8; LABEL_BYTES];
    for i in 0..LABEL_BYTES {
        plain[i] = ciphertext.masked[i] ^ ks[i];
    }
    Ok(WireLabel::new(plain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn round_trips_with_matching_key() {
        let mut rng = ChaCha12Rng::from_seed([3u8; 32]);
        let a = WireLabel::random(&mut rng);
        let b = WireLabel::random(&mut rng);
        let out = WireLabel::random(&mut rng);
        let ct = aead_encrypt(&[a, b], 7, &out);
        assert_eq!(aead_decrypt(&[a, b], 7, &ct).unwrap(), out);
    }

    #[test]
    fn wrong_key_fails_tag_check() {
        let mut rng = ChaCha12Rng::from_seed([4u8; 32]);
        let a = WireLabel::random(&mut rng);
        let b = WireLabel::random(&mut rng);
        let wrong = WireLabel::random(&mut rng);
        let out = WireLabel::random(&mut rng);
        let ct = aead_encrypt(&[a, b], 7, &out);
        assert!(aead_decrypt(&[wrong, b], 7, &ct).is_err());
    }

    #[test]
    fn wrong_gate_id_fails_tag_check() {
        let mut rng = ChaCha12Rng::from_seed([5u8; 32]);
        let a = WireLabel::random(&mut rng);
        let b = WireLabel::random(&mut rng);
        let out = WireLabel::random(&mut rng);
        let ct = aead_encrypt(&[a, b], 7, &out);
        assert!(aead_decrypt(&[a, b], 8, &ct).is_err());
    }
}
