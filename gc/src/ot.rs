//! Diffie-Hellman 1-out-of-2 oblivious transfer, used to deliver the
//! evaluator's own input labels without revealing its private bits to the
//! garbler and without the evaluator learning the label it didn't choose.
//!
//! This generalizes the toy `u64` field arithmetic of a textbook DH-OT
//! sketch to a real 2048-bit safe-prime group (RFC 3526 Group 14,
//! generator 2), computed with arbitrary-precision arithmetic since no
//! fixed-width integer is wide enough for a cryptographically sound group.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::RngCore;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::{self, Ciphertext};
use crate::constants::LABEL_BYTES;
use crate::error::{ProtocolError, Result};
use crate::label::WireLabel;

const GROUP_14_PRIME_HEX: &str = "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7EDEE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3BE39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF6955817183995497CEA956AE515D2261898FA051015728E5A8AACAA68FFFFFFFFFFFFFFFF";

fn group_prime() -> BigUint {
    BigUint::parse_bytes(GROUP_14_PRIME_HEX.as_bytes(), 16)
        .expect("RFC 3526 Group 14 prime is a valid hex literal")
}

fn group_generator() -> BigUint {
    BigUint::from(2u32)
}

/// Rejects a received group element that falls outside `(1, p-1)` — either
/// a transport corruption or a peer attempting a small-subgroup-style
/// confusion attack.
fn validate_element(value: &BigUint, prime: &BigUint) -> Result<()> {
    if value <= &BigUint::one() || value >= &(prime - BigUint::one()) {
        return Err(ProtocolError::OtGroup);
    }
    Ok(())
}

fn random_exponent(rng: &mut ChaCha12Rng, prime: &BigUint) -> BigUint {
    let byte_len = prime.to_bytes_be().len();
    let mut bytes = vec![0u8; byte_len];
    rng.fill_bytes(&mut bytes);
    let candidate = BigUint::from_bytes_be(&bytes);
    let range = prime - BigUint::from(3u32);
    (candidate % range) + BigUint::from(2u32)
}

/// Derives this wire's OT key from the DH shared secret, wrapped as a
/// [`WireLabel`] so it can be fed straight into [`crypto::aead_encrypt`] /
/// [`crypto::aead_decrypt`] as the sole "input label" of a one-input gate.
fn derive_label_key(shared: &BigUint) -> WireLabel {
    let mut hasher = Sha256::new();
    hasher.update(shared.to_bytes_be());
    let digest = hasher.finalize();
    let mut key = [0u8; LABEL_BYTES];
    key.copy_from_slice(&digest[..LABEL_BYTES]);
    WireLabel::new(key)
}

/// The sender's (garbler's) first-round message: its DH public value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtSenderHello {
    pub public: Vec<u8>,
}

/// The receiver's (evaluator's) reply: its own DH public value, blinded by
/// the choice bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtReceiverHello {
    pub public: Vec<u8>,
}

/// The sender's second-round message: both candidate labels, each
/// authenticated-encrypted under a key only the matching choice bit can
/// derive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtSenderPayload {
    pub ciphertext0: Ciphertext,
    pub ciphertext1: Ciphertext,
}

/// Domain-separation tweaks passed as the "gate id" to [`crypto::aead_encrypt`]
/// / [`crypto::aead_decrypt`], so the two candidate labels of one OT instance
/// never share a key-derivation input with each other.
const OT_TWEAK_CHOICE_0: u32 = 0;
const OT_TWEAK_CHOICE_1: u32 = 1;

/// Per-wire sender state, live between the two round-trip messages.
#[derive(Debug)]
pub struct OtSender {
    private: BigUint,
    public: BigUint,
}

impl OtSender {
    /// Starts a fresh OT instance with a new random exponent — OT security
    /// requires independent randomness per transfer, so one instance is
    /// used per input wire rather than being reused across a session.
    pub fn new(rng: &mut ChaCha12Rng) -> (Self, OtSenderHello) {
        let prime = group_prime();
        let private = random_exponent(rng, &prime);
        let public = group_generator().modpow(&private, &prime);
        let hello = OtSenderHello {
            public: public.to_bytes_be(),
        };
        (OtSender { private, public }, hello)
    }

    /// Computes both masked labels once the receiver's reply arrives.
    /// `msg0`/`msg1` are the labels for logical `0`/`1` on this wire.
    pub fn respond(
        &self,
        receiver_hello: &OtReceiverHello,
        msg0: &WireLabel,
        msg1: &WireLabel,
    ) -> Result<OtSenderPayload> {
        let prime = group_prime();
        let b_public = BigUint::from_bytes_be(&receiver_hello.public);
        validate_element(&b_public, &prime)?;

        // Case choice=0: receiver sent g^b, so k0 = (g^b)^a = g^(ab).
        let k0 = b_public.modpow(&self.private, &prime);

        // Case choice=1: receiver sent g^a * g^b, so g^b = received / g^a,
        // computed via the sender's public value's modular inverse
        // (Fermat: A^(p-2) mod p, since p is prime).
        let a_inverse = self.public.modpow(&(&prime - BigUint::from(2u32)), &prime);
        let g_b = (&b_public * &a_inverse) % &prime;
        let k1 = g_b.modpow(&self.private, &prime);

        let key0 = derive_label_key(&k0);
        let key1 = derive_label_key(&k1);
        Ok(OtSenderPayload {
            ciphertext0: crypto::aead_encrypt(&[key0], OT_TWEAK_CHOICE_0, msg0),
            ciphertext1: crypto::aead_encrypt(&[key1], OT_TWEAK_CHOICE_1, msg1),
        })
    }
}

/// Per-wire receiver state, live between the two round-trip messages.
#[derive(Debug)]
pub struct OtReceiver {
    private: BigUint,
    choice: bool,
}

impl OtReceiver {
    /// Responds to the sender's hello with a choice-blinded public value.
    pub fn new(
        choice: bool,
        sender_hello: &OtSenderHello,
        rng: &mut ChaCha12Rng,
    ) -> Result<(Self, OtReceiverHello)> {
        let prime = group_prime();
        let a_public = BigUint::from_bytes_be(&sender_hello.public);
        validate_element(&a_public, &prime)?;

        let private = random_exponent(rng, &prime);
        let g_b = group_generator().modpow(&private, &prime);
        let public = if choice {
            (&a_public * &g_b) % &prime
        } else {
            g_b
        };

        Ok((OtReceiver { private, choice }, OtReceiverHello {
            public: public.to_bytes_be(),
        }))
    }

    /// Recovers the chosen label from the sender's masked payload.
    pub fn finish(&self, sender_hello: &OtSenderHello, payload: &OtSenderPayload) -> Result<WireLabel> {
        let prime = group_prime();
        let a_public = BigUint::from_bytes_be(&sender_hello.public);
        validate_element(&a_public, &prime)?;

        let shared = a_public.modpow(&self.private, &prime);
        let key = derive_label_key(&shared);
        let (ciphertext, tweak) = if self.choice {
            (&payload.ciphertext1, OT_TWEAK_CHOICE_1)
        } else {
            (&payload.ciphertext0, OT_TWEAK_CHOICE_0)
        };
        crypto::aead_decrypt(&[key], tweak, ciphertext)
    }
}
