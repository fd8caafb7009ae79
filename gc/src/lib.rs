//! Two-party garbled-circuit secure comparison of private signed-number maxima.
//!
//! Party A (the garbler) and party B (the evaluator) each hold a private set of
//! signed numbers. Running the protocol in this crate reveals only a two-bit
//! verdict about whose set contains the larger maximum: `00` if the maxima are
//! equal, `01` if A holds the unique global maximum, `11` if B does. Neither
//! party's individual values, nor either side's local maximum, are disclosed.
//!
//! The security model is honest-but-curious (no malicious-adversary hardening),
//! two parties only, and scoped to the signed-comparator circuit family — see
//! [`comparator`] for the one circuit shape this crate ships.

/// Typed error taxonomy and exit-code mapping for the protocol.
pub mod error;
/// Shared session constants.
pub mod constants;
/// Fixed-width wire labels and free-XOR label tables.
pub mod label;
/// Immutable boolean-circuit representation with topological validation.
pub mod circuit;
/// Signed two's-complement greater-than/not-equal circuit generator.
pub mod comparator;
/// Encrypt-then-MAC authenticated encryption for garbled-table rows.
pub mod crypto;
/// Garbling engine: label generation and garbled-table construction.
pub mod garbler;
/// Gate-by-gate garbled-circuit evaluation.
pub mod evaluator;
/// Diffie-Hellman 1-of-2 oblivious transfer.
pub mod ot;
/// Length-framed message transport between garbler and evaluator.
pub mod transport;
/// Role-specific protocol flows and the shared turn-based FSM.
pub mod protocol;
/// In-the-clear reference computation, used for tests and `--verify` mode.
pub mod reference;
/// Text input-file parsing (comma-separated, one-decimal fixed point).
pub mod input;

pub use error::ProtocolError;
