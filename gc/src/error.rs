use thiserror::Error;

/// The fatal error kinds the protocol can raise, each carrying its own exit
/// code (§7). Nothing here is retried: the protocol is single-shot, and every
/// variant moves the session FSM to `Aborted`.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A user-supplied value doesn't fit in the circuit's signed bit width.
    #[error("input {value} out of range for a signed {bits}-bit circuit")]
    InputOutOfRange {
        /// The offending value.
        value: i64,
        /// The circuit's bit width.
        bits: u32,
    },

    /// Circuit topology failed an invariant (cycle, dangling wire, duplicate id).
    #[error("malformed circuit: {0}")]
    Malformed(String),

    /// Authenticated decryption failed at either endpoint.
    #[error("authenticated decryption failed")]
    Crypto,

    /// An oblivious-transfer peer sent a group element outside the expected subgroup.
    #[error("oblivious transfer received an invalid group element")]
    OtGroup,

    /// A per-message or session deadline elapsed.
    #[error("timed out waiting for peer")]
    Timeout,

    /// The transport connection closed, a frame was malformed, or an oversized
    /// length prefix was rejected.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl ProtocolError {
    /// Maps this error to the process exit code specified in §7.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProtocolError::InputOutOfRange { .. } => 2,
            ProtocolError::Malformed(_)
            | ProtocolError::Crypto
            | ProtocolError::OtGroup
            | ProtocolError::Timeout => 3,
            ProtocolError::Transport(_) => 4,
        }
    }
}

/// Convenience alias used throughout the crate's core modules.
pub type Result<T> = std::result::Result<T, ProtocolError>;
