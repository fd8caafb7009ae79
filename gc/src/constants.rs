/// Byte width of a wire label (128 bits).
pub const LABEL_BYTES: usize = 16;

/// Default signed comparator bit width, matching the scenarios in the protocol's
/// testable-properties table.
pub const DEFAULT_BIT_WIDTH: u32 = 32;

/// Default fixed-point scale factor applied to input files (one decimal digit).
pub const DEFAULT_SCALE: u32 = 10;

/// Default per-message transport timeout.
pub const DEFAULT_MESSAGE_TIMEOUT_SECS: u64 = 30;

/// Upper bound on a single framed message's declared length, to reject a
/// corrupted length prefix before it drives an allocation.
pub const MAX_MESSAGE_BYTES: u32 = 64 * 1024 * 1024;
