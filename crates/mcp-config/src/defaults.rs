//! Dispatch and transport limits applied when nothing overrides them.

/// Deadline for one handler invocation, in milliseconds.
pub const DEFAULT_HANDLER_TIMEOUT_MS: u64 = 30_000;

/// Longest accepted inbound message line, in bytes.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Messages the stream server dispatches at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Handler workers allowed to be alive at once, counting those still running
/// after their deadline expired.
pub const DEFAULT_MAX_HANDLER_WORKERS: usize = 256;
