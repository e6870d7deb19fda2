pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_PROOF: u64 = 100;
/// Four leading zero bytes.
pub const DEFAULT_DIFFICULTY_BITS: u32 = 32;
/// How many candidates the sequential search tries between cancellation checks.
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;
