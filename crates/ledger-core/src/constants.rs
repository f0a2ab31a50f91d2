pub const HASH_SIZE: usize = 32;
pub const DEFAULT_DIFFICULTY: usize = 2;
pub const DEFAULT_MINING_REWARD: u64 = 100;
/// 2021-01-01T00:00:00Z in milliseconds.
pub const GENESIS_TIMESTAMP: u64 = 1_609_459_200_000;
pub const GENESIS_DATA: &str = "Genesis Block";
pub const HEADER_RECORD_PREFIX: &str = "Block Header: ";
