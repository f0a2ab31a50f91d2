use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod block;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod sink;
pub mod transaction;

pub use block::{Block, HeaderRecord};
pub use config::LedgerConfig;
pub use crypto::{Address, KeyPair};
pub use error::LedgerError;
pub use ledger::Ledger;
pub use sink::{LogSink, MemorySink, NullSink};
pub use transaction::Transaction;

pub type Hash = [u8; constants::HASH_SIZE];

pub fn sha256(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; constants::HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub mod pow {
    use super::{Block, Hash};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum MineOutcome {
        Found,
        Cancelled,
    }

    /// Increment the nonce until the block hash has at least `difficulty`
    /// leading zero hex digits, starting from the block's current nonce.
    /// Without a cancel flag this only returns once a hash is found.
    pub fn search(
        block: &mut Block,
        difficulty: usize,
        cancel: Option<&AtomicBool>,
    ) -> MineOutcome {
        let prefix = block.preimage_prefix();
        loop {
            if meets_difficulty(&block.hash, difficulty) {
                return MineOutcome::Found;
            }
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return MineOutcome::Cancelled;
            }
            block.nonce = block.nonce.wrapping_add(1);
            block.hash = Block::hash_with_nonce(&prefix, block.nonce);
        }
    }

    pub fn meets_difficulty(hash: &Hash, difficulty: usize) -> bool {
        leading_zero_nibbles(hash) >= difficulty
    }

    /// Number of leading `'0'` characters in the hex form of `hash`.
    pub fn leading_zero_nibbles(hash: &Hash) -> usize {
        let mut total = 0usize;
        for b in hash {
            if *b == 0 {
                total += 2;
            } else {
                if *b < 0x10 {
                    total += 1;
                }
                break;
            }
        }
        total
    }
}
