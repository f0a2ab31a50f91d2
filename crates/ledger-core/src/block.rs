use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

use crate::{
    constants::{GENESIS_DATA, GENESIS_TIMESTAMP, HASH_SIZE, HEADER_RECORD_PREFIX},
    error::LedgerError,
    pow::{self, MineOutcome},
    sink::LogSink,
    Hash, Transaction,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub txs: Vec<Transaction>,
    pub previous_hash: Hash,
    pub hash: Hash,
    pub nonce: u64,
    /// Free-form payload; only the genesis block carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// The header fields written to the log sink once a block is mined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "TimeStamp")]
    pub timestamp: String,
    #[serde(rename = "Nonce")]
    pub nonce: String,
    #[serde(rename = "PreviousHash")]
    pub previous_hash: String,
    #[serde(rename = "Difficulty")]
    pub difficulty: String,
}

impl Block {
    /// Builds an unmined block: nonce 0, hash computed over the initial contents.
    pub fn new(timestamp: u64, txs: Vec<Transaction>, previous_hash: Hash) -> Self {
        let mut block = Self {
            timestamp,
            txs,
            previous_hash,
            hash: [0u8; HASH_SIZE],
            nonce: 0,
            data: None,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Fixed first block with an all-zero previous hash. It is never mined.
    pub fn genesis() -> Self {
        let mut block = Self {
            timestamp: GENESIS_TIMESTAMP,
            txs: vec![],
            previous_hash: [0u8; HASH_SIZE],
            hash: [0u8; HASH_SIZE],
            nonce: 0,
            data: Some(GENESIS_DATA.to_string()),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Everything hashed except the nonce: timestamp, previous hash, data and
    /// the JSON encoding of the transactions.
    pub fn preimage_prefix(&self) -> Vec<u8> {
        let txs_json =
            serde_json::to_vec(&self.txs).expect("transactions always serialize to JSON");
        let data = self.data.as_deref().unwrap_or_default().as_bytes();
        let mut bytes = Vec::with_capacity(8 + 32 + data.len() + txs_json.len());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&self.previous_hash);
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(&txs_json);
        bytes
    }

    pub fn hash_with_nonce(prefix: &[u8], nonce: u64) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(prefix);
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(&digest[..]);
        out
    }

    pub fn compute_hash(&self) -> Hash {
        Self::hash_with_nonce(&self.preimage_prefix(), self.nonce)
    }

    /// Searches nonces until the hash has `difficulty` leading zero hex digits.
    ///
    /// There is no upper bound: for a large enough difficulty this never
    /// returns. Use [`Block::mine_with_cancel`] to bound the search.
    pub fn mine(&mut self, difficulty: usize, sink: &dyn LogSink) {
        pow::search(self, difficulty, None);
        self.emit_header(difficulty, sink);
    }

    /// Same search as [`Block::mine`], abandoned once `cancel` is set. A
    /// cancelled block keeps its nonce, so calling again resumes the search.
    pub fn mine_with_cancel(
        &mut self,
        difficulty: usize,
        sink: &dyn LogSink,
        cancel: &AtomicBool,
    ) -> MineOutcome {
        let outcome = pow::search(self, difficulty, Some(cancel));
        if outcome == MineOutcome::Found {
            self.emit_header(difficulty, sink);
        }
        outcome
    }

    pub fn header_record(&self, difficulty: usize) -> HeaderRecord {
        HeaderRecord {
            hash: hex::encode(self.hash),
            timestamp: self.timestamp.to_string(),
            nonce: self.nonce.to_string(),
            previous_hash: hex::encode(self.previous_hash),
            difficulty: difficulty.to_string(),
        }
    }

    // Fire-and-forget: a failing sink never affects the block.
    pub(crate) fn emit_header(&self, difficulty: usize, sink: &dyn LogSink) {
        info!(
            "Mined block with nonce {} and hash {}",
            self.nonce,
            hex::encode(self.hash)
        );
        match serde_json::to_string(&self.header_record(difficulty)) {
            Ok(json) => {
                if let Err(e) = sink.append(&format!("{HEADER_RECORD_PREFIX}{json}")) {
                    warn!(error = %e, "failed to append block header to log sink");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode block header"),
        }
    }

    /// Stops at the first invalid transaction; errors from a transaction propagate.
    pub fn has_valid_transactions(&self) -> Result<bool, LedgerError> {
        for tx in &self.txs {
            if !tx.is_valid()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::KeyPair, pow::leading_zero_nibbles, sink::MemorySink, NullSink};
    use std::sync::atomic::Ordering;

    fn sample_txs() -> Vec<Transaction> {
        vec![
            Transaction::new("Alice", "Bob", 10),
            Transaction::reward("Charlie", 100),
        ]
    }

    #[test]
    fn new_block_starts_unmined() {
        let block = Block::new(1_600_000_000_000, sample_txs(), [0u8; 32]);
        assert_eq!(block.nonce, 0);
        assert_eq!(block.hash, block.compute_hash());
    }

    #[test]
    fn mined_hash_meets_difficulty() {
        for difficulty in 0..=3 {
            let mut block = Block::new(1_600_000_000_000, sample_txs(), [7u8; 32]);
            block.mine(difficulty, &NullSink);
            assert_eq!(block.hash, block.compute_hash());
            let hex_hash = hex::encode(block.hash);
            assert!(hex_hash.starts_with(&"0".repeat(difficulty)), "{hex_hash}");
            assert!(leading_zero_nibbles(&block.hash) >= difficulty);
        }
    }

    #[test]
    fn mining_emits_one_header_record() {
        let sink = MemorySink::new();
        let mut block = Block::new(1_600_000_000_000, sample_txs(), [1u8; 32]);
        block.mine(1, &sink);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        let json = records[0].strip_prefix("Block Header: ").unwrap();
        let header: HeaderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(header, block.header_record(1));
        assert_eq!(header.hash, hex::encode(block.hash));
        assert_eq!(header.previous_hash, hex::encode([1u8; 32]));
        assert_eq!(header.difficulty, "1");
        assert!(json.starts_with(r#"{"Hash":"#));
    }

    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn append(&self, _record: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn sink_failure_does_not_affect_mining() {
        let mut block = Block::new(1_600_000_000_000, sample_txs(), [0u8; 32]);
        block.mine(2, &BrokenSink);
        assert!(leading_zero_nibbles(&block.hash) >= 2);
        assert_eq!(block.hash, block.compute_hash());
    }

    #[test]
    fn cancelled_search_emits_nothing_and_can_resume() {
        let sink = MemorySink::new();
        let cancel = AtomicBool::new(true);
        let mut block = Block::new(1_600_000_000_000, sample_txs(), [0u8; 32]);
        // 64 zero digits is unreachable, so only the flag can end this.
        assert_eq!(
            block.mine_with_cancel(64, &sink, &cancel),
            MineOutcome::Cancelled
        );
        assert!(sink.records().is_empty());

        cancel.store(false, Ordering::Relaxed);
        assert_eq!(block.mine_with_cancel(1, &sink, &cancel), MineOutcome::Found);
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn hash_changes_with_any_field() {
        let base = Block::new(1_600_000_000_000, sample_txs(), [0u8; 32]);
        let h = base.compute_hash();

        let mut b = base.clone();
        b.nonce += 1;
        assert_ne!(b.compute_hash(), h);

        let mut b = base.clone();
        b.timestamp += 1;
        assert_ne!(b.compute_hash(), h);

        let mut b = base.clone();
        b.previous_hash = [9u8; 32];
        assert_ne!(b.compute_hash(), h);

        let mut b = base.clone();
        b.txs[0].amount = 5;
        assert_ne!(b.compute_hash(), h);
    }

    #[test]
    fn genesis_is_fixed() {
        let a = Block::genesis();
        let b = Block::genesis();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.previous_hash, [0u8; 32]);
        assert_eq!(a.data.as_deref(), Some("Genesis Block"));
        assert!(a.txs.is_empty());
    }

    #[test]
    fn has_valid_transactions_checks_every_record() {
        let key = KeyPair::generate();
        let mut tx = Transaction::new(key.address(), "bob", 10);
        tx.sign(&key).unwrap();
        let mut block = Block::new(0, vec![tx, Transaction::reward("miner", 100)], [0u8; 32]);
        assert_eq!(block.has_valid_transactions(), Ok(true));

        block.txs[0].amount = 99;
        assert_eq!(block.has_valid_transactions(), Ok(false));
    }

    #[test]
    fn has_valid_transactions_propagates_missing_signature() {
        let key = KeyPair::generate();
        let block = Block::new(0, vec![Transaction::new(key.address(), "bob", 1)], [0u8; 32]);
        assert_eq!(
            block.has_valid_transactions(),
            Err(LedgerError::MissingSignature)
        );
    }
}
