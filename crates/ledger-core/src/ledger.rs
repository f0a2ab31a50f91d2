use std::sync::{atomic::AtomicBool, Arc};
use tracing::{debug, info};

use crate::{
    config::LedgerConfig, error::LedgerError, now_millis, pow::MineOutcome, sink::LogSink, Block,
    NullSink, Transaction,
};

/// The chain of blocks plus the pool of transactions waiting to be mined.
///
/// Mining rewards lag by one block: the reward for mining block N is seeded
/// into the pending pool after N is appended and only lands in the chain when
/// block N+1 is mined. Until then it is invisible to [`Ledger::balance_of`].
///
/// `chain` must always start with the genesis block; callers that edit it
/// directly must not empty it.
pub struct Ledger {
    pub chain: Vec<Block>,
    pub pending: Vec<Transaction>,
    pub difficulty: usize,
    pub mining_reward: u64,
    sink: Arc<dyn LogSink>,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_sink(config, Arc::new(NullSink))
    }

    pub fn with_sink(config: LedgerConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: vec![],
            difficulty: config.difficulty,
            mining_reward: config.mining_reward,
            sink,
        }
    }

    pub fn sink(&self) -> Arc<dyn LogSink> {
        Arc::clone(&self.sink)
    }

    /// Panics if `chain` has been emptied.
    pub fn latest_block(&self) -> &Block {
        self.chain.last().expect("chain always holds the genesis block")
    }

    /// Number of blocks after genesis.
    pub fn height(&self) -> u64 {
        self.chain.len().saturating_sub(1) as u64
    }

    /// Queues a signed transfer. Reward-shaped transactions (no sender) are
    /// rejected here; only the ledger mints rewards. Nothing stops the same
    /// funds being spent twice within the pool.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), LedgerError> {
        let has_address = |addr: &Option<String>| addr.as_deref().is_some_and(|a| !a.is_empty());
        if !has_address(&tx.from) || !has_address(&tx.to) {
            return Err(LedgerError::MissingAddress);
        }
        if !tx.is_valid()? {
            return Err(LedgerError::InvalidTransaction);
        }
        info!(amount = tx.amount, "transaction added to pending pool");
        self.pending.push(tx);
        Ok(())
    }

    /// The unmined block the next mining round would search on: the pending
    /// pool followed by a fresh reward for `reward_address`.
    pub fn candidate_block(&self, reward_address: &str) -> Block {
        let mut txs = self.pending.clone();
        txs.push(Transaction::reward(reward_address, self.mining_reward));
        Block::new(now_millis(), txs, self.latest_block().hash)
    }

    /// Appends a mined block that consumed the first `consumed` pending
    /// transactions, then reseeds the pool with the reward for the next round.
    /// Transactions queued after the candidate was built stay pending.
    pub fn commit_block(&mut self, block: Block, consumed: usize, reward_address: &str) {
        self.chain.push(block);
        let rest = self.pending.split_off(consumed.min(self.pending.len()));
        self.pending = vec![Transaction::reward(reward_address, self.mining_reward)];
        self.pending.extend(rest);
        debug!(
            height = self.height(),
            pending = self.pending.len(),
            "pending pool reset"
        );
    }

    /// [`Ledger::commit_block`] followed by the block's header record, for
    /// blocks searched without emitting one.
    pub fn commit_and_log(&mut self, block: Block, consumed: usize, reward_address: &str) {
        block.emit_header(self.difficulty, self.sink.as_ref());
        self.commit_block(block, consumed, reward_address);
    }

    pub fn mine_pending_transactions(&mut self, reward_address: &str) -> &Block {
        let consumed = self.pending.len();
        let mut block = self.candidate_block(reward_address);
        block.mine(self.difficulty, self.sink.as_ref());
        self.commit_block(block, consumed, reward_address);
        info!(height = self.height(), "Block successfully mined!");
        self.latest_block()
    }

    /// Like [`Ledger::mine_pending_transactions`] but gives up once `cancel`
    /// is set, leaving the chain and pool untouched.
    pub fn mine_pending_transactions_with_cancel(
        &mut self,
        reward_address: &str,
        cancel: &AtomicBool,
    ) -> MineOutcome {
        let consumed = self.pending.len();
        let mut block = self.candidate_block(reward_address);
        let outcome = block.mine_with_cancel(self.difficulty, self.sink.as_ref(), cancel);
        if outcome == MineOutcome::Found {
            self.commit_block(block, consumed, reward_address);
        }
        outcome
    }

    pub fn balance_of(&self, address: &str) -> i128 {
        let mut balance: i128 = 0;
        for block in &self.chain {
            for tx in &block.txs {
                if tx.from.as_deref() == Some(address) {
                    balance -= i128::from(tx.amount);
                }
                if tx.to.as_deref() == Some(address) {
                    balance += i128::from(tx.amount);
                }
            }
        }
        balance
    }

    /// Checks every block after genesis: valid transactions, stored hash
    /// matches contents, and link to the predecessor. Genesis itself is never
    /// re-checked.
    pub fn is_chain_valid(&self) -> Result<bool, LedgerError> {
        for pair in self.chain.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if !current.has_valid_transactions()? {
                return Ok(false);
            }
            if current.hash != current.compute_hash() {
                return Ok(false);
            }
            if current.previous_hash != previous.hash {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
