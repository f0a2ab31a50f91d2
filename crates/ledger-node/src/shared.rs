use anyhow::Result;
use ledger_core::{
    pow::{self, MineOutcome},
    Block, Ledger, LedgerError, Transaction,
};
use std::sync::{atomic::AtomicBool, Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Cloneable handle to one ledger shared between tasks.
///
/// A single lock guards the chain and the pending pool. It is held only to
/// mutate the pool or append a block; the nonce search runs without it, so
/// balance and validity reads keep working while a block is being mined.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        // Nothing panics while holding the lock in a way that leaves the
        // ledger half-updated, so a poisoned guard is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_transaction(&self, tx: Transaction) -> Result<(), LedgerError> {
        self.lock().add_transaction(tx)
    }

    pub fn balance_of(&self, address: &str) -> i128 {
        self.lock().balance_of(address)
    }

    pub fn is_chain_valid(&self) -> Result<bool, LedgerError> {
        self.lock().is_chain_valid()
    }

    pub fn height(&self) -> u64 {
        self.lock().height()
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn latest_block(&self) -> Block {
        self.lock().latest_block().clone()
    }

    /// Mines the current pool into a new block. Returns `None` if `cancel`
    /// was set before a hash was found; the ledger is then left as it was.
    ///
    /// If another block was appended while searching, the candidate is
    /// rebuilt on the new tip and the search starts over.
    pub async fn mine_pending_transactions(
        &self,
        reward_address: &str,
        cancel: Arc<AtomicBool>,
    ) -> Result<Option<Block>> {
        loop {
            let (mut candidate, consumed, difficulty) = {
                let ledger = self.lock();
                (
                    ledger.candidate_block(reward_address),
                    ledger.pending.len(),
                    ledger.difficulty,
                )
            };

            // The header is only logged once the block is known to be appended.
            let flag = Arc::clone(&cancel);
            let (block, outcome) = tokio::task::spawn_blocking(move || {
                let outcome = pow::search(&mut candidate, difficulty, Some(&flag));
                (candidate, outcome)
            })
            .await?;

            if outcome == MineOutcome::Cancelled {
                info!("mining cancelled");
                return Ok(None);
            }

            {
                let mut ledger = self.lock();
                if ledger.latest_block().hash == block.previous_hash {
                    ledger.commit_and_log(block.clone(), consumed, reward_address);
                    info!(height = ledger.height(), "Block successfully mined!");
                    return Ok(Some(block));
                }
            }
            warn!("chain tip moved while mining, rebuilding candidate");
        }
    }
}
