use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD};

/// Fixed parameters a `Ledger` is created with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Required number of leading zero hex digits in a mined block hash.
    pub difficulty: usize,
    pub mining_reward: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
        }
    }
}
