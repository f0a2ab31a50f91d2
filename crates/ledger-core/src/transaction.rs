use serde::{Deserialize, Serialize};

use crate::{
    crypto::{self, Address, KeyPair},
    error::LedgerError,
    sha256, Hash,
};

/// A transfer of `amount` from one address to another. A transaction without
/// a `from` address is a mining reward minted by the ledger itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Transaction {
    pub fn new(from: impl Into<Address>, to: impl Into<Address>, amount: u64) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            amount,
            signature: None,
        }
    }

    pub fn reward(to: impl Into<Address>, amount: u64) -> Self {
        Self {
            from: None,
            to: Some(to.into()),
            amount,
            signature: None,
        }
    }

    pub fn is_reward(&self) -> bool {
        self.from.is_none()
    }

    /// Digest of `from ‖ to ‖ amount`. This is what gets signed, so two
    /// transfers with the same parties and amount share a hash and signature.
    pub fn hash(&self) -> Hash {
        let preimage = format!(
            "{}{}{}",
            self.from.as_deref().unwrap_or_default(),
            self.to.as_deref().unwrap_or_default(),
            self.amount
        );
        sha256(preimage.as_bytes())
    }

    /// Signs with `key`, which must own the `from` address. On failure no
    /// signature is stored.
    pub fn sign(&mut self, key: &KeyPair) -> Result<(), LedgerError> {
        if self.from.as_deref() != Some(key.address().as_str()) {
            return Err(LedgerError::Authorization);
        }
        self.signature = Some(key.sign(&self.hash()));
        Ok(())
    }

    pub fn is_valid(&self) -> Result<bool, LedgerError> {
        let Some(from) = self.from.as_deref() else {
            return Ok(true);
        };
        let signature = match self.signature.as_deref() {
            Some(sig) if !sig.is_empty() => sig,
            _ => return Err(LedgerError::MissingSignature),
        };
        crypto::verify(from, &self.hash(), signature)
    }
}
