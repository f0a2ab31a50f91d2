use thiserror::Error;

/// Failures raised while admitting, signing or verifying transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("cannot sign transactions for other wallets")]
    Authorization,

    #[error("no signature in this transaction")]
    MissingSignature,

    #[error("cannot add invalid transaction to chain")]
    InvalidTransaction,

    #[error("transaction must include from and to address")]
    MissingAddress,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),
}
