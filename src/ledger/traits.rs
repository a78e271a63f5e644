//! Funds transfer channel.
//!
//! The vault decides when value leaves the pool; moving it to the recipient
//! is somebody else's job. Implementations report success or failure
//! synchronously with the call and are never retried by the vault.
//!
//! Implementations must not call back into the vault that invoked them: the
//! vault holds its state lock for the whole transfer.

use crate::identity::Identity;
use async_trait::async_trait;

/// Transfer channel errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("recipient {0} rejected the transfer")]
    Rejected(Identity),

    #[error("transfer channel unavailable: {0}")]
    Unavailable(String),
}

/// Moves value out of the vault to a recipient.
#[async_trait]
pub trait FundsTransfer: Send + Sync {
    async fn transfer(&self, recipient: &Identity, amount: u64) -> Result<(), TransferError>;
}
