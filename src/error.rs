//! Vault error taxonomy.
//!
//! Every failed operation leaves vault state exactly as it was before the
//! call. Callers get a distinguishable variant, and `VaultError::kind`
//! collapses variants into the coarse categories tooling asserts on.

use crate::identity::Identity;
use crate::ledger::TransferError;
use crate::proposals::ProposalId;
use crate::roles::Role;
use serde::{Deserialize, Serialize};

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Vault operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("{identity} does not hold role {role}")]
    Unauthorized { identity: Identity, role: Role },

    #[error("only the proposer may cancel proposal {id}")]
    NotProposer { id: ProposalId },

    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("proposal {0} was already executed")]
    AlreadyExecuted(ProposalId),

    #[error("proposal {0} was already cancelled")]
    AlreadyCancelled(ProposalId),

    #[error("proposal {0} has expired")]
    ProposalExpired(ProposalId),

    #[error("proposal {id} has {have} approvals, {need} required")]
    InsufficientApprovals {
        id: ProposalId,
        have: usize,
        need: usize,
    },

    #[error("proposal {id} timelock elapses at {ready_at}")]
    TimelockNotElapsed { id: ProposalId, ready_at: u64 },

    #[error("{approver} already approved proposal {id}")]
    DuplicateApproval { id: ProposalId, approver: Identity },

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("invalid governance parameter: {0}")]
    InvalidParameter(String),

    #[error("vault is paused")]
    VaultPaused,

    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

/// Coarse error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidState,
    QuorumNotMet,
    TimelockNotElapsed,
    DuplicateApproval,
    InsufficientFunds,
    TransferFailed,
    InvalidInput,
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } | Self::NotProposer { .. } => ErrorKind::Unauthorized,
            Self::ProposalNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExecuted(_)
            | Self::AlreadyCancelled(_)
            | Self::ProposalExpired(_)
            | Self::VaultPaused => ErrorKind::InvalidState,
            Self::InsufficientApprovals { .. } => ErrorKind::QuorumNotMet,
            Self::TimelockNotElapsed { .. } => ErrorKind::TimelockNotElapsed,
            Self::DuplicateApproval { .. } => ErrorKind::DuplicateApproval,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::TransferFailed(_) => ErrorKind::TransferFailed,
            Self::InvalidAmount | Self::InvalidParameter(_) | Self::ArithmeticOverflow => {
                ErrorKind::InvalidInput
            }
        }
    }
}
