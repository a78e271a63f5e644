//! Quorum Vault - multi-signature custodial vault
//!
//! Funds pooled by depositors leave only through proposals that collect a
//! quorum of approvals, wait out a timelock and execute before they expire.
//! A Guardian can drain the pool in an emergency without a proposal.
//!
//! Key principles:
//! - Every operation commits fully or changes nothing
//! - A proposal executes at most once
//! - Status is derived from stored flags and the clock, never stored
//! - Proposals and their events are never deleted

pub mod clock;
pub mod error;
pub mod events;
pub mod identity;
pub mod ledger;
pub mod proposals;
pub mod roles;
pub mod scenario;
pub mod vault;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorKind, VaultError, VaultResult};
pub use events::{EventRecord, EventSink, VaultEvent};
pub use identity::Identity;
pub use ledger::{FundsTransfer, TransferError};
pub use proposals::{GovernanceParams, Proposal, ProposalId, ProposalKind, ProposalStatus};
pub use roles::Role;
pub use vault::Vault;
