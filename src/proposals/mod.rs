//! Multi-signature proposal lifecycle.
//!
//! - Creation by a quorum member
//! - Idempotent-per-identity approvals until quorum
//! - Mandatory timelock before execution, hard expiry after
//! - Exactly one terminal transition: executed or cancelled
//!
//! Pending, executable and expired are derived from timestamps, never stored.

pub mod params;
pub mod proposal;
pub mod store;

#[cfg(test)]
mod proptests;

pub use params::{parse_duration_secs, GovernanceParameter, GovernanceParams};
pub use proposal::{Proposal, ProposalId, ProposalKind, ProposalStatus};
pub use store::ProposalStore;
