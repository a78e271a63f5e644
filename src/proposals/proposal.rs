//! Proposal records and their derived status.

use super::params::{GovernanceParameter, GovernanceParams};
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Proposal identifier. Allocated from 1 upwards and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a proposal does once executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposalKind {
    /// Pay `amount` out of the pool to whoever executes the proposal.
    Withdraw { amount: u64 },
    /// Freeze deposits and withdrawals.
    Pause,
    /// Lift a pause.
    Unpause,
    /// Replace one governance parameter.
    ParameterUpdate {
        parameter: GovernanceParameter,
        value: u64,
    },
    /// Strip every role from a compromised identity.
    EmergencyAction { target: Identity },
}

impl ProposalKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProposalKind::Withdraw { .. } => "withdraw",
            ProposalKind::Pause => "pause",
            ProposalKind::Unpause => "unpause",
            ProposalKind::ParameterUpdate { .. } => "parameter_update",
            ProposalKind::EmergencyAction { .. } => "emergency_action",
        }
    }
}

/// Lifecycle position, computed from stored fields and the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Collecting approvals.
    Open,
    /// Quorum reached, timelock still running.
    PendingTimelock,
    /// Quorum reached, timelock elapsed, not expired.
    Executable,
    Executed,
    Cancelled,
    /// Past the expiry window without executing or being cancelled.
    Expired,
}

/// Audit record of a proposed action.
///
/// Only `approvals`, `executed` and `cancelled` ever change after creation,
/// and a proposal that reached a terminal flag never changes again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Identity,
    pub kind: ProposalKind,
    /// Unix seconds.
    pub created_at: u64,
    pub approvals: BTreeSet<Identity>,
    pub executed: bool,
    pub cancelled: bool,
}

impl Proposal {
    pub fn new(id: ProposalId, proposer: Identity, kind: ProposalKind, created_at: u64) -> Self {
        Self {
            id,
            proposer,
            kind,
            created_at,
            approvals: BTreeSet::new(),
            executed: false,
            cancelled: false,
        }
    }

    pub fn approval_count(&self) -> usize {
        self.approvals.len()
    }

    pub fn has_approved(&self, identity: &Identity) -> bool {
        self.approvals.contains(identity)
    }

    /// Earliest timestamp at which execution is allowed (inclusive).
    pub fn ready_at(&self, params: &GovernanceParams) -> u64 {
        self.created_at.saturating_add(params.timelock_secs())
    }

    /// Last timestamp at which approval and execution are allowed (inclusive).
    pub fn expires_at(&self, params: &GovernanceParams) -> u64 {
        self.created_at.saturating_add(params.expiry_window_secs())
    }

    pub fn is_expired(&self, now: u64, params: &GovernanceParams) -> bool {
        now > self.expires_at(params)
    }

    pub fn is_terminal(&self) -> bool {
        self.executed || self.cancelled
    }

    pub fn status(&self, now: u64, params: &GovernanceParams) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if self.cancelled {
            ProposalStatus::Cancelled
        } else if self.is_expired(now, params) {
            ProposalStatus::Expired
        } else if self.approval_count() < params.required_quorum {
            ProposalStatus::Open
        } else if now < self.ready_at(params) {
            ProposalStatus::PendingTimelock
        } else {
            ProposalStatus::Executable
        }
    }
}
