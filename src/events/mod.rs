//! Transition notifications.
//!
//! Every committed state transition produces one [`EventRecord`] that is
//! handed to the vault's [`EventSink`]. Publishing is fire-and-forget: a sink
//! cannot fail a transition, and nothing is published for a rolled-back one.

pub mod audit_trail;

pub use audit_trail::{format_events, query_events, AuditQuery};

use crate::identity::Identity;
use crate::proposals::{ProposalId, ProposalKind};
use crate::roles::Role;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A committed state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VaultEvent {
    ProposalCreated {
        id: ProposalId,
        proposer: Identity,
        kind: ProposalKind,
    },
    ProposalApproved {
        id: ProposalId,
        approver: Identity,
    },
    ProposalExecuted {
        id: ProposalId,
        executor: Identity,
    },
    ProposalCancelled {
        id: ProposalId,
        canceller: Identity,
    },
    Deposited {
        depositor: Identity,
        amount: u64,
    },
    /// Guardian drained the pool outside the proposal protocol.
    EmergencyWithdrawal {
        guardian: Identity,
        amount: u64,
    },
    RoleGranted {
        role: Role,
        identity: Identity,
    },
    RoleRevoked {
        role: Role,
        identity: Identity,
    },
}

impl VaultEvent {
    /// Proposal this event refers to, if any.
    pub fn proposal(&self) -> Option<ProposalId> {
        match self {
            VaultEvent::ProposalCreated { id, .. }
            | VaultEvent::ProposalApproved { id, .. }
            | VaultEvent::ProposalExecuted { id, .. }
            | VaultEvent::ProposalCancelled { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Identity that triggered or received the transition.
    pub fn actor(&self) -> Identity {
        match self {
            VaultEvent::ProposalCreated { proposer, .. } => *proposer,
            VaultEvent::ProposalApproved { approver, .. } => *approver,
            VaultEvent::ProposalExecuted { executor, .. } => *executor,
            VaultEvent::ProposalCancelled { canceller, .. } => *canceller,
            VaultEvent::Deposited { depositor, .. } => *depositor,
            VaultEvent::EmergencyWithdrawal { guardian, .. } => *guardian,
            VaultEvent::RoleGranted { identity, .. } | VaultEvent::RoleRevoked { identity, .. } => {
                *identity
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::ProposalCreated { .. } => "proposal_created",
            VaultEvent::ProposalApproved { .. } => "proposal_approved",
            VaultEvent::ProposalExecuted { .. } => "proposal_executed",
            VaultEvent::ProposalCancelled { .. } => "proposal_cancelled",
            VaultEvent::Deposited { .. } => "deposited",
            VaultEvent::EmergencyWithdrawal { .. } => "emergency_withdrawal",
            VaultEvent::RoleGranted { .. } => "role_granted",
            VaultEvent::RoleRevoked { .. } => "role_revoked",
        }
    }
}

/// Event plus the vault clock reading when it committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: VaultEvent,
}

/// Receives committed transitions.
pub trait EventSink: Send + Sync {
    fn publish(&self, record: &EventRecord);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn publish(&self, _record: &EventRecord) {}
}

/// Emits each event as a `tracing` info line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, record: &EventRecord) {
        tracing::info!(
            event = record.event.name(),
            actor = %record.event.actor(),
            proposal = ?record.event.proposal(),
            timestamp = record.timestamp,
            "vault event"
        );
    }
}

/// Append-only in-memory log. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record so far, oldest first.
    pub fn records(&self) -> Vec<EventRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemoryLog {
    fn publish(&self, record: &EventRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

/// Fan a record out to several sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn publish(&self, record: &EventRecord) {
        self.0.publish(record);
        self.1.publish(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event: VaultEvent) -> EventRecord {
        EventRecord {
            timestamp: 10,
            event,
        }
    }

    #[test]
    fn test_memory_log_appends() {
        let log = MemoryLog::new();
        let alice = Identity::from_label("alice");

        log.publish(&record(VaultEvent::Deposited {
            depositor: alice,
            amount: 3,
        }));
        log.publish(&record(VaultEvent::ProposalApproved {
            id: ProposalId(1),
            approver: alice,
        }));

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].event.proposal(), Some(ProposalId(1)));
    }

    #[test]
    fn test_pair_sink_fans_out() {
        let first = MemoryLog::new();
        let second = MemoryLog::new();
        let sink = (first.clone(), second.clone());

        sink.publish(&record(VaultEvent::Deposited {
            depositor: Identity::from_label("alice"),
            amount: 1,
        }));

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_event_actor() {
        let bob = Identity::from_label("bob");
        let event = VaultEvent::ProposalExecuted {
            id: ProposalId(2),
            executor: bob,
        };
        assert_eq!(event.actor(), bob);
        assert_eq!(event.name(), "proposal_executed");

        let event = VaultEvent::RoleGranted {
            role: Role::Guardian,
            identity: bob,
        };
        assert_eq!(event.actor(), bob);
        assert_eq!(event.proposal(), None);
    }

    #[test]
    fn test_record_serialization_is_flat() {
        let record = record(VaultEvent::ProposalCancelled {
            id: ProposalId(4),
            canceller: Identity::from_bytes(&[1u8; 32]),
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event"], "proposal_cancelled");
        assert_eq!(json["timestamp"], 10);
        assert_eq!(json["id"], 4);
    }
}
