//! Event log queries.
//!
//! Proposals are never deleted, and neither are their events: the log is the
//! audit record of who created, approved, executed or cancelled what, and of
//! every guardian drain. Queries filter and return most recent first.

use super::EventRecord;
use crate::identity::Identity;
use crate::proposals::ProposalId;

/// Query options for the event log.
#[derive(Debug, Clone)]
pub struct AuditQuery {
    /// Only events about this proposal.
    pub proposal: Option<ProposalId>,
    /// Only events triggered by this identity.
    pub actor: Option<Identity>,
    /// Only events with this name (e.g. "proposal_approved").
    pub event: Option<String>,
    /// Only events strictly after this timestamp.
    pub after_timestamp: Option<u64>,
    /// Limit number of results (most recent first).
    pub limit: Option<usize>,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            proposal: None,
            actor: None,
            event: None,
            after_timestamp: None,
            limit: Some(50),
        }
    }
}

/// Filter `records` by `query`, most recent first.
///
/// Records sharing a timestamp keep reverse insertion order.
pub fn query_events(records: &[EventRecord], query: &AuditQuery) -> Vec<EventRecord> {
    let mut filtered: Vec<EventRecord> = records
        .iter()
        .rev()
        .filter(|record| {
            if let Some(id) = query.proposal {
                if record.event.proposal() != Some(id) {
                    return false;
                }
            }

            if let Some(ref actor) = query.actor {
                if &record.event.actor() != actor {
                    return false;
                }
            }

            if let Some(ref name) = query.event {
                if record.event.name() != name {
                    return false;
                }
            }

            if let Some(after_ts) = query.after_timestamp {
                if record.timestamp <= after_ts {
                    return false;
                }
            }

            true
        })
        .cloned()
        .collect();

    // Stable sort keeps the reversed insertion order for equal timestamps
    filtered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    if let Some(limit) = query.limit {
        filtered.truncate(limit);
    }

    filtered
}

/// Render records one per line for terminal output.
pub fn format_events(records: &[EventRecord]) -> String {
    if records.is_empty() {
        return "No events recorded.".to_string();
    }

    records
        .iter()
        .map(|record| {
            let proposal = record
                .event
                .proposal()
                .map(|id| format!(" {}", id))
                .unwrap_or_default();
            format!(
                "[t={}] {}{} by {}",
                record.timestamp,
                record.event.name(),
                proposal,
                record.event.actor()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
