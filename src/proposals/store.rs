//! Proposal store.
//!
//! Owns every proposal and the id counter. Checks run in a fixed order
//! and nothing is mutated before all of them pass.

use super::params::GovernanceParams;
use super::proposal::{Proposal, ProposalId, ProposalKind};
use crate::error::{VaultError, VaultResult};
use crate::identity::Identity;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalStore {
    proposals: BTreeMap<ProposalId, Proposal>,
    last_id: u64,
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalStore {
    pub fn new() -> Self {
        Self {
            proposals: BTreeMap::new(),
            last_id: 0,
        }
    }

    /// Store a new open proposal and return its id.
    pub fn create(
        &mut self,
        proposer: Identity,
        kind: ProposalKind,
        now: u64,
    ) -> VaultResult<ProposalId> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let id = ProposalId(next);

        self.proposals
            .insert(id, Proposal::new(id, proposer, kind, now));
        self.last_id = next;
        Ok(id)
    }

    /// Record `approver`'s approval.
    pub fn approve(
        &mut self,
        id: ProposalId,
        approver: Identity,
        now: u64,
        params: &GovernanceParams,
    ) -> VaultResult<()> {
        let proposal = self.get_mut(id)?;
        ensure_live(proposal)?;
        if proposal.is_expired(now, params) {
            return Err(VaultError::ProposalExpired(id));
        }
        if proposal.has_approved(&approver) {
            return Err(VaultError::DuplicateApproval { id, approver });
        }

        proposal.approvals.insert(approver);
        Ok(())
    }

    /// Verify `id` may execute at `now`, returning its kind.
    pub fn check_executable(
        &self,
        id: ProposalId,
        now: u64,
        params: &GovernanceParams,
    ) -> VaultResult<ProposalKind> {
        let proposal = self.get(id).ok_or(VaultError::ProposalNotFound(id))?;
        ensure_live(proposal)?;

        let have = proposal.approval_count();
        if have < params.required_quorum {
            return Err(VaultError::InsufficientApprovals {
                id,
                have,
                need: params.required_quorum,
            });
        }

        let ready_at = proposal.ready_at(params);
        if now < ready_at {
            return Err(VaultError::TimelockNotElapsed { id, ready_at });
        }
        if proposal.is_expired(now, params) {
            return Err(VaultError::ProposalExpired(id));
        }

        Ok(proposal.kind.clone())
    }

    pub(crate) fn mark_executed(&mut self, id: ProposalId) -> VaultResult<()> {
        self.get_mut(id)?.executed = true;
        Ok(())
    }

    /// Roll back `mark_executed` after a failed execution effect.
    pub(crate) fn unmark_executed(&mut self, id: ProposalId) {
        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.executed = false;
        }
    }

    /// Cancel `id`. Only its proposer may, at any time before execution.
    pub fn cancel(&mut self, id: ProposalId, caller: &Identity) -> VaultResult<()> {
        let proposal = self.get_mut(id)?;
        if proposal.proposer != *caller {
            return Err(VaultError::NotProposer { id });
        }
        ensure_live(proposal)?;

        proposal.cancelled = true;
        Ok(())
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// All proposals in id order.
    pub fn list(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn next_id(&self) -> ProposalId {
        ProposalId(self.last_id.saturating_add(1))
    }

    fn get_mut(&mut self, id: ProposalId) -> VaultResult<&mut Proposal> {
        self.proposals
            .get_mut(&id)
            .ok_or(VaultError::ProposalNotFound(id))
    }
}

fn ensure_live(proposal: &Proposal) -> VaultResult<()> {
    if proposal.executed {
        return Err(VaultError::AlreadyExecuted(proposal.id));
    }
    if proposal.cancelled {
        return Err(VaultError::AlreadyCancelled(proposal.id));
    }
    Ok(())
}
