//! The custodial vault.
//!
//! `Vault` ties the role registry, the ledger and the proposal store
//! together behind one lock. Every operation takes the lock for its whole
//! duration: operations never interleave, and each either commits all of its
//! changes or none of them.
//!
//! Two paths move funds out:
//!
//! - **Quorum path**: `create_withdraw_proposal` → `approve_proposal` (until
//!   quorum) → `execute_proposal` after the timelock and before expiry. The
//!   payout goes to the identity that executes, not to the proposer.
//! - **Guardian bypass**: `emergency_withdraw` drains the whole pool to a
//!   Guardian with no proposal involved.
//!
//! On the quorum path the `executed` flag is set before the external transfer
//! is attempted. If the transfer fails, the flag and the debit are both undone.

use crate::clock::{Clock, SystemClock};
use crate::error::{VaultError, VaultResult};
use crate::events::{EventRecord, EventSink, NoopSink, VaultEvent};
use crate::identity::Identity;
use crate::ledger::{FundsTransfer, Ledger};
use crate::proposals::{
    GovernanceParameter, GovernanceParams, Proposal, ProposalId, ProposalKind, ProposalStatus,
    ProposalStore,
};
use crate::roles::{Role, RoleRegistry};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Everything the lock guards.
#[derive(Debug)]
struct VaultState {
    roles: RoleRegistry,
    ledger: Ledger,
    proposals: ProposalStore,
    params: GovernanceParams,
    paused: bool,
}

pub struct Vault<T: FundsTransfer, C: Clock = SystemClock> {
    state: Mutex<VaultState>,
    transfer: T,
    clock: C,
    sink: Arc<dyn EventSink>,
}

impl<T: FundsTransfer, C: Clock> Vault<T, C> {
    /// Create an empty, unpaused vault administered by `admin`.
    pub fn new(
        admin: Identity,
        params: GovernanceParams,
        transfer: T,
        clock: C,
    ) -> VaultResult<Self> {
        params.validate()?;

        Ok(Self {
            state: Mutex::new(VaultState {
                roles: RoleRegistry::with_administrator(admin),
                ledger: Ledger::new(),
                proposals: ProposalStore::new(),
                params,
                paused: false,
            }),
            transfer,
            clock,
            sink: Arc::new(NoopSink),
        })
    }

    /// Publish committed transitions to `sink`.
    pub fn with_sink<S: EventSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn transfer_channel(&self) -> &T {
        &self.transfer
    }

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    pub async fn grant_role(
        &self,
        caller: &Identity,
        role: Role,
        identity: Identity,
    ) -> VaultResult<()> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        if state.roles.grant(caller, role, identity)? {
            info!(role = %role, identity = %identity, "role granted");
            self.publish(now, VaultEvent::RoleGranted { role, identity });
        }
        Ok(())
    }

    pub async fn revoke_role(
        &self,
        caller: &Identity,
        role: Role,
        identity: &Identity,
    ) -> VaultResult<()> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        if state.roles.revoke(caller, role, identity)? {
            info!(role = %role, identity = %identity, "role revoked");
            self.publish(now, VaultEvent::RoleRevoked {
                role,
                identity: *identity,
            });
        }
        Ok(())
    }

    pub async fn has_role(&self, role: Role, identity: &Identity) -> bool {
        self.state.lock().await.roles.has(role, identity)
    }

    pub async fn roles_of(&self, identity: &Identity) -> Vec<Role> {
        self.state.lock().await.roles.roles_of(identity)
    }

    pub async fn holders(&self, role: Role) -> Vec<Identity> {
        self.state.lock().await.roles.holders(role)
    }

    // ------------------------------------------------------------------
    // Ledger
    // ------------------------------------------------------------------

    /// Add funds to the pool. Open to everyone.
    pub async fn deposit(&self, caller: &Identity, amount: u64) -> VaultResult<()> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        if state.paused {
            return Err(VaultError::VaultPaused);
        }

        state.ledger.deposit(*caller, amount)?;
        debug!(depositor = %caller, amount, pooled = state.ledger.pooled_balance(), "deposit");
        self.publish(now, VaultEvent::Deposited {
            depositor: *caller,
            amount,
        });
        Ok(())
    }

    pub async fn pooled_balance(&self) -> u64 {
        self.state.lock().await.ledger.pooled_balance()
    }

    pub async fn credit_of(&self, depositor: &Identity) -> u64 {
        self.state.lock().await.ledger.credit_of(depositor)
    }

    pub async fn total_credits(&self) -> u128 {
        self.state.lock().await.ledger.total_credits()
    }

    // ------------------------------------------------------------------
    // Proposals
    // ------------------------------------------------------------------

    /// Propose paying `amount` out of the pool.
    ///
    /// The amount is checked against the pool now and again at execution.
    pub async fn create_withdraw_proposal(
        &self,
        caller: &Identity,
        amount: u64,
    ) -> VaultResult<ProposalId> {
        self.create_proposal(caller, ProposalKind::Withdraw { amount })
            .await
    }

    /// Propose any kind of action.
    pub async fn create_proposal(
        &self,
        caller: &Identity,
        kind: ProposalKind,
    ) -> VaultResult<ProposalId> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        state.roles.authorize(caller, Role::QuorumMember)?;

        match &kind {
            ProposalKind::Withdraw { amount } => {
                if state.paused {
                    return Err(VaultError::VaultPaused);
                }
                if *amount == 0 {
                    return Err(VaultError::InvalidAmount);
                }
                state.ledger.ensure_covers(*amount)?;
            }
            ProposalKind::ParameterUpdate { parameter, value } => {
                state.params.with_update(*parameter, *value)?;
                ensure_quorum_reachable(&state.roles, *parameter, *value)?;
            }
            ProposalKind::Pause | ProposalKind::Unpause | ProposalKind::EmergencyAction { .. } => {}
        }

        let id = state.proposals.create(*caller, kind.clone(), now)?;
        info!(id = %id, proposer = %caller, kind = kind.name(), "proposal created");
        self.publish(now, VaultEvent::ProposalCreated {
            id,
            proposer: *caller,
            kind,
        });
        Ok(id)
    }

    pub async fn approve_proposal(&self, caller: &Identity, id: ProposalId) -> VaultResult<()> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        state.roles.authorize(caller, Role::QuorumMember)?;

        let params = state.params;
        state.proposals.approve(id, *caller, now, &params)?;

        let approvals = state
            .proposals
            .get(id)
            .map(Proposal::approval_count)
            .unwrap_or_default();
        info!(id = %id, approver = %caller, approvals, quorum = params.required_quorum, "proposal approved");
        self.publish(now, VaultEvent::ProposalApproved {
            id,
            approver: *caller,
        });
        Ok(())
    }

    /// Execute a proposal that has quorum, has passed its timelock and has
    /// not expired.
    ///
    /// For a withdrawal the funds go to `caller`.
    pub async fn execute_proposal(&self, caller: &Identity, id: ProposalId) -> VaultResult<()> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        state.roles.authorize(caller, Role::QuorumMember)?;

        let params = state.params;
        let kind = state.proposals.check_executable(id, now, &params)?;

        // Flag first: nothing below may observe this proposal as executable.
        state.proposals.mark_executed(id)?;

        let effects = match self.apply(&mut state, caller, &kind).await {
            Ok(effects) => effects,
            Err(e) => {
                state.proposals.unmark_executed(id);
                warn!(id = %id, executor = %caller, error = %e, "execution rolled back");
                return Err(e);
            }
        };

        info!(id = %id, executor = %caller, kind = kind.name(), "proposal executed");
        self.publish(now, VaultEvent::ProposalExecuted {
            id,
            executor: *caller,
        });
        for event in effects {
            self.publish(now, event);
        }
        Ok(())
    }

    /// Cancel a proposal. Only its proposer may, any time before execution.
    pub async fn cancel_proposal(&self, caller: &Identity, id: ProposalId) -> VaultResult<()> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        state.proposals.cancel(id, caller)?;

        info!(id = %id, canceller = %caller, "proposal cancelled");
        self.publish(now, VaultEvent::ProposalCancelled {
            id,
            canceller: *caller,
        });
        Ok(())
    }

    pub async fn proposal(&self, id: ProposalId) -> Option<Proposal> {
        self.state.lock().await.proposals.get(id).cloned()
    }

    pub async fn proposals(&self) -> Vec<Proposal> {
        self.state.lock().await.proposals.list().cloned().collect()
    }

    pub async fn status(&self, id: ProposalId) -> VaultResult<ProposalStatus> {
        let state = self.state.lock().await;
        let now = self.clock.now();
        state
            .proposals
            .get(id)
            .map(|p| p.status(now, &state.params))
            .ok_or(VaultError::ProposalNotFound(id))
    }

    pub async fn params(&self) -> GovernanceParams {
        self.state.lock().await.params
    }

    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.paused
    }

    // ------------------------------------------------------------------
    // Guardian bypass
    // ------------------------------------------------------------------

    /// Drain the entire pool to `caller`, bypassing the proposal protocol.
    ///
    /// Guardian only. Works while paused. Returns the amount paid out.
    pub async fn emergency_withdraw(&self, caller: &Identity) -> VaultResult<u64> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        state.roles.authorize(caller, Role::Guardian)?;

        let amount = state.ledger.pooled_balance();
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        state.ledger.debit(amount)?;
        if let Err(e) = self.transfer.transfer(caller, amount).await {
            state.ledger.restore(amount);
            warn!(guardian = %caller, amount, error = %e, "emergency withdrawal rolled back");
            return Err(e.into());
        }

        warn!(guardian = %caller, amount, "emergency withdrawal drained the pool");
        self.publish(now, VaultEvent::EmergencyWithdrawal {
            guardian: *caller,
            amount,
        });
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Run the kind-specific effect of an executing proposal.
    ///
    /// Either fully applies or leaves `state` as it found it. Returns the
    /// extra events the effect produced.
    async fn apply(
        &self,
        state: &mut VaultState,
        executor: &Identity,
        kind: &ProposalKind,
    ) -> VaultResult<Vec<VaultEvent>> {
        match kind {
            ProposalKind::Withdraw { amount } => {
                if state.paused {
                    return Err(VaultError::VaultPaused);
                }
                state.ledger.debit(*amount)?;
                if let Err(e) = self.transfer.transfer(executor, *amount).await {
                    state.ledger.restore(*amount);
                    return Err(e.into());
                }
                Ok(Vec::new())
            }
            ProposalKind::Pause => {
                state.paused = true;
                Ok(Vec::new())
            }
            ProposalKind::Unpause => {
                state.paused = false;
                Ok(Vec::new())
            }
            ProposalKind::ParameterUpdate { parameter, value } => {
                let updated = state.params.with_update(*parameter, *value)?;
                ensure_quorum_reachable(&state.roles, *parameter, *value)?;
                state.params = updated;
                Ok(Vec::new())
            }
            ProposalKind::EmergencyAction { target } => Ok(state
                .roles
                .revoke_all(target)
                .into_iter()
                .map(|role| VaultEvent::RoleRevoked {
                    role,
                    identity: *target,
                })
                .collect()),
        }
    }

    /// Stamp with the `now` the operation was checked against.
    fn publish(&self, now: u64, event: VaultEvent) {
        self.sink.publish(&EventRecord {
            timestamp: now,
            event,
        });
    }
}

/// A quorum larger than the current membership would lock the quorum path.
fn ensure_quorum_reachable(
    roles: &RoleRegistry,
    parameter: GovernanceParameter,
    value: u64,
) -> VaultResult<()> {
    if parameter != GovernanceParameter::RequiredQuorum {
        return Ok(());
    }
    let members = roles.holders(Role::QuorumMember).len();
    if value > members as u64 {
        return Err(VaultError::InvalidParameter(format!(
            "required_quorum {} exceeds the {} quorum members",
            value, members
        )));
    }
    Ok(())
}
