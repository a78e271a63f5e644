//! Scripted walkthroughs.
//!
//! A scenario is a JSON script replayed against an in-memory vault with a
//! [`ManualClock`] and a [`MockTransfer`]. Principals are named by label and
//! mapped with [`Identity::from_label`]. Each step may state the outcome it
//! expects, either `"ok"` or an error kind such as `"timelock_not_elapsed"`.
//!
//! ```json
//! {
//!   "admin": "admin",
//!   "roles": [{ "identity": "alice", "role": "quorum_member" }],
//!   "steps": [
//!     { "action": "deposit", "caller": "alice", "amount": 10 },
//!     { "action": "create_withdraw", "caller": "alice", "amount": 5 },
//!     { "action": "advance", "by": "24h" },
//!     { "action": "execute", "caller": "alice", "proposal": 1, "expect": "quorum_not_met" }
//!   ]
//! }
//! ```

use crate::clock::{Clock, ManualClock};
use crate::error::{ErrorKind, VaultError, VaultResult};
use crate::events::{EventRecord, MemoryLog, TracingSink};
use crate::identity::Identity;
use crate::ledger::MockTransfer;
use crate::proposals::{
    parse_duration_secs, GovernanceParameter, GovernanceParams, Proposal, ProposalId, ProposalKind,
    ProposalStatus,
};
use crate::roles::Role;
use crate::vault::Vault;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Default scenario start: 2023-11-14T22:13:20Z.
const DEFAULT_START_TIME: u64 = 1_700_000_000;

/// Scenario file errors.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },

    #[error("Vault setup failed: {0}")]
    Setup(#[from] VaultError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleAssignment {
    pub identity: String,
    pub role: Role,
}

/// Proposal kinds with principals named by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioKind {
    Withdraw {
        amount: u64,
    },
    Pause,
    Unpause,
    ParameterUpdate {
        parameter: GovernanceParameter,
        value: u64,
    },
    EmergencyAction {
        target: String,
    },
}

impl ScenarioKind {
    fn resolve(&self) -> ProposalKind {
        match self {
            ScenarioKind::Withdraw { amount } => ProposalKind::Withdraw { amount: *amount },
            ScenarioKind::Pause => ProposalKind::Pause,
            ScenarioKind::Unpause => ProposalKind::Unpause,
            ScenarioKind::ParameterUpdate { parameter, value } => ProposalKind::ParameterUpdate {
                parameter: *parameter,
                value: *value,
            },
            ScenarioKind::EmergencyAction { target } => ProposalKind::EmergencyAction {
                target: Identity::from_label(target),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Deposit { caller: String, amount: u64 },
    CreateWithdraw { caller: String, amount: u64 },
    Create { caller: String, kind: ScenarioKind },
    Approve { caller: String, proposal: u64 },
    Execute { caller: String, proposal: u64 },
    Cancel { caller: String, proposal: u64 },
    EmergencyWithdraw { caller: String },
    Grant { caller: String, role: Role, identity: String },
    Revoke { caller: String, role: Role, identity: String },
    /// Move the clock forward by a humantime duration ("24h", "90m").
    Advance { by: String },
    /// Make the transfer channel refuse payouts to `identity`.
    RejectRecipient { identity: String },
    AcceptRecipient { identity: String },
}

/// Expected step outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expectation {
    Error(ErrorKind),
    Ok(OkMarker),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OkMarker {
    Ok,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    #[serde(default)]
    pub expect: Option<Expectation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default = "default_admin")]
    pub admin: String,
    #[serde(default = "default_start_time")]
    pub start_time: u64,
    #[serde(default)]
    pub roles: Vec<RoleAssignment>,
    pub steps: Vec<Step>,
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_start_time() -> u64 {
    DEFAULT_START_TIME
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        let scenario: Scenario = serde_json::from_value(raw.clone())?;
        scenario.check_step_keys(&raw)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Reject step keys that are neither `expect` nor a field of the step's
    /// action. A misspelled `expect` would otherwise drop the assertion.
    fn check_step_keys(&self, raw: &serde_json::Value) -> Result<(), ScenarioError> {
        let raw_steps = raw
            .get("steps")
            .and_then(serde_json::Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for (index, (step, raw_step)) in self.steps.iter().zip(raw_steps).enumerate() {
            let known = serde_json::to_value(&step.action)?;
            let Some(keys) = raw_step.as_object() else {
                continue;
            };
            for key in keys.keys() {
                if key != "expect" && known.get(key).is_none() {
                    return Err(ScenarioError::InvalidStep {
                        index,
                        reason: format!(
                            "unknown key '{}' for action '{}'",
                            key,
                            step.action.name()
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Reject steps that can never run, before touching a vault.
    fn validate(&self) -> Result<(), ScenarioError> {
        for (index, step) in self.steps.iter().enumerate() {
            if let Action::Advance { by } = &step.action {
                parse_duration_secs(by)
                    .map_err(|reason| ScenarioError::InvalidStep { index, reason })?;
            }
        }
        Ok(())
    }
}

/// Result of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub index: usize,
    pub description: String,
    pub result: Result<String, VaultError>,
    pub expect: Option<Expectation>,
}

impl StepOutcome {
    pub fn met_expectation(&self) -> bool {
        match (&self.expect, &self.result) {
            (None, _) => true,
            (Some(Expectation::Ok(_)), Ok(_)) => true,
            (Some(Expectation::Error(kind)), Err(e)) => e.kind() == *kind,
            _ => false,
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.met_expectation() { "✓" } else { "✗" };
        match &self.result {
            Ok(detail) => write!(f, "{} {:>3}. {} → ok ({})", mark, self.index + 1, self.description, detail),
            Err(e) => write!(f, "{} {:>3}. {} → error: {}", mark, self.index + 1, self.description, e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub outcomes: Vec<StepOutcome>,
    pub pooled_balance: u64,
    pub proposals: Vec<Proposal>,
    pub events: Vec<EventRecord>,
    /// Parameters after any executed `ParameterUpdate`.
    pub params: GovernanceParams,
    pub paused: bool,
    pub finished_at: u64,
    labels: HashMap<Identity, String>,
}

impl ScenarioReport {
    pub fn all_expectations_met(&self) -> bool {
        self.outcomes.iter().all(StepOutcome::met_expectation)
    }

    pub fn failed_expectations(&self) -> Vec<&StepOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !o.met_expectation())
            .collect()
    }

    /// Status of every proposal when the scenario finished.
    pub fn statuses(&self) -> Vec<(ProposalId, ProposalStatus)> {
        self.proposals
            .iter()
            .map(|p| (p.id, p.status(self.finished_at, &self.params)))
            .collect()
    }

    /// Label a scenario principal, falling back to the short hex form.
    pub fn label(&self, identity: &Identity) -> String {
        self.labels
            .get(identity)
            .cloned()
            .unwrap_or_else(|| identity.to_string())
    }
}

/// Replay `scenario` against a fresh vault governed by `params`.
pub async fn run_scenario(
    scenario: &Scenario,
    params: GovernanceParams,
) -> Result<ScenarioReport, ScenarioError> {
    let clock = ManualClock::new(scenario.start_time);
    let channel = MockTransfer::new();
    let log = MemoryLog::new();
    let admin = Identity::from_label(&scenario.admin);
    let vault = Vault::new(admin, params, channel.clone(), clock.clone())?
        .with_sink((log.clone(), TracingSink));

    let mut labels = HashMap::new();
    labels.insert(admin, scenario.admin.clone());

    for assignment in &scenario.roles {
        let identity = Identity::from_label(&assignment.identity);
        labels.insert(identity, assignment.identity.clone());
        vault.grant_role(&admin, assignment.role, identity).await?;
    }

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        for label in step.action.labels() {
            labels.insert(Identity::from_label(label), label.to_string());
        }

        let result = run_step(&vault, &clock, &channel, &step.action).await;
        let outcome = StepOutcome {
            index,
            description: step.action.describe(),
            result,
            expect: step.expect,
        };
        if !outcome.met_expectation() {
            tracing::warn!(step = index + 1, "{}", outcome);
        }
        outcomes.push(outcome);
    }

    Ok(ScenarioReport {
        outcomes,
        pooled_balance: vault.pooled_balance().await,
        proposals: vault.proposals().await,
        events: log.records(),
        params: vault.params().await,
        paused: vault.is_paused().await,
        finished_at: clock.now(),
        labels,
    })
}

async fn run_step(
    vault: &Vault<MockTransfer, ManualClock>,
    clock: &ManualClock,
    channel: &MockTransfer,
    action: &Action,
) -> VaultResult<String> {
    let id = |label: &str| Identity::from_label(label);
    match action {
        Action::Deposit { caller, amount } => {
            vault.deposit(&id(caller), *amount).await?;
            Ok(format!("pool {}", vault.pooled_balance().await))
        }
        Action::CreateWithdraw { caller, amount } => {
            let proposal = vault.create_withdraw_proposal(&id(caller), *amount).await?;
            Ok(format!("proposal {}", proposal))
        }
        Action::Create { caller, kind } => {
            let proposal = vault.create_proposal(&id(caller), kind.resolve()).await?;
            Ok(format!("proposal {}", proposal))
        }
        Action::Approve { caller, proposal } => {
            let proposal = ProposalId(*proposal);
            vault.approve_proposal(&id(caller), proposal).await?;
            let approvals = vault
                .proposal(proposal)
                .await
                .map(|p| p.approval_count())
                .unwrap_or_default();
            Ok(format!("{} approvals", approvals))
        }
        Action::Execute { caller, proposal } => {
            vault
                .execute_proposal(&id(caller), ProposalId(*proposal))
                .await?;
            Ok(format!("pool {}", vault.pooled_balance().await))
        }
        Action::Cancel { caller, proposal } => {
            vault
                .cancel_proposal(&id(caller), ProposalId(*proposal))
                .await?;
            Ok("cancelled".to_string())
        }
        Action::EmergencyWithdraw { caller } => {
            let amount = vault.emergency_withdraw(&id(caller)).await?;
            Ok(format!("drained {}", amount))
        }
        Action::Grant {
            caller,
            role,
            identity,
        } => {
            vault.grant_role(&id(caller), *role, id(identity)).await?;
            Ok(format!("{} is {}", identity, role))
        }
        Action::Revoke {
            caller,
            role,
            identity,
        } => {
            vault.revoke_role(&id(caller), *role, &id(identity)).await?;
            Ok(format!("{} is no longer {}", identity, role))
        }
        Action::Advance { by } => {
            // Durations were validated when the scenario was parsed
            let secs = parse_duration_secs(by).unwrap_or(0);
            clock.advance(secs);
            Ok(format!("t={}", clock.now()))
        }
        Action::RejectRecipient { identity } => {
            channel.reject_recipient(id(identity));
            Ok(format!("rejecting transfers to {}", identity))
        }
        Action::AcceptRecipient { identity } => {
            channel.accept_recipient(&id(identity));
            Ok(format!("accepting transfers to {}", identity))
        }
    }
}

impl Action {
    /// The `action` tag as written in scenario files.
    fn name(&self) -> &'static str {
        match self {
            Action::Deposit { .. } => "deposit",
            Action::CreateWithdraw { .. } => "create_withdraw",
            Action::Create { .. } => "create",
            Action::Approve { .. } => "approve",
            Action::Execute { .. } => "execute",
            Action::Cancel { .. } => "cancel",
            Action::EmergencyWithdraw { .. } => "emergency_withdraw",
            Action::Grant { .. } => "grant",
            Action::Revoke { .. } => "revoke",
            Action::Advance { .. } => "advance",
            Action::RejectRecipient { .. } => "reject_recipient",
            Action::AcceptRecipient { .. } => "accept_recipient",
        }
    }

    fn describe(&self) -> String {
        match self {
            Action::Deposit { caller, amount } => format!("{} deposits {}", caller, amount),
            Action::CreateWithdraw { caller, amount } => {
                format!("{} proposes withdrawing {}", caller, amount)
            }
            Action::Create { caller, kind } => {
                format!("{} proposes {}", caller, kind.resolve().name())
            }
            Action::Approve { caller, proposal } => format!("{} approves #{}", caller, proposal),
            Action::Execute { caller, proposal } => format!("{} executes #{}", caller, proposal),
            Action::Cancel { caller, proposal } => format!("{} cancels #{}", caller, proposal),
            Action::EmergencyWithdraw { caller } => format!("{} emergency-withdraws", caller),
            Action::Grant {
                caller,
                role,
                identity,
            } => format!("{} grants {} to {}", caller, role, identity),
            Action::Revoke {
                caller,
                role,
                identity,
            } => format!("{} revokes {} from {}", caller, role, identity),
            Action::Advance { by } => format!("clock advances {}", by),
            Action::RejectRecipient { identity } => format!("{} starts rejecting funds", identity),
            Action::AcceptRecipient { identity } => format!("{} accepts funds again", identity),
        }
    }

    /// Principal labels mentioned by this action.
    fn labels(&self) -> Vec<&str> {
        match self {
            Action::Deposit { caller, .. }
            | Action::CreateWithdraw { caller, .. }
            | Action::Approve { caller, .. }
            | Action::Execute { caller, .. }
            | Action::Cancel { caller, .. }
            | Action::EmergencyWithdraw { caller } => vec![caller.as_str()],
            Action::Create { caller, kind } => match kind {
                ScenarioKind::EmergencyAction { target } => vec![caller.as_str(), target.as_str()],
                _ => vec![caller.as_str()],
            },
            Action::Grant {
                caller, identity, ..
            }
            | Action::Revoke {
                caller, identity, ..
            } => vec![caller.as_str(), identity.as_str()],
            Action::RejectRecipient { identity } | Action::AcceptRecipient { identity } => {
                vec![identity.as_str()]
            }
            Action::Advance { .. } => Vec::new(),
        }
    }
}
