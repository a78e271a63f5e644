use super::config::VaultConfig;
use quorum_vault::events::{format_events, query_events, AuditQuery};
use quorum_vault::scenario::{run_scenario, Scenario, ScenarioReport};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Replay a scenario file against an in-memory vault
///
/// Governance parameters come from the config (see `show-config`). Fails when
/// any step's outcome differs from its `expect`.
pub async fn execute(
    scenario_path: String,
    config: Option<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config.map(PathBuf::from);
    let config = VaultConfig::load_or_default(config_path.as_deref())?;
    super::logging::init(&config.logging)?;

    let params = config.governance.to_params()?;
    let scenario = Scenario::load(Path::new(&scenario_path))?;
    tracing::debug!(
        steps = scenario.steps.len(),
        quorum = params.required_quorum,
        "replaying scenario"
    );

    let report = run_scenario(&scenario, params).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&render_json(&report))?);
    } else {
        print_report(&scenario_path, &report);
    }

    let failed = report.failed_expectations().len();
    if failed > 0 {
        return Err(format!("{} step(s) did not match their expectation", failed).into());
    }
    Ok(())
}

fn print_report(scenario_path: &str, report: &ScenarioReport) {
    println!("🗳️  Scenario: {}", scenario_path);
    println!();
    for outcome in &report.outcomes {
        println!("{}", outcome);
    }

    println!();
    println!("Pooled balance: {}", report.pooled_balance);
    if report.paused {
        println!("Vault is PAUSED");
    }
    for (id, status) in report.statuses() {
        println!("Proposal {}: {:?}", id, status);
    }

    println!();
    println!("Audit log (most recent first):");
    let query = AuditQuery {
        limit: None,
        ..Default::default()
    };
    println!("{}", format_events(&query_events(&report.events, &query)));
}

fn render_json(report: &ScenarioReport) -> serde_json::Value {
    let steps: Vec<serde_json::Value> = report
        .outcomes
        .iter()
        .map(|outcome| {
            let result = match &outcome.result {
                Ok(detail) => json!({ "ok": detail }),
                Err(e) => json!({ "error": e.to_string(), "kind": e.kind() }),
            };
            json!({
                "step": outcome.index + 1,
                "description": outcome.description,
                "result": result,
                "expectation_met": outcome.met_expectation(),
            })
        })
        .collect();

    let proposals: Vec<serde_json::Value> = report
        .proposals
        .iter()
        .zip(report.statuses())
        .map(|(proposal, (_, status))| {
            json!({
                "id": proposal.id,
                "proposer": report.label(&proposal.proposer),
                "kind": proposal.kind,
                "approvals": proposal
                    .approvals
                    .iter()
                    .map(|a| report.label(a))
                    .collect::<Vec<_>>(),
                "status": status,
            })
        })
        .collect();

    json!({
        "steps": steps,
        "pooled_balance": report.pooled_balance,
        "paused": report.paused,
        "finished_at": report.finished_at,
        "params": report.params,
        "proposals": proposals,
        "events": report.events,
        "all_expectations_met": report.all_expectations_met(),
    })
}
