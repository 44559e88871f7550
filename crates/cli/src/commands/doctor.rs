use recipebot_agent::runtime::AgentRuntime;
use recipebot_agent::search::NoopRecipeSearch;
use recipebot_agent::validator::SlotValidator;
use recipebot_core::config::{AppConfig, LoadOptions};
use recipebot_core::dialog::actions::DialogAction;
use recipebot_core::domain::slot::{SlotName, Slots};
use recipebot_core::domain::turn::{InvocationSource, Turn};
use recipebot_core::session::ConversationContext;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_CONFIG };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_search_credentials(&config));
            checks.push(check_allergy_table(&config));
            checks.push(check_dialog_rehearsal(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["search_credentials", "allergy_table", "dialog_rehearsal"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_search_credentials(config: &AppConfig) -> DoctorCheck {
    if config.search.has_credentials() {
        DoctorCheck {
            name: "search_credentials",
            status: CheckStatus::Pass,
            details: format!("app id and key present for `{}`", config.search.base_url),
        }
    } else {
        DoctorCheck {
            name: "search_credentials",
            status: CheckStatus::Fail,
            details: "set RECIPEBOT_SEARCH_APP_ID and RECIPEBOT_SEARCH_APP_KEY \
                      (or AWS_YUMMLY_APP_ID / AWS_YUMMLY_APP_KEY)"
                .to_string(),
        }
    }
}

fn check_allergy_table(config: &AppConfig) -> DoctorCheck {
    let table = config.dialog.allergy_table();
    if table.is_empty() {
        return DoctorCheck {
            name: "allergy_table",
            status: CheckStatus::Fail,
            details: "no allergy keywords configured; every restriction becomes an exclusion"
                .to_string(),
        };
    }

    let missing_search_values =
        table.entries().iter().filter(|entry| entry.search_value.is_none()).count();
    DoctorCheck {
        name: "allergy_table",
        status: CheckStatus::Pass,
        details: format!(
            "{} keywords loaded, {missing_search_values} without a search value",
            table.len()
        ),
    }
}

/// Walks a scripted conversation through the dialog hook and expects it to delegate once
/// the user says the done sentinel.
fn check_dialog_rehearsal(config: &AppConfig) -> DoctorCheck {
    let agent = AgentRuntime::new(
        SlotValidator::new(config.dialog.allergy_table(), config.dialog.done_sentinel.clone()),
        config.dialog.intent_name.clone(),
        NoopRecipeSearch,
    );
    let first_keyword = config
        .dialog
        .allergies
        .first()
        .map(|entry| entry.keyword.clone())
        .unwrap_or_else(|| "cilantro".to_string());

    let base = Slots::new().with(SlotName::RecipeType, "soup").with(SlotName::Servings, "2");
    let script = [
        base.clone(),
        base.clone().with(SlotName::Restrictions, first_keyword),
        base.with(SlotName::Restrictions, config.dialog.done_sentinel.clone()),
    ];

    let mut context = ConversationContext::default();
    let mut actions = Vec::new();
    for slots in script {
        let turn =
            Turn::new(config.dialog.intent_name.clone(), slots, InvocationSource::DialogCodeHook);
        actions.push(agent.find_recipe(&turn, &mut context).dialog_action);
    }

    let delegated = matches!(actions.last(), Some(DialogAction::Delegate { .. }));
    let recorded = context.allergies.len() + context.restrictions.len();
    if delegated && recorded == 1 {
        DoctorCheck {
            name: "dialog_rehearsal",
            status: CheckStatus::Pass,
            details: format!("{} turns, delegated after the done sentinel", actions.len()),
        }
    } else {
        let kinds: Vec<&str> = actions.iter().map(DialogAction::kind).collect();
        DoctorCheck {
            name: "dialog_rehearsal",
            status: CheckStatus::Fail,
            details: format!(
                "unexpected dialog actions [{}] with {recorded} recorded constraints",
                kinds.join(", ")
            ),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
