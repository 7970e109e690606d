use partline_agent::LocalAnswerService;
use partline_core::config::{AppConfig, ConfigError, LoadOptions};
use partline_core::{ApplicationError, Catalog, Intent};
use serde::Serialize;

use super::CommandResult;

pub const EXIT_DOCTOR_FAILED: u8 = 5;

const SELF_CHECK_QUERIES: [(&str, Intent); 4] = [
    ("How do I install part PS11752778?", Intent::Installation),
    ("Is this compatible with WDT780SAEM1?", Intent::Compatibility),
    ("My ice maker is not working", Intent::Troubleshooting),
    ("hello", Intent::General),
];

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

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Skipped, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_DOCTOR_FAILED };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass("config_validation", "configuration loaded and validated"));
            match Catalog::load_or_builtin(config.catalog.path.as_deref())
                .map_err(ApplicationError::from)
            {
                Ok(catalog) => {
                    checks.push(DoctorCheck::pass(
                        "catalog_load",
                        format!(
                            "{} parts, {} models, {} symptoms",
                            catalog.parts().len(),
                            catalog.models().len(),
                            catalog.symptoms().len()
                        ),
                    ));
                    checks.push(check_classifier(LocalAnswerService::new(catalog)));
                }
                Err(error) => {
                    checks.push(DoctorCheck::fail("catalog_load", error.to_string()));
                    checks.push(DoctorCheck::skipped(
                        "classifier_self_check",
                        "skipped because the catalog did not load",
                    ));
                }
            }
            checks.push(check_answer_service(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in ["catalog_load", "classifier_self_check", "answer_service_endpoint"] {
                checks.push(DoctorCheck::skipped(name, "skipped because configuration did not load"));
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_classifier(service: LocalAnswerService) -> DoctorCheck {
    let mismatches: Vec<String> = SELF_CHECK_QUERIES
        .iter()
        .filter_map(|(query, expected)| {
            let classification = service.classify(query);
            if classification.intent != *expected {
                return Some(format!(
                    "`{query}` classified as {} (expected {expected})",
                    classification.intent
                ));
            }
            service
                .compose(&classification)
                .err()
                .map(|error| format!("`{query}` composed an invalid payload: {error}"))
        })
        .collect();

    if mismatches.is_empty() {
        DoctorCheck::pass(
            "classifier_self_check",
            format!("{} sample queries classified and composed", SELF_CHECK_QUERIES.len()),
        )
    } else {
        DoctorCheck::fail("classifier_self_check", mismatches.join("; "))
    }
}

fn check_answer_service(config: &AppConfig) -> DoctorCheck {
    match config.answer_service_endpoint() {
        Ok(url) => DoctorCheck::pass("answer_service_endpoint", format!("remote answers via {url}")),
        Err(ConfigError::MissingAnswerServiceUrl) => DoctorCheck::skipped(
            "answer_service_endpoint",
            "answer_service.base_url is unset; only local answers are available",
        ),
        Err(error) => DoctorCheck::fail("answer_service_endpoint", error.to_string()),
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
