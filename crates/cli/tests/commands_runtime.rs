use std::env;
use std::io::Cursor;
use std::sync::{Mutex, OnceLock};

use partline_agent::{ConversationController, LocalAnswerService};
use partline_cli::commands::{ask, chat, config, doctor};
use partline_core::Catalog;
use serde_json::Value;

#[test]
fn ask_json_reports_installation_classification() {
    with_env(&[], || {
        let result = ask::run("How do I install part PS11752778?", true);
        assert_eq!(result.exit_code, 0, "expected successful ask");

        let report = parse_payload(&result.output);
        assert_eq!(report["classification"]["intent"], "installation");
        assert_eq!(report["classification"]["entities"]["partNumbers"][0], "PS11752778");
        assert_eq!(report["degraded"], false);
        assert_eq!(report["panels"][0]["panel_id"], "installation.part.v1");
        assert!(report["blocks"].as_array().is_some_and(|blocks| !blocks.is_empty()));
    });
}

#[test]
fn ask_human_output_lists_entities_and_answer() {
    with_env(&[], || {
        let result = ask::run("Is this compatible with WDT780SAEM1?", false);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("intent: compatibility"));
        assert!(result.output.contains("model number: WDT780SAEM1"));
        assert!(result.output.contains("[Compatible parts]"));
    });
}

#[test]
fn ask_returns_config_failure_for_malformed_url() {
    with_env(&[("PARTLINE_ANSWER_SERVICE_BASE_URL", "not a url")], || {
        let result = ask::run("hello", true);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn ask_returns_catalog_failure_for_missing_catalog_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing-catalog.toml");
    let missing = missing.to_string_lossy().into_owned();

    with_env(&[("PARTLINE_CATALOG_PATH", missing.as_str())], || {
        let result = ask::run("hello", true);
        assert_eq!(result.exit_code, 3, "expected catalog failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "catalog_load");
        assert!(payload["message"]
            .as_str()
            .is_some_and(|message| message.starts_with("catalog failure: could not read catalog file")));
    });
}

#[test]
fn ask_json_explains_why_an_answer_was_degraded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.toml");
    std::fs::write(
        &path,
        r#"
[[models]]
model_number = "GSS25GSHSS"
brand = "GE"
appliance = "refrigerator"
description = "GE side-by-side refrigerator"

[[models.compatible_parts]]
part_number = "W10195416"
name = "Crisper Drawer"
price = "62.10"
compatibility_label = "Direct fit"
fix_rate_percent = 140
"#,
    )
    .expect("write catalog");
    let path = path.to_string_lossy().into_owned();

    with_env(&[("PARTLINE_CATALOG_PATH", path.as_str())], || {
        let result = ask::run("Is this compatible with GSS25GSHSS?", true);
        assert_eq!(result.exit_code, 0);

        let report = parse_payload(&result.output);
        assert_eq!(report["classification"]["intent"], "compatibility");
        assert_eq!(report["degraded"], true);
        let reason = report["degradedReason"].as_str().expect("degraded reason");
        assert!(reason.contains("fix rate 140%"), "unexpected reason: {reason}");
        assert_eq!(report["reply"]["data"]["intent"], "general");

        let human = ask::run("Is this compatible with GSS25GSHSS?", false);
        assert!(human.output.contains("note: showing general guidance because fix rate 140%"));
    });
}

#[test]
fn ask_json_omits_degraded_reason_for_valid_answers() {
    with_env(&[], || {
        let report = parse_payload(&ask::run("My ice maker is not working", true).output);
        assert_eq!(report["degraded"], false);
        assert!(report.get("degradedReason").is_none());
    });
}

#[test]
fn config_attributes_env_sources_and_redacts_api_key() {
    with_env(
        &[
            ("PARTLINE_ANSWER_SERVICE_BASE_URL", "http://answers.local:8000"),
            ("PARTLINE_ANSWER_SERVICE_API_KEY", "sk-very-secret"),
        ],
        || {
            let output = config::run();
            assert!(output.contains(
                "- answer_service.base_url = http://answers.local:8000 (source: env (PARTLINE_ANSWER_SERVICE_BASE_URL))"
            ));
            assert!(output.contains("- answer_service.api_key = <redacted>"));
            assert!(!output.contains("sk-very-secret"));
            assert!(output.contains("- server.port = 5001 (source: default)"));
            assert!(output.contains("- catalog.path = <builtin> (source: default)"));
        },
    );
}

#[test]
fn doctor_passes_with_defaults_and_skips_remote_endpoint() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "expected doctor success: {}", result.output);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "pass");
        let checks = report["checks"].as_array().expect("checks array");
        let status_of = |name: &str| {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .map(|check| check["status"].clone())
                .unwrap_or(Value::Null)
        };
        assert_eq!(status_of("config_validation"), "pass");
        assert_eq!(status_of("catalog_load"), "pass");
        assert_eq!(status_of("classifier_self_check"), "pass");
        assert_eq!(status_of("answer_service_endpoint"), "skipped");
    });
}

#[test]
fn doctor_fails_when_config_is_invalid() {
    with_env(&[("PARTLINE_SERVER_PORT", "not-a-port")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, doctor::EXIT_DOCTOR_FAILED);
        assert!(result.output.contains("- [fail] config_validation"));
        assert!(result.output.contains("- [skip] catalog_load"));
    });
}

#[test]
fn chat_remote_requires_answer_service_url() {
    with_env(&[], || {
        let result = chat::run(true);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "chat");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn chat_remote_does_not_load_the_local_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing-catalog.toml");
    let missing = missing.to_string_lossy().into_owned();

    with_env(&[("PARTLINE_CATALOG_PATH", missing.as_str())], || {
        let result = chat::run(true);
        assert_eq!(result.exit_code, 2, "remote chat should stop on the missing URL");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().is_some_and(|message| message.contains("base_url")));
    });
}

#[tokio::test]
async fn chat_session_handles_questions_reset_and_quit() {
    let mut controller = ConversationController::new(LocalAnswerService::new(Catalog::builtin()));
    let input = Cursor::new(
        "How do I install part PS11752778?\n/reset\n   \nMy ice maker is not working\n/quit\nhello\n",
    );
    let mut output = Vec::new();

    let summary =
        chat::run_session(&mut controller, input, &mut output).await.expect("session runs");
    assert_eq!(summary.exchanges, 2);
    assert_eq!(summary.resets, 1);

    let transcript = String::from_utf8(output).expect("utf8 output");
    assert!(transcript.contains("[Part details]"));
    assert!(transcript.contains("(new conversation started)"));
    assert!(transcript.contains("(type a question, or /quit to exit)"));
    assert!(transcript.contains("[Likely causes]"));

    // Only the exchange after the reset remains; input after /quit is never read.
    assert_eq!(controller.transcript().len(), 2);
    assert!(controller.state().is_idle());
}

#[tokio::test]
async fn chat_session_stops_at_end_of_input() {
    let mut controller = ConversationController::new(LocalAnswerService::new(Catalog::builtin()));
    let mut output = Vec::new();

    let summary = chat::run_session(&mut controller, Cursor::new("hello"), &mut output)
        .await
        .expect("session runs");
    assert_eq!(summary.exchanges, 1);
    assert_eq!(controller.transcript().len(), 2);
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PARTLINE_ANSWER_SERVICE_BASE_URL",
        "PARTLINE_ANSWER_SERVICE_API_KEY",
        "PARTLINE_ANSWER_SERVICE_TIMEOUT_SECS",
        "PARTLINE_SERVER_BIND_ADDRESS",
        "PARTLINE_SERVER_PORT",
        "PARTLINE_CATALOG_PATH",
        "PARTLINE_LOGGING_LEVEL",
        "PARTLINE_LOGGING_FORMAT",
        "PARTLINE_LOG_LEVEL",
        "PARTLINE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
