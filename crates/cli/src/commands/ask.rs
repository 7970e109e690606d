use partline_agent::{degraded_reply, AnswerReply, Classification};
use partline_render::{payload_panels, render, DisplayBlock, Panel};
use serde::Serialize;

use super::{load_config, local_service, CommandResult};
use crate::commands::chat::render_reply;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AskReport {
    classification: Classification,
    degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    degraded_reason: Option<String>,
    reply: AnswerReply,
    blocks: Vec<DisplayBlock>,
    panels: Vec<Panel>,
}

pub fn run(text: &str, json_output: bool) -> CommandResult {
    let service = match load_config("ask").and_then(|config| local_service("ask", &config)) {
        Ok(service) => service,
        Err(failure) => return failure,
    };

    let classification = service.classify(text);
    let (reply, degraded_reason) = match service.compose(&classification) {
        Ok(payload) => (AnswerReply::from_payload(payload), None),
        Err(error) => (degraded_reply(), Some(error.to_string())),
    };

    let report = AskReport {
        blocks: render(&reply.response),
        panels: reply.data.as_ref().map(payload_panels).unwrap_or_default(),
        classification,
        degraded: degraded_reason.is_some(),
        degraded_reason,
        reply,
    };

    if json_output {
        return match serde_json::to_string_pretty(&report) {
            Ok(output) => CommandResult::plain(output),
            Err(error) => CommandResult::failure("ask", "serialization", error.to_string(), 1),
        };
    }

    CommandResult::plain(render_human(&report))
}

fn render_human(report: &AskReport) -> String {
    let entities = &report.classification.entities;
    let mut lines = vec![
        format!("intent: {}", report.classification.intent),
        format!(
            "part numbers: {}",
            if entities.part_numbers.is_empty() {
                "-".to_string()
            } else {
                entities.part_numbers.join(", ")
            }
        ),
        format!("model number: {}", entities.model_number().unwrap_or("-")),
    ];
    if let Some(symptom) = &report.classification.symptom {
        lines.push(format!("symptom: {symptom}"));
    }
    if let Some(reason) = &report.degraded_reason {
        lines.push(format!("note: showing general guidance because {reason}"));
    }
    lines.push(String::new());
    lines.push(render_reply(&report.blocks, &report.panels));
    lines.join("\n")
}
