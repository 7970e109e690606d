use std::io::{self, BufRead, Write};

use anyhow::Context;
use partline_agent::{
    AnswerService, ConversationController, ConversationEntry, HttpAnswerService, SubmitRejection,
};
use partline_render::{DisplayBlock, Panel};

use super::{load_config, local_service, CommandResult, EXIT_CONFIG, EXIT_IO};

const PROMPT: &str = "you> ";
const GREETING: &str =
    "Ask about installing a part, model compatibility, or an appliance problem. /reset starts over, /quit exits.";

/// Counters for a finished session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub exchanges: usize,
    pub resets: usize,
}

pub fn run(remote: bool) -> CommandResult {
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_IO,
            );
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let result = if remote {
        let service = match HttpAnswerService::from_config(&config) {
            Ok(service) => service,
            Err(error) => {
                return CommandResult::failure(
                    "chat",
                    "config_validation",
                    error.to_string(),
                    EXIT_CONFIG,
                );
            }
        };
        let mut controller = ConversationController::new(service);
        runtime.block_on(run_session(&mut controller, stdin.lock(), &mut stdout))
    } else {
        let local = match local_service("chat", &config) {
            Ok(service) => service,
            Err(failure) => return failure,
        };
        let mut controller = ConversationController::new(local);
        runtime.block_on(run_session(&mut controller, stdin.lock(), &mut stdout))
    };

    match result {
        Ok(summary) => CommandResult::success(
            "chat",
            format!("session ended after {} exchanges", summary.exchanges),
        ),
        Err(error) => CommandResult::failure("chat", "io", format!("{error:#}"), EXIT_IO),
    }
}

/// Reads one submission per line until `/quit` or end of input.
pub async fn run_session<S, R, W>(
    controller: &mut ConversationController<S>,
    input: R,
    output: &mut W,
) -> anyhow::Result<SessionSummary>
where
    S: AnswerService,
    R: BufRead,
    W: Write,
{
    let mut summary = SessionSummary::default();
    writeln!(output, "{GREETING}").context("failed to write greeting")?;

    let mut lines = input.lines();
    loop {
        write!(output, "{PROMPT}").context("failed to write prompt")?;
        output.flush().context("failed to flush prompt")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read input line")?;

        match line.trim() {
            "/quit" | "/exit" => break,
            "/reset" => {
                controller.reset().context("could not reset session")?;
                summary.resets += 1;
                writeln!(output, "(new conversation started)")?;
            }
            text => match controller.submit(text).await {
                Ok(entry) => {
                    summary.exchanges += 1;
                    writeln!(output, "{}", render_entry(entry))?;
                }
                Err(SubmitRejection::EmptyInput) => {
                    writeln!(output, "(type a question, or /quit to exit)")?;
                }
                Err(rejection) => return Err(rejection).context("submission rejected"),
            },
        }
    }

    writeln!(output)?;
    Ok(summary)
}

pub fn render_entry(entry: &ConversationEntry) -> String {
    if entry.blocks().is_empty() {
        return entry.text().to_string();
    }
    render_reply(entry.blocks(), entry.panels())
}

/// Terminal rendering of narrative blocks followed by attachment panels.
pub fn render_reply(blocks: &[DisplayBlock], panels: &[Panel]) -> String {
    let mut lines: Vec<String> = blocks.iter().map(display_line).collect();

    for panel in panels {
        lines.push(String::new());
        lines.push(format!("[{}]", panel.title));
        for item in &panel.items {
            lines.push(format!("  {}", item.heading));
            for field in &item.fields {
                lines.push(format!("    {}: {}", field.label, field.value));
            }
        }
    }

    lines.join("\n")
}

fn display_line(block: &DisplayBlock) -> String {
    match block {
        DisplayBlock::Heading { text } => format!("== {text} =="),
        DisplayBlock::Bullet { .. } => format!("  {}", block.to_line()),
        DisplayBlock::Numbered { text } => format!("  {text}"),
        DisplayBlock::Link { label } => format!("<{label}>"),
        DisplayBlock::Paragraph { text } => text.clone(),
        DisplayBlock::Blank => String::new(),
    }
}
