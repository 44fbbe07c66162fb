use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::services::api::FileAttachment;
use crate::services::chat::{ChatPanel, Message, MessageStatus, PanelEvent, Sender};
use crate::services::prompts;

use super::AppContext;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplInput {
    Ask(String),
    New,
    Attach(PathBuf),
    Detach,
    Reasoning(Option<u64>),
    Suggest(usize),
    Close,
    Quit,
    Help,
    Unknown(String),
    Empty,
}

pub fn parse_input(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ReplInput::Ask(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match (name, arg) {
        ("new", _) => ReplInput::New,
        ("attach", "") => ReplInput::Unknown("/attach needs a file path".to_string()),
        ("attach", path) => ReplInput::Attach(PathBuf::from(path)),
        ("detach", _) => ReplInput::Detach,
        ("reasoning", "") => ReplInput::Reasoning(None),
        ("reasoning", n) => match n.parse() {
            Ok(seq) => ReplInput::Reasoning(Some(seq)),
            Err(_) => ReplInput::Unknown(format!("Not a message number: {n}")),
        },
        ("suggest", n) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => ReplInput::Suggest(n - 1),
            _ => ReplInput::Unknown(format!(
                "Pick a suggestion between 1 and {}",
                prompts::SUGGESTED_PROMPTS.len()
            )),
        },
        ("close", _) => ReplInput::Close,
        ("quit" | "exit", _) => ReplInput::Quit,
        ("help", _) => ReplInput::Help,
        (other, _) => ReplInput::Unknown(format!("Unknown command: /{other}")),
    }
}

pub(crate) fn format_timestamp(ms: u64) -> String {
    Local
        .timestamp_millis_opt(ms as i64)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

pub fn render_message(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Assistant => "Assistant",
    };
    let mut out = format!(
        "#{} [{}] {}: {}",
        message.seq,
        format_timestamp(message.created_at_ms),
        who,
        message.text
    );
    if let Some(file) = &message.file {
        out.push_str(&format!("\n    attached: {} ({} bytes)", file.name, file.size));
    }
    if message.status == MessageStatus::Error {
        out.push_str(&format!("\n    ! {}", prompts::ERROR_BADGE));
    }
    if message.has_reasoning() {
        if message.show_reasoning {
            let reasoning = message.reasoning.as_deref().unwrap_or_default();
            out.push_str(&format!("\n    reasoning: {}", reasoning.trim()));
        } else {
            out.push_str(&format!(
                "\n    (reasoning available: /reasoning {})",
                message.seq
            ));
        }
    }
    out
}

pub fn render_suggestions() -> String {
    let mut out = String::from("Suggested questions:");
    for (i, prompt) in prompts::SUGGESTED_PROMPTS.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", i + 1, prompt));
    }
    for (title, description) in prompts::FEATURE_CARDS {
        out.push_str(&format!("\n  * {title}: {description}"));
    }
    out
}

const HELP: &str = "Commands:
  /new             start a new chat
  /attach <path>   attach a document to the next question
  /detach          drop the attached document
  /reasoning [n]   show or hide the reasoning of message n (default: latest)
  /suggest <n>     ask suggested question n
  /close           close the panel, cancelling any pending answer
  /quit            exit";

fn print_history(panel: &ChatPanel) -> anyhow::Result<()> {
    let snapshot = panel.snapshot()?;
    for message in &snapshot.messages {
        println!("{}", render_message(message));
    }
    if snapshot.show_suggestions {
        println!("{}", render_suggestions());
    }
    Ok(())
}

/// Terminal line for one panel event, if it shows anything.
pub(crate) fn render_event(event: &PanelEvent) -> Option<String> {
    match event {
        PanelEvent::MessageAppended { message } if message.sender == Sender::Assistant => {
            Some(render_message(message))
        }
        PanelEvent::TypingChanged { typing: true } => Some(prompts::TYPING_INDICATOR.to_string()),
        PanelEvent::RequestCancelled { request_id } => {
            log::debug!("Cancelled {}", request_id);
            Some("(previous question cancelled)".to_string())
        }
        PanelEvent::FileSelected { file } => Some(format!(
            "Attached {} ({} bytes). {}",
            file.name,
            file.size,
            prompts::INPUT_HINT_WITH_FILE
        )),
        _ => None,
    }
}

fn spawn_renderer(panel: &ChatPanel) -> tokio::task::JoinHandle<()> {
    let mut events = panel.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = render_event(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Renderer skipped {} panel events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Ask one question and write the assistant bubbles it produced.
///
/// The reply is read back from the panel once it is idle, so nothing depends
/// on an event subscriber keeping up.
pub(crate) async fn ask_once<W: Write>(
    panel: &ChatPanel,
    question: &str,
    out: &mut W,
) -> anyhow::Result<()> {
    let last_seq = panel.snapshot()?.messages.last().map(|m| m.seq);
    if panel.send(question)?.is_none() {
        writeln!(out, "{}", prompts::INPUT_HINT)?;
        return Ok(());
    }
    writeln!(out, "{}", prompts::TYPING_INDICATOR)?;
    panel.wait_idle().await;

    let snapshot = panel.snapshot()?;
    let replies = snapshot
        .messages
        .iter()
        .filter(|m| m.sender == Sender::Assistant)
        .filter(|m| last_seq.is_none_or(|seq| m.seq > seq));
    for message in replies {
        writeln!(out, "{}", render_message(message))?;
    }
    out.flush()?;
    Ok(())
}

async fn attach(panel: &ChatPanel, path: &Path) -> anyhow::Result<()> {
    let file = FileAttachment::from_path(path).await?;
    panel.select_file(file)?;
    Ok(())
}

fn toggle_reasoning(panel: &ChatPanel, seq: Option<u64>) -> anyhow::Result<()> {
    let snapshot = panel.snapshot()?;
    let target = match seq {
        Some(seq) => snapshot.messages.iter().find(|m| m.seq == seq),
        None => snapshot.messages.iter().rev().find(|m| m.has_reasoning()),
    };
    let Some(target) = target else {
        println!("No such message.");
        return Ok(());
    };
    if !target.has_reasoning() {
        println!("Message #{} has no reasoning.", target.seq);
        return Ok(());
    }

    if panel.toggle_reasoning(&target.id)? == Some(true) {
        let shown = panel.snapshot()?;
        if let Some(message) = shown.messages.iter().find(|m| m.id == target.id) {
            println!("{}", render_message(message));
        }
    } else {
        println!("Reasoning for #{} hidden.", target.seq);
    }
    Ok(())
}

/// Interactive chat loop, or a single question when `question` is given.
pub async fn run_chat(
    ctx: &AppContext,
    file: Option<PathBuf>,
    question: Option<String>,
) -> anyhow::Result<()> {
    let panel = ChatPanel::new(ctx.chat_backend());
    panel.open()?;

    if let Some(question) = question {
        if let Some(path) = file.as_deref() {
            attach(&panel, path).await?;
        }
        ask_once(&panel, &question, &mut std::io::stdout()).await?;
        panel.close()?;
        return Ok(());
    }

    let renderer = spawn_renderer(&panel);
    if let Some(path) = file.as_deref() {
        attach(&panel, path).await?;
    }

    print_history(&panel)?;
    println!("{} (/help for commands)", prompts::INPUT_HINT);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            ReplInput::Empty => {}
            ReplInput::Ask(text) => {
                panel.send(&text)?;
            }
            ReplInput::New => {
                panel.clear_conversation()?;
                print_history(&panel)?;
            }
            ReplInput::Attach(path) => {
                if let Err(err) = attach(&panel, &path).await {
                    println!("Could not attach {}: {}", path.display(), err);
                }
            }
            ReplInput::Detach => panel.remove_file()?,
            ReplInput::Reasoning(seq) => toggle_reasoning(&panel, seq)?,
            ReplInput::Suggest(index) => {
                if let Err(err) = panel.send_suggestion(index) {
                    println!("{}", err);
                }
            }
            ReplInput::Close => {
                panel.close()?;
                println!("Panel closed. Type a question to reopen it.");
            }
            ReplInput::Quit => break,
            ReplInput::Help => println!("{HELP}"),
            ReplInput::Unknown(message) => println!("{message}"),
        }
    }

    panel.close()?;
    renderer.abort();
    Ok(())
}
