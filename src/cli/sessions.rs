//! 会话相关命令

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::style::Stylize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::api::{CreateSessionRequest, CreateSessionResponse, DevinClient};
use crate::cli::input::{confirm, text_from_file_or_arg};
use crate::cli::Context;
use crate::config::ConfigStore;
use crate::core::{poll_session, CliError, PollOptions, PollOutcome};
use crate::ui::render::{format_timestamp, pretty_json, sessions_table};
use crate::ui::{colored_status, SinkMode, TerminalSink};

fn print_created(resp: &CreateSessionResponse) {
    println!(
        "{} {} (url: {})",
        "Session created:".green(),
        resp.session_id,
        resp.url.as_deref().unwrap_or("-")
    );
}

pub async fn create_session(ctx: &mut Context, request: &CreateSessionRequest) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let resp = client.create_session(request).await?;
    ctx.store.set_current_session_id(&resp.session_id)?;
    print_created(&resp);
    Ok(())
}

pub async fn list_sessions(ctx: &Context, limit: u32, json: bool) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let list = client.list_sessions(limit, 0, &[]).await?;
    if json {
        println!("{}", pretty_json(list.raw_items()));
        return Ok(());
    }
    match list.items() {
        None => println!("{}", pretty_json(&list.raw)),
        Some([]) => println!("No sessions found."),
        Some(sessions) => {
            println!("{}", "Devin Sessions".bold());
            println!("{}", sessions_table(sessions));
        }
    }
    Ok(())
}

pub async fn get_session(ctx: &Context, session_id: Option<String>) -> anyhow::Result<()> {
    let sid = ctx.session_id(session_id)?;
    let session = ctx.client()?.get_session(&sid).await?;
    println!("{}", format!("Session {sid}").bold());
    println!("{} {}", "Status:".bold(), colored_status(session.status_label()));
    println!("{} {}", "URL:".bold(), session.url.as_deref().unwrap_or("-"));
    println!(
        "{} {}",
        "Created:".bold(),
        session.created_at.as_deref().map(format_timestamp).unwrap_or_default()
    );
    if let Some(output) = session.structured_output.as_ref().filter(|v| !v.is_null()) {
        println!("{}", "Structured Output:".bold());
        println!("{}", pretty_json(output));
    }
    Ok(())
}

pub async fn message(
    ctx: &Context,
    text: Option<String>,
    file: Option<PathBuf>,
    session_id: Option<String>,
) -> anyhow::Result<()> {
    let sid = ctx.session_id(session_id)?;
    let text = text_from_file_or_arg(file.as_deref(), text, "Must provide message text or --file")?;
    ctx.client()?.send_message(&sid, &text).await?;
    println!("{}", format!("Message sent to session {sid}").green());
    Ok(())
}

/// 实时监视：按 watch 退避上限轮询，Ctrl+C 结束并视为正常退出
pub async fn watch(ctx: &Context, session_id: Option<String>, timeout: Option<u64>) -> anyhow::Result<()> {
    let sid = ctx.session_id(session_id)?;
    let settings = ctx.settings()?;
    let client = DevinClient::from_settings(&settings)?;
    let options = PollOptions::watch(&settings.poll).with_max_wait(timeout.map(Duration::from_secs));

    println!("Watching session {sid}. Press Ctrl+C to stop.");
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let mut sink = TerminalSink::stdout(SinkMode::Live);
    if !std::io::stdout().is_terminal() {
        sink = sink.without_redraw();
    }
    let outcome = poll_session(&client, &sid, &options, &mut sink, Some(&cancel)).await;
    ctrl_c.abort();

    match outcome? {
        PollOutcome::Settled(_) => Ok(()),
        PollOutcome::Cancelled => {
            println!("\nStopped watching.");
            Ok(())
        }
        PollOutcome::TimedOut(last) => Err(CliError::TimedOut {
            session_id: sid,
            status: last.status_label().to_string(),
        }
        .into()),
    }
}

pub async fn update_tags(ctx: &Context, session_id: Option<String>, tags: &[String]) -> anyhow::Result<()> {
    let sid = ctx.session_id(session_id)?;
    ctx.client()?.update_session_tags(&sid, tags).await?;
    println!("{}", format!("Tags updated for session {sid}.").green());
    Ok(())
}

pub async fn terminate(ctx: &Context, session_id: Option<String>, yes: bool) -> anyhow::Result<()> {
    let sid = ctx.session_id(session_id)?;
    if !confirm(&format!("Are you sure you want to terminate session {sid}?"), yes)? {
        println!("Aborted.");
        return Ok(());
    }
    ctx.client()?.terminate_session(&sid).await?;
    println!("{}", format!("Session {sid} terminated.").green());
    Ok(())
}

pub async fn upload(ctx: &Context, file: &Path) -> anyhow::Result<()> {
    let url = ctx.client()?.upload_file(file).await?;
    println!("{} {}", "File uploaded:".green(), url);
    Ok(())
}

/// 附件提示词：原始 prompt 之后追加 `ATTACHMENT: "<url>"`
pub fn attachment_prompt(prompt: &str, url: &str) -> String {
    format!("{prompt}\n\nATTACHMENT: \"{url}\"")
}

pub async fn attach(ctx: &mut Context, file: &Path, prompt: &str) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let url = client.upload_file(file).await?;
    let request = CreateSessionRequest::new(attachment_prompt(prompt, &url));
    let resp = client.create_session(&request).await?;
    ctx.store.set_current_session_id(&resp.session_id)?;
    print_created(&resp);
    Ok(())
}

pub async fn open_in_browser(ctx: &Context) -> anyhow::Result<()> {
    let sid = ctx.session_id(None)?;
    let session = ctx.client()?.get_session(&sid).await?;
    match session.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => {
            println!("Opening {url}...");
            open::that(url).map_err(|e| anyhow::anyhow!("Failed to open {url}: {e}"))?;
        }
        None => println!("{}", "No URL found for this session.".yellow()),
    }
    Ok(())
}

pub async fn status(ctx: &Context) -> anyhow::Result<()> {
    let sid = ctx.session_id(None)?;
    let session = ctx.client()?.get_session(&sid).await?;
    println!("Session {sid}: {}", colored_status(session.status_label()));
    Ok(())
}

/// 单条消息的展示：`[type] message`，结构不认识时输出紧凑 JSON
pub fn format_message(message: &Value) -> String {
    let text = message.get("message").and_then(Value::as_str);
    let kind = message
        .get("type")
        .or_else(|| message.get("origin"))
        .and_then(Value::as_str);
    match (kind, text) {
        (Some(kind), Some(text)) => format!("[{kind}] {text}"),
        (None, Some(text)) => text.to_string(),
        _ => message.to_string(),
    }
}

pub async fn messages(ctx: &Context, session_id: Option<String>) -> anyhow::Result<()> {
    let sid = ctx.session_id(session_id)?;
    let session = ctx.client()?.get_session(&sid).await?;
    println!("{}", format!("Conversation for Session {sid}").bold());
    println!("{}", "─".repeat(25));
    for m in session.messages.unwrap_or_default() {
        println!("{}", format_message(&m));
    }
    Ok(())
}
