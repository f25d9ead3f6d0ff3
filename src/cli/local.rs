//! 只涉及本地配置的命令

use crossterm::style::Stylize;

use crate::api::DEFAULT_BASE_URL;
use crate::cli::input::{prompt_line, prompt_with_default, validate_token};
use crate::cli::Context;
use crate::config::ConfigStore;

pub fn configure(
    ctx: &mut Context,
    token: Option<String>,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    let token = match token {
        Some(t) => t,
        None => prompt_line("Devin API Token (starts with apk_user_ or apk_)")?,
    };
    validate_token(&token)?;

    let base_url = match base_url {
        Some(u) => u,
        None => prompt_with_default("Devin API Base URL", DEFAULT_BASE_URL)?,
    };

    ctx.store.set_api_token(&token)?;
    ctx.store.set_base_url(&base_url)?;
    println!(
        "{}",
        format!("Token and Base URL saved to {}", ctx.store.location()).green()
    );
    Ok(())
}

pub fn use_session(ctx: &mut Context, session_id: &str) -> anyhow::Result<()> {
    ctx.store.set_current_session_id(session_id)?;
    println!("{}", format!("Switched to session {session_id}").green());
    Ok(())
}

pub fn history(ctx: &Context) -> anyhow::Result<()> {
    match ctx.store.current_session_id() {
        Some(sid) => println!("Current local session: {sid}"),
        None => println!("No current local session."),
    }
    Ok(())
}
