//! 知识库、Playbook、组织密钥命令
//!
//! 列表响应不是预期结构时原样输出 JSON。

use crossterm::style::Stylize;
use serde_json::Value;

use crate::api::{CreateKnowledgeRequest, Listing, PlaybookRequest, UpdateKnowledgeRequest};
use crate::cli::input::confirm;
use crate::cli::Context;
use crate::ui::pretty_json;
use crate::ui::render::{format_timestamp, render_table};

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// 创建接口返回的 ID；没有 id 字段时退回整个响应
fn created_id(resp: &Value, key: &str) -> String {
    match resp.get(key).and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => match resp {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}

pub async fn list_knowledge(ctx: &Context) -> anyhow::Result<()> {
    let list = ctx.client()?.list_knowledge().await?;
    let Some(entries) = list.items() else {
        println!("{}", pretty_json(&list.raw));
        return Ok(());
    };
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|k| {
            vec![
                cell(&k.id),
                cell(&k.name),
                k.created_at.as_deref().map(format_timestamp).unwrap_or_default(),
            ]
        })
        .collect();
    println!("{}", "Knowledge Base".bold());
    println!("{}", render_table(&["ID", "Name", "Created At"], &rows));
    Ok(())
}

pub async fn create_knowledge(ctx: &Context, request: &CreateKnowledgeRequest) -> anyhow::Result<()> {
    let resp = ctx.client()?.create_knowledge(request).await?;
    println!("{} {}", "Knowledge created:".green(), created_id(&resp, "id"));
    Ok(())
}

pub async fn update_knowledge(
    ctx: &Context,
    knowledge_id: &str,
    request: &UpdateKnowledgeRequest,
) -> anyhow::Result<()> {
    ctx.client()?.update_knowledge(knowledge_id, request).await?;
    println!("{}", format!("Knowledge {knowledge_id} updated.").green());
    Ok(())
}

pub async fn delete_knowledge(ctx: &Context, knowledge_id: &str, yes: bool) -> anyhow::Result<()> {
    if !confirm(&format!("Are you sure you want to delete knowledge {knowledge_id}?"), yes)? {
        println!("Aborted.");
        return Ok(());
    }
    ctx.client()?.delete_knowledge(knowledge_id).await?;
    println!("{}", format!("Knowledge {knowledge_id} deleted.").green());
    Ok(())
}

pub async fn list_playbooks(ctx: &Context) -> anyhow::Result<()> {
    match ctx.client()?.list_playbooks().await? {
        Listing::Items(items) => {
            let rows: Vec<Vec<String>> = items
                .iter()
                .map(|p| {
                    vec![
                        cell(&p.playbook_id),
                        cell(&p.title),
                        p.macro_name.clone().unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            println!("{}", "Playbooks".bold());
            println!("{}", render_table(&["ID", "Title", "Macro"], &rows));
        }
        Listing::Raw(raw) => println!("{}", pretty_json(&raw)),
    }
    Ok(())
}

pub async fn get_playbook(ctx: &Context, playbook_id: &str) -> anyhow::Result<()> {
    let pb = ctx.client()?.get_playbook(playbook_id).await?;
    println!("{}", format!("Playbook {playbook_id}").bold());
    println!("{} {}", "Title:".bold(), cell(&pb.title));
    println!("{} {}", "Macro:".bold(), pb.macro_name.as_deref().unwrap_or("-"));
    if let Some(body) = pb.body.as_deref() {
        println!();
        println!("{body}");
    }
    Ok(())
}

pub async fn create_playbook(
    ctx: &Context,
    title: &str,
    body: &str,
    macro_name: Option<String>,
) -> anyhow::Result<()> {
    let resp = ctx.client()?.create_playbook(title, body, macro_name).await?;
    println!("{} {}", "Playbook created:".green(), created_id(&resp, "playbook_id"));
    Ok(())
}

pub async fn update_playbook(ctx: &Context, playbook_id: &str, request: &PlaybookRequest) -> anyhow::Result<()> {
    ctx.client()?.update_playbook(playbook_id, request).await?;
    println!("{}", format!("Playbook {playbook_id} updated.").green());
    Ok(())
}

pub async fn delete_playbook(ctx: &Context, playbook_id: &str, yes: bool) -> anyhow::Result<()> {
    if !confirm(&format!("Are you sure you want to delete playbook {playbook_id}?"), yes)? {
        println!("Aborted.");
        return Ok(());
    }
    ctx.client()?.delete_playbook(playbook_id).await?;
    println!("{}", format!("Playbook {playbook_id} deleted.").green());
    Ok(())
}

pub async fn list_secrets(ctx: &Context) -> anyhow::Result<()> {
    match ctx.client()?.list_secrets().await? {
        Listing::Items(items) => {
            let rows: Vec<Vec<String>> = items.iter().map(|s| vec![cell(&s.id), cell(&s.name)]).collect();
            println!("{}", "Organization Secrets".bold());
            println!("{}", render_table(&["ID", "Name"], &rows));
        }
        Listing::Raw(raw) => println!("{}", pretty_json(&raw)),
    }
    Ok(())
}

pub async fn delete_secret(ctx: &Context, secret_id: &str, yes: bool) -> anyhow::Result<()> {
    if !confirm(&format!("Are you sure you want to delete secret {secret_id}?"), yes)? {
        println!("Aborted.");
        return Ok(());
    }
    ctx.client()?.delete_secret(secret_id).await?;
    println!("{}", format!("Secret {secret_id} deleted.").green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_created_id_prefers_field() {
        assert_eq!(created_id(&json!({"id": "note-1", "name": "x"}), "id"), "note-1");
        assert_eq!(created_id(&json!({"ok": true}), "id"), "{\"ok\":true}");
        assert_eq!(created_id(&json!("pb-9"), "playbook_id"), "pb-9");
    }
}
