//! 文本渲染
//!
//! 纯函数：会话表格、状态面板、JSON 美化、时间格式化。颜色只在写入终端时附加（见 colored_status），
//! 这里返回的字符串不含转义序列，便于测试。

use chrono::{DateTime, Local};
use crossterm::style::{Color, StyledContent, Stylize};
use serde_json::Value;

use crate::api::Session;

/// 表格中标题列回退到 prompt 时保留的最大字符数
const TITLE_FALLBACK_CHARS: usize = 50;

/// 无 structured_output 时的占位
pub const NO_OUTPUT_PLACEHOLDER: &str = "(No structured output yet)";

/// 按字符截断（不会切断 UTF-8）
pub fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}

/// 标题；缺失时取 prompt 前 50 个字符
pub fn session_title(session: &Session) -> String {
    match session.title.as_deref().filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None => truncate_chars(session.prompt.as_deref().unwrap_or(""), TITLE_FALLBACK_CHARS),
    }
}

/// RFC3339 时间转为本地时间 `YYYY-MM-DD HH:MM:SS`；无法解析时原样返回
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// 状态对应的颜色：working 绿、blocked 红、finished 蓝，其余默认
pub fn status_color(status: &str) -> Color {
    match status {
        "working" => Color::Green,
        "blocked" => Color::Red,
        "finished" => Color::Blue,
        _ => Color::Reset,
    }
}

pub fn colored_status(status: &str) -> StyledContent<String> {
    status.to_string().with(status_color(status)).bold()
}

pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// 左对齐的纯文本表格：表头、分隔线、数据行
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(format_row(headers.to_vec()));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        out.push(format_row(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

/// list-sessions 表格
pub fn sessions_table(sessions: &[Session]) -> String {
    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|s| {
            vec![
                s.session_id.clone(),
                s.status_label().to_string(),
                session_title(s),
                s.created_at.as_deref().map(format_timestamp).unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&["ID", "Status", "Title", "Created At"], &rows)
}

/// watch 的状态面板内容（不含颜色）
pub fn snapshot_panel(session_id: &str, status: &str, output: Option<&Value>) -> Vec<String> {
    let mut lines = vec![
        format!("Session: {session_id}"),
        format!("Status: {status}"),
        String::new(),
    ];
    match output {
        Some(v) => lines.extend(pretty_json(v).lines().map(str::to_string)),
        None => lines.push(NO_OUTPUT_PLACEHOLDER.to_string()),
    }
    lines
}
