//! 命令行输入：交互式提示、确认、密钥解析、文件/参数二选一的文本输入

use std::io::{self, BufRead, Write};
use std::path::Path;

use crossterm::style::Stylize;

use crate::api::SessionSecret;
use crate::core::CliError;

const TOKEN_PREFIXES: [&str; 2] = ["apk_user_", "apk_"];

/// 打印提示并读一行（去掉首尾空白）；stdin 关闭时返回空串
pub fn prompt_line(label: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}: ")?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// 带默认值的提示：直接回车取默认
pub fn prompt_with_default(label: &str, default: &str) -> io::Result<String> {
    let answer = prompt_line(&format!("{label} [{default}]"))?;
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer
    })
}

/// y/N 确认；`assume_yes` 为 true 时不读取输入
pub fn confirm(question: &str, assume_yes: bool) -> io::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt_line(&format!("{question} [y/N]"))?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

/// API Token 只接受 `apk_user_` / `apk_` 前缀
pub fn validate_token(token: &str) -> Result<(), CliError> {
    if TOKEN_PREFIXES.iter().any(|p| token.starts_with(p)) {
        Ok(())
    } else {
        Err(CliError::validation(
            "Invalid token format. Must start with 'apk_user_' or 'apk_'.",
        ))
    }
}

/// 解析 `KEY=VALUE`；格式不对的条目打印警告后跳过
pub fn parse_session_secrets(raw: &[String]) -> Vec<SessionSecret> {
    raw.iter()
        .filter_map(|entry| match entry.split_once('=') {
            Some((key, value)) => Some(SessionSecret {
                key: key.to_string(),
                value: value.to_string(),
            }),
            None => {
                tracing::warn!("skipping malformed session secret");
                eprintln!(
                    "{} Invalid secret format '{}', skipping. Use KEY=VALUE.",
                    "Warning:".yellow().bold(),
                    entry
                );
                None
            }
        })
        .collect()
}

/// 文本来自文件或参数，文件优先；都没有时报 `missing`
pub fn text_from_file_or_arg(
    file: Option<&Path>,
    inline: Option<String>,
    missing: &str,
) -> Result<String, CliError> {
    match (file, inline) {
        (Some(path), _) => {
            if !path.exists() {
                return Err(CliError::validation(format!(
                    "File not found: {}",
                    path.display()
                )));
            }
            Ok(std::fs::read_to_string(path)?)
        }
        (None, Some(text)) if !text.is_empty() => Ok(text),
        _ => Err(CliError::validation(missing)),
    }
}
