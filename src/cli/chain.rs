//! chain 命令：从工作流文件或 `prompt + --playbooks` 得到步骤，交给 ChainRunner 顺序执行
//!
//! 不注册 Ctrl+C 处理：链执行期间中断即进程退出，已创建的远程会话保持原状。

use std::path::PathBuf;
use std::time::Duration;

use crate::api::DevinClient;
use crate::cli::Context;
use crate::core::{steps_from_playbooks, ChainRunner, ChainStep, CliError, PollOptions, Workflow};
use crate::ui::{SinkMode, TerminalSink};

/// 解析步骤来源：文件优先，其次 prompt + playbooks，否则报错
pub fn resolve_steps(
    prompt: Option<String>,
    playbooks: Option<String>,
    file: Option<PathBuf>,
) -> Result<Vec<ChainStep>, CliError> {
    match (file, prompt, playbooks) {
        (Some(path), _, _) => Ok(Workflow::from_file(&path)?.steps),
        (None, Some(prompt), Some(playbooks)) if !prompt.is_empty() && !playbooks.is_empty() => {
            Ok(steps_from_playbooks(&prompt, &playbooks))
        }
        _ => Err(CliError::validation(
            "Must provide --file OR (prompt and --playbooks)",
        )),
    }
}

pub async fn run(
    ctx: &mut Context,
    prompt: Option<String>,
    playbooks: Option<String>,
    file: Option<PathBuf>,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    let steps = resolve_steps(prompt, playbooks, file)?;
    let settings = ctx.settings()?;
    let client = DevinClient::from_settings(&settings)?;
    let options = PollOptions::chain(&settings.poll).with_max_wait(timeout.map(Duration::from_secs));
    let mut sink = TerminalSink::stdout(SinkMode::Progress);

    let report = ChainRunner::new(&client, &mut ctx.store, options)
        .run(&steps, &mut sink)
        .await?;
    tracing::debug!(session_id = %report.session_id, steps = report.steps.len(), "chain finished");
    Ok(())
}
