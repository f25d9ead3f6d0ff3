//! 链式执行（chain）
//!
//! 按顺序驱动同一个远程会话经过多个 Playbook 阶段：
//! - 第 0 步创建会话（携带 playbook_id），并把会话 ID 写入本地配置作为当前会话；
//! - 第 i>0 步向该会话发送一条指令：`<prompt> (Playbook: <id>)`。API 没有切换 Playbook 的接口，
//!   这只是约定俗成的文字提示，是否遵循由远端 Agent 决定；
//! - 每一步之后都轮询到终止状态才进入下一步。
//!
//! 任何创建、发送、轮询错误都会立即中止整条链，已完成的远端状态保持原样，不做清理。

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::api::{CreateSessionRequest, SessionApi};
use crate::config::ConfigStore;
use crate::core::events::{DisplaySink, SessionEvent};
use crate::core::poller::{poll_session, PollOptions, PollOutcome};
use crate::core::CliError;

/// 链中的一步
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStep {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub playbook: Option<String>,
}

impl ChainStep {
    pub fn new(prompt: impl Into<String>, playbook: Option<String>) -> Self {
        Self {
            prompt: prompt.into(),
            playbook,
        }
    }

    /// 后续步骤发送给会话的指令文本
    pub fn instruction(&self) -> String {
        match &self.playbook {
            Some(pb) => format!("{} (Playbook: {})", self.prompt, pb),
            None => self.prompt.clone(),
        }
    }
}

/// 工作流文件（YAML）：
///
/// ```yaml
/// steps:
///   - prompt: "Set up the repo"
///     playbook: playbook-setup
///   - prompt: "Now write tests"
///     playbook: playbook-tests
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub steps: Vec<ChainStep>,
}

impl Workflow {
    pub fn from_yaml(text: &str) -> Result<Self, CliError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
            .map_err(|e| CliError::validation(format!("Error parsing YAML: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Err(CliError::validation(format!(
                "File not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}

/// 由逗号分隔的 Playbook 列表展开步骤：第 0 步用原始 prompt，其余为 `Execute playbook: <id>`
pub fn steps_from_playbooks(prompt: &str, playbooks: &str) -> Vec<ChainStep> {
    playbooks
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .enumerate()
        .map(|(i, id)| {
            let step_prompt = if i == 0 {
                prompt.to_string()
            } else {
                format!("Execute playbook: {id}")
            };
            ChainStep::new(step_prompt, Some(id.to_string()))
        })
        .collect()
}

/// 单步结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub index: usize,
    pub playbook: Option<String>,
    pub status: String,
}

/// 整条链的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub session_id: String,
    pub steps: Vec<StepReport>,
}

/// 链式执行器
pub struct ChainRunner<'a> {
    api: &'a dyn SessionApi,
    store: &'a mut dyn ConfigStore,
    options: PollOptions,
    cancel: Option<CancellationToken>,
}

impl<'a> ChainRunner<'a> {
    pub fn new(api: &'a dyn SessionApi, store: &'a mut dyn ConfigStore, options: PollOptions) -> Self {
        Self {
            api,
            store,
            options,
            cancel: None,
        }
    }

    /// 允许中断：取消后当前步骤以 CliError::Interrupted 失败（不是正常结束）
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// 严格顺序执行全部步骤
    pub async fn run(
        &mut self,
        steps: &[ChainStep],
        sink: &mut dyn DisplaySink,
    ) -> Result<ChainReport, CliError> {
        if steps.is_empty() {
            return Err(CliError::validation("Workflow has no steps"));
        }
        let total = steps.len();
        let mut working: Option<String> = None;
        let mut reports = Vec::with_capacity(total);

        for (index, step) in steps.iter().enumerate() {
            sink.emit(&SessionEvent::StepStarted {
                index,
                total,
                playbook: step.playbook.clone(),
            });
            tracing::info!(step = index + 1, total, playbook = ?step.playbook, "chain step started");

            let session_id = match working.take() {
                None => {
                    let request =
                        CreateSessionRequest::new(step.prompt.clone()).playbook(step.playbook.clone());
                    let resp = self.api.create_session(&request).await?;
                    self.store.set_current_session_id(&resp.session_id)?;
                    sink.emit(&SessionEvent::SessionStarted {
                        session_id: resp.session_id.clone(),
                        url: resp.url.clone(),
                    });
                    resp.session_id
                }
                Some(session_id) => {
                    let message = step.instruction();
                    self.api.send_message(&session_id, &message).await?;
                    sink.emit(&SessionEvent::InstructionSent { index, message });
                    session_id
                }
            };

            let outcome = poll_session(
                self.api,
                &session_id,
                &self.options,
                sink,
                self.cancel.as_ref(),
            )
            .await?;
            let status = match outcome {
                PollOutcome::Settled(session) => session.status_label().to_string(),
                PollOutcome::Cancelled => return Err(CliError::Interrupted { session_id }),
                PollOutcome::TimedOut(session) => {
                    return Err(CliError::TimedOut {
                        session_id,
                        status: session.status_label().to_string(),
                    })
                }
            };
            tracing::info!(step = index + 1, total, status = %status, "chain step settled");
            sink.emit(&SessionEvent::StepSettled {
                index,
                status: status.clone(),
            });
            reports.push(StepReport {
                index,
                playbook: step.playbook.clone(),
                status,
            });
            working = Some(session_id);
        }

        let session_id = working.unwrap_or_default();
        sink.emit(&SessionEvent::ChainCompleted {
            session_id: session_id.clone(),
            steps: total,
        });
        Ok(ChainReport {
            session_id,
            steps: reports,
        })
    }
}
