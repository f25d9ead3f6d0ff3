//! 会话过程事件：轮询快照、退避等待、链式步骤进度
//!
//! 轮询器与链式执行器只产生事件，不关心如何展示；终端渲染见 ui::TerminalSink。

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// 单个过程事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// 一次拉取得到的状态快照；output 为空表示尚无 structured_output
    Snapshot {
        session_id: String,
        status: String,
        output: Option<Value>,
    },
    /// 下一次拉取前的等待
    Waiting { delay: Duration },
    /// 会话进入终止状态
    Settled { session_id: String, status: String },
    /// 链式步骤开始（index 从 0 开始）
    StepStarted {
        index: usize,
        total: usize,
        playbook: Option<String>,
    },
    /// 第一步创建了会话
    SessionStarted {
        session_id: String,
        url: Option<String>,
    },
    /// 后续步骤的指令已发送
    InstructionSent { index: usize, message: String },
    /// 步骤等待结束
    StepSettled { index: usize, status: String },
    /// 全部步骤完成
    ChainCompleted { session_id: String, steps: usize },
}

/// 展示端：接收事件并渲染
pub trait DisplaySink: Send {
    fn emit(&mut self, event: &SessionEvent);
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn emit(&mut self, _event: &SessionEvent) {}
}

/// 记录全部事件（测试与需要回放的调用方）
impl DisplaySink for Vec<SessionEvent> {
    fn emit(&mut self, event: &SessionEvent) {
        self.push(event.clone());
    }
}
