//! 终端展示端
//!
//! - Live：watch 使用。每个 Snapshot 原地重绘状态面板（上移光标并清除上一帧），终止时打印 `Session <status>!`。
//!   回退行数按终端宽度折行计算；面板高度不小于终端高度时无法原地重绘，改为顺序追加
//! - Progress：chain 使用。只打印步骤进度行，不重绘面板
//!
//! 写入失败只记日志，不影响轮询本身。

use std::io::{self, Write};

use crossterm::{
    cursor::MoveUp,
    queue,
    style::{Print, Stylize},
    terminal::{self, Clear, ClearType},
};

use crate::core::{DisplaySink, SessionEvent};
use crate::ui::render::{colored_status, snapshot_panel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    Live,
    Progress,
}

pub struct TerminalSink<W: Write + Send> {
    out: W,
    mode: SinkMode,
    /// 上一帧面板占用的屏幕行数（含折行），重绘前据此回退；0 表示不回退
    drawn_lines: u16,
    redraw: bool,
    /// 固定的终端尺寸 (列, 行)；None 时每帧查询当前终端
    size: Option<(u16, u16)>,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(mode: SinkMode) -> Self {
        Self::new(io::stdout(), mode)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W, mode: SinkMode) -> Self {
        Self {
            out,
            mode,
            drawn_lines: 0,
            redraw: true,
            size: None,
        }
    }

    /// 使用固定终端尺寸代替实时查询
    pub fn with_terminal_size(mut self, columns: u16, rows: u16) -> Self {
        self.size = Some((columns, rows));
        self
    }

    /// 关闭原地重绘（输出不是终端时每帧顺序追加）
    pub fn without_redraw(mut self) -> Self {
        self.redraw = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw_panel(&mut self, session_id: &str, status: &str, output: Option<&serde_json::Value>) -> io::Result<()> {
        if self.redraw && self.drawn_lines > 0 {
            queue!(self.out, MoveUp(self.drawn_lines), Clear(ClearType::FromCursorDown))?;
        }
        let lines = snapshot_panel(session_id, status, output);
        for (i, line) in lines.iter().enumerate() {
            if i == 1 {
                queue!(self.out, Print("Status: "), Print(colored_status(status)), Print("\n"))?;
            } else {
                queue!(self.out, Print(line), Print("\n"))?;
            }
        }
        self.drawn_lines = self.rows_to_rewind(&lines);
        self.out.flush()
    }

    /// 下一帧需要回退的屏幕行数；面板放不进终端时返回 0（下一帧直接追加）
    fn rows_to_rewind(&self, lines: &[String]) -> u16 {
        let size = self.size.or_else(|| terminal::size().ok());
        let rows = match size {
            Some((columns, height)) => {
                let rows = panel_rows(lines, columns);
                if rows >= usize::from(height) {
                    return 0;
                }
                rows
            }
            None => lines.len(),
        };
        u16::try_from(rows).unwrap_or(0)
    }

    fn line(&mut self, text: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    fn render(&mut self, event: &SessionEvent) -> io::Result<()> {
        match (self.mode, event) {
            (SinkMode::Live, SessionEvent::Snapshot { session_id, status, output }) => {
                self.draw_panel(session_id, status, output.as_ref())
            }
            (SinkMode::Live, SessionEvent::Settled { status, .. }) => {
                self.drawn_lines = 0;
                self.line(format!("Session {status}!").green().bold())
            }
            (_, SessionEvent::StepStarted { index, total, playbook }) => self.line(
                format!(
                    "Step {}/{}: Playbook={}",
                    index + 1,
                    total,
                    playbook.as_deref().unwrap_or("none")
                )
                .cyan()
                .bold(),
            ),
            (_, SessionEvent::SessionStarted { session_id, url }) => {
                match url {
                    Some(url) => self.line(format!("Session started: {session_id} ({url})"))?,
                    None => self.line(format!("Session started: {session_id}"))?,
                }
                self.line("Watching step 1...".dim())
            }
            (_, SessionEvent::InstructionSent { index, .. }) => {
                self.line("Sending instruction for next step...")?;
                self.line(format!("Watching step {}...", index + 1).dim())
            }
            (_, SessionEvent::StepSettled { index, status }) => {
                self.line(format!("Step {} finished (status: {status}).", index + 1).green())
            }
            (_, SessionEvent::ChainCompleted { .. }) => self.line("Chain completed!".green().bold()),
            _ => Ok(()),
        }
    }
}

/// 按终端列宽折行后占用的行数，空行也占一行
fn panel_rows(lines: &[String], columns: u16) -> usize {
    let columns = usize::from(columns.max(1));
    lines
        .iter()
        .map(|line| line.chars().count().div_ceil(columns).max(1))
        .sum()
}

impl<W: Write + Send> DisplaySink for TerminalSink<W> {
    fn emit(&mut self, event: &SessionEvent) {
        if let Err(e) = self.render(event) {
            tracing::warn!("terminal write failed: {}", e);
        }
    }
}
