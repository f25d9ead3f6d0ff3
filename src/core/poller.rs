//! 会话轮询器
//!
//! 反复拉取会话状态直到 blocked / finished。两次拉取之间按指数退避等待（上限可配置），
//! 拉取失败立即返回，不在循环内重试。取消与最长等待都是可选项：
//! - 提供 CancellationToken 时，拉取和等待都会与取消信号竞争，取消得到 PollOutcome::Cancelled；
//! - 设置 max_wait 时，若下一次等待会越过期限则返回 PollOutcome::TimedOut；默认不限时。

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, Session, SessionApi};
use crate::config::PollSettings;
use crate::core::events::{DisplaySink, SessionEvent};

/// 指数退避：每次返回 min(current, ceiling)，随后 current = min(current * factor, ceiling)
#[derive(Debug, Clone)]
pub struct Backoff {
    current: f64,
    factor: f64,
    ceiling: f64,
}

impl Backoff {
    /// 非法值（非正数、NaN）回落到 1 秒；factor 不小于 1，保证延迟单调不减
    pub fn new(initial_secs: f64, factor: f64, ceiling_secs: f64) -> Self {
        let ceiling = positive_or(ceiling_secs, 1.0);
        Self {
            current: positive_or(initial_secs, 1.0).min(ceiling),
            factor: if factor.is_finite() { factor.max(1.0) } else { 1.0 },
            ceiling,
        }
    }

    /// 本次应等待的时长
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.ceiling);
        self.current = (self.current * self.factor).min(self.ceiling);
        Duration::from_secs_f64(delay)
    }

    pub fn ceiling(&self) -> Duration {
        Duration::from_secs_f64(self.ceiling)
    }
}

fn positive_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        fallback
    }
}

/// 单次轮询的参数；每次轮询都会基于这些参数新建 Backoff
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub initial_delay_secs: f64,
    pub factor: f64,
    pub ceiling_secs: f64,
    pub max_wait: Option<Duration>,
}

impl PollOptions {
    /// watch 命令使用的参数（上限默认 30 秒）
    pub fn watch(settings: &PollSettings) -> Self {
        Self {
            initial_delay_secs: settings.initial_delay_secs,
            factor: settings.factor,
            ceiling_secs: settings.watch_ceiling_secs,
            max_wait: None,
        }
    }

    /// chain 每一步使用的参数（上限默认 10 秒）
    pub fn chain(settings: &PollSettings) -> Self {
        Self {
            initial_delay_secs: settings.initial_delay_secs,
            factor: settings.factor,
            ceiling_secs: settings.chain_ceiling_secs,
            max_wait: None,
        }
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_delay_secs, self.factor, self.ceiling_secs)
    }
}

/// 轮询结果
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// 进入终止状态，附最后一次拉取的会话
    Settled(Session),
    /// 被调用方取消
    Cancelled,
    /// 超过 max_wait，附最后一次拉取的会话
    TimedOut(Session),
}

/// 轮询直到终止状态、取消或超时；任何一次拉取失败都直接返回错误
pub async fn poll_session(
    api: &dyn SessionApi,
    session_id: &str,
    options: &PollOptions,
    sink: &mut dyn DisplaySink,
    cancel: Option<&CancellationToken>,
) -> Result<PollOutcome, ApiError> {
    let mut backoff = options.backoff();
    let started = Instant::now();
    let mut fetches = 0usize;

    loop {
        let fetched = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(PollOutcome::Cancelled),
                r = api.get_session(session_id) => r,
            },
            None => api.get_session(session_id).await,
        };
        let session = fetched?;
        fetches += 1;

        sink.emit(&SessionEvent::Snapshot {
            session_id: session_id.to_string(),
            status: session.status_label().to_string(),
            output: session.structured_output.clone().filter(has_content),
        });

        if session.is_terminal() {
            tracing::debug!(session_id, fetches, status = session.status_label(), "session settled");
            sink.emit(&SessionEvent::Settled {
                session_id: session_id.to_string(),
                status: session.status_label().to_string(),
            });
            return Ok(PollOutcome::Settled(session));
        }

        let delay = backoff.next_delay();
        if let Some(max_wait) = options.max_wait {
            if started.elapsed() + delay > max_wait {
                tracing::debug!(session_id, fetches, "poll deadline reached");
                return Ok(PollOutcome::TimedOut(session));
            }
        }

        tracing::debug!(
            session_id,
            status = session.status_label(),
            delay_ms = delay.as_millis() as u64,
            "session not settled, waiting"
        );
        sink.emit(&SessionEvent::Waiting { delay });

        match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            },
            None => tokio::time::sleep(delay).await,
        }
    }
}

/// null、空对象、空数组视为尚无输出
fn has_content(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => false,
        serde_json::Value::Object(m) => !m.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
