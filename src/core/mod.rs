//! 核心层：错误、过程事件、会话轮询（指数退避）、链式执行

pub mod chain;
pub mod error;
pub mod events;
pub mod poller;

pub use chain::{steps_from_playbooks, ChainReport, ChainRunner, ChainStep, StepReport, Workflow};
pub use error::CliError;
pub use events::{DisplaySink, NullSink, SessionEvent};
pub use poller::{poll_session, Backoff, PollOptions, PollOutcome};
