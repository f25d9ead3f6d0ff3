//! Devin CLI - Devin 远程会话命令行客户端
//!
//! 模块划分：
//! - **api**: REST 客户端、错误分类、数据类型与各资源接口
//! - **config**: 本地配置存储（config.json）与分层运行时配置
//! - **core**: 会话轮询（指数退避）、Playbook 链式执行、过程事件、命令层错误
//! - **ui**: 终端着色、实时面板与表格渲染
//! - **cli**: clap 命令定义与处理函数
//! - **observability**: tracing 初始化

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod observability;
pub mod ui;

pub use crate::api::{ApiError, DevinClient, SessionApi};
pub use crate::core::{ChainRunner, CliError, PollOptions, PollOutcome};
