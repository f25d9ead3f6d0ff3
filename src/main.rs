//! devin 入口：解析参数、初始化日志、执行子命令，错误统一打印后以 1 退出

use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use devin_cli::{cli::Cli, ApiError, CliError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    devin_cli::observability::init(cli.verbose);

    match devin_cli::cli::run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            if is_unauthorized(&err) {
                eprintln!("Tip: Check your API token with 'devin configure'.");
            }
            ExitCode::FAILURE
        }
    }
}

/// 根因是否为 401（CliError::Api 是 transparent，需要两种都查）
fn is_unauthorized(err: &anyhow::Error) -> bool {
    err.chain().any(|e| {
        matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized))
            || e.downcast_ref::<CliError>().is_some_and(CliError::is_unauthorized)
    })
}
