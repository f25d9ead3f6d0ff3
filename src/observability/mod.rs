//! 可观测性：tracing 日志输出到 stderr，标准输出只留给命令结果

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 默认 warn；RUST_LOG 优先，`--verbose` 时默认提升为 debug
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
