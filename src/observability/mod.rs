//! 可观测性：tracing 订阅器初始化
//!
//! 编排器日志写 stdout；MCP 服务的 stdout 承载 JSON-RPC，日志必须走 stderr。
//! 设置了 RUST_LOG 时以其为准，否则使用配置中的级别。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
}

pub fn init(log_level: &str, target: LogTarget) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(normalize_level(log_level)));
    let registry = tracing_subscriber::registry().with(filter);
    match target {
        LogTarget::Stdout => registry.with(fmt::layer()).init(),
        LogTarget::Stderr => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .init(),
    }
}

/// 把配置里的级别名（大小写不限，兼容 WARNING / CRITICAL）映射成过滤指令；未知名称退回 info
pub fn normalize_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        "off" => "off",
        _ => "info",
    }
}
