//! unreal-mcp：stdio 上的 MCP 服务
//!
//! 启动时探测一次编辑器连接，然后逐行处理 JSON-RPC，直到 stdin 关闭或收到 Ctrl+C。
//! 日志全部写 stderr。

use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;

use unreal_mcp::config::{load_config, AppConfig};
use unreal_mcp::core::shutdown::EngineDisconnect;
use unreal_mcp::core::{ShutdownCoordinator, ShutdownManager, ShutdownReason};
use unreal_mcp::mcp::McpServer;
use unreal_mcp::observability::{self, LogTarget};
use unreal_mcp::tools::{build_full_registry, ToolExecutor};
use unreal_mcp::EngineClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cfg, config_error) = match load_config(None) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    observability::init(&cfg.orchestrator.log_level, LogTarget::Stderr);
    if let Some(e) = config_error {
        tracing::warn!("Config load failed ({}), using defaults", e);
    }

    let client = EngineClient::from_config(&cfg.engine);
    if client.probe().await {
        tracing::info!("Connected to Unreal Engine on startup");
    } else {
        tracing::warn!("Could not connect to Unreal Engine on startup");
    }

    let registry = build_full_registry(&client);
    let executor = Arc::new(ToolExecutor::new(registry, cfg.tools.tool_timeout_secs));
    let server = McpServer::new(executor);

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();
    let mut coordinator = ShutdownCoordinator::new();
    coordinator.register(EngineDisconnect::new(client));

    tracing::info!("Unreal MCP server ready on stdio");
    let served = server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown.token())
        .await
        .context("MCP stdio loop failed");

    // 信号已触发关闭时保留原先的原因
    shutdown.shutdown(ShutdownReason::InputClosed);
    coordinator.run_cleanup().await;
    tracing::info!(reason = ?shutdown.reason(), "Unreal MCP server shut down");
    served
}
