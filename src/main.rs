//! unreal-orchestrator：根据一句提示词在编辑器中执行一组资产创建步骤
//!
//! 用法：`unreal-orchestrator "<prompt>"`
//! 退出码：0 全部成功（或计划为空），2 有步骤用尽重试，1 用法错误或致命错误。

use std::process::ExitCode;

use unreal_mcp::config::{load_config, AppConfig};
use unreal_mcp::observability::{self, LogTarget};
use unreal_mcp::orchestrator::Orchestrator;
use unreal_mcp::EngineClient;

#[tokio::main]
async fn main() -> ExitCode {
    let Some(prompt) = std::env::args().nth(1) else {
        eprintln!("Usage: unreal-orchestrator \"<prompt>\"");
        return ExitCode::from(1);
    };

    let (cfg, config_error) = match load_config(None) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    observability::init(&cfg.orchestrator.log_level, LogTarget::Stdout);
    if let Some(e) = config_error {
        tracing::warn!("Config load failed ({}), using defaults", e);
    }

    let client = EngineClient::from_config(&cfg.engine);
    let orchestrator = Orchestrator::from_config(&cfg, &client);

    let code = match orchestrator.run(&prompt).await {
        Ok(report) => {
            if let Some(path) = &report.summary_path {
                tracing::info!(run_id = %report.run_id, "Summary: {}", path.display());
            }
            report.exit_code()
        }
        Err(e) => {
            tracing::error!("Orchestration failed: {}", e);
            1
        }
    };
    client.disconnect().await;
    ExitCode::from(code)
}
