//! 运行后钩子
//!
//! 每次运行结束后按顺序执行配置中的外部命令（如更新指南知识库的脚本）。
//! 第一个失败的钩子终止后续钩子，由调用方记录日志；钩子结果不影响退出码。

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::HookEntry;
use crate::core::OrchestratorError;

/// 执行单个钩子：非零退出、启动失败、超时都返回 Hook 错误
pub async fn run_hook(hook: &HookEntry) -> Result<(), OrchestratorError> {
    let hook_err = |reason: String| OrchestratorError::Hook {
        program: hook.program.clone(),
        reason,
    };

    let mut command = Command::new(&hook.program);
    command
        .args(&hook.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &hook.cwd {
        command.current_dir(cwd);
    }

    tracing::info!("Running post-run hook: {} {}", hook.program, hook.args.join(" "));
    let output = tokio::time::timeout(Duration::from_secs(hook.timeout_secs), command.output())
        .await
        .map_err(|_| hook_err(format!("timed out after {}s", hook.timeout_secs)))?
        .map_err(|e| hook_err(e.to_string()))?;

    if output.status.success() {
        tracing::debug!(
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "post-run hook finished"
        );
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(hook_err(format!("{} {}", output.status, stderr.trim())))
    }
}

/// 依次执行全部钩子，返回成功执行的个数
pub async fn run_post_run_hooks(hooks: &[HookEntry]) -> Result<usize, OrchestratorError> {
    for (done, hook) in hooks.iter().enumerate() {
        if let Err(e) = run_hook(hook).await {
            return Err(match e {
                OrchestratorError::Hook { program, reason } => OrchestratorError::Hook {
                    program,
                    reason: format!("{} ({} of {} hooks completed)", reason, done, hooks.len()),
                },
                other => other,
            });
        }
    }
    Ok(hooks.len())
}
