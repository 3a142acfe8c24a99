//! MCP 服务的关闭流程
//!
//! Ctrl+C / SIGTERM / stdin EOF 任一发生即取消 token，stdio 循环随之退出；
//! 之后按注册顺序执行清理任务（断开编辑器连接），每个任务单独限时。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::transport::EngineClient;

/// 关闭原因；只记录第一次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl+C
    UserInitiated,
    /// SIGTERM
    Signal,
    /// 客户端关闭了 stdin
    InputClosed,
}

#[derive(Debug, Default)]
pub struct ShutdownManager {
    token: CancellationToken,
    reason: OnceLock<ShutdownReason>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// 触发关闭；返回本次调用是否是第一个原因
    pub fn shutdown(&self, reason: ShutdownReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        if first {
            tracing::info!(?reason, "shutdown requested");
        }
        self.token.cancel();
        first
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().copied()
    }

    /// Ctrl+C 与（unix 下）SIGTERM 都转成 shutdown
    pub fn install_signal_handlers(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                manager.shutdown(ShutdownReason::UserInitiated);
            }
        });

        #[cfg(unix)]
        {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                    sigterm.recv().await;
                    manager.shutdown(ShutdownReason::Signal);
                }
            });
        }
    }
}

#[async_trait::async_trait]
pub trait ShutdownCleanup: Send + Sync {
    async fn cleanup(&self) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

pub struct ShutdownCoordinator {
    tasks: Vec<Box<dyn ShutdownCleanup>>,
    task_timeout: Duration,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            task_timeout: Duration::from_secs(5),
        }
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: ShutdownCleanup + 'static>(&mut self, task: T) {
        self.tasks.push(Box::new(task));
    }

    /// 依次执行清理；失败或超时只告警，返回成功的个数
    pub async fn run_cleanup(&self) -> usize {
        let mut done = 0;
        for task in &self.tasks {
            match tokio::time::timeout(self.task_timeout, task.cleanup()).await {
                Ok(Ok(())) => {
                    tracing::debug!("Cleanup task '{}' completed", task.name());
                    done += 1;
                }
                Ok(Err(e)) => tracing::warn!("Cleanup task '{}' failed: {}", task.name(), e),
                Err(_) => tracing::warn!(
                    "Cleanup task '{}' timed out after {:?}",
                    task.name(),
                    self.task_timeout
                ),
            }
        }
        done
    }
}

/// 退出前断开编辑器连接
pub struct EngineDisconnect {
    client: EngineClient,
}

impl EngineDisconnect {
    pub fn new(client: EngineClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ShutdownCleanup for EngineDisconnect {
    async fn cleanup(&self) -> anyhow::Result<()> {
        self.client.disconnect().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "EngineConnection"
    }
}
