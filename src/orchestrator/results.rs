//! 运行结果与持久化
//!
//! RunResult 序列化为 `[{step, output, error, attempts}]`；output 与 error 恰有一个非 null。
//! 落盘文件名为 `run_<unix 秒>.json`，同一秒内重名时追加 `_<n>`。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::OrchestratorError;
use crate::orchestrator::plan::PlanStep;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: PlanStep,
    pub output: Option<Value>,
    pub error: Option<String>,
    /// 实际调用次数
    pub attempts: u32,
}

impl StepOutcome {
    pub fn success(step: PlanStep, output: Value, attempts: u32) -> Self {
        // null 输出记为 {}，保持 output / error 二选一
        let output = if output.is_null() { json!({}) } else { output };
        Self {
            step,
            output: Some(output),
            error: None,
            attempts,
        }
    }

    pub fn failure(step: PlanStep, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            step,
            output: None,
            error: Some(error.into()),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// 按计划顺序排列的步骤结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunResult {
    entries: Vec<StepOutcome>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: StepOutcome) {
        self.entries.push(outcome);
    }

    pub fn entries(&self) -> &[StepOutcome] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.entries.len() - self.success_count()
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.entries.iter().filter(|e| !e.is_success())
    }

    /// 写入 `dir/run_<ts>.json`（不存在则创建目录），返回文件路径
    pub async fn persist(&self, dir: &Path) -> Result<PathBuf, OrchestratorError> {
        let persist_err = |path: &Path, source: std::io::Error| OrchestratorError::Persist {
            path: path.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| persist_err(dir, e))?;

        let path = unique_run_path(dir, chrono::Utc::now().timestamp()).await;
        let body = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| persist_err(&path, e))?;
        Ok(path)
    }
}

async fn unique_run_path(dir: &Path, timestamp: i64) -> PathBuf {
    let first = dir.join(format!("run_{}.json", timestamp));
    if !tokio::fs::try_exists(&first).await.unwrap_or(false) {
        return first;
    }
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("run_{}_{}.json", timestamp, n));
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }
        n += 1;
    }
}
