//! 逐步执行与有限重试
//!
//! 步骤严格按顺序执行。每次调用若工具层返回 Err，或输出 `success == false` / 顶层 `error` 非 null，
//! 即视为失败；失败后睡眠 retry_delay 再试，总调用次数不超过 `max_retries + 1`。
//! 用尽重试的步骤记为失败，继续执行下一个步骤。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::OrchestratorSection;
use crate::orchestrator::clarify::{ClarificationHook, PassthroughClarifier};
use crate::orchestrator::plan::PlanStep;
use crate::orchestrator::results::{RunResult, StepOutcome};
use crate::tools::{failure_reason, ToolExecutor};

/// 步骤状态：Pending → Executing → (Success | Retrying → Executing | Failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Executing,
    Retrying,
    Success,
    Failed,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepState::Pending => "pending",
            StepState::Executing => "executing",
            StepState::Retrying => "retrying",
            StepState::Success => "success",
            StepState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(2),
        }
    }
}

impl From<&OrchestratorSection> for RetryPolicy {
    fn from(cfg: &OrchestratorSection) -> Self {
        Self {
            max_retries: cfg.retries,
            delay: cfg.retry_delay(),
        }
    }
}

pub struct StepRunner {
    executor: Arc<ToolExecutor>,
    policy: RetryPolicy,
    clarifier: Arc<dyn ClarificationHook>,
}

impl StepRunner {
    pub fn new(executor: Arc<ToolExecutor>, policy: RetryPolicy) -> Self {
        Self {
            executor,
            policy,
            clarifier: Arc::new(PassthroughClarifier),
        }
    }

    pub fn with_clarifier(mut self, clarifier: Arc<dyn ClarificationHook>) -> Self {
        self.clarifier = clarifier;
        self
    }

    pub async fn execute_steps(&self, steps: Vec<PlanStep>) -> RunResult {
        let total = steps.len();
        let mut results = RunResult::new();
        for (index, step) in steps.into_iter().enumerate() {
            results.push(self.execute_step(index + 1, total, step).await);
        }
        results
    }

    async fn execute_step(&self, position: usize, total: usize, step: PlanStep) -> StepOutcome {
        tracing::debug!(step = position, tool = %step.tool, state = %StepState::Pending);
        let step = if step.ambiguous {
            self.clarifier.clarify(step).await
        } else {
            step
        };

        let mut attempt: u32 = 1;
        loop {
            tracing::info!(
                state = %StepState::Executing,
                "Executing step {}/{}: {} (Attempt {})",
                position,
                total,
                step.tool,
                attempt
            );
            let error = match self.executor.execute(&step.tool, step.args_value()).await {
                Ok(output) => match failure_reason(&output) {
                    None => {
                        tracing::info!(state = %StepState::Success, "Step {} succeeded: {}", position, step.label());
                        return StepOutcome::success(step, output, attempt);
                    }
                    Some(reason) => reason,
                },
                Err(e) => e.to_string(),
            };
            tracing::error!("Error executing step {}: {}", step.tool, error);

            if attempt > self.policy.max_retries {
                tracing::warn!(
                    state = %StepState::Failed,
                    "Step {} failed after {} attempts",
                    position,
                    attempt
                );
                return StepOutcome::failure(step, error, attempt);
            }
            tracing::info!(
                state = %StepState::Retrying,
                "Retrying step after {} seconds...",
                self.policy.delay.as_secs_f64()
            );
            tokio::time::sleep(self.policy.delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolRegistry};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// 前 fail_first 次调用返回 success:false，之后成功
    struct Flaky {
        name: &'static str,
        fail_first: u32,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Tool for Flaky {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "flaky"
        }

        async fn execute(&self, _args: Value) -> Result<Value, String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Ok(json!({"success": false, "message": format!("attempt {} failed", n + 1)}))
            } else {
                Ok(json!({"success": true}))
            }
        }
    }

    struct Erroring;

    #[async_trait]
    impl Tool for Erroring {
        fn name(&self) -> &str {
            "erroring"
        }

        fn description(&self) -> &str {
            "returns Err"
        }

        async fn execute(&self, _args: Value) -> Result<Value, String> {
            Err("boom".to_string())
        }
    }

    fn runner(registry: ToolRegistry, max_retries: u32) -> StepRunner {
        StepRunner::new(
            Arc::new(ToolExecutor::new(registry, 5)),
            RetryPolicy {
                max_retries,
                delay: Duration::ZERO,
            },
        )
    }

    fn flaky(name: &'static str, fail_first: u32) -> (Flaky, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Flaky {
                name,
                fail_first,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[tokio::test]
    async fn test_always_failing_step_runs_retries_plus_one() {
        let (tool, calls) = flaky("always", u32::MAX);
        let mut registry = ToolRegistry::new();
        registry.register(tool);

        let result = runner(registry, 2)
            .execute_steps(vec![PlanStep::new("always", json!({}))])
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let entry = &result.entries()[0];
        assert_eq!(entry.attempts, 3);
        assert_eq!(entry.output, None);
        assert_eq!(entry.error.as_deref(), Some("attempt 3 failed"));
    }

    #[tokio::test]
    async fn test_recovers_within_retry_budget() {
        let (tool, calls) = flaky("flaky", 2);
        let mut registry = ToolRegistry::new();
        registry.register(tool);

        let result = runner(registry, 2)
            .execute_steps(vec![PlanStep::new("flaky", json!({}))])
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!result.has_failures());
        assert_eq!(result.entries()[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let mut registry = ToolRegistry::new();
        registry.register(Erroring);
        let result = runner(registry, 0)
            .execute_steps(vec![PlanStep::new("erroring", json!({}))])
            .await;
        let entry = &result.entries()[0];
        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.error.as_deref(), Some("Tool execution failed: boom"));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_steps() {
        let (ok, ok_calls) = flaky("ok", 0);
        let mut registry = ToolRegistry::new();
        registry.register(ok);
        registry.register(Erroring);

        let steps = vec![
            PlanStep::new("erroring", json!({})),
            PlanStep::new("unknown_tool", json!({})),
            PlanStep::new("ok", json!({"asset_name": "BP_Exit"})),
        ];
        let result = runner(registry, 1).execute_steps(steps).await;

        assert_eq!(result.len(), 3);
        assert_eq!(result.failure_count(), 2);
        assert_eq!(result.entries()[1].error.as_deref(), Some("Unknown tool: unknown_tool"));
        assert!(result.entries()[2].is_success());
        assert_eq!(result.entries()[2].step.label(), "BP_Exit");
        assert_eq!(ok_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let result = runner(ToolRegistry::new(), 2).execute_steps(Vec::new()).await;
        assert!(result.is_empty());
        assert_eq!(serde_json::to_value(&result).unwrap(), json!([]));
    }

    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ClarificationHook for Recording {
        async fn clarify(&self, mut step: PlanStep) -> PlanStep {
            self.seen.lock().unwrap().push(step.tool.clone());
            step.args.insert("asset_name".to_string(), json!("BP_Resolved"));
            step
        }
    }

    #[tokio::test]
    async fn test_clarification_runs_once_before_retries() {
        let (tool, calls) = flaky("always", u32::MAX);
        let mut registry = ToolRegistry::new();
        registry.register(tool);
        let hook = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
        });

        let steps = vec![
            PlanStep::new("always", json!({})).ambiguous(),
            PlanStep::new("always", json!({})),
        ];
        let result = runner(registry, 2)
            .with_clarifier(hook.clone())
            .execute_steps(steps)
            .await;

        assert_eq!(hook.seen.lock().unwrap().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(result.entries()[0].step.label(), "BP_Resolved");
    }

    #[test]
    fn test_policy_from_config() {
        let cfg = OrchestratorSection::default();
        let policy = RetryPolicy::from(&cfg);
        assert_eq!(policy, RetryPolicy::default());
    }
}
