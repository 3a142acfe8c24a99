//! 编排引擎：上下文收集 → 规划 → 带重试的逐步执行 → 结果落盘 → 运行后钩子

pub mod clarify;
pub mod context;
pub mod hooks;
pub mod plan;
pub mod planner;
pub mod results;
pub mod runner;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::{AppConfig, HookEntry};
use crate::core::OrchestratorError;
use crate::tools::{build_registry, ToolExecutor};
use crate::transport::EngineClient;

pub use clarify::{ClarificationHook, PassthroughClarifier};
pub use context::{query_project_context, AssetSummary, ContextOptions, ProjectContext};
pub use hooks::run_post_run_hooks;
pub use plan::PlanStep;
pub use planner::{PlanRule, Planner, RuleBasedPlanner};
pub use results::{RunResult, StepOutcome};
pub use runner::{RetryPolicy, StepRunner, StepState};

/// 一次运行的结果汇总
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub results: RunResult,
    /// 计划为空时不落盘，为 None
    pub summary_path: Option<PathBuf>,
}

impl RunReport {
    /// 进程退出码：有步骤用尽重试为 2，否则 0
    pub fn exit_code(&self) -> u8 {
        if self.results.has_failures() {
            2
        } else {
            0
        }
    }
}

pub struct Orchestrator {
    executor: Arc<ToolExecutor>,
    planner: Box<dyn Planner>,
    runner: StepRunner,
    context_options: ContextOptions,
    results_dir: PathBuf,
    hooks: Vec<HookEntry>,
}

impl Orchestrator {
    pub fn new(executor: Arc<ToolExecutor>, planner: Box<dyn Planner>, policy: RetryPolicy) -> Self {
        Self {
            runner: StepRunner::new(executor.clone(), policy),
            executor,
            planner,
            context_options: ContextOptions::default(),
            results_dir: PathBuf::from("orchestration_results"),
            hooks: Vec::new(),
        }
    }

    /// 按配置组装：核心 + tool_modules 指定的 Provider、规则规划器、重试策略、结果目录、钩子
    pub fn from_config(cfg: &AppConfig, client: &EngineClient) -> Self {
        let registry = build_registry(client, &cfg.orchestrator.tool_modules);
        let executor = Arc::new(ToolExecutor::new(registry, cfg.tools.tool_timeout_secs));
        Self::new(
            executor,
            Box::new(RuleBasedPlanner::default()),
            RetryPolicy::from(&cfg.orchestrator),
        )
        .with_context_options(ContextOptions {
            content_path: cfg.orchestrator.content_path.clone(),
            asset_limit: cfg.orchestrator.context_asset_limit,
            ..ContextOptions::default()
        })
        .with_results_dir(cfg.orchestrator.results_path.clone())
        .with_hooks(cfg.hooks.post_run.clone())
    }

    pub fn with_context_options(mut self, options: ContextOptions) -> Self {
        self.context_options = options;
        self
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn with_hooks(mut self, hooks: Vec<HookEntry>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_clarifier(mut self, clarifier: Arc<dyn ClarificationHook>) -> Self {
        self.runner = self.runner.with_clarifier(clarifier);
        self
    }

    pub fn executor(&self) -> &Arc<ToolExecutor> {
        &self.executor
    }

    pub async fn query_project_context(&self) -> ProjectContext {
        query_project_context(&self.executor, &self.context_options).await
    }

    pub async fn plan_steps(&self, prompt: &str, context: &ProjectContext) -> Vec<PlanStep> {
        self.planner.plan(prompt, context).await
    }

    pub async fn execute_steps(&self, steps: Vec<PlanStep>) -> RunResult {
        self.runner.execute_steps(steps).await
    }

    /// 完整运行一次。只有结果落盘失败会返回 Err；钩子失败仅记录日志
    pub async fn run(&self, prompt: &str) -> Result<RunReport, OrchestratorError> {
        let run_id = Uuid::new_v4();
        self.run_inner(run_id, prompt)
            .instrument(tracing::info_span!("run", run_id = %run_id))
            .await
    }

    async fn run_inner(&self, run_id: Uuid, prompt: &str) -> Result<RunReport, OrchestratorError> {
        tracing::info!("Prompt: {}", prompt);
        let context = self.query_project_context().await;
        let steps = self.plan_steps(prompt, &context).await;

        if steps.is_empty() {
            tracing::warn!(planner = %self.planner.name(), "Planner produced no steps, exiting.");
            return Ok(RunReport {
                run_id,
                results: RunResult::new(),
                summary_path: None,
            });
        }

        tracing::info!("Planned {} steps:", steps.len());
        for (i, step) in steps.iter().enumerate() {
            tracing::info!("  {}. {} ({})", i + 1, step.tool, step.label());
        }

        let results = self.execute_steps(steps).await;
        tracing::info!(
            "Run complete: {} succeeded, {} failed",
            results.success_count(),
            results.failure_count()
        );
        for failed in results.failures() {
            tracing::warn!(
                "Failed step {}: {}",
                failed.step.tool,
                failed.error.as_deref().unwrap_or_default()
            );
        }

        let path = results.persist(&self.results_dir).await?;
        tracing::info!("Run summary written to {}", path.display());

        if !self.hooks.is_empty() {
            match run_post_run_hooks(&self.hooks).await {
                Ok(n) => tracing::info!("Ran {} post-run hooks", n),
                Err(e) => tracing::error!("{}", e),
            }
        }

        Ok(RunReport {
            run_id,
            results,
            summary_path: Some(path),
        })
    }
}
