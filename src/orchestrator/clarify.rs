//! 歧义步骤澄清

use async_trait::async_trait;

use crate::orchestrator::plan::PlanStep;

/// 对 ambiguous 步骤做一次澄清，返回实际要执行的步骤
#[async_trait]
pub trait ClarificationHook: Send + Sync {
    async fn clarify(&self, step: PlanStep) -> PlanStep;
}

/// 默认实现：记录日志后原样返回
pub struct PassthroughClarifier;

#[async_trait]
impl ClarificationHook for PassthroughClarifier {
    async fn clarify(&self, step: PlanStep) -> PlanStep {
        tracing::warn!(
            "Ambiguous step detected: {} ({}). Prompting for clarification...",
            step.tool,
            step.label()
        );
        step
    }
}
