//! 项目上下文收集
//!
//! 规划前对编辑器做一次快照：资产列表、前 N 个资产的元数据、若干 Blueprint 示例。
//! 任何一步失败只记录到 errors，不中断整个流程。

use serde::Serialize;
use serde_json::{json, Value};

use crate::tools::{failure_reason, ToolExecutor};

/// 上下文收集参数
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub content_path: String,
    /// 拉取元数据的资产数上限
    pub asset_limit: usize,
    pub example_type: String,
    pub example_count: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            content_path: "/Game".to_string(),
            asset_limit: 10,
            example_type: "Blueprint".to_string(),
            example_count: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssetSummary {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// 规划器可见的项目快照
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectContext {
    /// 最多 asset_limit 个
    pub assets: Vec<AssetSummary>,
    /// list_assets 返回的资产总数（截断前）
    pub total_assets: usize,
    pub examples: Vec<Value>,
    pub errors: Vec<String>,
}

/// 资产列表响应里取资产路径：兼容 `result.assets` 与顶层 `assets`，元素可为字符串或带路径字段的对象
pub fn extract_asset_paths(response: &Value) -> Vec<String> {
    let list = response
        .get("result")
        .and_then(|r| r.get("assets"))
        .or_else(|| response.get("assets"))
        .and_then(Value::as_array);
    let Some(list) = list else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => ["path", "asset_path", "object_path", "package_name"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

fn extract_examples(response: &Value) -> Vec<Value> {
    let result = response.get("result").unwrap_or(response);
    match result.get("examples").or_else(|| result.get("assets")) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

async fn call(executor: &ToolExecutor, tool: &str, args: Value) -> Result<Value, String> {
    let output = executor.execute(tool, args).await.map_err(|e| e.to_string())?;
    match failure_reason(&output) {
        Some(reason) => Err(reason),
        None => Ok(output),
    }
}

pub async fn query_project_context(executor: &ToolExecutor, options: &ContextOptions) -> ProjectContext {
    let mut context = ProjectContext::default();

    match call(executor, "list_assets", json!({"content_path": options.content_path})).await {
        Ok(output) => {
            let paths = extract_asset_paths(&output);
            context.total_assets = paths.len();
            context.assets = paths
                .into_iter()
                .take(options.asset_limit)
                .map(|path| AssetSummary { path, metadata: None })
                .collect();
        }
        Err(e) => {
            tracing::warn!("Failed to list assets: {}", e);
            context.errors.push(format!("list_assets: {}", e));
        }
    }

    for asset in context.assets.iter_mut() {
        match call(executor, "get_asset_metadata", json!({"asset_path": asset.path})).await {
            Ok(output) => asset.metadata = Some(output.get("result").cloned().unwrap_or(output)),
            Err(e) => {
                tracing::warn!("Failed to get metadata for {}: {}", asset.path, e);
                context.errors.push(format!("get_asset_metadata({}): {}", asset.path, e));
            }
        }
    }

    let args = json!({"asset_type": options.example_type, "count": options.example_count});
    match call(executor, "extract_asset_examples", args).await {
        Ok(output) => context.examples = extract_examples(&output),
        Err(e) => {
            tracing::warn!("Failed to extract {} examples: {}", options.example_type, e);
            context.errors.push(format!("extract_asset_examples: {}", e));
        }
    }

    tracing::info!(
        assets = context.assets.len(),
        total_assets = context.total_assets,
        examples = context.examples.len(),
        errors = context.errors.len(),
        "project context gathered"
    );
    context
}
