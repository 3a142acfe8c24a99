//! 计划步骤

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 一次工具调用：工具名 + 参数对象；ambiguous 表示执行前需要澄清
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub tool: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ambiguous: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl PlanStep {
    /// 非对象的 args 视为空参数
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            tool: tool.into(),
            args,
            ambiguous: false,
        }
    }

    pub fn ambiguous(mut self) -> Self {
        self.ambiguous = true;
        self
    }

    pub fn args_value(&self) -> Value {
        Value::Object(self.args.clone())
    }

    /// 便于日志输出的 asset_name（没有则为工具名）
    pub fn label(&self) -> &str {
        self.args
            .get("asset_name")
            .and_then(Value::as_str)
            .unwrap_or(&self.tool)
    }
}
