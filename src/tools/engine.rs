//! 引擎透传工具
//!
//! 绝大多数编辑器操作只是「参数对象 → send_command → 原样返回响应」，
//! 用一个通用的 EngineTool 加一张静态表描述即可，不必为每条命令写一个类型。

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::tools::Tool;
use crate::transport::EngineClient;

/// 连接失败时工具层返回的统一结果
pub fn not_connected() -> Value {
    json!({
        "success": false,
        "message": "Failed to connect to Unreal Engine"
    })
}

/// 工具参数转命令参数：对象原样使用，null 视为无参数，其它类型拒绝
pub fn params_from_args(args: Value) -> Result<Option<Map<String, Value>>, String> {
    match args {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        other => Err(format!("Arguments must be a JSON object, got: {}", other)),
    }
}

/// 静态表中的一条透传命令描述
#[derive(Debug, Clone, Copy)]
pub struct EngineToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// 必填参数名；只做存在性检查，类型交给插件校验
    pub required: &'static [&'static str],
}

/// 通用透传工具：工具名即命令名
pub struct EngineTool {
    spec: EngineToolSpec,
    client: EngineClient,
}

impl EngineTool {
    pub fn new(spec: EngineToolSpec, client: EngineClient) -> Self {
        Self { spec, client }
    }
}

#[async_trait]
impl Tool for EngineTool {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn description(&self) -> &str {
        self.spec.description
    }

    fn parameters_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .spec
            .required
            .iter()
            .map(|key| (key.to_string(), json!({})))
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": self.spec.required,
            "additionalProperties": true
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let params = params_from_args(args)?;
        if let Some(missing) = self
            .spec
            .required
            .iter()
            .find(|key| !params.as_ref().is_some_and(|p| p.contains_key(**key)))
        {
            return Err(format!("Missing '{}' parameter", missing));
        }

        match self.client.send_command(self.spec.name, params).await {
            Some(response) => {
                tracing::info!(tool = %self.spec.name, error = response.is_error(), "engine response");
                Ok(response.into_value())
            }
            None => {
                tracing::error!("Failed to connect to Unreal Engine");
                Ok(not_connected())
            }
        }
    }
}
