//! 请求编码

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::TransportError;

/// 发往插件的一条命令；序列化后为 `{"type": name, "params": {...}}`
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub name: String,
    pub params: Map<String, Value>,
}

impl Command {
    /// name 不能为空（去掉首尾空白后）；params 缺省为空对象
    pub fn new(
        name: impl Into<String>,
        params: Option<Map<String, Value>>,
    ) -> Result<Self, TransportError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TransportError::InvalidCommand(
                "command name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            params: params.unwrap_or_default(),
        })
    }

    /// 编码为线上格式（UTF-8 JSON，无换行）
    pub fn to_json(&self) -> Result<String, TransportError> {
        Ok(serde_json::to_string(self)?)
    }
}
