//! 响应归一
//!
//! 插件有两种错误形态：`{"status": "error", "error"|"message": ...}` 与
//! `{"success": false, "error"|"message": ...}`。归一后 status == "error" 当且仅当失败，
//! 且失败时 `error` 字段一定存在。其它内容视为成功，原样透传。

use serde::Serialize;
use serde_json::{json, Value};

const UNKNOWN_ERROR: &str = "Unknown Unreal error";

/// 归一化后的插件响应
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Response {
    body: Value,
}

impl Response {
    /// 把插件返回的原始 JSON 折叠为统一形态
    pub fn normalize(raw: Value) -> Self {
        let Value::Object(mut map) = raw else {
            return Self { body: raw };
        };

        if map.get("status").and_then(Value::as_str) == Some("error") {
            let message = error_message(&map);
            tracing::error!("Unreal error (status=error): {}", message);
            if !has_error_text(map.get("error")) {
                map.insert("error".to_string(), Value::String(message));
            }
            return Self {
                body: Value::Object(map),
            };
        }

        if map.get("success") == Some(&Value::Bool(false)) {
            let message = error_message(&map);
            tracing::error!("Unreal error (success=false): {}", message);
            return Self::error(message);
        }

        Self {
            body: Value::Object(map),
        }
    }

    /// 本地构造的错误响应（连接/收发/解码失败）
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            body: json!({ "status": "error", "error": message.into() }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.body.get("status").and_then(Value::as_str) == Some("error")
    }

    pub fn error_message(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        self.body.get("error").and_then(Value::as_str)
    }

    /// 插件放在 `result` 里的业务数据
    pub fn result(&self) -> Option<&Value> {
        self.body.get("result")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.body
    }

    pub fn into_value(self) -> Value {
        self.body
    }
}

/// error 优先，其次 message；两者都不是非空文本时给默认文案
fn error_message(map: &serde_json::Map<String, Value>) -> String {
    ["error", "message"]
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(text_of)
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn has_error_text(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.is_empty())
}
