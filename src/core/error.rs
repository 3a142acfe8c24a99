//! 错误类型
//!
//! TransportError 只在传输层内部流动：`send_command` 会把它折叠成 status=error 的 Response，
//! 不会越过公共接口。ToolError 与 OrchestratorError 分别面向工具执行器与编排器。

use std::io;

use thiserror::Error;

/// 与编辑器插件通信时可能出现的错误（连接、发送、接收、解码）
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Failed to resolve {0}")]
    Resolve(String),

    #[error("Failed to connect to Unreal at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Timed out connecting to Unreal at {0}")]
    ConnectTimeout(String),

    #[error("Not connected to Unreal Engine")]
    NotConnected,

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to send command: {0}")]
    Send(#[source] io::Error),

    #[error("Timeout sending command to Unreal")]
    SendTimeout,

    #[error("Connection closed before receiving data")]
    ConnectionClosed,

    #[error("Timeout receiving Unreal response")]
    ReceiveTimeout,

    #[error("Error during receive: {0}")]
    Receive(#[source] io::Error),

    #[error("Response exceeded {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("Failed to decode Unreal response: {0}")]
    Decode(String),
}

/// 工具执行器返回的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool timeout: {0}")]
    Timeout(String),

    #[error("Tool execution failed: {0}")]
    Failed(String),
}

/// 编排器在规划/执行之外的错误（结果落盘、钩子）
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Failed to write run summary to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize run summary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Post-run hook '{program}' failed: {reason}")]
    Hook { program: String, reason: String },
}
