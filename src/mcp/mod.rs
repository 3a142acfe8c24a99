//! MCP 服务：把工具注册表以 JSON-RPC 2.0 暴露给 stdio 客户端

pub mod server;
pub mod types;

pub use server::McpServer;
pub use types::{JsonRpcId, JsonRpcRequest, JsonRpcResponse};
