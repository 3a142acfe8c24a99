//! unreal-mcp - Unreal Editor 远程控制桥
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、优雅关闭
//! - **transport**: 与编辑器插件之间的 TCP 命令/响应协议（每条命令一个连接）
//! - **tools**: 工具 trait、注册表、执行器、引擎透传工具与 Provider 表
//! - **orchestrator**: 上下文收集、规则规划、带重试的逐步执行、结果持久化
//! - **mcp**: stdio 上的 MCP（JSON-RPC 2.0）服务
//! - **observability**: 日志初始化

pub mod config;
pub mod core;
pub mod mcp;
pub mod observability;
pub mod orchestrator;
pub mod tools;
pub mod transport;

pub use transport::{EngineClient, EngineConnection, Response};
