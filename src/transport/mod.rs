//! 编辑器传输层
//!
//! 插件端协议：一个 TCP 连接只承载一条命令。请求是 `{"type": ..., "params": {...}}`，
//! 无长度前缀、无分隔符；响应是一个 JSON 对象，可能被任意切片，靠「能否完整解析」判断结束。
//!
//! - [`command`]: 请求编码
//! - [`framing`]: 分片读取与完整性判断
//! - [`response`]: 两种错误形态归一
//! - [`connection`]: 每条命令重连一次的连接对象与会话句柄

pub mod command;
pub mod connection;
pub mod framing;
pub mod response;

pub use command::Command;
pub use connection::{ConnectionOptions, EngineClient, EngineConnection};
pub use framing::{receive_full_response, ReadOptions};
pub use response::Response;
