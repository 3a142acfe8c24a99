//! 核心：错误类型与优雅关闭

pub mod error;
pub mod shutdown;

pub use error::{OrchestratorError, ToolError, TransportError};
pub use shutdown::{ShutdownCleanup, ShutdownCoordinator, ShutdownManager, ShutdownReason};
