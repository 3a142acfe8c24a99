//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `UNREAL_MCP__*` 覆盖（双下划线表示嵌套，如 `UNREAL_MCP__ENGINE__PORT=55558`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub hooks: HooksSection,
}

/// [engine] 段：编辑器插件监听地址与套接字参数
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// 单次 recv / send 的超时（秒）
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// SO_SNDBUF / SO_RCVBUF
    #[serde(default = "default_socket_buffer_bytes")]
    pub socket_buffer_bytes: u32,
    /// 单个响应的字节上限；0 表示不限制
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    55557
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_read_timeout_secs() -> u64 {
    5
}

fn default_chunk_size() -> usize {
    4096
}

fn default_socket_buffer_bytes() -> u32 {
    65536
}

fn default_max_response_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            chunk_size: default_chunk_size(),
            socket_buffer_bytes: default_socket_buffer_bytes(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

/// [orchestrator] 段：重试策略、日志级别、结果目录、额外工具 Provider
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSection {
    /// 每步最多重试次数（总尝试次数 = retries + 1）
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// 两次尝试之间的等待（秒）
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_results_path")]
    pub results_path: PathBuf,
    /// 额外加载的 Provider 名（见 tools::provider），未知名称只告警
    #[serde(default)]
    pub tool_modules: Vec<String>,
    /// 上下文快照里最多取多少个资产的元数据
    #[serde(default = "default_context_asset_limit")]
    pub context_asset_limit: usize,
    #[serde(default = "default_content_path")]
    pub content_path: String,
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    2
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_results_path() -> PathBuf {
    PathBuf::from("orchestration_results")
}

fn default_context_asset_limit() -> usize {
    10
}

fn default_content_path() -> String {
    "/Game".to_string()
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            retry_delay: default_retry_delay(),
            log_level: default_log_level(),
            results_path: default_results_path(),
            tool_modules: Vec::new(),
            context_asset_limit: default_context_asset_limit(),
            content_path: default_content_path(),
        }
    }
}

impl OrchestratorSection {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }
}

/// [tools] 段：单次工具调用超时
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

fn default_tool_timeout_secs() -> u64 {
    30
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

/// [hooks] 段：一次编排结束后依次执行的外部命令（如规则抓取/更新流水线）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HooksSection {
    #[serde(default)]
    pub post_run: Vec<HookEntry>,
}

/// [[hooks.post_run]]：program + args，直接 exec，不经过 shell
#[derive(Debug, Clone, Deserialize)]
pub struct HookEntry {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// 工作目录，未设置时为当前目录
    pub cwd: Option<PathBuf>,
    #[serde(default = "default_hook_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_hook_timeout_secs() -> u64 {
    600
}

/// 从 config 目录加载配置，环境变量 UNREAL_MCP__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 UNREAL_MCP__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("UNREAL_MCP")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("orchestrator.tool_modules")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
