pub mod assets;
pub mod engine;
pub mod executor;
pub mod provider;
pub mod registry;

pub use assets::{AssetCreationTool, AssetKind, CreateAssetArgs, ASSET_KINDS};
pub use engine::{EngineTool, EngineToolSpec};
pub use executor::{failure_reason, ToolExecutor};
pub use provider::{
    build_full_registry, build_registry, builtin_providers, load_providers, ToolProvider,
    CORE_PROVIDERS,
};
pub use registry::{Tool, ToolRegistry};
