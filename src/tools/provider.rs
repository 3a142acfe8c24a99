//! 工具 Provider 表
//!
//! 每个 Provider 是一组工具注册（assets、editor、umg ...）。`assets` 与 `asset_creation`
//! 总是加载；其余按配置 `orchestrator.tool_modules` 选择。未知名称或注册失败只告警并跳过。

use crate::tools::assets::{AssetCreationTool, ASSET_KINDS};
use crate::tools::engine::{EngineTool, EngineToolSpec};
use crate::tools::ToolRegistry;
use crate::transport::EngineClient;

/// 能力提供者：把自己的工具注册进注册表
pub trait ToolProvider: Send + Sync {
    fn name(&self) -> &str;

    fn register(&self, registry: &mut ToolRegistry, client: &EngineClient) -> Result<(), String>;
}

/// 由一张透传命令表组成的 Provider
pub struct SpecProvider {
    name: &'static str,
    specs: &'static [EngineToolSpec],
}

impl SpecProvider {
    pub const fn new(name: &'static str, specs: &'static [EngineToolSpec]) -> Self {
        Self { name, specs }
    }
}

impl ToolProvider for SpecProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn register(&self, registry: &mut ToolRegistry, client: &EngineClient) -> Result<(), String> {
        for spec in self.specs {
            registry.register(EngineTool::new(*spec, client.clone()));
        }
        Ok(())
    }
}

/// 资产创建工具（带默认值与结果整理）
pub struct AssetCreationProvider;

impl ToolProvider for AssetCreationProvider {
    fn name(&self) -> &str {
        "asset_creation"
    }

    fn register(&self, registry: &mut ToolRegistry, client: &EngineClient) -> Result<(), String> {
        for kind in ASSET_KINDS {
            registry.register(AssetCreationTool::new(*kind, client.clone()));
        }
        Ok(())
    }
}

const fn spec(
    name: &'static str,
    description: &'static str,
    required: &'static [&'static str],
) -> EngineToolSpec {
    EngineToolSpec {
        name,
        description,
        required,
    }
}

const ASSET_TOOLS: &[EngineToolSpec] = &[
    spec("list_assets", "List assets under a content path (args: content_path, with_metadata)", &[]),
    spec("get_asset_metadata", "Get metadata for one asset", &["asset_path"]),
    spec("extract_asset_examples", "Extract example assets of a type (args: asset_type, count)", &["asset_type"]),
    spec("find_asset_references", "Find references to an asset", &["asset_path"]),
    spec("import_asset", "Import a file as an asset", &["source_file", "destination_path", "asset_name"]),
    spec("export_asset", "Export an asset to disk", &["asset_path", "export_path"]),
    spec("duplicate_asset", "Duplicate an asset", &["asset_path", "new_name"]),
    spec("rename_asset", "Rename an asset", &["asset_path", "new_name"]),
    spec("delete_asset", "Delete an asset", &["asset_path"]),
];

const EDITOR_TOOLS: &[EngineToolSpec] = &[
    spec("get_actors_in_level", "List all actors in the current level", &[]),
    spec("find_actors_by_name", "Find actors by name pattern", &["pattern"]),
    spec("spawn_actor", "Spawn an actor (args: name, type, location, rotation, scale)", &["name", "type"]),
    spec("delete_actor", "Delete an actor by name", &["name"]),
    spec("set_actor_transform", "Set actor location/rotation/scale", &["name"]),
    spec("get_actor_properties", "Get all properties of an actor", &["name"]),
    spec("set_actor_property", "Set a property on an actor", &["name", "property_name", "property_value"]),
    spec("focus_viewport", "Focus the viewport on a target actor or location", &[]),
    spec("take_screenshot", "Capture a viewport screenshot", &["filename"]),
    spec("spawn_blueprint_actor", "Spawn an actor from a Blueprint", &["blueprint_name", "actor_name"]),
    spec("save_level", "Save the current level", &[]),
    spec("load_level", "Load a level", &["level_name"]),
    spec("undo", "Undo the last editor transaction", &[]),
    spec("redo", "Redo the last undone transaction", &[]),
    spec("select_actors", "Select actors by name", &["names"]),
    spec("get_selected_actors", "List selected actors", &[]),
    spec("register_toolbar_button", "Register a toolbar button in the editor", &["button_name", "tooltip"]),
];

const BLUEPRINT_TOOLS: &[EngineToolSpec] = &[
    spec("create_blueprint", "Create a Blueprint class (args: name, parent_class)", &["name"]),
    spec("add_component_to_blueprint", "Add a component to a Blueprint", &["blueprint_name", "component_type", "component_name"]),
    spec("set_component_property", "Set a property on a Blueprint component", &["blueprint_name", "component_name", "property_name"]),
    spec("set_static_mesh_properties", "Assign a static mesh to a component", &["blueprint_name", "component_name"]),
    spec("set_physics_properties", "Configure physics on a component", &["blueprint_name", "component_name"]),
    spec("set_blueprint_property", "Set a property on the Blueprint class defaults", &["blueprint_name", "property_name", "property_value"]),
    spec("compile_blueprint", "Compile a Blueprint", &["blueprint_name"]),
    spec("add_blueprint_event_node", "Add an event node", &["blueprint_name", "event_type"]),
    spec("add_blueprint_function_node", "Add a function call node", &["blueprint_name", "function_name"]),
    spec("add_blueprint_variable", "Add a member variable", &["blueprint_name", "variable_name", "variable_type"]),
    spec("connect_blueprint_nodes", "Connect two node pins", &["blueprint_name", "source_node_id", "source_pin", "target_node_id", "target_pin"]),
];

const UMG_TOOLS: &[EngineToolSpec] = &[
    spec("create_umg_widget_blueprint", "Create a UMG Widget Blueprint", &["widget_name"]),
    spec("add_text_block_to_widget", "Add a Text Block to a widget", &["widget_name", "text_block_name"]),
    spec("add_button_to_widget", "Add a Button to a widget", &["widget_name", "button_name"]),
    spec("bind_widget_event", "Bind a widget event to a function", &["widget_name", "widget_component_name", "event_name"]),
    spec("add_widget_to_viewport", "Add a widget instance to the viewport", &["widget_name"]),
    spec("set_text_block_binding", "Bind a Text Block property", &["widget_name", "text_block_name", "binding_property"]),
];

const PROJECT_TOOLS: &[EngineToolSpec] = &[
    spec("create_input_mapping", "Create an input action mapping", &["action_name", "key"]),
    spec("get_project_setting", "Read a project setting", &["setting_name"]),
    spec("set_project_setting", "Write a project setting", &["setting_name", "value"]),
    spec("list_plugins", "List engine plugins", &[]),
    spec("enable_plugin", "Enable a plugin", &["plugin_name"]),
    spec("disable_plugin", "Disable a plugin", &["plugin_name"]),
    spec("build_project", "Build the project", &[]),
    spec("run_automation_test", "Run an automation test", &["test_name"]),
];

/// 总是加载的 Provider 名（上下文收集与规则规划依赖它们）
pub const CORE_PROVIDERS: &[&str] = &["assets", "asset_creation"];

/// 编译进二进制的全部 Provider
pub fn builtin_providers() -> Vec<Box<dyn ToolProvider>> {
    vec![
        Box::new(SpecProvider::new("assets", ASSET_TOOLS)),
        Box::new(AssetCreationProvider),
        Box::new(SpecProvider::new("editor", EDITOR_TOOLS)),
        Box::new(SpecProvider::new("blueprint", BLUEPRINT_TOOLS)),
        Box::new(SpecProvider::new("umg", UMG_TOOLS)),
        Box::new(SpecProvider::new("project", PROJECT_TOOLS)),
    ]
}

/// 按名称从 Provider 表加载；返回实际加载成功的名称
pub fn load_providers(
    providers: &[Box<dyn ToolProvider>],
    names: &[String],
    registry: &mut ToolRegistry,
    client: &EngineClient,
) -> Vec<String> {
    let mut loaded: Vec<String> = Vec::new();
    for name in names {
        if loaded.iter().any(|n| n == name) {
            continue;
        }
        let Some(provider) = providers.iter().find(|p| p.name() == name) else {
            tracing::warn!("Could not load tool provider {}: not found", name);
            continue;
        };
        match provider.register(registry, client) {
            Ok(()) => {
                tracing::debug!("Loaded tool provider {}", name);
                loaded.push(name.clone());
            }
            Err(e) => tracing::warn!("Could not load tool provider {}: {}", name, e),
        }
    }
    loaded
}

/// 核心 Provider + 额外 Provider 组成的注册表
pub fn build_registry(client: &EngineClient, extra: &[String]) -> ToolRegistry {
    let names: Vec<String> = CORE_PROVIDERS
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().cloned())
        .collect();
    let mut registry = ToolRegistry::new();
    let loaded = load_providers(&builtin_providers(), &names, &mut registry, client);
    tracing::info!(
        "Registered {} tools from providers [{}]",
        registry.len(),
        loaded.join(", ")
    );
    registry
}

/// 全部内置 Provider（MCP 服务使用）
pub fn build_full_registry(client: &EngineClient) -> ToolRegistry {
    let names: Vec<String> = builtin_providers()
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    build_registry(client, &names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ConnectionOptions;

    struct FailingProvider;

    impl ToolProvider for FailingProvider {
        fn name(&self) -> &str {
            "broken"
        }

        fn register(&self, _: &mut ToolRegistry, _: &EngineClient) -> Result<(), String> {
            Err("missing dependency".to_string())
        }
    }

    fn client() -> EngineClient {
        EngineClient::new(ConnectionOptions::default())
    }

    #[test]
    fn test_core_registry_has_context_and_planner_tools() {
        let registry = build_registry(&client(), &[]);
        for name in [
            "list_assets",
            "get_asset_metadata",
            "extract_asset_examples",
            "create_level",
            "create_blueprint_class",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert!(!registry.contains("spawn_actor"));
    }

    #[test]
    fn test_unknown_and_failing_providers_are_skipped() {
        let mut providers = builtin_providers();
        providers.push(Box::new(FailingProvider));
        let mut registry = ToolRegistry::new();
        let loaded = load_providers(
            &providers,
            &["umg".to_string(), "nope".to_string(), "broken".to_string(), "umg".to_string()],
            &mut registry,
            &client(),
        );
        assert_eq!(loaded, vec!["umg".to_string()]);
        assert!(registry.contains("add_text_block_to_widget"));
    }

    #[test]
    fn test_full_registry_has_every_tool() {
        let registry = build_full_registry(&client());
        let expected = ASSET_TOOLS.len()
            + ASSET_KINDS.len()
            + EDITOR_TOOLS.len()
            + BLUEPRINT_TOOLS.len()
            + UMG_TOOLS.len()
            + PROJECT_TOOLS.len();
        assert_eq!(registry.len(), expected);
    }
}
