//! 资产创建工具
//!
//! 与透传工具不同，这类工具把插件响应整理成 `{"success", "message", "asset_path"}`，
//! 并为 save_path / parent_class 提供默认值。

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::tools::engine::not_connected;
use crate::tools::Tool;
use crate::transport::{EngineClient, Response};

/// 一种可创建的资产
#[derive(Debug, Clone, Copy)]
pub struct AssetKind {
    /// 工具名
    pub tool: &'static str,
    /// 发给插件的命令名（GameMode 等复用 create_blueprint_class）
    pub command: &'static str,
    /// 出现在 message 中的人类可读名称
    pub label: &'static str,
    pub default_save_path: &'static str,
    /// 固定或默认的父类
    pub parent_class: Option<&'static str>,
    /// parent_class 不可被调用方覆盖
    pub fixed_parent: bool,
}

const fn kind(
    tool: &'static str,
    label: &'static str,
    default_save_path: &'static str,
) -> AssetKind {
    AssetKind {
        tool,
        command: tool,
        label,
        default_save_path,
        parent_class: None,
        fixed_parent: false,
    }
}

const fn with_parent(mut k: AssetKind, parent: &'static str) -> AssetKind {
    k.parent_class = Some(parent);
    k
}

const fn blueprint_subclass(
    tool: &'static str,
    label: &'static str,
    parent: &'static str,
) -> AssetKind {
    AssetKind {
        tool,
        command: "create_blueprint_class",
        label,
        default_save_path: "/Game/Gameplay",
        parent_class: Some(parent),
        fixed_parent: true,
    }
}

pub const ASSET_KINDS: &[AssetKind] = &[
    with_parent(
        kind("create_animation_blueprint", "Animation Blueprint", "/Game/Animations"),
        "/Script/Engine.AnimInstance",
    ),
    kind("create_animation_composite", "Animation Composite", "/Game/Animations"),
    kind("create_animation_montage", "Animation Montage", "/Game/Animations"),
    kind("create_aim_offset", "Aim Offset", "/Game/Animations"),
    kind("create_blend_space", "Blend Space", "/Game/Animations"),
    kind("create_pose_asset", "Pose Asset", "/Game/Animations"),
    with_parent(
        kind("create_blueprint_class", "Blueprint Class", "/Game/Blueprints"),
        "/Script/Engine.Actor",
    ),
    kind("create_material", "Material", "/Game/Materials"),
    kind("create_material_instance", "Material Instance", "/Game/Materials"),
    kind("create_physics_asset", "Physics Asset", "/Game/Physics"),
    kind("create_behavior_tree", "Behavior Tree", "/Game/AI"),
    kind("create_blackboard", "Blackboard", "/Game/AI"),
    kind("create_sound_cue", "Sound Cue", "/Game/Audio"),
    kind("create_level_sequence", "Level Sequence", "/Game/Cinematics"),
    with_parent(
        kind("create_widget_blueprint", "Widget Blueprint", "/Game/UI"),
        "/Script/UMG.UserWidget",
    ),
    kind("create_niagara_system", "Niagara System", "/Game/Effects"),
    kind("create_niagara_emitter", "Niagara Emitter", "/Game/Effects"),
    kind("create_level", "Level", "/Game/Maps"),
    kind("create_render_target", "Render Target", "/Game/Textures"),
    kind("create_data_asset", "Data Asset", "/Game/Data"),
    blueprint_subclass("create_game_mode", "Game Mode", "/Script/Engine.GameModeBase"),
    blueprint_subclass("create_game_state", "Game State", "/Script/Engine.GameStateBase"),
    blueprint_subclass(
        "create_player_controller",
        "Player Controller",
        "/Script/Engine.PlayerController",
    ),
];

/// 资产创建参数；除下列字段外的键原样转发给插件（如 skeleton_path、width、height）
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateAssetArgs {
    /// 资产名
    pub asset_name: String,
    /// 保存目录，缺省按资产类型取默认值
    #[serde(default)]
    pub save_path: Option<String>,
    /// 父类路径
    #[serde(default)]
    pub parent_class: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct AssetCreationTool {
    kind: AssetKind,
    description: String,
    client: EngineClient,
}

impl AssetCreationTool {
    pub fn new(kind: AssetKind, client: EngineClient) -> Self {
        Self {
            description: format!(
                "Create a {} asset (default save path {})",
                kind.label, kind.default_save_path
            ),
            kind,
            client,
        }
    }

    fn build_params(&self, args: CreateAssetArgs) -> Map<String, Value> {
        let mut params = args.extra;
        params.insert("asset_name".to_string(), json!(args.asset_name));
        params.insert(
            "save_path".to_string(),
            json!(args
                .save_path
                .unwrap_or_else(|| self.kind.default_save_path.to_string())),
        );
        let parent = if self.kind.fixed_parent {
            self.kind.parent_class.map(str::to_string)
        } else {
            args.parent_class
                .or_else(|| self.kind.parent_class.map(str::to_string))
        };
        if let Some(parent) = parent {
            params.insert("parent_class".to_string(), json!(parent));
        }
        params
    }

    fn summarize(&self, response: Response) -> Value {
        let label = self.kind.label;
        if response.get("status").and_then(Value::as_str) != Some("success") {
            let error = response.error_message().unwrap_or("Unknown error");
            tracing::error!("Failed to create {}: {}", label, response.as_value());
            return json!({
                "success": false,
                "message": format!("Failed to create {}: {}", label, error)
            });
        }

        let asset_path = response
            .result()
            .and_then(|r| r.get("asset_path"))
            .and_then(Value::as_str)
            .unwrap_or("");
        json!({
            "success": true,
            "message": format!("Successfully created {}: {}", label, asset_path),
            "asset_path": asset_path
        })
    }
}

#[async_trait]
impl Tool for AssetCreationTool {
    fn name(&self) -> &str {
        self.kind.tool
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schema_for!(CreateAssetArgs)).unwrap_or_else(|_| json!({"type": "object"}))
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let args: CreateAssetArgs =
            serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))?;
        if args.asset_name.trim().is_empty() {
            return Err("Missing 'asset_name' parameter".to_string());
        }

        let params = self.build_params(args);
        match self.client.send_command(self.kind.command, Some(params)).await {
            Some(response) => Ok(self.summarize(response)),
            None => {
                tracing::error!("Failed to connect to Unreal Engine");
                Ok(not_connected())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ConnectionOptions;

    fn tool(name: &str) -> AssetCreationTool {
        let kind = *ASSET_KINDS.iter().find(|k| k.tool == name).unwrap();
        AssetCreationTool::new(kind, EngineClient::new(ConnectionOptions::default()))
    }

    fn args(v: Value) -> CreateAssetArgs {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_tool_names_are_unique() {
        let mut names: Vec<_> = ASSET_KINDS.iter().map(|k| k.tool).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ASSET_KINDS.len());
    }

    #[test]
    fn test_blueprint_class_defaults() {
        let params = tool("create_blueprint_class").build_params(args(json!({"asset_name": "BP_Room"})));
        assert_eq!(params["asset_name"], "BP_Room");
        assert_eq!(params["save_path"], "/Game/Blueprints");
        assert_eq!(params["parent_class"], "/Script/Engine.Actor");
    }

    #[test]
    fn test_game_mode_parent_is_fixed() {
        let t = tool("create_game_mode");
        let params = t.build_params(args(json!({
            "asset_name": "GM_Dungeon",
            "parent_class": "/Script/Engine.Actor"
        })));
        assert_eq!(params["parent_class"], "/Script/Engine.GameModeBase");
        assert_eq!(t.kind.command, "create_blueprint_class");
    }

    #[test]
    fn test_extra_fields_are_forwarded() {
        let params = tool("create_level").build_params(args(json!({
            "asset_name": "Dungeon",
            "template_level": "/Game/Maps/Template"
        })));
        assert_eq!(params["template_level"], "/Game/Maps/Template");
        assert_eq!(params["save_path"], "/Game/Maps");
        assert!(params.get("parent_class").is_none());
    }

    #[test]
    fn test_summarize_success_and_failure() {
        let t = tool("create_level");
        let ok = t.summarize(Response::normalize(json!({
            "status": "success",
            "result": {"asset_path": "/Game/Maps/Dungeon"}
        })));
        assert_eq!(ok["success"], true);
        assert_eq!(ok["asset_path"], "/Game/Maps/Dungeon");
        assert_eq!(ok["message"], "Successfully created Level: /Game/Maps/Dungeon");

        let failed = t.summarize(Response::normalize(json!({
            "success": false,
            "message": "Level already exists"
        })));
        assert_eq!(failed["success"], false);
        assert_eq!(failed["message"], "Failed to create Level: Level already exists");
    }

    #[tokio::test]
    async fn test_empty_asset_name_rejected() {
        let err = tool("create_material")
            .execute(json!({"asset_name": " "}))
            .await
            .unwrap_err();
        assert_eq!(err, "Missing 'asset_name' parameter");
    }

    #[test]
    fn test_schema_requires_asset_name() {
        let schema = tool("create_level").parameters_schema();
        assert_eq!(schema["required"], json!(["asset_name"]));
    }
}
