//! 编排集成测试：真实工具注册表 + 假插件，走完 上下文 → 规划 → 执行 → 落盘

mod common;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::common::{unused_port, Reply, StubEngine};
    use unreal_mcp::config::AppConfig;
    use unreal_mcp::orchestrator::{Orchestrator, RetryPolicy, RuleBasedPlanner};
    use unreal_mcp::tools::{build_registry, ToolExecutor};
    use unreal_mcp::transport::{ConnectionOptions, EngineClient};

    fn engine_reply(req: &Value) -> Reply {
        let params = &req["params"];
        let body = match req["type"].as_str().unwrap_or_default() {
            "list_assets" => json!({"status": "success", "result": {"assets": ["/Game/Maps/Entry"]}}),
            "get_asset_metadata" => json!({"status": "success", "result": {"class": "World"}}),
            "extract_asset_examples" => json!({"status": "success", "result": {"examples": []}}),
            "create_level" | "create_blueprint_class" => json!({
                "status": "success",
                "result": {"asset_path": format!(
                    "{}/{}",
                    params["save_path"].as_str().unwrap_or_default(),
                    params["asset_name"].as_str().unwrap_or_default()
                )}
            }),
            other => json!({"status": "error", "error": format!("Unknown command: {}", other)}),
        };
        Reply::json(&body)
    }

    fn orchestrator(client: &EngineClient, results: &std::path::Path) -> Orchestrator {
        let executor = ToolExecutor::new(build_registry(client, &[]), 5);
        Orchestrator::new(
            std::sync::Arc::new(executor),
            Box::new(RuleBasedPlanner::default()),
            RetryPolicy {
                max_retries: 2,
                delay: Duration::ZERO,
            },
        )
        .with_results_dir(results)
    }

    #[tokio::test]
    async fn test_dungeon_run_against_engine() {
        let engine = StubEngine::start(engine_reply).await;
        let client = EngineClient::new(engine.options());
        let tmp = tempfile::tempdir().unwrap();

        let report = orchestrator(&client, tmp.path())
            .run("Generate a procedural Dungeon")
            .await
            .unwrap();

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.results.len(), 9);
        let first = &report.results.entries()[0];
        assert_eq!(
            first.output.as_ref().unwrap()["message"],
            "Successfully created Level: /Game/Maps/ProceduralDungeon"
        );

        let types = engine.request_types();
        assert_eq!(
            &types[..3],
            &["list_assets", "get_asset_metadata", "extract_asset_examples"]
        );
        assert_eq!(types[3], "create_level");
        assert_eq!(types.iter().filter(|t| *t == "create_blueprint_class").count(), 8);

        let saved: Value = serde_json::from_str(
            &std::fs::read_to_string(report.summary_path.unwrap()).unwrap(),
        )
        .unwrap();
        assert_eq!(saved[8]["step"]["args"]["asset_name"], "BP_DungeonExit");
        assert_eq!(saved[8]["error"], Value::Null);
    }

    #[tokio::test]
    async fn test_offline_engine_exhausts_retries() {
        let client = EngineClient::new(ConnectionOptions {
            port: unused_port(),
            connect_timeout: Duration::from_millis(300),
            ..ConnectionOptions::default()
        });
        let tmp = tempfile::tempdir().unwrap();

        let report = orchestrator(&client, tmp.path()).run("dungeon").await.unwrap();

        assert_eq!(report.exit_code(), 2);
        assert_eq!(report.results.failure_count(), 9);
        for entry in report.results.entries() {
            assert_eq!(entry.attempts, 3);
            assert_eq!(entry.error.as_deref(), Some("Failed to connect to Unreal Engine"));
        }
        assert!(report.summary_path.unwrap().exists());
    }

    #[tokio::test]
    async fn test_plugin_errors_are_step_failures() {
        let engine = StubEngine::start(|req| {
            if req["type"] == "create_level" {
                Reply::json(&json!({"success": false, "message": "Map already exists"}))
            } else {
                engine_reply(req)
            }
        })
        .await;
        let client = EngineClient::new(engine.options());
        let tmp = tempfile::tempdir().unwrap();

        let report = orchestrator(&client, tmp.path()).run("dungeon").await.unwrap();
        assert_eq!(report.exit_code(), 2);
        assert_eq!(report.results.failure_count(), 1);
        assert_eq!(
            report.results.entries()[0].error.as_deref(),
            Some("Failed to create Level: Map already exists")
        );
        assert_eq!(
            engine.request_types().iter().filter(|t| *t == "create_level").count(),
            3
        );
    }

    #[tokio::test]
    async fn test_from_config_builds_core_tools() {
        let cfg = AppConfig::default();
        let client = EngineClient::from_config(&cfg.engine);
        let orch = Orchestrator::from_config(&cfg, &client);
        let names = orch.executor().tool_names();
        assert!(names.iter().any(|n| n == "create_level"));
        assert!(names.iter().any(|n| n == "list_assets"));
    }
}
