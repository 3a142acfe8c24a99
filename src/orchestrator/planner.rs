//! 规划器
//!
//! `Planner` 把提示词 + 项目上下文变成有序的 PlanStep 列表。内置的 `RuleBasedPlanner`
//! 按关键字（大小写不敏感）匹配规则模板，没有规则命中时返回空计划。

use async_trait::async_trait;
use serde_json::json;

use crate::orchestrator::context::ProjectContext;
use crate::orchestrator::plan::PlanStep;

#[async_trait]
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;

    async fn plan(&self, prompt: &str, context: &ProjectContext) -> Vec<PlanStep>;
}

/// 一条规则：任一关键字出现在提示词中即用 build 生成步骤
#[derive(Clone, Copy)]
pub struct PlanRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub build: fn(&str, &ProjectContext) -> Vec<PlanStep>,
}

impl PlanRule {
    fn matches(&self, prompt_lower: &str) -> bool {
        self.keywords.iter().any(|k| prompt_lower.contains(k))
    }
}

const DUNGEON_PATH: &str = "/Game/Dungeon";
const MONSTERS: [&str; 5] = ["Goblin", "Skeleton", "Orc", "Spider", "Slime"];

fn blueprint(name: &str, parent: &str, save_path: &str) -> PlanStep {
    PlanStep::new(
        "create_blueprint_class",
        json!({
            "asset_name": name,
            "parent_class": parent,
            "save_path": save_path
        }),
    )
}

/// 地牢模板：关卡 → 房间 → 5 种怪物 → 出生点 → 出口
pub fn dungeon_plan(_prompt: &str, _context: &ProjectContext) -> Vec<PlanStep> {
    let mut steps = vec![
        PlanStep::new(
            "create_level",
            json!({"asset_name": "ProceduralDungeon", "save_path": "/Game/Maps"}),
        ),
        blueprint("BP_DungeonRoom", "/Script/Engine.Actor", DUNGEON_PATH),
    ];
    let monster_path = format!("{}/Monsters", DUNGEON_PATH);
    steps.extend(MONSTERS.iter().map(|m| {
        blueprint(&format!("BP_Monster_{}", m), "/Script/Engine.Character", &monster_path)
    }));
    steps.push(blueprint("BP_PlayerSpawn", "/Script/Engine.PlayerStart", DUNGEON_PATH));
    steps.push(blueprint("BP_DungeonExit", "/Script/Engine.Actor", DUNGEON_PATH));
    steps
}

pub const DUNGEON_RULE: PlanRule = PlanRule {
    name: "dungeon",
    keywords: &["dungeon"],
    build: dungeon_plan,
};

pub struct RuleBasedPlanner {
    rules: Vec<PlanRule>,
}

impl RuleBasedPlanner {
    pub fn new(rules: Vec<PlanRule>) -> Self {
        Self { rules }
    }

    pub fn with_rule(mut self, rule: PlanRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name).collect()
    }
}

impl Default for RuleBasedPlanner {
    fn default() -> Self {
        Self::new(vec![DUNGEON_RULE])
    }
}

#[async_trait]
impl Planner for RuleBasedPlanner {
    fn name(&self) -> &str {
        "rule_based"
    }

    async fn plan(&self, prompt: &str, context: &ProjectContext) -> Vec<PlanStep> {
        let lower = prompt.to_lowercase();
        match self.rules.iter().find(|r| r.matches(&lower)) {
            Some(rule) => {
                let steps = (rule.build)(prompt, context);
                tracing::info!(rule = %rule.name, steps = steps.len(), "plan rule matched");
                steps
            }
            None => {
                tracing::info!(rules = ?self.rule_names(), "No planning rule matched the prompt");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dungeon_plan_shape() {
        let planner = RuleBasedPlanner::default();
        let steps = planner
            .plan("Build me a spooky DUNGEON with monsters", &ProjectContext::default())
            .await;

        assert_eq!(steps.len(), 9);
        assert_eq!(steps[0].tool, "create_level");
        assert!(steps[1..].iter().all(|s| s.tool == "create_blueprint_class"));

        let names: Vec<&str> = steps[1..].iter().map(|s| s.label()).collect();
        assert_eq!(
            names,
            vec![
                "BP_DungeonRoom",
                "BP_Monster_Goblin",
                "BP_Monster_Skeleton",
                "BP_Monster_Orc",
                "BP_Monster_Spider",
                "BP_Monster_Slime",
                "BP_PlayerSpawn",
                "BP_DungeonExit",
            ]
        );
        assert_eq!(steps[2].args["save_path"], "/Game/Dungeon/Monsters");
        assert_eq!(steps[7].args["parent_class"], "/Script/Engine.PlayerStart");
    }

    #[tokio::test]
    async fn test_no_rule_gives_empty_plan() {
        let planner = RuleBasedPlanner::default();
        assert!(planner.plan("make a racing game", &ProjectContext::default()).await.is_empty());
        assert!(planner.plan("", &ProjectContext::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        fn single(_: &str, _: &ProjectContext) -> Vec<PlanStep> {
            vec![PlanStep::new("save_level", json!({}))]
        }
        let planner = RuleBasedPlanner::new(vec![PlanRule {
            name: "save",
            keywords: &["save", "dungeon"],
            build: single,
        }])
        .with_rule(DUNGEON_RULE);

        assert_eq!(planner.rule_names(), vec!["save", "dungeon"]);
        let steps = planner.plan("dungeon", &ProjectContext::default()).await;
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].tool, "save_level");
    }
}
