use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::control::{
    action::DiscreteAction,
    control_loop::DEFAULT_TIME_PENALTY,
    input::Key,
    navigation::DEFAULT_SEARCH_RADIUS,
    reward::{RewardError, RewardTable},
};

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub dt_s: f64,
    /// 1エピソードのティック数
    pub episode_ticks: u64,
    #[serde(default = "default_episodes")]
    pub episodes: u32,
    pub seed: u64,
    #[serde(default = "default_time_penalty")]
    pub time_penalty: f64,
}

fn default_episodes() -> u32 {
    1
}

fn default_time_penalty() -> f64 {
    DEFAULT_TIME_PENALTY
}

/// アリーナ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ArenaConfig {
    pub bounds: RegionRect,
    /// 前進・後退の速度（単位/秒）
    pub move_speed: f64,
    /// 旋回速度（度/秒）
    pub turn_speed_deg_s: f64,
    /// ターゲットとの接触判定半径
    pub contact_radius: f64,
    #[serde(default = "default_search_radius")]
    pub search_radius: f64,
    #[serde(default)]
    pub laser: LaserConfig,
}

/// 有限かつ正の値か（NaNは弾く）
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// 有限かつ0以上の値か
fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn default_search_radius() -> f64 {
    DEFAULT_SEARCH_RADIUS
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegionRect {
    pub x_min: f64,
    pub x_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

/// レーザー設定
#[derive(Debug, Deserialize, Serialize)]
pub struct LaserConfig {
    /// 射程
    pub range: f64,
    /// 命中判定の半角（度）
    pub half_angle_deg: f64,
    /// 命中時に敵が凍結されるティック数
    pub freeze_ticks: u32,
}

impl Default for LaserConfig {
    fn default() -> Self {
        Self {
            range: 10.0,
            half_angle_deg: 5.0,
            freeze_ticks: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position2D {
    pub x: f64,
    pub z: f64,
}

/// 基地設定
#[derive(Debug, Deserialize, Serialize)]
pub struct BaseConfig {
    pub position: Position2D,
    pub radius: f64,
}

/// アクション供給元の設定
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionSourceConfig {
    /// オートパイロットのみ
    #[default]
    None,
    /// アクション列の再生
    Scripted {
        actions: Vec<DiscreteAction>,
        #[serde(default)]
        repeat: bool,
    },
    /// シード付きランダム
    Random,
    /// 押下キー列による手動操作
    Manual { keys: Vec<Vec<Key>> },
}

impl ActionSourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ActionSourceConfig::None => "none",
            ActionSourceConfig::Scripted { .. } => "scripted",
            ActionSourceConfig::Random => "random",
            ActionSourceConfig::Manual { .. } => "manual",
        }
    }
}

/// エージェント設定
#[derive(Debug, Deserialize, Serialize)]
pub struct AgentConfig {
    pub name: String,
    pub position: Position2D,
    #[serde(default)]
    pub heading_deg: f64,
    #[serde(default)]
    pub action_source: ActionSourceConfig,
}

/// チーム設定
#[derive(Debug, Deserialize, Serialize)]
pub struct TeamConfig {
    pub team: u32,
    pub base: BaseConfig,
    pub agents: Vec<AgentConfig>,
}

/// リング状のターゲット配置
#[derive(Debug, Deserialize, Serialize)]
pub struct TargetRingConfig {
    pub id_prefix: String,
    pub center: Position2D,
    pub count: u32,
    pub radius: f64,
    #[serde(default)]
    pub start_angle_deg: f64,
}

/// 個別のターゲット配置
#[derive(Debug, Deserialize, Serialize)]
pub struct TargetPointConfig {
    pub id: String,
    pub position: Position2D,
}

/// ターゲット配置設定
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TargetsConfig {
    #[serde(default)]
    pub rings: Vec<TargetRingConfig>,
    #[serde(default)]
    pub points: Vec<TargetPointConfig>,
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub arena: ArenaConfig,
    pub teams: Vec<TeamConfig>,
    #[serde(default)]
    pub targets: TargetsConfig,
    /// 標準報酬値の上書き
    #[serde(default)]
    pub rewards: BTreeMap<String, f64>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !is_positive(self.sim.dt_s) {
            return Err(ScenarioError::ValidationError("dt_s must be positive".to_string()));
        }
        if !self.sim.time_penalty.is_finite() {
            return Err(ScenarioError::ValidationError("time_penalty must be finite".to_string()));
        }
        if self.sim.episode_ticks == 0 {
            return Err(ScenarioError::ValidationError("episode_ticks must be positive".to_string()));
        }
        if self.sim.episodes == 0 {
            return Err(ScenarioError::ValidationError("episodes must be positive".to_string()));
        }

        let bounds = &self.arena.bounds;
        let finite_bounds = [bounds.x_min, bounds.x_max, bounds.z_min, bounds.z_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite_bounds || bounds.x_min >= bounds.x_max || bounds.z_min >= bounds.z_max {
            return Err(ScenarioError::ValidationError("Invalid arena bounds".to_string()));
        }
        if !is_non_negative(self.arena.move_speed) || !is_non_negative(self.arena.turn_speed_deg_s) {
            return Err(ScenarioError::ValidationError("Speeds must not be negative".to_string()));
        }
        let laser = &self.arena.laser;
        if !is_positive(self.arena.contact_radius) || !is_positive(self.arena.search_radius) {
            return Err(ScenarioError::ValidationError("Radii must be positive".to_string()));
        }
        if !is_non_negative(laser.range) || !is_non_negative(laser.half_angle_deg) {
            return Err(ScenarioError::ValidationError("Laser range and angle must not be negative".to_string()));
        }

        if self.teams.is_empty() {
            return Err(ScenarioError::ValidationError("At least one team is required".to_string()));
        }

        let mut team_ids = HashSet::new();
        for team in &self.teams {
            if !team_ids.insert(team.team) {
                return Err(ScenarioError::ValidationError(format!("Duplicate team id {}", team.team)));
            }
            if !is_positive(team.base.radius) {
                return Err(ScenarioError::ValidationError(format!("Base radius of team {} must be positive", team.team)));
            }
            if !self.is_position_in_bounds(&team.base.position) {
                return Err(ScenarioError::ValidationError(format!("Base of team {} outside arena bounds", team.team)));
            }
            for agent in &team.agents {
                if !self.is_position_in_bounds(&agent.position) {
                    return Err(ScenarioError::ValidationError(format!("Agent {} outside arena bounds", agent.name)));
                }
            }
        }

        for ring in &self.targets.rings {
            if !is_non_negative(ring.radius) || !ring.start_angle_deg.is_finite() || !self.is_position_in_bounds(&ring.center) {
                return Err(ScenarioError::ValidationError(format!("Invalid target ring {}", ring.id_prefix)));
            }
        }

        for point in &self.targets.points {
            if !self.is_position_in_bounds(&point.position) {
                return Err(ScenarioError::ValidationError(format!("Target {} outside arena bounds", point.id)));
            }
        }

        if let Some((name, _)) = self.rewards.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ScenarioError::ValidationError(format!("Reward {} must be finite", name)));
        }
        // 報酬名の検証（未登録の名前は初期化時に検出する）
        RewardTable::with_overrides(&self.rewards)?;

        Ok(())
    }

    /// 位置がアリーナ内かどうかをチェック
    fn is_position_in_bounds(&self, position: &Position2D) -> bool {
        let bounds = &self.arena.bounds;
        position.x >= bounds.x_min && position.x <= bounds.x_max &&
        position.z >= bounds.z_min && position.z <= bounds.z_max
    }

    /// 総エージェント数
    pub fn agent_count(&self) -> usize {
        self.teams.iter().map(|t| t.agents.len()).sum()
    }

    /// 総ターゲット数
    pub fn target_count(&self) -> usize {
        let ring_total: u32 = self.targets.rings.iter().map(|r| r.count).sum();
        ring_total as usize + self.targets.points.len()
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!("エピソード長: {}ティック ({:.1}秒)", self.sim.episode_ticks, self.sim.episode_ticks as f64 * self.sim.dt_s);
        println!("エピソード数: {}", self.sim.episodes);
        println!("シード値: {}", self.sim.seed);
        println!("時間減衰報酬: {}", self.sim.time_penalty);
        println!();

        println!("=== チーム ===");
        for team in &self.teams {
            println!("  チーム{}: {}体 (基地: {:.1}, {:.1})", team.team, team.agents.len(), team.base.position.x, team.base.position.z);
            for agent in &team.agents {
                println!("    {} (アクション: {})", agent.name, agent.action_source.kind());
            }
        }
        println!();

        println!("=== ターゲット ===");
        println!("総ターゲット数: {}", self.target_count());
        if !self.rewards.is_empty() {
            println!();
            println!("=== 報酬の上書き ===");
            for (name, value) in &self.rewards {
                println!("  {}: {}", name, value);
            }
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    ValidationError(String),
    #[error("報酬設定エラー: {0}")]
    RewardError(#[from] RewardError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
meta:
  version: "1.0"
  name: test
sim:
  dt_s: 0.02
  episode_ticks: 100
  seed: 7
arena:
  bounds: { x_min: -20.0, x_max: 20.0, z_min: -20.0, z_max: 20.0 }
  move_speed: 5.0
  turn_speed_deg_s: 180.0
  contact_radius: 1.0
teams:
  - team: 1
    base: { position: { x: -15.0, z: -15.0 }, radius: 3.0 }
    agents:
      - name: blue-1
        position: { x: -15.0, z: -12.0 }
        action_source:
          type: scripted
          actions: [[1, 0, 1, 0, 0], [0, 0, 0, 0, 1]]
          repeat: true
  - team: 2
    base: { position: { x: 15.0, z: 15.0 }, radius: 3.0 }
    agents:
      - name: red-1
        position: { x: 15.0, z: 12.0 }
        heading_deg: 180.0
        action_source:
          type: manual
          keys: [[Up, Space], [S]]
targets:
  rings:
    - id_prefix: center
      center: { x: 0.0, z: 0.0 }
      count: 4
      radius: 3.0
  points:
    - id: lone
      position: { x: 5.0, z: -5.0 }
rewards:
  wall: -0.5
"#;

    #[test]
    fn test_parse_full_scenario() {
        let config = ScenarioConfig::from_yaml_str(SCENARIO).unwrap();
        assert_eq!(config.sim.episodes, 1);
        assert_eq!(config.sim.time_penalty, DEFAULT_TIME_PENALTY);
        assert_eq!(config.arena.search_radius, DEFAULT_SEARCH_RADIUS);
        assert_eq!(config.arena.laser.range, 10.0);
        assert_eq!(config.agent_count(), 2);
        assert_eq!(config.target_count(), 5);
        assert_eq!(config.teams[0].agents[0].action_source.kind(), "scripted");
        assert_eq!(config.teams[1].agents[0].action_source.kind(), "manual");
        assert_eq!(config.rewards.get("wall"), Some(&-0.5));

        match &config.teams[0].agents[0].action_source {
            ActionSourceConfig::Scripted { actions, repeat } => {
                assert_eq!(actions[0], DiscreteAction::new([1, 0, 1, 0, 0]));
                assert!(*repeat);
            }
            other => panic!("unexpected action source {:?}", other),
        }
    }

    #[test]
    fn test_unknown_reward_override_is_rejected() {
        let yaml = SCENARIO.replace("wall: -0.5", "teleport: 1.0");
        let error = ScenarioConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(error, ScenarioError::RewardError(RewardError::UnknownReward(ref name)) if name == "teleport"));
    }

    #[test]
    fn test_invalid_dt_is_rejected() {
        let yaml = SCENARIO.replace("dt_s: 0.02", "dt_s: 0.0");
        assert!(matches!(ScenarioConfig::from_yaml_str(&yaml), Err(ScenarioError::ValidationError(_))));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let cases = [
            ("dt_s: 0.02", "dt_s: .nan"),
            ("move_speed: 5.0", "move_speed: .nan"),
            ("contact_radius: 1.0", "contact_radius: .inf"),
        ];
        for (from, to) in cases {
            assert!(SCENARIO.contains(from), "{}", from);
            let yaml = SCENARIO.replace(from, to);
            assert!(
                matches!(ScenarioConfig::from_yaml_str(&yaml), Err(ScenarioError::ValidationError(_))),
                "{}",
                to
            );
        }
    }

    #[test]
    fn test_duplicate_team_is_rejected() {
        let yaml = SCENARIO.replace("- team: 2", "- team: 1");
        assert!(matches!(ScenarioConfig::from_yaml_str(&yaml), Err(ScenarioError::ValidationError(_))));
    }

    #[test]
    fn test_missing_file() {
        let error = ScenarioConfig::from_file("does/not/exist.yaml").unwrap_err();
        assert!(matches!(error, ScenarioError::FileNotFound(_)));
        assert!(error.to_string().contains("does/not/exist.yaml"));
    }

    #[test]
    fn test_bundled_scenarios_load() {
        let basic = ScenarioConfig::from_file("scenarios/capture_basic.yaml").unwrap();
        assert_eq!(basic.agent_count(), 2);
        assert_eq!(basic.target_count(), 10);
        assert_eq!(basic.teams[1].agents[0].action_source.kind(), "random");

        let solo = ScenarioConfig::from_file("scenarios/scripted_solo.yaml").unwrap();
        assert_eq!(solo.sim.episodes, 1);
        assert_eq!(solo.sim.time_penalty, -0.002);
        assert_eq!(solo.arena.laser.freeze_ticks, 100);
        assert_eq!(solo.rewards.get("wall"), Some(&-0.5));
    }
}
