//! # Simulation モジュール
//!
//! キャプチャーゲームのシミュレーションエンジンを提供します。
//!
//! このモジュールは、固定時間刻みのメインループとエピソードの管理を行い、
//! 各エージェントの制御ループとアリーナ（物理・衝突処理層）を協調させます。
//!
//! ## 主要機能
//!
//! - **エピソード管理**: エピソード開始ごとの報酬テーブル再構築と状態リセット
//! - **ステップ制御**: 観測 → アクション取得 → 制御ループ → 物理処理の順序保証
//! - **統計の集計**: エピソードごとの累計報酬と収納数のサマリー
//!
//! ## シミュレーション処理順序
//!
//! 各時間刻みにおいて、以下の順序で処理が実行されます：
//!
//! 1. **凍結カウンタ更新**: 全エージェントの凍結残りティックを減らす
//! 2. **制御ループ**: シナリオ順に、観測の構築・アクション取得・意図の確定
//! 3. **アリーナ処理**: 運動の適用、接触イベント、レーザー処理
//!
//! ## 使用例
//!
//! ```no_run
//! use capsim::simulation::SimulationEngine;
//! use capsim::scenario::ScenarioConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScenarioConfig::from_file("scenarios/capture_basic.yaml")?;
//! let mut engine = SimulationEngine::new(config, 1);
//! engine.initialize()?;
//! let summaries = engine.run()?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::arena::{Arena, ArenaParams, ArenaStats, MotionQueue, StepEvent};
use crate::control::{
    autopilot::AutopilotPolicy,
    control_loop::{ControlLoop, WorldView},
    input::{ManualInput, NoActions, RandomActions, ScriptedActions},
    navigation::TargetSelector,
    observation::ObservationBuilder,
    reward::{RewardError, RewardShaper, RewardTable},
};
use crate::models::*;
use crate::scenario::*;

/// シミュレーション実行時のエラー
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("シミュレーションエンジンが初期化されていません")]
    NotInitialized,
    #[error("チーム{0}の基地が見つかりません")]
    MissingBase(TeamId),
    #[error("報酬設定エラー: {0}")]
    Reward(#[from] RewardError),
}

/// エピソード終了時のサマリー
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub ticks: u64,
    /// エージェント名ごとの累計報酬
    pub rewards: Vec<(String, f64)>,
    /// チームごとの基地に収納されているターゲット数
    pub banked_by_team: BTreeMap<TeamId, usize>,
    pub stats: ArenaStats,
}

pub struct SimulationEngine {
    pub current_time: f64,
    pub dt: f64,
    pub episode_ticks: u64,
    pub episodes: u32,
    pub seed: u64,
    pub step_count: u64,
    pub episode: u32,

    pub agents: Vec<CaptureAgent>,
    pub controllers: Vec<ControlLoop>,
    pub action_sources: Vec<Box<dyn IActionSource>>,
    pub targets: Vec<Target>,
    pub bases: Vec<HomeBase>,
    pub arena: Arena,
    pub motion_queue: MotionQueue,

    /// 各エージェントの自チーム基地のインデックス
    base_of_agent: Vec<usize>,
    /// エピソード開始時に構築される報酬シェーパー
    shaper: Option<RewardShaper>,

    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        let bounds = &scenario.arena.bounds;
        let params = ArenaParams {
            bounds: ArenaBounds {
                x_min: bounds.x_min,
                x_max: bounds.x_max,
                z_min: bounds.z_min,
                z_max: bounds.z_max,
            },
            move_speed: scenario.arena.move_speed,
            turn_speed_deg_s: scenario.arena.turn_speed_deg_s,
            contact_radius: scenario.arena.contact_radius,
            laser_range: scenario.arena.laser.range,
            laser_half_angle_deg: scenario.arena.laser.half_angle_deg,
            freeze_ticks: scenario.arena.laser.freeze_ticks,
        };

        Self {
            current_time: 0.0,
            dt: scenario.sim.dt_s,
            episode_ticks: scenario.sim.episode_ticks,
            episodes: scenario.sim.episodes,
            seed: scenario.sim.seed,
            step_count: 0,
            episode: 0,
            agents: Vec::new(),
            controllers: Vec::new(),
            action_sources: Vec::new(),
            targets: Vec::new(),
            bases: Vec::new(),
            arena: Arena::new(params),
            motion_queue: MotionQueue::default(),
            base_of_agent: Vec::new(),
            shaper: None,
            scenario_config: scenario,
            verbose_level,
        }
    }

    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        self.initialize_bases();
        self.initialize_agents()?;
        self.initialize_targets();

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  基地: {}基", self.bases.len());
            info!("  エージェント: {}体", self.agents.len());
            info!("  ターゲット: {}個", self.targets.len());
        }

        Ok(())
    }

    fn initialize_bases(&mut self) {
        for team_config in &self.scenario_config.teams {
            let base = HomeBase::new(
                team_config.team,
                Position3D::new(team_config.base.position.x, 0.0, team_config.base.position.z),
                team_config.base.radius,
            );

            if self.verbose_level > 1 {
                debug!("基地初期化: チーム{} (位置: {:.1}, {:.1})", base.team, base.position.x, base.position.z);
            }

            self.bases.push(base);
        }
    }

    fn initialize_agents(&mut self) -> Result<(), SimulationError> {
        let selector = TargetSelector::new(self.scenario_config.arena.search_radius);
        let control = ControlLoop::new(AutopilotPolicy::new(selector), self.scenario_config.sim.time_penalty);

        for team_config in &self.scenario_config.teams {
            let base_index = self.bases
                .iter()
                .position(|b| b.team == team_config.team)
                .ok_or(SimulationError::MissingBase(team_config.team))?;

            for agent_config in &team_config.agents {
                let id = self.agents.len();
                let agent = CaptureAgent::new(
                    id,
                    agent_config.name.clone(),
                    team_config.team,
                    Position3D::new(agent_config.position.x, 0.0, agent_config.position.z),
                    agent_config.heading_deg,
                );

                if self.verbose_level > 1 {
                    debug!("エージェント初期化: {} (チーム{}, アクション: {})",
                            agent.name,
                            agent.team,
                            agent_config.action_source.kind());
                }

                self.agents.push(agent);
                self.controllers.push(control);
                self.base_of_agent.push(base_index);
            }
        }

        Ok(())
    }

    fn initialize_targets(&mut self) {
        for ring_config in &self.scenario_config.targets.rings {
            let ring = TargetRing {
                id_prefix: ring_config.id_prefix.clone(),
                center_position: Position3D::new(ring_config.center.x, 0.0, ring_config.center.z),
                count: ring_config.count,
                radius: ring_config.radius,
                start_angle: ring_config.start_angle_deg,
            };
            self.targets.extend(ring.generate_targets());
        }

        for point in &self.scenario_config.targets.points {
            self.targets.push(Target::new(
                point.id.clone(),
                Position3D::new(point.position.x, 0.0, point.position.z),
            ));
        }
    }

    /// アクション供給元をシナリオ設定から構築
    fn build_action_sources(&self) -> Vec<Box<dyn IActionSource>> {
        let mut sources: Vec<Box<dyn IActionSource>> = Vec::new();
        for team_config in &self.scenario_config.teams {
            for agent_config in &team_config.agents {
                let slot = sources.len() as u64;
                let source: Box<dyn IActionSource> = match &agent_config.action_source {
                    ActionSourceConfig::None => Box::new(NoActions),
                    ActionSourceConfig::Scripted { actions, repeat } => {
                        Box::new(ScriptedActions::new(actions.clone(), *repeat))
                    }
                    ActionSourceConfig::Random => {
                        // エピソードとスロットごとに異なるが再現可能なシード
                        let seed = self.seed
                            .wrapping_add(u64::from(self.episode) << 32)
                            .wrapping_add(slot);
                        Box::new(RandomActions::new(seed))
                    }
                    ActionSourceConfig::Manual { keys } => Box::new(ManualInput::from_schedule(keys.clone())),
                };
                sources.push(source);
            }
        }
        sources
    }

    /// エピソード開始処理
    ///
    /// 報酬テーブルを再構築し、エージェント・ターゲット・アリーナを初期状態に戻します。
    pub fn begin_episode(&mut self, episode: u32) -> Result<(), SimulationError> {
        let table = RewardTable::with_overrides(&self.scenario_config.rewards)?;
        if self.verbose_level > 1 {
            for (name, value) in table.entries() {
                debug!("報酬テーブル: {} = {}", name, value);
            }
        }
        self.shaper = Some(RewardShaper::new(&table)?);

        self.episode = episode;
        self.current_time = 0.0;
        self.step_count = 0;

        for agent in &mut self.agents {
            agent.reset();
        }
        for target in &mut self.targets {
            target.reset();
        }
        self.arena.reset();
        self.motion_queue.clear();
        self.action_sources = self.build_action_sources();
        for (agent, source) in self.agents.iter().zip(self.action_sources.iter()) {
            debug!(agent_id = agent.id, source = source.name(), "ACTION_SOURCE: アクション供給元を設定しました");
        }

        info!(
            episode = episode,
            agents = self.agents.len(),
            targets = self.targets.len(),
            "EPISODE_BEGIN: エピソードを開始しました"
        );

        Ok(())
    }

    pub fn run(&mut self) -> Result<Vec<EpisodeSummary>, SimulationError> {
        info!("=== シミュレーション実行開始 ===");

        let mut summaries = Vec::new();
        for episode in 0..self.episodes {
            self.begin_episode(episode)?;

            while self.step_count < self.episode_ticks {
                self.step()?;

                if self.verbose_level > 2 {
                    trace!("時刻: {:.2}秒 (ステップ: {})", self.current_time, self.step_count);
                }

                if self.step_count % 500 == 0 && self.verbose_level > 0 {
                    let progress = (self.step_count as f64 / self.episode_ticks as f64) * 100.0;
                    info!("進行状況: エピソード{} {:.1}% ({}/{}ティック)", episode, progress, self.step_count, self.episode_ticks);
                }
            }

            let summary = self.summarize();
            self.log_summary(&summary);
            summaries.push(summary);
        }

        info!("=== シミュレーション完了 ===");
        info!("エピソード数: {}", summaries.len());

        Ok(summaries)
    }

    /// 1ステップの実行
    pub fn step(&mut self) -> Result<Vec<StepEvent>, SimulationError> {
        let shaper = self.shaper.ok_or(SimulationError::NotInitialized)?;
        if self.action_sources.len() != self.agents.len() {
            return Err(SimulationError::NotInitialized);
        }

        self.arena.begin_step(&mut self.agents);
        for agent in &mut self.agents {
            agent.rewards.take_step_reward();
        }

        let time_remaining = self.time_remaining();
        for index in 0..self.agents.len() {
            let base = &self.bases[self.base_of_agent[index]];
            let enemy = self.enemy_position(index);
            let observation = ObservationBuilder::build(&self.agents[index], base, &self.targets, enemy, time_remaining);
            let action = self.action_sources[index].next_action(&observation);

            let world = WorldView { targets: &self.targets, base };
            self.controllers[index].tick(&mut self.agents[index], action.as_ref(), &world, &mut self.motion_queue);
        }

        let events = self.arena.step(
            &mut self.agents,
            &mut self.targets,
            &self.bases,
            &mut self.motion_queue,
            &shaper,
            self.dt,
        );

        self.current_time += self.dt;
        self.step_count += 1;

        Ok(events)
    }

    /// エピソードの残り時間（秒）
    pub fn time_remaining(&self) -> f64 {
        self.episode_ticks.saturating_sub(self.step_count) as f64 * self.dt
    }

    /// 指定エージェントから見た敵（別チームの最初のエージェント）の位置
    pub fn enemy_position(&self, index: usize) -> Option<Position3D> {
        let team = self.agents[index].team;
        self.agents
            .iter()
            .find(|a| a.team != team)
            .map(|a| a.position)
    }

    /// 現在のエピソードのサマリーを作成
    pub fn summarize(&self) -> EpisodeSummary {
        let mut banked_by_team = BTreeMap::new();
        for base in &self.bases {
            let count = self.targets.iter().filter(|t| t.in_base == Some(base.team)).count();
            banked_by_team.insert(base.team, count);
        }

        EpisodeSummary {
            episode: self.episode,
            ticks: self.step_count,
            rewards: self.agents
                .iter()
                .map(|a| (a.name.clone(), a.rewards.total))
                .collect(),
            banked_by_team,
            stats: self.arena.stats.clone(),
        }
    }

    fn log_summary(&self, summary: &EpisodeSummary) {
        info!(
            episode = summary.episode,
            ticks = summary.ticks,
            pickups = summary.stats.pickups,
            banked = summary.stats.banked_targets,
            laser_hits = summary.stats.laser_hits,
            wall_contacts = summary.stats.wall_contacts,
            "EPISODE_END: エピソードが終了しました"
        );
        for (name, total) in &summary.rewards {
            info!("  {}: 累計報酬 {:.3}", name, total);
        }
        for (team, count) in &summary.banked_by_team {
            info!("  チーム{}: 収納数 {}", team, count);
        }
    }
}
