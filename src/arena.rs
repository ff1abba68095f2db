//! # Arena モジュール
//!
//! 制御コアの外側にある物理・衝突処理層の簡易実装です。
//!
//! 剛体物理は扱わず、移動意図をそのまま運動学的に積分します。
//! 接触は「進入した瞬間」にのみイベントとして通知され、
//! 凍結中のエージェントのターゲット接触は凍結解除後に改めて進入として扱われます。
//! 報酬シェーパーは状態を書き換える前の接触時点の状態で評価します。
//! ターゲットの運搬者・収納先を書き換えるのはこの層だけです。
//!
//! ## 1ステップの処理順序
//!
//! 1. **運動の適用**: 回転 → 並進 → 壁との接触判定（凍結中は移動しない）
//! 2. **運搬物の追従**: 運ばれているターゲットを運搬者の位置へ移動
//! 3. **ターゲット接触**: 接触イベントの通知と確保処理
//! 4. **基地接触**: 進入イベントの通知と自チーム基地への収納
//! 5. **レーザー**: 発射・命中・凍結・積荷の落下

use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::control::{
    action::MotionIntent,
    navigation::heading_delta,
    reward::{CollisionEvent, RewardShaper, WorldEvent},
};
use crate::models::{
    agent::CaptureAgent,
    base::HomeBase,
    common::{math_utils, AgentId, ArenaBounds, LocalVelocity, TeamId},
    target::Target,
    traits::{IControllable, IMotionSink},
};

/// アリーナの物理パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaParams {
    pub bounds: ArenaBounds,
    /// 前進・後退の速度（単位/秒）
    pub move_speed: f64,
    /// 旋回速度（度/秒）
    pub turn_speed_deg_s: f64,
    /// ターゲットとの接触判定半径
    pub contact_radius: f64,
    /// レーザーの射程
    pub laser_range: f64,
    /// レーザー命中判定の半角（度）
    pub laser_half_angle_deg: f64,
    /// レーザー命中時の凍結ティック数
    pub freeze_ticks: u32,
}

/// 制御ループから転送された移動意図の受け口
#[derive(Debug, Default)]
pub struct MotionQueue {
    commands: HashMap<AgentId, MotionIntent>,
}

impl MotionQueue {
    /// エージェントの移動意図を取り出す
    pub fn take(&mut self, agent_id: AgentId) -> Option<MotionIntent> {
        self.commands.remove(&agent_id)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl IMotionSink for MotionQueue {
    fn apply_motion(&mut self, agent_id: AgentId, intent: &MotionIntent) {
        self.commands.insert(agent_id, *intent);
    }
}

/// ステップ中に発生したイベント
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    pub agent_id: AgentId,
    pub event: WorldEvent,
    /// 適用された報酬（条件を満たさなかった場合は0）
    pub reward: f64,
}

/// エピソード中のアリーナ統計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArenaStats {
    pub wall_contacts: u64,
    pub pickups: u64,
    pub banked_targets: u64,
    pub laser_hits: u64,
    pub dropped_targets: u64,
}

/// 運動学的なアリーナ
///
/// エージェントIDはエージェント配列のインデックスと一致している必要があります。
#[derive(Debug)]
pub struct Arena {
    pub params: ArenaParams,
    pub stats: ArenaStats,
    wall_contacts: HashSet<AgentId>,
    target_contacts: HashSet<(AgentId, usize)>,
    base_contacts: HashSet<(AgentId, TeamId)>,
}

impl Arena {
    pub fn new(params: ArenaParams) -> Self {
        Self {
            params,
            stats: ArenaStats::default(),
            wall_contacts: HashSet::new(),
            target_contacts: HashSet::new(),
            base_contacts: HashSet::new(),
        }
    }

    /// エピソード開始時に接触状態と統計をリセット
    pub fn reset(&mut self) {
        self.stats = ArenaStats::default();
        self.wall_contacts.clear();
        self.target_contacts.clear();
        self.base_contacts.clear();
    }

    /// ステップ開始処理（凍結カウンタを進める）
    ///
    /// 制御ループとアリーナが同じステップで同じ凍結状態を見るよう、
    /// 制御ループの実行前に呼び出します。
    pub fn begin_step(&mut self, agents: &mut [CaptureAgent]) {
        for agent in agents.iter_mut() {
            agent.tick_freeze();
        }
    }

    /// 1ステップの物理・衝突処理
    ///
    /// # 引数
    ///
    /// * `agents` - 全エージェント（IDとインデックスが一致）
    /// * `targets` - 全ターゲット
    /// * `bases` - 全基地
    /// * `motions` - 制御ループから転送された移動意図
    /// * `shaper` - イベント報酬の適用先
    /// * `dt` - 時間ステップ（秒）
    ///
    /// # 戻り値
    ///
    /// ステップ中に発生したイベントの一覧（発生順）
    pub fn step(
        &mut self,
        agents: &mut [CaptureAgent],
        targets: &mut [Target],
        bases: &[HomeBase],
        motions: &mut MotionQueue,
        shaper: &RewardShaper,
        dt: f64,
    ) -> Vec<StepEvent> {
        let mut events = Vec::new();

        for agent in agents.iter_mut() {
            let intent = motions.take(agent.id).unwrap_or_default();
            self.integrate_motion(agent, &intent, shaper, dt, &mut events);
        }

        Self::carry_targets(agents, targets);

        for agent in agents.iter_mut() {
            self.resolve_target_contacts(agent, targets, shaper, &mut events);
            self.resolve_base_contacts(agent, targets, bases, shaper, &mut events);
        }

        self.resolve_lasers(agents, targets, shaper, &mut events);

        events
    }

    fn dispatch(
        agent: &mut CaptureAgent,
        event: WorldEvent,
        shaper: &RewardShaper,
        events: &mut Vec<StepEvent>,
    ) {
        let reward = shaper.on_event(agent, &event);
        events.push(StepEvent { agent_id: agent.id, event, reward });
    }

    fn integrate_motion(
        &mut self,
        agent: &mut CaptureAgent,
        intent: &MotionIntent,
        shaper: &RewardShaper,
        dt: f64,
        events: &mut Vec<StepEvent>,
    ) {
        // 凍結中は移動しない
        if agent.is_frozen() {
            agent.local_velocity = LocalVelocity::default();
            return;
        }

        agent.heading = math_utils::normalize_angle(
            agent.heading + intent.rotate.sign() * self.params.turn_speed_deg_s * dt,
        );

        let speed = intent.translate.sign() * self.params.move_speed;
        let proposed = agent.position + agent.forward() * (speed * dt);
        let clamped = self.params.bounds.clamp(proposed);
        agent.position = clamped;
        agent.local_velocity = LocalVelocity {
            x: 0.0,
            z: if clamped == proposed { speed } else { 0.0 },
        };

        if self.params.bounds.is_on_edge(&clamped) {
            if self.wall_contacts.insert(agent.id) {
                self.stats.wall_contacts += 1;
                Self::dispatch(agent, WorldEvent::Collision(CollisionEvent::WallContact), shaper, events);
            }
        } else {
            self.wall_contacts.remove(&agent.id);
        }
    }

    fn carry_targets(agents: &[CaptureAgent], targets: &mut [Target]) {
        for target in targets.iter_mut() {
            if let Some(carrier) = target.carried_by.and_then(|id| agents.get(id)) {
                target.position = carrier.position;
            }
        }
    }

    fn resolve_target_contacts(
        &mut self,
        agent: &mut CaptureAgent,
        targets: &mut [Target],
        shaper: &RewardShaper,
        events: &mut Vec<StepEvent>,
    ) {
        // 凍結中は接触を保持しない（解除後に改めて進入として扱う）
        if agent.is_frozen() {
            self.target_contacts.retain(|(agent_id, _)| *agent_id != agent.id);
            return;
        }

        for (index, target) in targets.iter_mut().enumerate() {
            if target.carried_by == Some(agent.id) {
                continue;
            }

            let key = (agent.id, index);
            let in_contact = agent.position.distance_xz(&target.position) <= self.params.contact_radius;
            if !in_contact {
                self.target_contacts.remove(&key);
                continue;
            }
            if !self.target_contacts.insert(key) {
                continue;
            }

            let event = CollisionEvent::TargetContact {
                carried: target.is_carried(),
                in_base_team: target.in_base,
            };
            Self::dispatch(agent, WorldEvent::Collision(event), shaper, events);

            if target.is_eligible_for(agent.team) && agent.load_cargo() {
                target.carried_by = Some(agent.id);
                target.in_base = None;
                target.position = agent.position;
                self.stats.pickups += 1;
                debug!(
                    agent_id = agent.id,
                    target_id = %target.id,
                    cargo = agent.cargo,
                    "TARGET_PICKED_UP: ターゲットを確保しました"
                );
            }
        }
    }

    fn resolve_base_contacts(
        &mut self,
        agent: &mut CaptureAgent,
        targets: &mut [Target],
        bases: &[HomeBase],
        shaper: &RewardShaper,
        events: &mut Vec<StepEvent>,
    ) {
        for base in bases {
            let key = (agent.id, base.team);
            if !base.contains(&agent.position) {
                self.base_contacts.remove(&key);
                continue;
            }

            if self.base_contacts.insert(key) {
                let event = CollisionEvent::HomeBaseContact { team: base.team };
                Self::dispatch(agent, WorldEvent::Collision(event), shaper, events);
            }

            // 自チーム基地の中にいる間は積荷を収納する
            if base.team == agent.team && agent.cargo > 0 {
                let mut banked = 0;
                for target in targets.iter_mut().filter(|t| t.carried_by == Some(agent.id)) {
                    target.carried_by = None;
                    target.in_base = Some(base.team);
                    target.position = base.position;
                    banked += 1;
                }
                agent.unload_cargo();
                self.stats.banked_targets += banked;
                info!(
                    agent_id = agent.id,
                    team = base.team,
                    banked = banked,
                    "TARGETS_BANKED: ターゲットを基地に収納しました"
                );
            }
        }
    }

    fn resolve_lasers(
        &mut self,
        agents: &mut [CaptureAgent],
        targets: &mut [Target],
        shaper: &RewardShaper,
        events: &mut Vec<StepEvent>,
    ) {
        for shooter in 0..agents.len() {
            if !agents[shooter].laser_enabled || agents[shooter].is_frozen() {
                continue;
            }

            Self::dispatch(&mut agents[shooter], WorldEvent::LaserFired, shaper, events);

            let Some(victim) = self.find_laser_victim(agents, shooter) else {
                continue;
            };

            self.stats.laser_hits += 1;
            Self::dispatch(&mut agents[shooter], WorldEvent::EnemyHit, shaper, events);
            self.freeze_agent(&mut agents[victim], targets, shaper, events);

            info!(
                shooter_id = shooter,
                victim_id = victim,
                "LASER_HIT: レーザーが敵に命中しました"
            );
        }
    }

    /// 射程と角度の範囲内にいる最も近い凍結していない敵
    fn find_laser_victim(&self, agents: &[CaptureAgent], shooter: usize) -> Option<usize> {
        let origin = &agents[shooter];
        let mut best_distance = f64::INFINITY;
        let mut victim = None;

        for (index, other) in agents.iter().enumerate() {
            if index == shooter || other.team == origin.team || other.is_frozen() {
                continue;
            }
            let distance = origin.position.distance_xz(&other.position);
            if distance > self.params.laser_range || distance >= best_distance {
                continue;
            }
            let within_cone = heading_delta(&origin.position, origin.heading, &other.position)
                .is_some_and(|delta| delta.abs() <= self.params.laser_half_angle_deg);
            if within_cone {
                best_distance = distance;
                victim = Some(index);
            }
        }

        victim
    }

    /// エージェントを凍結し、運搬中のターゲットをその場に落とす
    fn freeze_agent(
        &mut self,
        agent: &mut CaptureAgent,
        targets: &mut [Target],
        shaper: &RewardShaper,
        events: &mut Vec<StepEvent>,
    ) {
        Self::dispatch(agent, WorldEvent::Frozen, shaper, events);
        agent.freeze(self.params.freeze_ticks);

        for target in targets.iter_mut().filter(|t| t.carried_by == Some(agent.id)) {
            target.carried_by = None;
            target.position = agent.position;
        }
        let count = agent.unload_cargo();
        self.stats.dropped_targets += u64::from(count);
        Self::dispatch(agent, WorldEvent::DroppedTargets { count }, shaper, events);
    }
}
