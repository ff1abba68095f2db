use crate::control::action::MotionIntent;
use crate::models::{
    traits::IControllable,
    common::{math_utils, AgentId, LocalVelocity, Position3D, TeamId},
};
use tracing::trace;

/// 同時に運搬できるターゲットの最大数
pub const CARGO_CAPACITY: u32 = 4;

/// 報酬の累積器
///
/// トレーナーが参照する累計報酬と、現在ステップ中に加算された報酬を保持します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardAccumulator {
    /// エピソード開始からの累計報酬
    pub total: f64,
    /// 現在ステップで加算された報酬
    pub step_reward: f64,
    /// 報酬の適用回数
    pub applications: u64,
}

impl RewardAccumulator {
    /// 報酬を加算
    pub fn add(&mut self, reward: f64) {
        self.total += reward;
        self.step_reward += reward;
        self.applications += 1;
    }

    /// ステップ報酬をリセットし、直前ステップの値を返す
    pub fn take_step_reward(&mut self) -> f64 {
        std::mem::take(&mut self.step_reward)
    }

    /// エピソード開始時のリセット
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// キャプチャーゲームの自律エージェント
///
/// 位置・方位・チーム・運搬数・凍結状態・移動意図・報酬を保持します。
/// 状態の変更は制御ループとアリーナからのみ行われます。
#[derive(Debug, Clone)]
pub struct CaptureAgent {
    /// エージェントの一意識別子
    pub id: AgentId,
    /// 表示用の名前
    pub name: String,
    /// 所属チーム
    pub team: TeamId,
    /// 現在位置
    pub position: Position3D,
    /// 現在の方位（度、+Zを0度とし時計回りを正）
    pub heading: f64,
    /// ローカル座標系での速度
    pub local_velocity: LocalVelocity,
    /// 運搬中のターゲット数（0〜CARGO_CAPACITY）
    pub cargo: u32,
    /// 凍結の残りティック数（0なら凍結していない）
    pub frozen_ticks: u32,
    /// レーザーが有効かどうか
    pub laser_enabled: bool,
    /// 今ティックの移動意図
    pub motion_intent: MotionIntent,
    /// 報酬の累積
    pub rewards: RewardAccumulator,
    /// エピソード開始時の位置
    pub spawn_position: Position3D,
    /// エピソード開始時の方位
    pub spawn_heading: f64,
}

impl CaptureAgent {
    /// 新しいエージェントを作成します
    ///
    /// # 引数
    ///
    /// * `id` - エージェントの一意識別子
    /// * `name` - 表示用の名前
    /// * `team` - 所属チーム
    /// * `position` - 初期位置
    /// * `heading` - 初期方位（度）
    pub fn new(id: AgentId, name: String, team: TeamId, position: Position3D, heading: f64) -> Self {
        Self {
            id,
            name,
            team,
            position,
            heading,
            local_velocity: LocalVelocity::default(),
            cargo: 0,
            frozen_ticks: 0,
            laser_enabled: false,
            motion_intent: MotionIntent::default(),
            rewards: RewardAccumulator::default(),
            spawn_position: position,
            spawn_heading: heading,
        }
    }

    /// ターゲットを1つ積み込む
    ///
    /// # 戻り値
    ///
    /// 積み込めた場合はtrue、容量上限の場合はfalse
    pub fn load_cargo(&mut self) -> bool {
        if self.cargo >= CARGO_CAPACITY {
            return false;
        }
        self.cargo += 1;
        true
    }

    /// 全ての積荷を降ろし、降ろした数を返す
    pub fn unload_cargo(&mut self) -> u32 {
        std::mem::take(&mut self.cargo)
    }

    /// 指定ティック数だけ凍結する
    pub fn freeze(&mut self, ticks: u32) {
        self.frozen_ticks = ticks;
        self.laser_enabled = false;
    }

    /// 凍結カウンタを1ティック進める
    pub fn tick_freeze(&mut self) {
        self.frozen_ticks = self.frozen_ticks.saturating_sub(1);
    }

    /// 前方向の単位ベクトル（XZ平面）
    pub fn forward(&self) -> Position3D {
        let heading_rad = math_utils::deg_to_rad(self.heading);
        Position3D::new(heading_rad.sin(), 0.0, heading_rad.cos())
    }

    /// エピソード開始状態に戻す
    pub fn reset(&mut self) {
        self.position = self.spawn_position;
        self.heading = self.spawn_heading;
        self.local_velocity = LocalVelocity::default();
        self.cargo = 0;
        self.frozen_ticks = 0;
        self.laser_enabled = false;
        self.motion_intent = MotionIntent::default();
        self.rewards.reset();
    }
}

impl IControllable for CaptureAgent {
    fn get_id(&self) -> AgentId {
        self.id
    }

    fn get_position(&self) -> Position3D {
        self.position
    }

    fn get_heading(&self) -> f64 {
        self.heading
    }

    fn get_team(&self) -> TeamId {
        self.team
    }

    fn get_cargo(&self) -> u32 {
        self.cargo
    }

    fn is_frozen(&self) -> bool {
        self.frozen_ticks > 0
    }

    fn set_motion_intent(&mut self, intent: MotionIntent) {
        self.motion_intent = intent;
    }

    fn apply_reward(&mut self, reward: f64) {
        self.rewards.add(reward);
        trace!(
            agent_id = self.id,
            reward = reward,
            total = self.rewards.total,
            "REWARD_APPLIED: 報酬を加算しました"
        );
    }

    fn set_laser(&mut self, enabled: bool) {
        // 凍結中はレーザーを使用できない
        self.laser_enabled = enabled && !self.is_frozen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> CaptureAgent {
        CaptureAgent::new(0, "blue-1".to_string(), 1, Position3D::zero(), 0.0)
    }

    #[test]
    fn test_cargo_never_exceeds_capacity() {
        let mut agent = agent();
        for _ in 0..CARGO_CAPACITY {
            assert!(agent.load_cargo());
        }
        assert!(!agent.load_cargo());
        assert_eq!(agent.get_cargo(), CARGO_CAPACITY);
        assert_eq!(agent.unload_cargo(), CARGO_CAPACITY);
        assert_eq!(agent.get_cargo(), 0);
    }

    #[test]
    fn test_frozen_agent_cannot_enable_laser() {
        let mut agent = agent();
        agent.freeze(3);
        agent.set_laser(true);
        assert!(!agent.laser_enabled);

        for _ in 0..3 {
            agent.tick_freeze();
        }
        assert!(!agent.is_frozen());
        agent.set_laser(true);
        assert!(agent.laser_enabled);
    }

    #[test]
    fn test_reward_accumulator_tracks_step_and_total() {
        let mut agent = agent();
        agent.apply_reward(-0.001);
        agent.apply_reward(1.0);
        assert!((agent.rewards.total - 0.999).abs() < 1e-12);
        assert!((agent.rewards.take_step_reward() - 0.999).abs() < 1e-12);
        assert_eq!(agent.rewards.step_reward, 0.0);
        assert_eq!(agent.rewards.applications, 2);
    }

    #[test]
    fn test_forward_vector_follows_heading() {
        let mut agent = agent();
        agent.heading = 90.0;
        let forward = agent.forward();
        assert!((forward.x - 1.0).abs() < 1e-9);
        assert!(forward.z.abs() < 1e-9);
    }
}
