use crate::control::action::{DiscreteAction, MotionIntent};
use crate::models::common::*;

/// 制御コアが操作対象のエージェントに要求する能力インターフェース
///
/// オートパイロットとアクションデコーダーはこのトレイトにのみ依存し、
/// 具体的なエンジンのオブジェクトモデルからは切り離されています。
pub trait IControllable {
    /// エージェントIDの取得
    fn get_id(&self) -> AgentId;

    /// 現在位置の取得
    fn get_position(&self) -> Position3D;

    /// 現在の方位（度）の取得
    fn get_heading(&self) -> f64;

    /// 所属チームの取得
    fn get_team(&self) -> TeamId;

    /// 運搬中のターゲット数の取得
    fn get_cargo(&self) -> u32;

    /// 凍結状態かどうか
    fn is_frozen(&self) -> bool;

    /// 今ティックの移動意図を設定
    fn set_motion_intent(&mut self, intent: MotionIntent);

    /// 報酬を加算
    fn apply_reward(&mut self, reward: f64);

    /// レーザーの有効/無効を設定
    fn set_laser(&mut self, enabled: bool);
}

/// 離散アクションの供給元（学習済みポリシー、スクリプト、手動入力など）
pub trait IActionSource {
    /// 観測ベクトルから次のアクションを取得
    ///
    /// このティックでアクションが無い場合はNone
    fn next_action(&mut self, observation: &[f64]) -> Option<DiscreteAction>;

    /// 供給元の名前
    fn name(&self) -> &str;
}

/// 移動意図を受け取って運動を適用する物理層のインターフェース
pub trait IMotionSink {
    /// 移動意図の適用
    fn apply_motion(&mut self, agent_id: AgentId, intent: &MotionIntent);
}
