//! # ControlLoop モジュール
//!
//! 1ティックごとの制御処理を統括します。
//!
//! ## ティック処理順序
//!
//! 1. **時間減衰報酬**: 凍結中を含め毎ティック無条件に適用
//! 2. **オートパイロット**: 運搬数に応じた移動提案
//! 3. **デコード済みアクション**: 発射フラグの適用、シークフラグによる再ナビゲーション
//! 4. **移動意図の確定**: 優先度で解決し、物理層へ転送
//!
//! 移動意図は毎ティック再計算され、前ティックの意図は引き継がれません。

use tracing::trace;

use crate::control::{
    action::{ActionDecoder, DiscreteAction, MotionIntent},
    autopilot::AutopilotPolicy,
    intent::{IntentBuilder, IntentSource},
};
use crate::models::{
    base::HomeBase,
    target::Target,
    traits::{IControllable, IMotionSink},
};

/// 毎ティック適用される既定の時間減衰報酬
pub const DEFAULT_TIME_PENALTY: f64 = -0.001;

/// 制御ループが参照するワールドの読み取り専用ビュー
#[derive(Debug, Clone, Copy)]
pub struct WorldView<'a> {
    /// 走査順に並んだ全ターゲット
    pub targets: &'a [Target],
    /// エージェント自身のチームの基地
    pub base: &'a HomeBase,
}

/// 1エージェント分の制御ループ
#[derive(Debug, Clone, Copy)]
pub struct ControlLoop {
    pub autopilot: AutopilotPolicy,
    pub time_penalty: f64,
}

impl Default for ControlLoop {
    fn default() -> Self {
        Self::new(AutopilotPolicy::default(), DEFAULT_TIME_PENALTY)
    }
}

impl ControlLoop {
    pub fn new(autopilot: AutopilotPolicy, time_penalty: f64) -> Self {
        Self { autopilot, time_penalty }
    }

    /// このティックの移動提案を集める（報酬の適用や転送は行わない）
    pub fn plan<A: IControllable + ?Sized>(
        &self,
        agent: &A,
        action: Option<&DiscreteAction>,
        world: &WorldView<'_>,
    ) -> IntentBuilder {
        let mut builder = IntentBuilder::new();

        let decision = self.autopilot.decide(agent, world.targets, world.base);
        builder.propose(IntentSource::Autopilot, decision.movement);
        trace!(
            agent_id = agent.get_id(),
            mode = ?decision.mode,
            target_index = ?decision.target_index,
            "AUTOPILOT_DECISION: オートパイロットの行き先を決定しました"
        );

        if let Some(action) = action {
            let decoded = ActionDecoder::decode(action);
            builder.propose(IntentSource::Decoded, decoded.movement());
            builder.set_fire(decoded.fire);
            builder.set_seek_flags(decoded.seek_target, decoded.seek_base);

            if decoded.seek_target {
                if let Some((_, movement)) = self.autopilot.seek_target(agent, world.targets) {
                    builder.propose(IntentSource::SeekTarget, movement);
                }
            }
            if decoded.seek_base {
                if let Some(movement) = self.autopilot.seek_base(agent, world.base) {
                    builder.propose(IntentSource::SeekBase, movement);
                }
            }
        }

        builder
    }

    /// 1ティックの処理実行
    ///
    /// # 引数
    ///
    /// * `agent` - 制御対象のエージェント
    /// * `action` - このティックにデコードされたアクション（無ければNone）
    /// * `world` - ターゲットと自チーム基地の読み取り専用ビュー
    /// * `sink` - 移動意図の転送先（物理層）
    ///
    /// # 戻り値
    ///
    /// 確定した移動意図
    pub fn tick<A: IControllable + ?Sized>(
        &self,
        agent: &mut A,
        action: Option<&DiscreteAction>,
        world: &WorldView<'_>,
        sink: &mut dyn IMotionSink,
    ) -> MotionIntent {
        agent.apply_reward(self.time_penalty);

        let builder = self.plan(agent, action, world);
        let winner = builder.proposals().iter().map(|(source, _)| *source).max();
        let intent = builder.resolve();
        if action.is_some() {
            agent.set_laser(intent.fire);
        }

        agent.set_motion_intent(intent);
        sink.apply_motion(agent.get_id(), &intent);

        trace!(
            agent_id = agent.get_id(),
            cargo = agent.get_cargo(),
            frozen = agent.is_frozen(),
            has_action = action.is_some(),
            source = ?winner,
            translate = ?intent.translate,
            rotate = ?intent.rotate,
            fire = intent.fire,
            "CONTROL_TICK: 移動意図を確定しました"
        );

        intent
    }
}
