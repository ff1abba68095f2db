use crate::control::{
    action::Movement,
    navigation::{steer_towards, TargetSelector},
};
use crate::models::{
    agent::CARGO_CAPACITY,
    base::HomeBase,
    target::Target,
    traits::IControllable,
};

/// オートパイロットの行き先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutopilotMode {
    /// 最寄りの適格ターゲットへ向かう
    SeekTarget,
    /// 自チームの基地へ戻る
    SeekBase,
}

/// オートパイロットの1ティック分の判断
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutopilotDecision {
    pub mode: AutopilotMode,
    /// 選択されたターゲット（SeekTargetの場合のみ）
    pub target_index: Option<usize>,
    /// 目的地が無い場合は停止
    pub movement: Movement,
}

/// 運搬数に応じてターゲット回収と基地帰還を切り替えるスクリプトポリシー
#[derive(Debug, Clone, Copy, Default)]
pub struct AutopilotPolicy {
    pub selector: TargetSelector,
}

impl AutopilotPolicy {
    pub fn new(selector: TargetSelector) -> Self {
        Self { selector }
    }

    /// 運搬数から行き先を決定
    pub fn mode_for(cargo: u32) -> AutopilotMode {
        if cargo < CARGO_CAPACITY {
            AutopilotMode::SeekTarget
        } else {
            AutopilotMode::SeekBase
        }
    }

    /// 最寄りの適格ターゲットへ向かう移動
    ///
    /// # 戻り値
    ///
    /// (選択されたターゲット, 移動)。目的地が無い場合はNone
    pub fn seek_target<A: IControllable + ?Sized>(
        &self,
        agent: &A,
        targets: &[Target],
    ) -> Option<(usize, Movement)> {
        let index = self.selector.select(&agent.get_position(), agent.get_team(), targets)?;
        let movement = steer_towards(agent, &targets[index].position)?;
        Some((index, movement))
    }

    /// 自チーム基地へ向かう移動（既に基地の中心にいる場合はNone）
    pub fn seek_base<A: IControllable + ?Sized>(&self, agent: &A, base: &HomeBase) -> Option<Movement> {
        steer_towards(agent, &base.position)
    }

    /// 1ティック分の判断
    pub fn decide<A: IControllable + ?Sized>(
        &self,
        agent: &A,
        targets: &[Target],
        base: &HomeBase,
    ) -> AutopilotDecision {
        let mode = Self::mode_for(agent.get_cargo());
        match mode {
            AutopilotMode::SeekTarget => {
                let found = self.seek_target(agent, targets);
                AutopilotDecision {
                    mode,
                    target_index: found.map(|(index, _)| index),
                    movement: found.map(|(_, movement)| movement).unwrap_or_default(),
                }
            }
            AutopilotMode::SeekBase => AutopilotDecision {
                mode,
                target_index: None,
                movement: self.seek_base(agent, base).unwrap_or_default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::action::Rotate;
    use crate::models::{agent::CaptureAgent, common::Position3D};

    fn setup(cargo: u32) -> (CaptureAgent, Vec<Target>, HomeBase) {
        let mut agent = CaptureAgent::new(0, "blue-1".to_string(), 1, Position3D::zero(), 0.0);
        agent.cargo = cargo;
        // ターゲットは右前方、基地は左前方
        let targets = vec![Target::new("T001".to_string(), Position3D::new(10.0, 0.0, 10.0))];
        let base = HomeBase::new(1, Position3D::new(-10.0, 0.0, 10.0), 3.0);
        (agent, targets, base)
    }

    #[test]
    fn test_below_capacity_seeks_target() {
        for cargo in 0..CARGO_CAPACITY {
            let (agent, targets, base) = setup(cargo);
            let decision = AutopilotPolicy::default().decide(&agent, &targets, &base);
            assert_eq!(decision.mode, AutopilotMode::SeekTarget);
            assert_eq!(decision.target_index, Some(0));
            assert_eq!(decision.movement, Movement::turn(Rotate::Right));
        }
    }

    #[test]
    fn test_exactly_full_cargo_seeks_base() {
        let (agent, targets, base) = setup(CARGO_CAPACITY);
        let decision = AutopilotPolicy::default().decide(&agent, &targets, &base);
        assert_eq!(decision.mode, AutopilotMode::SeekBase);
        assert_eq!(decision.target_index, None);
        assert_eq!(decision.movement, Movement::turn(Rotate::Left));
    }

    #[test]
    fn test_no_eligible_target_is_idle() {
        let (agent, mut targets, base) = setup(0);
        targets[0].carried_by = Some(5);
        let decision = AutopilotPolicy::default().decide(&agent, &targets, &base);
        assert_eq!(decision.mode, AutopilotMode::SeekTarget);
        assert_eq!(decision.target_index, None);
        assert_eq!(decision.movement, Movement::idle());
    }

    #[test]
    fn test_standing_on_base_center_is_idle() {
        let (mut agent, targets, base) = setup(CARGO_CAPACITY);
        agent.position = base.position;
        let decision = AutopilotPolicy::default().decide(&agent, &targets, &base);
        assert_eq!(decision.movement, Movement::idle());
    }
}
