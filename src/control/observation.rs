use crate::models::{
    agent::CaptureAgent,
    base::HomeBase,
    common::{math_utils, Position3D},
    target::Target,
};

/// ターゲット以外の観測要素数
pub const BASE_OBSERVATION_SIZE: usize = 14;

/// ターゲット1つあたりの観測要素数
pub const PER_TARGET_OBSERVATION_SIZE: usize = 5;

/// 外部ポリシー向けの観測ベクトルを構築する
///
/// 要素の順序は学習済みポリシーとの互換性のため固定です:
/// ローカル速度(x, z)、残り時間、方位、自位置(3)、自基地位置(3)、
/// ターゲットごとに位置(3)・運搬フラグ・収納チーム、凍結フラグ、敵位置(3)。
pub struct ObservationBuilder;

impl ObservationBuilder {
    /// 観測ベクトルの長さ
    pub fn observation_size(target_count: usize) -> usize {
        BASE_OBSERVATION_SIZE + PER_TARGET_OBSERVATION_SIZE * target_count
    }

    /// 観測ベクトルを構築
    ///
    /// # 引数
    ///
    /// * `agent` - 観測するエージェント
    /// * `base` - エージェント自身の基地
    /// * `targets` - 全ターゲット（走査順）
    /// * `enemy` - 敵の位置（敵がいない場合は原点として扱う）
    /// * `time_remaining` - エピソードの残り時間（秒）
    pub fn build(
        agent: &CaptureAgent,
        base: &HomeBase,
        targets: &[Target],
        enemy: Option<Position3D>,
        time_remaining: f64,
    ) -> Vec<f64> {
        let mut observation = Vec::with_capacity(Self::observation_size(targets.len()));

        observation.push(agent.local_velocity.x);
        observation.push(agent.local_velocity.z);
        observation.push(time_remaining);
        // Y軸回転クォータニオンのy成分
        observation.push((math_utils::deg_to_rad(agent.heading) / 2.0).sin());

        push_position(&mut observation, &agent.position);
        push_position(&mut observation, &base.position);

        for target in targets {
            push_position(&mut observation, &target.position);
            observation.push(if target.is_carried() { 1.0 } else { 0.0 });
            observation.push(target.in_base.map(f64::from).unwrap_or(0.0));
        }

        observation.push(if agent.frozen_ticks > 0 { 1.0 } else { 0.0 });
        push_position(&mut observation, &enemy.unwrap_or_default());

        observation
    }
}

fn push_position(observation: &mut Vec<f64>, position: &Position3D) {
    observation.extend_from_slice(&[position.x, position.y, position.z]);
}
