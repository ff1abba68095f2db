//! # Navigation モジュール
//!
//! 方位サーボ（デッドバンド付きのバンバン制御）と最寄りターゲット選択を提供します。
//!
//! 方位差が±5度を超えている間は回転のみを行い、範囲内に入ると前進のみを行います。
//! ティック間で状態は保持せず、判定は現在の方位差だけで決まります。

use crate::models::{
    common::{math_utils, Position3D, TeamId},
    target::Target,
    traits::IControllable,
};
use crate::control::action::{Movement, Rotate};

/// 回転を行わない方位差の許容幅（度）
pub const DEADBAND_DEGREES: f64 = 5.0;

/// 方向が定義できないとみなす目的地までの距離
pub const ARRIVAL_EPSILON: f64 = 1e-6;

/// ターゲット探索の既定の最大距離
pub const DEFAULT_SEARCH_RADIUS: f64 = 200.0;

/// 方位差から移動を決定
///
/// # 引数
///
/// * `delta_deg` - 前方から目的地方向への符号付き方位差（度、正は右）
///
/// # 戻り値
///
/// 右/左回転のみ、またはデッドバンド内（境界を含む）なら前進のみ
pub fn turn_and_go(delta_deg: f64) -> Movement {
    if delta_deg < -DEADBAND_DEGREES {
        Movement::turn(Rotate::Left)
    } else if delta_deg > DEADBAND_DEGREES {
        Movement::turn(Rotate::Right)
    } else {
        Movement::forward()
    }
}

/// エージェントの前方から目的地への符号付き方位差を計算
///
/// # 戻り値
///
/// -180度〜180度の方位差。目的地がエージェントと同じ位置の場合はNone
pub fn heading_delta(position: &Position3D, heading: f64, destination: &Position3D) -> Option<f64> {
    if position.distance_xz(destination) < ARRIVAL_EPSILON {
        return None;
    }
    let bearing = position.bearing_to(destination);
    Some(math_utils::angle_difference(heading, bearing))
}

/// エージェントを目的地へ向かわせる移動を計算
pub fn steer_towards<A: IControllable + ?Sized>(agent: &A, destination: &Position3D) -> Option<Movement> {
    heading_delta(&agent.get_position(), agent.get_heading(), destination).map(turn_and_go)
}

/// 最寄りの適格ターゲットの選択器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSelector {
    /// この距離以上のターゲットは選択しない
    pub max_distance: f64,
}

impl Default for TargetSelector {
    fn default() -> Self {
        Self { max_distance: DEFAULT_SEARCH_RADIUS }
    }
}

impl TargetSelector {
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    /// 最寄りの適格ターゲットのインデックスを返す
    ///
    /// 距離が等しい場合は走査順で先に見つかったものを採用します。
    ///
    /// # 引数
    ///
    /// * `position` - エージェントの位置
    /// * `team` - エージェントの所属チーム
    /// * `targets` - 走査対象のターゲット
    ///
    /// # 戻り値
    ///
    /// 選択されたターゲットのインデックス、適格なものが無い場合はNone
    pub fn select(&self, position: &Position3D, team: TeamId, targets: &[Target]) -> Option<usize> {
        let mut best_distance = self.max_distance;
        let mut nearest = None;

        for (index, target) in targets.iter().enumerate() {
            let distance = target.position.distance_3d(position);
            if distance < best_distance && target.is_eligible_for(team) {
                best_distance = distance;
                nearest = Some(index);
            }
        }

        nearest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::action::Translate;

    #[test]
    fn test_deadband_boundaries_resolve_to_forward() {
        assert_eq!(turn_and_go(5.0), Movement::forward());
        assert_eq!(turn_and_go(-5.0), Movement::forward());
        assert_eq!(turn_and_go(0.0), Movement::forward());
    }

    #[test]
    fn test_outside_deadband_rotates_without_translation() {
        for delta in [5.0001, 20.0, 90.0, 180.0] {
            let movement = turn_and_go(delta);
            assert_eq!(movement.rotate, Rotate::Right);
            assert_eq!(movement.translate, Translate::None);
        }
        for delta in [-5.0001, -20.0, -90.0, -180.0] {
            let movement = turn_and_go(delta);
            assert_eq!(movement.rotate, Rotate::Left);
            assert_eq!(movement.translate, Translate::None);
        }
    }

    #[test]
    fn test_servo_never_mixes_translate_and_rotate() {
        let mut delta = -180.0;
        while delta <= 180.0 {
            let movement = turn_and_go(delta);
            let translating = movement.translate != Translate::None;
            let rotating = movement.rotate != Rotate::None;
            assert!(translating ^ rotating, "delta {}", delta);
            delta += 0.25;
        }
    }

    #[test]
    fn test_heading_delta_sign() {
        let origin = Position3D::zero();
        let right = Position3D::new(10.0, 0.0, 10.0);
        let left = Position3D::new(-10.0, 0.0, 10.0);
        assert!((heading_delta(&origin, 0.0, &right).unwrap() - 45.0).abs() < 1e-9);
        assert!((heading_delta(&origin, 0.0, &left).unwrap() + 45.0).abs() < 1e-9);
        // 方位350度から見て方位10度の目的地は右に20度
        let ahead = Position3D::new(10f64.to_radians().sin(), 0.0, 10f64.to_radians().cos());
        assert!((heading_delta(&origin, 350.0, &ahead).unwrap() - 20.0).abs() < 1e-9);
        assert!(heading_delta(&origin, 0.0, &origin).is_none());
    }

    #[test]
    fn test_selector_skips_ineligible_targets() {
        let mut carried = Target::new("carried".to_string(), Position3D::new(1.0, 0.0, 0.0));
        carried.carried_by = Some(7);
        let mut banked_own = Target::new("own".to_string(), Position3D::new(2.0, 0.0, 0.0));
        banked_own.in_base = Some(1);
        let mut banked_enemy = Target::new("enemy".to_string(), Position3D::new(3.0, 0.0, 0.0));
        banked_enemy.in_base = Some(2);
        let free = Target::new("free".to_string(), Position3D::new(4.0, 0.0, 0.0));

        let targets = vec![carried, banked_own, banked_enemy, free];
        let selector = TargetSelector::default();
        assert_eq!(selector.select(&Position3D::zero(), 1, &targets), Some(2));
        assert_eq!(selector.select(&Position3D::zero(), 2, &targets), Some(1));
    }

    #[test]
    fn test_selector_keeps_first_on_tie() {
        let targets = vec![
            Target::new("a".to_string(), Position3D::new(5.0, 0.0, 0.0)),
            Target::new("b".to_string(), Position3D::new(-5.0, 0.0, 0.0)),
            Target::new("c".to_string(), Position3D::new(0.0, 0.0, 5.0)),
        ];
        assert_eq!(TargetSelector::default().select(&Position3D::zero(), 1, &targets), Some(0));
    }

    #[test]
    fn test_selector_respects_search_radius() {
        let targets = vec![Target::new("far".to_string(), Position3D::new(250.0, 0.0, 0.0))];
        assert_eq!(TargetSelector::default().select(&Position3D::zero(), 1, &targets), None);
        assert_eq!(TargetSelector::new(300.0).select(&Position3D::zero(), 1, &targets), Some(0));
        assert_eq!(TargetSelector::default().select(&Position3D::zero(), 1, &[]), None);
    }
}
