use crate::models::common::{Position3D, TeamId};

/// チームの基地
///
/// 位置と所有チームは固定で、エピソード中に変化しません。
#[derive(Debug, Clone, PartialEq)]
pub struct HomeBase {
    /// 所有チーム
    pub team: TeamId,
    /// 基地の中心位置
    pub position: Position3D,
    /// 基地への進入判定半径
    pub radius: f64,
}

impl HomeBase {
    pub fn new(team: TeamId, position: Position3D, radius: f64) -> Self {
        Self { team, position, radius }
    }

    /// 位置が基地の範囲内かどうか（XZ平面距離）
    pub fn contains(&self, position: &Position3D) -> bool {
        self.position.distance_xz(position) <= self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_uses_planar_distance() {
        let base = HomeBase::new(1, Position3D::new(0.0, 0.0, 0.0), 3.0);
        assert!(base.contains(&Position3D::new(3.0, 10.0, 0.0)));
        assert!(!base.contains(&Position3D::new(2.5, 0.0, 2.5)));
    }
}
