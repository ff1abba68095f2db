use crate::models::common::{math_utils, AgentId, Position3D, TeamId};

/// 回収対象のターゲット
///
/// アリーナ上に配置され、エージェントに運ばれて自チームの基地に収められます。
/// 運搬者と収納先チームはアリーナ（衝突処理層）だけが書き換え、
/// 制御コアは適格性の判定のために読み取るだけです。
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// ターゲットの一意識別子
    pub id: String,
    /// 現在位置
    pub position: Position3D,
    /// 運搬中のエージェント（運ばれていなければNone）
    pub carried_by: Option<AgentId>,
    /// 収納されている基地のチーム（どの基地にも無ければNone）
    pub in_base: Option<TeamId>,
    /// エピソード開始時の位置
    pub spawn_position: Position3D,
}

impl Target {
    /// 新しいTargetインスタンスを作成
    ///
    /// # 引数
    ///
    /// * `id` - ターゲットの一意識別子
    /// * `position` - 初期位置（エピソード開始時にもこの位置に戻る）
    pub fn new(id: String, position: Position3D) -> Self {
        Self {
            id,
            position,
            carried_by: None,
            in_base: None,
            spawn_position: position,
        }
    }

    /// 運搬中かどうか
    pub fn is_carried(&self) -> bool {
        self.carried_by.is_some()
    }

    /// 指定チームのエージェントにとって選択可能かどうか
    ///
    /// 運ばれておらず、かつそのチーム自身の基地に収納されていない場合のみ選択可能です。
    pub fn is_eligible_for(&self, team: TeamId) -> bool {
        self.carried_by.is_none() && self.in_base != Some(team)
    }

    /// エピソード開始状態に戻す
    pub fn reset(&mut self) {
        self.position = self.spawn_position;
        self.carried_by = None;
        self.in_base = None;
    }
}

/// ターゲット配置パターンを生成するヘルパー構造体
///
/// 中心点の周りに等角度間隔でリング状にターゲットを配置します。
pub struct TargetRing {
    /// IDのプレフィックス
    pub id_prefix: String,
    /// 配置の中心位置
    pub center_position: Position3D,
    /// ターゲット数
    pub count: u32,
    /// リング半径
    pub radius: f64,
    /// 配置開始角度（度）
    pub start_angle: f64,
}

impl TargetRing {
    /// リング上の配置位置を計算
    ///
    /// 半径が0の場合は全て中心に配置されます。
    pub fn generate_positions(&self) -> Vec<Position3D> {
        if self.count == 0 {
            return Vec::new();
        }

        let angle_step = 360.0 / self.count as f64;
        (0..self.count)
            .map(|i| {
                let angle_rad = math_utils::deg_to_rad(self.start_angle + i as f64 * angle_step);
                Position3D::new(
                    self.center_position.x + self.radius * angle_rad.sin(),
                    self.center_position.y,
                    self.center_position.z + self.radius * angle_rad.cos(),
                )
            })
            .collect()
    }

    /// リング上の全ターゲットを生成
    pub fn generate_targets(&self) -> Vec<Target> {
        self.generate_positions()
            .into_iter()
            .enumerate()
            .map(|(index, position)| Target::new(format!("{}_T{:03}", self.id_prefix, index + 1), position))
            .collect()
    }
}
