//! # Reward モジュール
//!
//! 報酬テーブルとイベント駆動の報酬シェーピングを提供します。
//!
//! 報酬テーブルはエピソード開始時に一度だけ構築され、以後は読み取り専用です。
//! [`RewardShaper`] は構築時に必要な全ての報酬名をテーブルから解決するため、
//! 未登録の名前は初期化時のエラーとして検出されます。
//!
//! ## 標準の報酬値
//!
//! | 名前 | 値 | 契機 |
//! |------|----|------|
//! | `frozen` | -1 | 敵のレーザーで凍結された |
//! | `shooting-laser` | +0.001 | レーザーを発射した |
//! | `hit-enemy` | +3 | レーザーが敵に命中した |
//! | `dropped-one-target` | -1 | ターゲットを1つ落とした |
//! | `dropped-targets` | -2 | ターゲットを2つ以上落とした |
//! | `home-base` | +3 | 積荷を持って自チーム基地に入った |
//! | `target-pickup` | +1 | 凍結していない状態で適格ターゲットを確保した |
//! | `wall` | -1 | 壁に衝突した |

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    agent::CARGO_CAPACITY,
    common::TeamId,
    traits::IControllable,
};

pub const FROZEN: &str = "frozen";
pub const SHOOTING_LASER: &str = "shooting-laser";
pub const HIT_ENEMY: &str = "hit-enemy";
pub const DROPPED_ONE_TARGET: &str = "dropped-one-target";
pub const DROPPED_TARGETS: &str = "dropped-targets";
pub const HOME_BASE: &str = "home-base";
pub const TARGET_PICKUP: &str = "target-pickup";
pub const WALL: &str = "wall";

/// 標準の報酬名と値
pub const STANDARD_REWARDS: [(&str, f64); 8] = [
    (FROZEN, -1.0),
    (SHOOTING_LASER, 0.001),
    (HIT_ENEMY, 3.0),
    (DROPPED_ONE_TARGET, -1.0),
    (DROPPED_TARGETS, -2.0),
    (HOME_BASE, 3.0),
    (TARGET_PICKUP, 1.0),
    (WALL, -1.0),
];

/// 報酬テーブルのエラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RewardError {
    #[error("未登録の報酬名です: {0}")]
    UnknownReward(String),
}

/// 名前付きの報酬値の集合
#[derive(Debug, Clone, PartialEq)]
pub struct RewardTable {
    entries: BTreeMap<String, f64>,
}

impl RewardTable {
    /// 標準値でテーブルを構築
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_REWARDS
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }

    /// 標準値に上書き値を適用してテーブルを構築
    ///
    /// # 引数
    ///
    /// * `overrides` - 報酬名から値へのマップ
    ///
    /// # 戻り値
    ///
    /// 構築されたテーブル。標準に無い名前が含まれる場合はエラー
    pub fn with_overrides<'a, I>(overrides: I) -> Result<Self, RewardError>
    where
        I: IntoIterator<Item = (&'a String, &'a f64)>,
    {
        let mut table = Self::standard();
        for (name, value) in overrides {
            match table.entries.get_mut(name) {
                Some(entry) => *entry = *value,
                None => return Err(RewardError::UnknownReward(name.clone())),
            }
        }
        Ok(table)
    }

    /// 報酬値の取得
    pub fn get(&self, name: &str) -> Result<f64, RewardError> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| RewardError::UnknownReward(name.to_string()))
    }

    /// 登録済みの全エントリ
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 物理層から通知される接触イベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEvent {
    /// 基地への進入
    HomeBaseContact { team: TeamId },
    /// ターゲットとの接触（接触時点の状態）
    TargetContact { carried: bool, in_base_team: Option<TeamId> },
    /// 壁との衝突
    WallContact,
}

/// 報酬の契機となるワールドイベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    Collision(CollisionEvent),
    /// このティックにレーザーを発射した
    LaserFired,
    /// レーザーが敵に命中した
    EnemyHit,
    /// 敵のレーザーで凍結された
    Frozen,
    /// 運搬中のターゲットを落とした
    DroppedTargets { count: u32 },
}

/// ワールドイベントに応じて報酬を適用するシェーパー
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardShaper {
    frozen: f64,
    shooting_laser: f64,
    hit_enemy: f64,
    dropped_one_target: f64,
    dropped_targets: f64,
    home_base: f64,
    target_pickup: f64,
    wall: f64,
}

impl RewardShaper {
    /// テーブルから全ての報酬値を解決してシェーパーを作成
    pub fn new(table: &RewardTable) -> Result<Self, RewardError> {
        Ok(Self {
            frozen: table.get(FROZEN)?,
            shooting_laser: table.get(SHOOTING_LASER)?,
            hit_enemy: table.get(HIT_ENEMY)?,
            dropped_one_target: table.get(DROPPED_ONE_TARGET)?,
            dropped_targets: table.get(DROPPED_TARGETS)?,
            home_base: table.get(HOME_BASE)?,
            target_pickup: table.get(TARGET_PICKUP)?,
            wall: table.get(WALL)?,
        })
    }

    /// イベントに対応する報酬値を計算（適用はしない）
    ///
    /// 報酬の条件を満たさない場合はNone
    pub fn evaluate<A: IControllable + ?Sized>(&self, agent: &A, event: &WorldEvent) -> Option<f64> {
        match *event {
            WorldEvent::Collision(CollisionEvent::HomeBaseContact { team }) => {
                (team == agent.get_team() && agent.get_cargo() > 0).then_some(self.home_base)
            }
            WorldEvent::Collision(CollisionEvent::TargetContact { carried, in_base_team }) => {
                let eligible = !carried && in_base_team != Some(agent.get_team());
                let can_secure = !agent.is_frozen() && agent.get_cargo() < CARGO_CAPACITY;
                (eligible && can_secure).then_some(self.target_pickup)
            }
            WorldEvent::Collision(CollisionEvent::WallContact) => Some(self.wall),
            WorldEvent::LaserFired => Some(self.shooting_laser),
            WorldEvent::EnemyHit => Some(self.hit_enemy),
            WorldEvent::Frozen => Some(self.frozen),
            WorldEvent::DroppedTargets { count } => match count {
                0 => None,
                1 => Some(self.dropped_one_target),
                _ => Some(self.dropped_targets),
            },
        }
    }

    /// イベントに対応する報酬をエージェントに即時適用
    ///
    /// # 戻り値
    ///
    /// 適用した報酬値（適用しなかった場合は0）
    pub fn on_event<A: IControllable + ?Sized>(&self, agent: &mut A, event: &WorldEvent) -> f64 {
        match self.evaluate(agent, event) {
            Some(reward) => {
                agent.apply_reward(reward);
                debug!(
                    agent_id = agent.get_id(),
                    event = ?event,
                    reward = reward,
                    "REWARD_EVENT: イベント報酬を適用しました"
                );
                reward
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{agent::CaptureAgent, common::Position3D};

    fn agent() -> CaptureAgent {
        CaptureAgent::new(0, "blue-1".to_string(), 1, Position3D::zero(), 0.0)
    }

    fn shaper() -> RewardShaper {
        RewardShaper::new(&RewardTable::standard()).unwrap()
    }

    #[test]
    fn test_standard_table_values() {
        let table = RewardTable::standard();
        assert_eq!(table.len(), 8);
        assert_eq!(table.get("frozen"), Ok(-1.0));
        assert_eq!(table.get("shooting-laser"), Ok(0.001));
        assert_eq!(table.get("hit-enemy"), Ok(3.0));
        assert_eq!(table.get("dropped-one-target"), Ok(-1.0));
        assert_eq!(table.get("dropped-targets"), Ok(-2.0));
        assert_eq!(table.get("home-base"), Ok(3.0));
        assert_eq!(table.get("target-pickup"), Ok(1.0));
        assert_eq!(table.get("wall"), Ok(-1.0));
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let table = RewardTable::standard();
        assert_eq!(table.get("teleport"), Err(RewardError::UnknownReward("teleport".to_string())));

        let overrides: BTreeMap<String, f64> = [("teleport".to_string(), 1.0)].into_iter().collect();
        assert!(RewardTable::with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_overrides_replace_values() {
        let overrides: BTreeMap<String, f64> = [("wall".to_string(), -0.5)].into_iter().collect();
        let table = RewardTable::with_overrides(&overrides).unwrap();
        assert_eq!(table.get("wall"), Ok(-0.5));
        assert_eq!(table.get("hit-enemy"), Ok(3.0));
    }

    #[test]
    fn test_home_base_requires_own_team_and_cargo() {
        let shaper = shaper();
        let mut agent = agent();
        let own = WorldEvent::Collision(CollisionEvent::HomeBaseContact { team: 1 });
        let other = WorldEvent::Collision(CollisionEvent::HomeBaseContact { team: 2 });

        assert_eq!(shaper.on_event(&mut agent, &own), 0.0);
        agent.cargo = 2;
        assert_eq!(shaper.on_event(&mut agent, &other), 0.0);
        assert_eq!(shaper.on_event(&mut agent, &own), 3.0);
        assert_eq!(agent.rewards.total, 3.0);
    }

    #[test]
    fn test_target_contact_requires_eligible_and_unfrozen() {
        let shaper = shaper();
        let mut agent = agent();
        let free = WorldEvent::Collision(CollisionEvent::TargetContact { carried: false, in_base_team: None });
        let carried = WorldEvent::Collision(CollisionEvent::TargetContact { carried: true, in_base_team: None });
        let own_base = WorldEvent::Collision(CollisionEvent::TargetContact { carried: false, in_base_team: Some(1) });
        let enemy_base = WorldEvent::Collision(CollisionEvent::TargetContact { carried: false, in_base_team: Some(2) });

        assert_eq!(shaper.evaluate(&agent, &free), Some(1.0));
        assert_eq!(shaper.evaluate(&agent, &carried), None);
        assert_eq!(shaper.evaluate(&agent, &own_base), None);
        assert_eq!(shaper.evaluate(&agent, &enemy_base), Some(1.0));

        agent.freeze(2);
        assert_eq!(shaper.evaluate(&agent, &free), None);
    }

    #[test]
    fn test_full_agent_gets_no_pickup_reward() {
        let shaper = shaper();
        let mut agent = agent();
        let free = WorldEvent::Collision(CollisionEvent::TargetContact { carried: false, in_base_team: None });

        agent.cargo = CARGO_CAPACITY - 1;
        assert_eq!(shaper.evaluate(&agent, &free), Some(1.0));
        agent.cargo = CARGO_CAPACITY;
        assert_eq!(shaper.on_event(&mut agent, &free), 0.0);
        assert_eq!(agent.rewards.applications, 0);
    }

    #[test]
    fn test_drop_rewards_depend_on_count() {
        let shaper = shaper();
        let agent = agent();
        assert_eq!(shaper.evaluate(&agent, &WorldEvent::DroppedTargets { count: 0 }), None);
        assert_eq!(shaper.evaluate(&agent, &WorldEvent::DroppedTargets { count: 1 }), Some(-1.0));
        assert_eq!(shaper.evaluate(&agent, &WorldEvent::DroppedTargets { count: 3 }), Some(-2.0));
    }

    #[test]
    fn test_laser_and_freeze_events() {
        let shaper = shaper();
        let mut agent = agent();
        shaper.on_event(&mut agent, &WorldEvent::LaserFired);
        shaper.on_event(&mut agent, &WorldEvent::EnemyHit);
        shaper.on_event(&mut agent, &WorldEvent::Frozen);
        shaper.on_event(&mut agent, &WorldEvent::Collision(CollisionEvent::WallContact));
        assert!((agent.rewards.total - (0.001 + 3.0 - 1.0 - 1.0)).abs() < 1e-12);
        assert_eq!(agent.rewards.applications, 4);
    }
}
