//! # Action モジュール
//!
//! 5要素の離散アクションベクトルを構造化された移動意図（MotionIntent）に変換します。
//!
//! ## アクションベクトルの構成
//!
//! | 要素 | 値域 | 意味 |
//! |------|------|------|
//! | 0 | {0,1,2} | 0: 並進なし, 1: 前進, 2: 後退 |
//! | 1 | {0,1,2} | 0: 回転なし, 1: 右回転, 2: 左回転 |
//! | 2 | {0,1} | 1: レーザー発射 |
//! | 3 | {0,1} | 1: 最寄りターゲットへ向かう |
//! | 4 | {0,1} | 1: 自チーム基地へ向かう |
//!
//! 値域外の値は検証せず、その要素の中立値（なし/無効）として扱います。

use serde::{Deserialize, Serialize};
use tracing::warn;

/// アクションベクトルの要素数
pub const ACTION_SIZE: usize = 5;

/// 各要素の選択肢の数（ポリシー出力の分岐サイズ）
pub const ACTION_BRANCHES: [usize; ACTION_SIZE] = [3, 3, 2, 2, 2];

/// 並進方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Translate {
    #[default]
    None,
    Forward,
    Backward,
}

impl Translate {
    /// 前方向を正とした符号
    pub fn sign(&self) -> f64 {
        match self {
            Translate::None => 0.0,
            Translate::Forward => 1.0,
            Translate::Backward => -1.0,
        }
    }
}

/// 回転方向（右 = 正の横軸 = 時計回り）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotate {
    #[default]
    None,
    Left,
    Right,
}

impl Rotate {
    /// 時計回りを正とした符号
    pub fn sign(&self) -> f64 {
        match self {
            Rotate::None => 0.0,
            Rotate::Left => -1.0,
            Rotate::Right => 1.0,
        }
    }
}

/// 並進と回転の組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Movement {
    pub translate: Translate,
    pub rotate: Rotate,
}

impl Movement {
    /// 何もしない移動
    pub fn idle() -> Self {
        Self::default()
    }

    /// 前進のみ
    pub fn forward() -> Self {
        Self { translate: Translate::Forward, rotate: Rotate::None }
    }

    /// 回転のみ
    pub fn turn(rotate: Rotate) -> Self {
        Self { translate: Translate::None, rotate }
    }
}

/// 1ティック分の移動意図
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionIntent {
    pub translate: Translate,
    pub rotate: Rotate,
    pub fire: bool,
    pub seek_target: bool,
    pub seek_base: bool,
}

impl MotionIntent {
    /// 並進と回転の部分を取り出す
    pub fn movement(&self) -> Movement {
        Movement { translate: self.translate, rotate: self.rotate }
    }

    /// 並進と回転の部分を置き換える
    pub fn with_movement(self, movement: Movement) -> Self {
        Self { translate: movement.translate, rotate: movement.rotate, ..self }
    }
}

/// ポリシーから受け取る離散アクションベクトル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscreteAction(pub [i32; ACTION_SIZE]);

impl DiscreteAction {
    pub fn new(values: [i32; ACTION_SIZE]) -> Self {
        Self(values)
    }

    /// 全要素が値域内かどうか
    pub fn is_in_domain(&self) -> bool {
        self.0
            .iter()
            .zip(ACTION_BRANCHES.iter())
            .all(|(&value, &branches)| value >= 0 && (value as usize) < branches)
    }
}

/// 離散アクションのデコーダー
pub struct ActionDecoder;

impl ActionDecoder {
    /// 離散アクションを移動意図に変換
    ///
    /// # 引数
    ///
    /// * `action` - 5要素の離散アクション
    ///
    /// # 戻り値
    ///
    /// デコードされた移動意図。値域外の要素は中立値になります。
    pub fn decode(action: &DiscreteAction) -> MotionIntent {
        if !action.is_in_domain() {
            warn!(
                action = ?action.0,
                "ACTION_OUT_OF_DOMAIN: 値域外のアクション要素を中立値として扱います"
            );
        }

        let [forward_axis, rotate_axis, shoot_axis, go_to_target_axis, go_to_base_axis] = action.0;

        let translate = match forward_axis {
            1 => Translate::Forward,
            2 => Translate::Backward,
            _ => Translate::None,
        };

        let rotate = match rotate_axis {
            1 => Rotate::Right,
            2 => Rotate::Left,
            _ => Rotate::None,
        };

        MotionIntent {
            translate,
            rotate,
            fire: shoot_axis == 1,
            seek_target: go_to_target_axis == 1,
            seek_base: go_to_base_axis == 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_each_slot() {
        let intent = ActionDecoder::decode(&DiscreteAction::new([1, 2, 1, 0, 1]));
        assert_eq!(intent.translate, Translate::Forward);
        assert_eq!(intent.rotate, Rotate::Left);
        assert!(intent.fire);
        assert!(!intent.seek_target);
        assert!(intent.seek_base);

        let intent = ActionDecoder::decode(&DiscreteAction::new([2, 1, 0, 1, 0]));
        assert_eq!(intent.translate, Translate::Backward);
        assert_eq!(intent.rotate, Rotate::Right);
        assert!(!intent.fire);
        assert!(intent.seek_target);
        assert!(!intent.seek_base);
    }

    #[test]
    fn test_zero_action_is_neutral() {
        assert_eq!(ActionDecoder::decode(&DiscreteAction::default()), MotionIntent::default());
    }

    #[test]
    fn test_out_of_domain_values_decode_to_neutral() {
        let action = DiscreteAction::new([3, -1, 2, 7, -4]);
        assert!(!action.is_in_domain());
        assert_eq!(ActionDecoder::decode(&action), MotionIntent::default());
    }

    #[test]
    fn test_with_movement_keeps_flags() {
        let intent = MotionIntent { fire: true, seek_base: true, ..Default::default() };
        let updated = intent.with_movement(Movement::forward());
        assert_eq!(updated.translate, Translate::Forward);
        assert!(updated.fire);
        assert!(updated.seek_base);
    }
}
