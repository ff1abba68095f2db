use crate::control::action::{MotionIntent, Movement};

/// 移動提案の出所
///
/// 宣言順が優先度の昇順です（後のものほど優先）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntentSource {
    /// デコードされたアクションの生の並進・回転
    Decoded,
    /// オートパイロット
    Autopilot,
    /// デコードされた「最寄りターゲットへ」フラグ
    SeekTarget,
    /// デコードされた「基地へ」フラグ
    SeekBase,
}

/// 1ティック内の移動提案を集め、優先度で解決するビルダー
///
/// 同じ出所から複数の提案があった場合は最後のものが採用されます。
#[derive(Debug, Clone, Default)]
pub struct IntentBuilder {
    proposals: Vec<(IntentSource, Movement)>,
    fire: bool,
    seek_target: bool,
    seek_base: bool,
}

impl IntentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 移動提案を記録
    pub fn propose(&mut self, source: IntentSource, movement: Movement) {
        self.proposals.push((source, movement));
    }

    /// 発射フラグを設定
    pub fn set_fire(&mut self, fire: bool) {
        self.fire = fire;
    }

    /// シークフラグを記録
    pub fn set_seek_flags(&mut self, seek_target: bool, seek_base: bool) {
        self.seek_target = seek_target;
        self.seek_base = seek_base;
    }

    /// 記録済みの提案
    pub fn proposals(&self) -> &[(IntentSource, Movement)] {
        &self.proposals
    }

    /// 最も優先度の高い提案を採用して移動意図を確定
    ///
    /// 提案が無い場合は停止（並進・回転なし）になります。
    pub fn resolve(&self) -> MotionIntent {
        let movement = self.proposals
            .iter()
            .max_by_key(|(source, _)| *source)
            .map(|(_, movement)| *movement)
            .unwrap_or_default();

        MotionIntent {
            fire: self.fire,
            seek_target: self.seek_target,
            seek_base: self.seek_base,
            ..MotionIntent::default()
        }
        .with_movement(movement)
    }
}
