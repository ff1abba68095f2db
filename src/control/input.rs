//! # Input モジュール
//!
//! 離散アクションの供給元（[`IActionSource`]）の実装を提供します。
//!
//! - [`NoActions`]: アクションを出さない（オートパイロットのみで動作）
//! - [`ManualInput`]: 押下キーをアクションベクトルに対応付ける手動操作
//! - [`ScriptedActions`]: あらかじめ決められたアクション列の再生
//! - [`RandomActions`]: シード付き乱数による一様ランダムなアクション

use std::collections::HashSet;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::control::action::{DiscreteAction, ACTION_BRANCHES, ACTION_SIZE};
use crate::models::traits::IActionSource;

/// 手動操作のキー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    A,
    S,
}

/// 押下キーの集合からアクションベクトルを作成
///
/// Up/Downは前進/後退、Right/Leftは右/左回転、Spaceは発射、
/// Aは最寄りターゲット、Sは基地へ向かうフラグに対応します。
/// 相反するキーが同時に押された場合はDown、Leftが優先されます。
pub fn map_keys(pressed: &HashSet<Key>) -> DiscreteAction {
    let mut action = [0; ACTION_SIZE];

    if pressed.contains(&Key::Up) {
        action[0] = 1;
    }
    if pressed.contains(&Key::Down) {
        action[0] = 2;
    }
    if pressed.contains(&Key::Right) {
        action[1] = 1;
    }
    if pressed.contains(&Key::Left) {
        action[1] = 2;
    }
    if pressed.contains(&Key::Space) {
        action[2] = 1;
    }
    if pressed.contains(&Key::A) {
        action[3] = 1;
    }
    if pressed.contains(&Key::S) {
        action[4] = 1;
    }

    DiscreteAction::new(action)
}

/// アクションを出さない供給元
#[derive(Debug, Default)]
pub struct NoActions;

impl IActionSource for NoActions {
    fn next_action(&mut self, _observation: &[f64]) -> Option<DiscreteAction> {
        None
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// 押下キーに基づく手動操作
///
/// キーの状態はティックごとのスケジュール、または`press`/`release`で更新します。
#[derive(Debug, Default)]
pub struct ManualInput {
    pressed: HashSet<Key>,
    schedule: Vec<Vec<Key>>,
    cursor: usize,
}

impl ManualInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// ティックごとの押下キーの列から作成
    pub fn from_schedule(schedule: Vec<Vec<Key>>) -> Self {
        Self { schedule, ..Self::default() }
    }

    pub fn press(&mut self, key: Key) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.pressed.remove(&key);
    }
}

impl IActionSource for ManualInput {
    fn next_action(&mut self, _observation: &[f64]) -> Option<DiscreteAction> {
        if let Some(keys) = self.schedule.get(self.cursor) {
            self.pressed = keys.iter().copied().collect();
            self.cursor += 1;
        } else if !self.schedule.is_empty() {
            self.pressed.clear();
        }
        Some(map_keys(&self.pressed))
    }

    fn name(&self) -> &str {
        "manual"
    }
}

/// 決められたアクション列を順に返す供給元
#[derive(Debug)]
pub struct ScriptedActions {
    actions: Vec<DiscreteAction>,
    cursor: usize,
    repeat: bool,
}

impl ScriptedActions {
    /// # 引数
    ///
    /// * `actions` - 再生するアクション列
    /// * `repeat` - 末尾に達したら先頭から繰り返すか（falseなら以降はNone）
    pub fn new(actions: Vec<DiscreteAction>, repeat: bool) -> Self {
        Self { actions, cursor: 0, repeat }
    }
}

impl IActionSource for ScriptedActions {
    fn next_action(&mut self, _observation: &[f64]) -> Option<DiscreteAction> {
        if self.actions.is_empty() {
            return None;
        }
        if self.cursor >= self.actions.len() {
            if !self.repeat {
                return None;
            }
            self.cursor = 0;
        }
        let action = self.actions[self.cursor];
        self.cursor += 1;
        Some(action)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// 各要素を値域内で一様ランダムに選ぶ供給元
#[derive(Debug)]
pub struct RandomActions {
    rng: StdRng,
}

impl RandomActions {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl IActionSource for RandomActions {
    fn next_action(&mut self, _observation: &[f64]) -> Option<DiscreteAction> {
        let mut action = [0; ACTION_SIZE];
        for (slot, branches) in action.iter_mut().zip(ACTION_BRANCHES.iter()) {
            *slot = self.rng.gen_range(0..*branches as i32);
        }
        Some(DiscreteAction::new(action))
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let pressed: HashSet<Key> = [Key::Up, Key::Left, Key::Space, Key::S].into_iter().collect();
        assert_eq!(map_keys(&pressed), DiscreteAction::new([1, 2, 1, 0, 1]));

        let pressed: HashSet<Key> = [Key::Down, Key::Right, Key::A].into_iter().collect();
        assert_eq!(map_keys(&pressed), DiscreteAction::new([2, 1, 0, 1, 0]));

        assert_eq!(map_keys(&HashSet::new()), DiscreteAction::default());
    }

    #[test]
    fn test_manual_schedule_then_released() {
        let mut input = ManualInput::from_schedule(vec![vec![Key::Up], vec![Key::Space]]);
        assert_eq!(input.next_action(&[]), Some(DiscreteAction::new([1, 0, 0, 0, 0])));
        assert_eq!(input.next_action(&[]), Some(DiscreteAction::new([0, 0, 1, 0, 0])));
        assert_eq!(input.next_action(&[]), Some(DiscreteAction::default()));
    }

    #[test]
    fn test_manual_press_and_release() {
        let mut input = ManualInput::new();
        input.press(Key::A);
        assert_eq!(input.next_action(&[]), Some(DiscreteAction::new([0, 0, 0, 1, 0])));
        input.release(Key::A);
        assert_eq!(input.next_action(&[]), Some(DiscreteAction::default()));
    }

    #[test]
    fn test_scripted_sequence() {
        let actions = vec![DiscreteAction::new([1, 0, 0, 0, 0]), DiscreteAction::new([0, 0, 0, 0, 1])];
        let mut once = ScriptedActions::new(actions.clone(), false);
        assert_eq!(once.next_action(&[]), Some(actions[0]));
        assert_eq!(once.next_action(&[]), Some(actions[1]));
        assert_eq!(once.next_action(&[]), None);

        let mut looping = ScriptedActions::new(actions.clone(), true);
        looping.next_action(&[]);
        looping.next_action(&[]);
        assert_eq!(looping.next_action(&[]), Some(actions[0]));
    }

    #[test]
    fn test_random_actions_in_domain_and_reproducible() {
        let mut first = RandomActions::new(7);
        let mut second = RandomActions::new(7);
        for _ in 0..100 {
            let action = first.next_action(&[]).unwrap();
            assert!(action.is_in_domain());
            assert_eq!(Some(action), second.next_action(&[]));
        }
    }
}
