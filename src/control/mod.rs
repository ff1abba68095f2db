// 離散アクションと移動意図
pub mod action;

// 移動提案の優先度解決
pub mod intent;

// 方位サーボとターゲット選択
pub mod navigation;

// スクリプト化されたオートパイロット
pub mod autopilot;

// 報酬テーブルとシェーピング
pub mod reward;

// 1ティックの制御処理
pub mod control_loop;

// 観測ベクトルの構築
pub mod observation;

// アクションの供給元
pub mod input;

// 便利な re-export
pub use action::{ActionDecoder, DiscreteAction, MotionIntent, Movement, Rotate, Translate};
pub use intent::{IntentBuilder, IntentSource};
pub use navigation::{TargetSelector, DEADBAND_DEGREES};
pub use autopilot::{AutopilotDecision, AutopilotMode, AutopilotPolicy};
pub use reward::{CollisionEvent, RewardError, RewardShaper, RewardTable, WorldEvent};
pub use control_loop::{ControlLoop, WorldView, DEFAULT_TIME_PENALTY};
pub use observation::ObservationBuilder;
pub use input::{Key, ManualInput, NoActions, RandomActions, ScriptedActions};
