// 基本的なデータ型と数学ユーティリティ
pub mod common;

// 制御コアとの境界インターフェース（trait）定義
pub mod traits;

// 各モデルの実装
pub mod agent;
pub mod base;
pub mod target;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use agent::{CaptureAgent, RewardAccumulator, CARGO_CAPACITY};
pub use base::HomeBase;
pub use target::{Target, TargetRing};
