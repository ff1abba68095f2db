//! # capsim
//!
//! 2チーム対戦のキャプチャー＆リターン・ミニゲームにおけるエージェント制御コアと、
//! それを単体で動かすための運動学アリーナを提供します。
//!
//! - [`control`]: アクションのデコード、方位サーボ、オートパイロット、報酬シェーピング
//! - [`models`]: エージェント・ターゲット・基地のデータモデル
//! - [`arena`]: 物理・衝突層の代替となる簡易アリーナ
//! - [`simulation`]: エピソード単位のシミュレーションエンジン
//! - [`scenario`]: YAMLシナリオ設定

pub mod arena;
pub mod control;
pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
