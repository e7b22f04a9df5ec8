//! メッセージ送信（通知）の実装
//!
//! - `broadcast_bus`: Room Registry を使ったルーム単位のブロードキャスト

pub mod broadcast_bus;

pub use broadcast_bus::{BroadcastBus, encode_event};
