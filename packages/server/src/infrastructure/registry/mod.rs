//! 接続中セッションの共有状態
//!
//! - `room_registry`: ルーム → セッション集合
//! - `presence_ledger`: (ルーム, ユーザー) → セッション数

pub mod presence_ledger;
pub mod room_registry;

pub use presence_ledger::PresenceLedger;
pub use room_registry::RoomRegistry;
