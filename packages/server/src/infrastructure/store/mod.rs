//! ChatStore の実装
//!
//! - `inmemory`: インメモリ実装（テスト・開発用）
//! - `sqlite`: SQLite 実装

pub mod inmemory;
pub mod sqlite;

pub use inmemory::InMemoryChatStore;
pub use sqlite::SqliteChatStore;
