//! Presence Ledger
//!
//! (ルーム, ユーザー) → 生存中セッション数 の参照カウント。
//! オンライン / オフラインの通知は 0→1 / 1→0 の遷移でだけ発火させる。
//! 同じユーザーが複数タブ・複数端末から接続しても通知は 1 組にまとまる。

use dashmap::{DashMap, mapref::entry::Entry};

use crate::domain::{RoomId, UserId};

/// ルーム単位のプレゼンス参照カウント
#[derive(Default)]
pub struct PresenceLedger {
    counts: DashMap<(RoomId, UserId), usize>,
}

impl PresenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// セッション数を 1 増やす。0→1 の遷移なら `true`
    pub fn increment(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        self.increment_with(room_id, user_id, || {})
    }

    /// セッション数を 1 増やし、0→1 の遷移なら `on_online` を実行する
    ///
    /// `on_online` は同じ (ルーム, ユーザー) の他の遷移と直列に実行されるため、
    /// 遷移の順序と通知の順序が一致する。`on_online` の中から Ledger を操作してはならない。
    pub fn increment_with(&self, room_id: &RoomId, user_id: &UserId, on_online: impl FnOnce()) -> bool {
        let mut count = self.counts.entry((*room_id, *user_id)).or_insert(0);
        *count += 1;
        let went_online = *count == 1;
        if went_online {
            on_online();
        }
        went_online
    }

    /// セッション数を 1 減らす。1→0 の遷移なら `true`
    ///
    /// カウントが無い場合は何もしない（負にはならない）。
    pub fn decrement(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        self.decrement_with(room_id, user_id, || {})
    }

    /// セッション数を 1 減らし、1→0 の遷移なら `on_offline` を実行する
    ///
    /// 直列化の条件は `increment_with` と同じ。
    pub fn decrement_with(&self, room_id: &RoomId, user_id: &UserId, on_offline: impl FnOnce()) -> bool {
        match self.counts.entry((*room_id, *user_id)) {
            Entry::Occupied(mut entry) => {
                if *entry.get() <= 1 {
                    on_offline();
                    entry.remove();
                    true
                } else {
                    *entry.get_mut() -= 1;
                    false
                }
            }
            Entry::Vacant(_) => {
                tracing::warn!(room_id = %room_id, user_id = %user_id, "presence decrement without a live count");
                false
            }
        }
    }

    pub fn count(&self, room_id: &RoomId, user_id: &UserId) -> usize {
        self.counts
            .get(&(*room_id, *user_id))
            .map_or(0, |count| *count)
    }

    /// ルームでオンラインのユーザー（ID 順）
    pub fn online_users(&self, room_id: &RoomId) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .counts
            .iter()
            .filter(|entry| entry.key().0 == *room_id)
            .map(|entry| entry.key().1)
            .collect();
        users.sort();
        users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[test]
    fn test_first_increment_transitions_online() {
        // テスト項目: 最初の increment だけが 0→1 の遷移を返す
        // given (前提条件):
        let ledger = PresenceLedger::new();
        let room_id = RoomId::generate();
        let user_id = UserId::generate();

        // when (操作):
        let first = ledger.increment(&room_id, &user_id);
        let second = ledger.increment(&room_id, &user_id);

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(ledger.count(&room_id, &user_id), 2);
    }

    #[test]
    fn test_last_decrement_transitions_offline() {
        // テスト項目: 最後の decrement だけが 1→0 の遷移を返す
        // given (前提条件):
        let ledger = PresenceLedger::new();
        let room_id = RoomId::generate();
        let user_id = UserId::generate();
        ledger.increment(&room_id, &user_id);
        ledger.increment(&room_id, &user_id);

        // when (操作):
        let first = ledger.decrement(&room_id, &user_id);
        let second = ledger.decrement(&room_id, &user_id);

        // then (期待する結果):
        assert!(!first);
        assert!(second);
        assert_eq!(ledger.count(&room_id, &user_id), 0);
    }

    #[test]
    fn test_decrement_without_count_never_goes_negative() {
        // テスト項目: カウントが無い状態の decrement は遷移を返さず、負にならない
        // given (前提条件):
        let ledger = PresenceLedger::new();
        let room_id = RoomId::generate();
        let user_id = UserId::generate();

        // when (操作):
        let result = ledger.decrement(&room_id, &user_id);

        // then (期待する結果):
        assert!(!result);
        assert_eq!(ledger.count(&room_id, &user_id), 0);
        assert!(ledger.increment(&room_id, &user_id));
    }

    #[test]
    fn test_presence_is_scoped_per_room() {
        // テスト項目: 別ルームのカウントは独立している
        // given (前提条件):
        let ledger = PresenceLedger::new();
        let room_a = RoomId::generate();
        let room_b = RoomId::generate();
        let user_id = UserId::generate();

        // when (操作):
        let online_a = ledger.increment(&room_a, &user_id);
        let online_b = ledger.increment(&room_b, &user_id);

        // then (期待する結果):
        assert!(online_a);
        assert!(online_b);
        assert_eq!(ledger.online_users(&room_a), vec![user_id]);
    }

    #[test]
    fn test_concurrent_sessions_collapse_to_one_transition_pair() {
        // テスト項目: N 本の並行セッションでも online / offline の遷移は 1 回ずつ
        // given (前提条件):
        let ledger = Arc::new(PresenceLedger::new());
        let room_id = RoomId::generate();
        let user_id = UserId::generate();
        let onlines = AtomicUsize::new(0);
        let offlines = AtomicUsize::new(0);

        // when (操作): 各スレッドが increment → decrement を行う
        std::thread::scope(|scope| {
            for _ in 0..32 {
                let ledger = Arc::clone(&ledger);
                let onlines = &onlines;
                scope.spawn(move || {
                    if ledger.increment(&room_id, &user_id) {
                        onlines.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });
        std::thread::scope(|scope| {
            for _ in 0..32 {
                let ledger = Arc::clone(&ledger);
                let offlines = &offlines;
                scope.spawn(move || {
                    if ledger.decrement(&room_id, &user_id) {
                        offlines.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        // then (期待する結果):
        assert_eq!(onlines.load(Ordering::SeqCst), 1);
        assert_eq!(offlines.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.count(&room_id, &user_id), 0);
    }

    #[test]
    fn test_transition_callbacks_follow_transition_order() {
        // テスト項目: 接続と切断が入り乱れても、通知は遷移と同じ順序で交互に発生する
        // given (前提条件):
        let ledger = Arc::new(PresenceLedger::new());
        let room_id = RoomId::generate();
        let user_id = UserId::generate();
        let notifications = parking_lot::Mutex::new(Vec::new());

        // when (操作): 各スレッドが接続 → 切断を繰り返す
        std::thread::scope(|scope| {
            for _ in 0..8 {
                let ledger = Arc::clone(&ledger);
                let notifications = &notifications;
                scope.spawn(move || {
                    for _ in 0..100 {
                        ledger.increment_with(&room_id, &user_id, || {
                            notifications.lock().push("online")
                        });
                        ledger.decrement_with(&room_id, &user_id, || {
                            notifications.lock().push("offline")
                        });
                    }
                });
            }
        });

        // then (期待する結果): online / offline が交互に並び、offline で終わる
        let notifications = notifications.into_inner();
        assert!(!notifications.is_empty());
        for (index, status) in notifications.iter().enumerate() {
            let expected = if index % 2 == 0 { "online" } else { "offline" };
            assert_eq!(*status, expected, "notification #{index}");
        }
        assert_eq!(notifications.last(), Some(&"offline"));
        assert_eq!(ledger.count(&room_id, &user_id), 0);
    }
}
