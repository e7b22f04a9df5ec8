//! UseCase: 参加者切断処理（Closing → Closed）
//!
//! ## 処理内容
//!
//! 1. Room Registry からセッションを外す（冪等）
//! 2. Presence Ledger を減算し、1 → 0 の遷移だった場合のみオフライン通知をルームにブロードキャスト
//! 3. 最終接続時刻をストアに記録
//! 4. 接続を閉じる
//!
//! 読み込みループの終了、生存確認のタイムアウト、配信失敗による強制切断、
//! サーバーのシャットダウンのどれが先に起きても、この処理はセッションごとに一度だけ実行される。

use std::sync::Arc;

use devlink_shared::time::Clock;

use crate::{
    domain::{ChatStore, HubEvent, MessagePusher, SessionHandle},
    infrastructure::registry::{PresenceLedger, RoomRegistry},
};

/// 切断処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// 既に別の経路で終了処理済み
    AlreadyClosed,
    /// 今回の呼び出しで終了処理を行った
    Closed { went_offline: bool },
}

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<RoomRegistry>,
    ledger: Arc<PresenceLedger>,
    store: Arc<dyn ChatStore>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        ledger: Arc<PresenceLedger>,
        store: Arc<dyn ChatStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            ledger,
            store,
            message_pusher,
            clock,
        }
    }

    /// 参加者切断を実行
    pub async fn execute(&self, session: &SessionHandle) -> Teardown {
        if !session.mark_closed() {
            return Teardown::AlreadyClosed;
        }

        // 1. Registry から外す（配信失敗で既に外されていても良い）
        self.registry.remove(&session.room_id, &session.id);

        // 2. Presence Ledger の減算とオフライン通知（1 → 0 の遷移のときだけ）
        //    減算と通知は同じユーザーの接続処理と直列化される
        let last_seen = self.clock.now();
        let went_offline = self
            .ledger
            .decrement_with(&session.room_id, &session.user_id, || {
                self.message_pusher.publish(
                    &session.room_id,
                    &HubEvent::PresenceOffline {
                        user_id: session.user_id,
                        last_seen,
                    },
                );
            });

        // 3. 最終接続時刻の記録（通知の後に行う。失敗してもログのみ）
        if let Err(e) = self.store.set_last_seen(&session.user_id, last_seen).await {
            tracing::error!(user_id = %session.user_id, "Failed to record last_seen: {}", e);
        }

        // 4. 接続を閉じる
        session.force_close();

        tracing::info!(
            session_id = %session.id,
            user_id = %session.user_id,
            room_id = %session.room_id,
            went_offline,
            connected_secs = (last_seen - session.connected_at).num_seconds(),
            "Session closed"
        );

        Teardown::Closed { went_offline }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatMessage, MessageId, MockChatStore, Outgoing, RoomId, StoreError, UserId},
        infrastructure::{message_pusher::BroadcastBus, store::InMemoryChatStore},
        usecase::ConnectParticipantUseCase,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use devlink_shared::time::FixedClock;
    use std::time::Duration;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 終了処理がセッションごとに一度だけ実行されること
    // - オフライン通知は最後のセッションが閉じたときだけ発生すること
    // - 配信失敗でルームから外されたセッションも正しく減算されること
    // - 最終接続時刻の記録中に再接続されても、最後に届く通知がオンラインであること
    //
    // 【なぜこのテストが必要か】
    // - 読み込みループの終了と強制切断が同時に起きても二重に減算してはならない
    // - 同じユーザーの複数端末はオフライン通知 1 回にまとめる必要がある
    // ========================================

    const NOW_MILLIS: i64 = 1_700_000_000_000;

    struct Fixture {
        registry: Arc<RoomRegistry>,
        ledger: Arc<PresenceLedger>,
        store: Arc<InMemoryChatStore>,
        connect: ConnectParticipantUseCase,
        disconnect: DisconnectParticipantUseCase,
    }

    fn create_fixture() -> Fixture {
        let registry = Arc::new(RoomRegistry::new());
        let ledger = Arc::new(PresenceLedger::new());
        let store = Arc::new(InMemoryChatStore::new());
        let bus = Arc::new(BroadcastBus::new(registry.clone()));
        let connect = ConnectParticipantUseCase::new(registry.clone(), ledger.clone(), bus.clone());
        let disconnect = DisconnectParticipantUseCase::new(
            registry.clone(),
            ledger.clone(),
            store.clone(),
            bus,
            Arc::new(FixedClock::from_millis(NOW_MILLIS)),
        );
        Fixture {
            registry,
            ledger,
            store,
            connect,
            disconnect,
        }
    }

    fn connect_session(
        fixture: &Fixture,
        user_id: UserId,
        room_id: RoomId,
    ) -> (SessionHandle, mpsc::Receiver<Outgoing>) {
        let (tx, rx) = mpsc::channel(16);
        let session = SessionHandle::new(user_id, room_id, FixedClock::from_millis(0).now(), tx);
        fixture.connect.execute(&session);
        (session, rx)
    }

    fn drain_events(rx: &mut mpsc::Receiver<Outgoing>) -> Vec<serde_json::Value> {
        let mut events = Vec::new();
        while let Ok(item) = rx.try_recv() {
            if let Outgoing::Event(text) = item {
                events.push(serde_json::from_str(&text).unwrap());
            }
        }
        events
    }

    fn offline_events_for(events: &[serde_json::Value], user_id: &UserId) -> usize {
        events
            .iter()
            .filter(|e| e["status"] == "offline" && e["user_id"] == user_id.to_string())
            .count()
    }

    #[tokio::test]
    async fn test_last_session_goes_offline() {
        // テスト項目: 唯一のセッションが閉じるとオフライン通知が届き、最終接続時刻が記録される
        // given (前提条件):
        let fixture = create_fixture();
        let room_id = RoomId::generate();
        let alice = UserId::generate();
        let bob = UserId::generate();
        let (_alice_session, mut alice_rx) = connect_session(&fixture, alice, room_id);
        let (bob_session, _bob_rx) = connect_session(&fixture, bob, room_id);
        drain_events(&mut alice_rx);

        // when (操作):
        let result = fixture.disconnect.execute(&bob_session).await;

        // then (期待する結果):
        assert_eq!(result, Teardown::Closed { went_offline: true });
        assert!(!fixture.registry.contains(&room_id, &bob_session.id));
        assert_eq!(fixture.ledger.count(&room_id, &bob), 0);
        assert!(!bob_session.is_live());
        let events = drain_events(&mut alice_rx);
        assert_eq!(
            events,
            vec![serde_json::json!({
                "type": "presence",
                "status": "offline",
                "user_id": bob.to_string(),
                "last_seen": "2023-11-14T22:13:20.000Z",
            })]
        );
        assert_eq!(
            fixture.store.last_seen(&bob).await,
            Some(FixedClock::from_millis(NOW_MILLIS).now())
        );
    }

    #[tokio::test]
    async fn test_teardown_runs_only_once() {
        // テスト項目: 2 回目以降の切断処理は何もしない
        // given (前提条件):
        let fixture = create_fixture();
        let room_id = RoomId::generate();
        let alice = UserId::generate();
        let (session, _rx) = connect_session(&fixture, alice, room_id);
        let (_other, _other_rx) = connect_session(&fixture, alice, room_id);

        // when (操作):
        let first = fixture.disconnect.execute(&session).await;
        let second = fixture.disconnect.execute(&session.clone()).await;

        // then (期待する結果):
        assert_eq!(first, Teardown::Closed { went_offline: false });
        assert_eq!(second, Teardown::AlreadyClosed);
        assert_eq!(fixture.ledger.count(&room_id, &alice), 1);
    }

    #[tokio::test]
    async fn test_multiple_devices_collapse_to_one_offline_event() {
        // テスト項目: 同じユーザーの 2 台の接続が閉じてもオフライン通知は 1 回だけ
        // given (前提条件):
        let fixture = create_fixture();
        let room_id = RoomId::generate();
        let alice = UserId::generate();
        let bob = UserId::generate();
        let (_alice_session, mut alice_rx) = connect_session(&fixture, alice, room_id);
        let (bob_phone, _rx1) = connect_session(&fixture, bob, room_id);
        let (bob_laptop, _rx2) = connect_session(&fixture, bob, room_id);

        // when (操作):
        fixture.disconnect.execute(&bob_phone).await;
        fixture.disconnect.execute(&bob_laptop).await;

        // then (期待する結果):
        let events = drain_events(&mut alice_rx);
        assert_eq!(offline_events_for(&events, &bob), 1);
    }

    #[tokio::test]
    async fn test_evicted_session_is_still_counted_down() {
        // テスト項目: 配信失敗でルームから外されたセッションも減算・オフライン通知される
        // given (前提条件):
        let fixture = create_fixture();
        let room_id = RoomId::generate();
        let alice = UserId::generate();
        let bob = UserId::generate();
        let (_alice_session, mut alice_rx) = connect_session(&fixture, alice, room_id);
        let (bob_session, _bob_rx) = connect_session(&fixture, bob, room_id);
        fixture.registry.remove(&room_id, &bob_session.id);
        bob_session.force_close();
        drain_events(&mut alice_rx);

        // when (操作):
        let result = fixture.disconnect.execute(&bob_session).await;

        // then (期待する結果):
        assert_eq!(result, Teardown::Closed { went_offline: true });
        assert_eq!(fixture.ledger.count(&room_id, &bob), 0);
        assert_eq!(offline_events_for(&drain_events(&mut alice_rx), &bob), 1);
    }

    #[tokio::test]
    async fn test_concurrent_teardown_of_many_devices() {
        // テスト項目: N 台の接続が並行に閉じてもオフライン通知はちょうど 1 回
        // given (前提条件):
        let fixture = Arc::new(create_fixture());
        let room_id = RoomId::generate();
        let observer = UserId::generate();
        let user = UserId::generate();
        let (_observer_session, mut observer_rx) = connect_session(&fixture, observer, room_id);
        let sessions: Vec<_> = (0..16)
            .map(|_| connect_session(&fixture, user, room_id))
            .collect();
        drain_events(&mut observer_rx);

        // when (操作): 各セッションを 2 回ずつ並行に閉じる
        let mut handles = Vec::new();
        for (session, _) in &sessions {
            for _ in 0..2 {
                let fixture = Arc::clone(&fixture);
                let session = session.clone();
                handles.push(tokio::spawn(async move {
                    fixture.disconnect.execute(&session).await
                }));
            }
        }
        let mut closed = 0;
        for handle in handles {
            if let Teardown::Closed { .. } = handle.await.unwrap() {
                closed += 1;
            }
        }

        // then (期待する結果):
        assert_eq!(closed, 16);
        assert_eq!(fixture.ledger.count(&room_id, &user), 0);
        assert_eq!(fixture.registry.session_count(&room_id), 1);
        assert_eq!(offline_events_for(&drain_events(&mut observer_rx), &user), 1);
    }

    #[tokio::test]
    async fn test_last_seen_failure_does_not_block_offline_event() {
        // テスト項目: 最終接続時刻の記録に失敗してもオフライン通知は行われる
        // given (前提条件):
        let registry = Arc::new(RoomRegistry::new());
        let ledger = Arc::new(PresenceLedger::new());
        let bus = Arc::new(BroadcastBus::new(registry.clone()));
        let mut store = MockChatStore::new();
        store
            .expect_set_last_seen()
            .times(1)
            .returning(|_, _| Err(StoreError::PersistenceFailure("db down".to_string())));
        let connect = ConnectParticipantUseCase::new(registry.clone(), ledger.clone(), bus.clone());
        let disconnect = DisconnectParticipantUseCase::new(
            registry.clone(),
            ledger,
            Arc::new(store),
            bus,
            Arc::new(FixedClock::from_millis(NOW_MILLIS)),
        );
        let room_id = RoomId::generate();
        let (tx1, mut observer_rx) = mpsc::channel(8);
        let (tx2, _rx2) = mpsc::channel(8);
        let observer = SessionHandle::new(
            UserId::generate(),
            room_id,
            FixedClock::from_millis(0).now(),
            tx1,
        );
        let leaver = SessionHandle::new(
            UserId::generate(),
            room_id,
            FixedClock::from_millis(0).now(),
            tx2,
        );
        connect.execute(&observer);
        connect.execute(&leaver);
        drain_events(&mut observer_rx);

        // when (操作):
        let result = disconnect.execute(&leaver).await;

        // then (期待する結果):
        assert_eq!(result, Teardown::Closed { went_offline: true });
        assert_eq!(
            offline_events_for(&drain_events(&mut observer_rx), &leaver.user_id),
            1
        );
    }

    /// 最終接続時刻の記録に時間がかかるストア
    struct SlowLastSeenStore {
        inner: InMemoryChatStore,
        delay: Duration,
    }

    #[async_trait]
    impl ChatStore for SlowLastSeenStore {
        async fn room_contains_participant(
            &self,
            room_id: &RoomId,
            user_id: &UserId,
        ) -> Result<bool, StoreError> {
            self.inner.room_contains_participant(room_id, user_id).await
        }

        async fn insert_message(&self, message: &ChatMessage) -> Result<MessageId, StoreError> {
            self.inner.insert_message(message).await
        }

        async fn set_last_seen(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.set_last_seen(user_id, at).await
        }
    }

    #[tokio::test]
    async fn test_reconnect_during_slow_last_seen_ends_online() {
        // テスト項目: 最終接続時刻の記録中に同じユーザーが再接続しても、最後の通知はオンライン
        // given (前提条件):
        let registry = Arc::new(RoomRegistry::new());
        let ledger = Arc::new(PresenceLedger::new());
        let bus = Arc::new(BroadcastBus::new(registry.clone()));
        let connect = ConnectParticipantUseCase::new(registry.clone(), ledger.clone(), bus.clone());
        let disconnect = Arc::new(DisconnectParticipantUseCase::new(
            registry.clone(),
            ledger.clone(),
            Arc::new(SlowLastSeenStore {
                inner: InMemoryChatStore::new(),
                delay: Duration::from_millis(300),
            }),
            bus,
            Arc::new(FixedClock::from_millis(NOW_MILLIS)),
        ));
        let room_id = RoomId::generate();
        let alice = UserId::generate();
        let bob = UserId::generate();
        let (tx_alice, mut alice_rx) = mpsc::channel(16);
        let (tx_bob1, _bob1_rx) = mpsc::channel(16);
        let (tx_bob2, _bob2_rx) = mpsc::channel(16);
        let started = FixedClock::from_millis(0).now();
        let alice_session = SessionHandle::new(alice, room_id, started, tx_alice);
        let bob_first = SessionHandle::new(bob, room_id, started, tx_bob1);
        let bob_second = SessionHandle::new(bob, room_id, started, tx_bob2);
        connect.execute(&alice_session);
        connect.execute(&bob_first);

        // when (操作): 1 台目の切断処理中（記録待ち）に 2 台目が接続する
        let teardown = {
            let disconnect = Arc::clone(&disconnect);
            let bob_first = bob_first.clone();
            tokio::spawn(async move { disconnect.execute(&bob_first).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        connect.execute(&bob_second);
        let result = teardown.await.unwrap();

        // then (期待する結果):
        assert_eq!(result, Teardown::Closed { went_offline: true });
        let statuses: Vec<_> = drain_events(&mut alice_rx)
            .into_iter()
            .filter(|e| e["type"] == "presence" && e["user_id"] == bob.to_string())
            .map(|e| e["status"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(statuses, vec!["online", "offline", "online"]);
        assert_eq!(ledger.count(&room_id, &bob), 1);
    }
}
