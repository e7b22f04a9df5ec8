//! Room Registry
//!
//! ルーム ID → 生存中セッション集合 のマップ。
//!
//! ## ロック構造
//!
//! - 外側: `DashMap`（シャード単位のロック）でルームを引く
//! - 内側: ルームごとの `parking_lot::Mutex` でメンバー集合を守る
//!
//! ロック順序は常に「シャード → ルーム」。ブロードキャストはシャードのロックを
//! 解放してからルームのロックだけを保持して配信するため、別ルームへの配信は
//! 並行に進み、同じルームへの配信はルームのロックで直列化される。

use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::domain::{RoomId, SessionHandle, SessionId};

type RoomMembers = HashMap<SessionId, SessionHandle>;

/// ルームごとの生存中セッション集合
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Arc<Mutex<RoomMembers>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// セッションをルームに登録
    pub fn admit(&self, room_id: &RoomId, session: SessionHandle) {
        let room = self.rooms.entry(*room_id).or_default();
        let mut members = room.lock();
        tracing::debug!(
            room_id = %room_id,
            session_id = %session.id,
            members = members.len() + 1,
            "session admitted to room"
        );
        members.insert(session.id, session);
    }

    /// セッションをルームから外す（冪等）
    ///
    /// 実際に外した場合だけハンドルを返す。最後のメンバーが抜けたルームは削除する。
    pub fn remove(&self, room_id: &RoomId, session_id: &SessionId) -> Option<SessionHandle> {
        let removed = {
            let room = self.rooms.get(room_id)?;
            let mut members = room.lock();
            members.remove(session_id)
        };

        self.rooms
            .remove_if(room_id, |_, members| members.lock().is_empty());

        if removed.is_some() {
            tracing::debug!(room_id = %room_id, session_id = %session_id, "session removed from room");
        }
        removed
    }

    /// ルームのロックを保持したまま各メンバーに `f` を適用する
    ///
    /// 同じルームに対する呼び出しは直列化される。`f` の中からこのレジストリを
    /// 変更してはならない（ロックは再入不可）。
    pub fn for_each_member(&self, room_id: &RoomId, mut f: impl FnMut(&SessionHandle)) {
        let Some(room) = self.room(room_id) else {
            return;
        };
        let members = room.lock();
        for session in members.values() {
            f(session);
        }
    }

    pub fn contains(&self, room_id: &RoomId, session_id: &SessionId) -> bool {
        self.room(room_id)
            .is_some_and(|room| room.lock().contains_key(session_id))
    }

    pub fn session_count(&self, room_id: &RoomId) -> usize {
        self.room(room_id).map_or(0, |room| room.lock().len())
    }

    /// メンバーが 1 人以上いるルームの数
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// 全ルームの全セッション（シャットダウン用）
    pub fn all_sessions(&self) -> Vec<SessionHandle> {
        let rooms: Vec<Arc<Mutex<RoomMembers>>> =
            self.rooms.iter().map(|entry| Arc::clone(entry.value())).collect();
        rooms
            .iter()
            .flat_map(|room| room.lock().values().cloned().collect::<Vec<_>>())
            .collect()
    }

    fn room(&self, room_id: &RoomId) -> Option<Arc<Mutex<RoomMembers>>> {
        self.rooms.get(room_id).map(|entry| Arc::clone(entry.value()))
    }
}
