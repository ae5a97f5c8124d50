// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Snapshot Store (persistence interface)
// ─────────────────────────────────────────────────────────────────────
//! Key-value persistence of avatars and sessions.
//!
//! The kernel only needs load/save by id. The in-memory backend keeps
//! JSON snapshots so that a restored session is a faithful copy and not
//! a shared reference. Production deployments plug a database in via
//! the `SnapshotStore` trait.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use tactik_types::{AvatarDna, ConversationSession, TactikError, TactikResult};

pub trait SnapshotStore: Send + Sync {
    fn save_avatar(&self, dna: &AvatarDna) -> TactikResult<()>;
    fn load_avatar(&self, avatar_id: &str) -> TactikResult<Option<AvatarDna>>;
    fn save_session(&self, session: &ConversationSession) -> TactikResult<()>;
    fn load_session(&self, session_id: &str) -> TactikResult<Option<ConversationSession>>;
    fn delete_session(&self, session_id: &str) -> TactikResult<()>;
}

/// JSON snapshots in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    avatars: Mutex<HashMap<String, String>>,
    sessions: Mutex<HashMap<String, String>>,
}

fn encode<T: Serialize>(value: &T) -> TactikResult<String> {
    serde_json::to_string(value).map_err(|e| TactikError::Persistence(format!("encode: {e}")))
}

fn decode<T: DeserializeOwned>(raw: &str) -> TactikResult<T> {
    serde_json::from_str(raw).map_err(|e| TactikError::Persistence(format!("decode: {e}")))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn avatar_count(&self) -> usize {
        self.avatars.lock().len()
    }
}

impl SnapshotStore for InMemoryStore {
    fn save_avatar(&self, dna: &AvatarDna) -> TactikResult<()> {
        let raw = encode(dna)?;
        self.avatars.lock().insert(dna.avatar_id.clone(), raw);
        Ok(())
    }

    fn load_avatar(&self, avatar_id: &str) -> TactikResult<Option<AvatarDna>> {
        let raw = self.avatars.lock().get(avatar_id).cloned();
        raw.as_deref().map(decode::<AvatarDna>).transpose()
    }

    fn save_session(&self, session: &ConversationSession) -> TactikResult<()> {
        let raw = encode(session)?;
        self.sessions.lock().insert(session.session_id.clone(), raw);
        Ok(())
    }

    fn load_session(&self, session_id: &str) -> TactikResult<Option<ConversationSession>> {
        let raw = self.sessions.lock().get(session_id).cloned();
        raw.as_deref().map(decode::<ConversationSession>).transpose()
    }

    fn delete_session(&self, session_id: &str) -> TactikResult<()> {
        self.sessions.lock().remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use tactik_types::{DriftState, GateState};

    #[test]
    fn test_avatar_roundtrip() {
        let store = InMemoryStore::new();
        let dna = fixtures::canonical_dna();
        store.save_avatar(&dna).unwrap();
        assert_eq!(store.load_avatar("ceo_retail").unwrap(), Some(dna));
        assert_eq!(store.load_avatar("nobody").unwrap(), None);
    }

    #[test]
    fn test_session_snapshot_is_a_copy() {
        let store = InMemoryStore::new();
        let mut session = ConversationSession::new(
            "s1",
            fixtures::GOAL,
            vec!["ceo_retail".into()],
            GateState::new(0.52),
            DriftState::new(Default::default()),
        );
        store.save_session(&session).unwrap();
        session.empathy_pauses = 5;
        let loaded = store.load_session("s1").unwrap().unwrap();
        assert_eq!(loaded.empathy_pauses, 0);
        store.delete_session("s1").unwrap();
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn test_corrupt_snapshot_is_persistence_error() {
        let store = InMemoryStore::new();
        store.sessions.lock().insert("bad".into(), "{oops".into());
        assert!(matches!(
            store.load_session("bad"),
            Err(TactikError::Persistence(_))
        ));
    }
}
