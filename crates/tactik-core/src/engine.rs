// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Engine Context
// ─────────────────────────────────────────────────────────────────────
//! Process-level context owning the avatar registry, live sessions and
//! the collaborators.
//!
//! # Concurrency
//!
//! Each session sits behind its own async mutex, so turns on one session
//! are serialized while different sessions run in parallel. The registry
//! locks are `parking_lot` locks held only to look up or clone a handle;
//! none is held across an `.await`.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use tactik_types::{
    AvatarDna, AvdaMetrics, ConversationSession, SessionMetrics, TactikConfig, TactikError,
    TactikResult, TurnResult,
};

use crate::avda::{compute_avda, compute_avda_for_session};
use crate::generator::Generator;
use crate::orchestrator::ConversationOrchestrator;
use crate::report::{build_advisor_report, AdvisorReport};
use crate::store::SnapshotStore;

/// An avatar with the metrics computed when it was registered.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredAvatar {
    pub dna: AvatarDna,
    pub avda: AvdaMetrics,
}

type SessionHandle = Arc<Mutex<ConversationSession>>;

const SESSION_PREFIX: &str = "session_";

/// Counter value embedded in an engine-generated session id.
fn session_number(session_id: &str) -> Option<u64> {
    session_id.strip_prefix(SESSION_PREFIX)?.parse().ok()
}

pub struct Engine {
    orchestrator: ConversationOrchestrator,
    avatars: RwLock<HashMap<String, Arc<RegisteredAvatar>>>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
    store: Option<Arc<dyn SnapshotStore>>,
    next_session: AtomicU64,
}

impl Engine {
    pub fn new(config: TactikConfig, generator: Arc<dyn Generator>) -> TactikResult<Self> {
        Ok(Self {
            orchestrator: ConversationOrchestrator::new(config, generator)?,
            avatars: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            store: None,
            next_session: AtomicU64::new(1),
        })
    }

    /// Attach a persistence backend.
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &TactikConfig {
        self.orchestrator.config()
    }

    // ── Avatars ─────────────────────────────────────────────────────

    /// Validate, score and register an avatar.
    ///
    /// Re-registering an id requires a strictly higher `version`.
    pub fn register_avatar(&self, dna: AvatarDna) -> TactikResult<AvdaMetrics> {
        dna.validate()?;
        let avda = compute_avda(&dna);
        let mut avatars = self.avatars.write();
        if let Some(existing) = avatars.get(&dna.avatar_id) {
            if dna.version <= existing.dna.version {
                return Err(TactikError::Validation(format!(
                    "avatar '{}' version {} does not supersede registered version {}",
                    dna.avatar_id, dna.version, existing.dna.version
                )));
            }
        }
        if let Some(store) = &self.store {
            store.save_avatar(&dna)?;
        }
        log::info!(
            "registered avatar {} v{}: AVDA {:.1} {}",
            dna.avatar_id,
            dna.version,
            avda.avda_score,
            avda.classification
        );
        avatars.insert(
            dna.avatar_id.clone(),
            Arc::new(RegisteredAvatar {
                dna,
                avda: avda.clone(),
            }),
        );
        Ok(avda)
    }

    pub fn avatar(&self, avatar_id: &str) -> TactikResult<Arc<RegisteredAvatar>> {
        self.avatars
            .read()
            .get(avatar_id)
            .cloned()
            .ok_or_else(|| TactikError::avatar_not_found(avatar_id))
    }

    pub fn avda(&self, avatar_id: &str) -> TactikResult<AvdaMetrics> {
        Ok(self.avatar(avatar_id)?.avda.clone())
    }

    // ── Sessions ────────────────────────────────────────────────────

    /// Open a session for `goal` with 1..=`max_avatars` distinct,
    /// registered avatars. Returns the new session id.
    pub fn create_session(&self, goal: &str, avatar_ids: &[&str]) -> TactikResult<String> {
        if goal.trim().is_empty() {
            return Err(TactikError::Validation("session goal must not be empty".into()));
        }
        let max = self.config().max_avatars;
        if avatar_ids.is_empty() || avatar_ids.len() > max {
            return Err(TactikError::Validation(format!(
                "session needs 1 to {max} avatars, got {}",
                avatar_ids.len()
            )));
        }
        let mut seen = HashSet::new();
        for id in avatar_ids {
            if !seen.insert(*id) {
                return Err(TactikError::Validation(format!(
                    "avatar '{id}' listed twice in session"
                )));
            }
            self.avatar(id)?;
        }

        let session_id = self.allocate_session_id()?;
        let session = self.orchestrator.new_session(
            session_id.clone(),
            goal,
            avatar_ids.iter().map(|id| id.to_string()).collect(),
        );
        match self.sessions.write().entry(session_id.clone()) {
            Entry::Occupied(_) => {
                return Err(TactikError::Validation(format!(
                    "session '{session_id}' is already active"
                )));
            }
            Entry::Vacant(slot) => {
                self.persist(&session);
                slot.insert(Arc::new(Mutex::new(session)));
            }
        }
        log::info!("opened {session_id} with {} avatar(s)", avatar_ids.len());
        Ok(session_id)
    }

    /// Next counter id that is neither live nor already stored.
    fn allocate_session_id(&self) -> TactikResult<String> {
        loop {
            let n = self.next_session.fetch_add(1, Ordering::Relaxed);
            let session_id = format!("{SESSION_PREFIX}{n:04}");
            if self.sessions.read().contains_key(&session_id) {
                continue;
            }
            if let Some(store) = &self.store {
                if store.load_session(&session_id)?.is_some() {
                    log::debug!("{session_id} exists in store, skipping");
                    continue;
                }
            }
            return Ok(session_id);
        }
    }

    fn session_handle(&self, session_id: &str) -> TactikResult<SessionHandle> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| TactikError::session_not_found(session_id))
    }

    /// Run one turn. Waits behind any turn already in flight on the same
    /// session; other sessions are unaffected.
    pub async fn orchestrate_turn(
        &self,
        session_id: &str,
        speaker_id: &str,
        message: &str,
    ) -> TactikResult<TurnResult> {
        let handle = self.session_handle(session_id)?;
        let speaker = self.avatar(speaker_id)?;
        let mut session = handle.lock().await;
        let avda = compute_avda_for_session(&speaker.dna, &session);
        let result = self
            .orchestrator
            .orchestrate_turn(&mut session, &speaker.dna, &avda, message)
            .await?;
        self.persist(&session);
        Ok(result)
    }

    /// Operator reset of the session's drift and gate counters.
    pub async fn recalibrate_session(&self, session_id: &str) -> TactikResult<()> {
        let handle = self.session_handle(session_id)?;
        let mut session = handle.lock().await;
        self.orchestrator.recalibrate(&mut session);
        self.persist(&session);
        log::info!("{session_id} recalibrated");
        Ok(())
    }

    /// Copy of the current session state.
    pub async fn session_snapshot(&self, session_id: &str) -> TactikResult<ConversationSession> {
        let handle = self.session_handle(session_id)?;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    pub async fn session_metrics(&self, session_id: &str) -> TactikResult<SessionMetrics> {
        let handle = self.session_handle(session_id)?;
        let session = handle.lock().await;
        Ok(session.metrics())
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Bring a stored session back into memory.
    pub fn restore_session(&self, session_id: &str) -> TactikResult<()> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| TactikError::Persistence("no snapshot store attached".into()))?;
        if self.sessions.read().contains_key(session_id) {
            return Err(TactikError::Validation(format!(
                "session '{session_id}' is already active"
            )));
        }
        let session = store
            .load_session(session_id)?
            .ok_or_else(|| TactikError::session_not_found(session_id))?;
        for avatar_id in &session.avatar_ids {
            self.avatar(avatar_id)?;
        }
        match self.sessions.write().entry(session_id.to_string()) {
            Entry::Occupied(_) => {
                return Err(TactikError::Validation(format!(
                    "session '{session_id}' is already active"
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(session)));
            }
        }
        if let Some(n) = session_number(session_id) {
            self.next_session.fetch_max(n.saturating_add(1), Ordering::Relaxed);
        }
        log::info!("{session_id} restored from store");
        Ok(())
    }

    /// Drop a session from memory. A stored snapshot is kept.
    pub fn remove_session(&self, session_id: &str) -> TactikResult<()> {
        self.sessions
            .write()
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| TactikError::session_not_found(session_id))
    }

    pub async fn advisor_report(&self, session_id: &str) -> TactikResult<AdvisorReport> {
        let handle = self.session_handle(session_id)?;
        let session = handle.lock().await;
        let registered = session
            .avatar_ids
            .iter()
            .map(|id| self.avatar(id))
            .collect::<TactikResult<Vec<_>>>()?;
        let avatars: Vec<(&AvatarDna, AvdaMetrics)> = registered
            .iter()
            .map(|r| (&r.dna, compute_avda_for_session(&r.dna, &session)))
            .collect();
        Ok(build_advisor_report(&session, &avatars, Utc::now()))
    }

    /// Save every live session, then clear the registries.
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = self.sessions.read().values().cloned().collect();
        for handle in handles {
            let session = handle.lock().await;
            self.persist(&session);
        }
        let count = {
            let mut sessions = self.sessions.write();
            let count = sessions.len();
            sessions.clear();
            count
        };
        self.avatars.write().clear();
        log::info!("engine shut down, {count} session(s) released");
    }

    /// The in-memory state stays authoritative; a failed save is logged.
    fn persist(&self, session: &ConversationSession) {
        if let Some(store) = &self.store {
            if let Err(err) = store.save_session(session) {
                log::error!("{}: snapshot save failed: {err}", session.session_id);
            }
        }
    }
}
