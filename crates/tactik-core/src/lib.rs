// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! AVDA fidelity validation, turn scoring, hysteresis gating, drift
//! detection and conversation orchestration for simulated negotiation
//! counterparts.
//!
//! # Invariants
//!
//! 1. **A turn commits atomically**: gate, drift and metrics state only
//!    change when a candidate is accepted. Provider failures and
//!    timeouts leave the session byte-for-byte unchanged.
//!
//! 2. **Non-finite scores are failing scores**: every scorer output is
//!    clamped to [0, 1] and NaN becomes 0.0, so a broken signal can only
//!    push a candidate toward rejection.
//!
//! 3. **Regeneration is bounded**: at most `max_regenerations` extra
//!    candidates per turn. The last candidate is then accepted and
//!    flagged low-confidence.
//!
//! 4. **Sessions are single-writer**: each session sits behind its own
//!    async mutex; different sessions never contend.

pub mod avda;
pub mod builder;
pub mod catalog;
pub mod drift;
pub mod empathy;
pub mod engine;
pub mod gate;
pub mod generator;
pub mod metrics;
pub mod orchestrator;
pub mod prompt;
pub mod report;
pub mod scoring;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use avda::{compute_avda, compute_avda_for_session};
pub use builder::{build_avatar_dna, AvatarDnaBuilder, CategoryClaims};
pub use catalog::SourceCatalog;
pub use drift::DriftDetector;
pub use empathy::EmpathyPauseTrigger;
pub use engine::{Engine, RegisteredAvatar};
pub use gate::{GateDecision, QualityGate};
pub use generator::{
    ExternalGenerator, GenerationError, GenerationRequest, Generator, ScriptStep,
    ScriptedGenerator,
};
pub use metrics::MetricsTracker;
pub use orchestrator::ConversationOrchestrator;
pub use prompt::{build_prior_turns, build_system_prompt, PromptMessage, PromptRole};
pub use report::{build_advisor_report, AdvisorReport};
pub use scoring::{ScoringContext, TurnScorer};
pub use store::{InMemoryStore, SnapshotStore};
