// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Data model, configuration, and error hierarchy for the TACTIK
//! avatar validation kernel.

pub mod config;
pub mod dna;
pub mod error;
pub mod metrics;
pub mod score;
pub mod session;
pub mod source;

pub use config::TactikConfig;
pub use dna::{AvatarDna, ClaimCategory, ClaimSet, InferredClaim, VerifiedClaim};
pub use error::{TactikError, TactikResult};
pub use metrics::{AvdaMetrics, AvdaPercentages, Fidelity};
pub use score::{clamp_score, TurnScores};
pub use session::{
    BackflowEvent, BackflowIssue, ConversationSession, DriftState, GateMode, GateState,
    MetricsState, PauseReason, SessionMetrics, Turn, TurnPhase, TurnResult,
};
pub use source::{GroundTruthSource, SourceRecord, SourceSummary, SourceTier};
