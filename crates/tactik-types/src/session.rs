// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Session, Turn and Per-Session State
// ─────────────────────────────────────────────────────────────────────

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::TurnScores;

/// One accepted exchange. Append-only; immutable once in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based position in the transcript.
    pub turn_number: u32,
    pub speaker_id: String,
    pub speaker_name: String,
    /// The user message this turn answers.
    pub user_message: String,
    /// The avatar's accepted response.
    pub message: String,
    pub eis_score: f64,
    pub hca_score: f64,
    pub dna_score: f64,
    /// Accepted inside the dead band or forced after the regeneration cap.
    pub low_confidence: bool,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn scores(&self) -> TurnScores {
        TurnScores::new(self.eis_score, self.hca_score, self.dna_score)
    }
}

/// Quality gate mode, derived from the rejection streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateMode {
    Open,
    Tightened,
}

/// Persistent hysteresis state of the quality gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateState {
    /// Adaptive midpoint; accept above `threshold + margin`,
    /// reject below `threshold - margin`.
    pub threshold: f64,
    pub consecutive_low_count: u32,
}

impl GateState {
    pub fn new(baseline: f64) -> Self {
        Self {
            threshold: baseline,
            consecutive_low_count: 0,
        }
    }

    pub fn mode(&self) -> GateMode {
        if self.consecutive_low_count > 0 {
            GateMode::Tightened
        } else {
            GateMode::Open
        }
    }
}

/// Why a backflow event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackflowIssue {
    TopicDrift,
    UncertaintyAccumulation,
    CoverageGap,
    Contradiction,
}

impl BackflowIssue {
    pub const fn as_str(self) -> &'static str {
        match self {
            BackflowIssue::TopicDrift => "topic_drift",
            BackflowIssue::UncertaintyAccumulation => "uncertainty_accumulation",
            BackflowIssue::CoverageGap => "coverage_gap",
            BackflowIssue::Contradiction => "contradiction",
        }
    }
}

impl fmt::Display for BackflowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a fired backflow event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackflowEvent {
    pub turn_number: u32,
    pub issue: BackflowIssue,
}

/// Per-session drift tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftState {
    /// Extracted once from the user goal; never modified.
    pub goal_anchor_terms: BTreeSet<String>,
    /// Accepted turns in a row whose goal overlap was below threshold.
    pub off_topic_streak: u32,
    /// Turns in a row whose composite fell below the drift bound,
    /// independent of the gate's own counter.
    pub consecutive_low_score_turns: u32,
    /// Monotonic; only an explicit recalibration resets it.
    pub backflow_event_count: u32,
    pub events: Vec<BackflowEvent>,
    /// Corrective instruction for the next prompt, consumed on use.
    pub pending_correction: Option<String>,
}

impl DriftState {
    pub fn new(goal_anchor_terms: BTreeSet<String>) -> Self {
        Self {
            goal_anchor_terms,
            off_topic_streak: 0,
            consecutive_low_score_turns: 0,
            backflow_event_count: 0,
            events: Vec::new(),
            pending_correction: None,
        }
    }
}

/// Exponentially smoothed session scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsState {
    pub ema_eis: f64,
    pub ema_hca: f64,
    pub ema_dna: f64,
    /// Blend of the three EMAs on a 0–10 scale.
    pub tactik_score: f64,
    pub total_turns: u32,
}

/// Conversation session and all its mutable per-turn state.
///
/// Single-writer: every mutation happens under the session's lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub user_goal: String,
    pub avatar_ids: Vec<String>,
    pub transcript: Vec<Turn>,
    pub gate_state: GateState,
    pub drift_state: DriftState,
    pub metrics_state: MetricsState,
    pub empathy_pauses: u32,
    pub started_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(
        session_id: impl Into<String>,
        user_goal: impl Into<String>,
        avatar_ids: Vec<String>,
        gate_state: GateState,
        drift_state: DriftState,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_goal: user_goal.into(),
            avatar_ids,
            transcript: Vec::new(),
            gate_state,
            drift_state,
            metrics_state: MetricsState::default(),
            empathy_pauses: 0,
            started_at: Utc::now(),
        }
    }

    pub fn has_avatar(&self, avatar_id: &str) -> bool {
        self.avatar_ids.iter().any(|a| a == avatar_id)
    }

    pub fn avatar_turns<'a>(&'a self, avatar_id: &'a str) -> impl Iterator<Item = &'a Turn> + 'a {
        self.transcript.iter().filter(move |t| t.speaker_id == avatar_id)
    }

    pub fn metrics(&self) -> SessionMetrics {
        SessionMetrics {
            total_turns: self.metrics_state.total_turns,
            ema_eis: self.metrics_state.ema_eis,
            ema_hca: self.metrics_state.ema_hca,
            ema_dna: self.metrics_state.ema_dna,
            tactik_score: self.metrics_state.tactik_score,
            backflow_events: self.drift_state.backflow_event_count,
            empathy_pauses: self.empathy_pauses,
        }
    }
}

/// Session-level metrics reported with every completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub total_turns: u32,
    pub ema_eis: f64,
    pub ema_hca: f64,
    pub ema_dna: f64,
    pub tactik_score: f64,
    pub backflow_events: u32,
    pub empathy_pauses: u32,
}

/// One condition that pre-empted a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PauseReason {
    LowCoverage { coverage: f64 },
    SensitiveTopic { pattern: String },
    RepeatedBackflow { events: u32 },
    GateExhausted { consecutive_low: u32 },
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseReason::LowCoverage { coverage } => write!(
                f,
                "source coverage {:.1}% is too low for a reliable answer",
                coverage * 100.0
            ),
            PauseReason::SensitiveTopic { pattern } => {
                write!(f, "message touches a sensitive topic ({pattern})")
            }
            PauseReason::RepeatedBackflow { events } => {
                write!(f, "conversation drifted {events} times from its goal")
            }
            PauseReason::GateExhausted { consecutive_low } => write!(
                f,
                "{consecutive_low} consecutive responses failed the quality gate"
            ),
        }
    }
}

/// Orchestrator phases a turn passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    Idle,
    Precheck,
    Generating,
    Scoring,
    Gating,
    Accepted,
    Regenerate,
    EmpathyPause,
    Failed,
}

/// Outcome of `orchestrate_turn`. Transient failures surface as `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnResult {
    EmpathyPause {
        message: String,
        reason: String,
        reasons: Vec<PauseReason>,
    },
    TurnCompleted {
        turn: Turn,
        session_metrics: SessionMetrics,
        backflow_triggered: bool,
        backflow_issue: Option<BackflowIssue>,
        candidates_evaluated: u32,
        phases: Vec<TurnPhase>,
    },
}

impl TurnResult {
    pub fn is_pause(&self) -> bool {
        matches!(self, TurnResult::EmpathyPause { .. })
    }

    pub fn turn(&self) -> Option<&Turn> {
        match self {
            TurnResult::TurnCompleted { turn, .. } => Some(turn),
            TurnResult::EmpathyPause { .. } => None,
        }
    }
}
