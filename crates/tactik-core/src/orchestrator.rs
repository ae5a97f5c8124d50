// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Conversation Orchestrator
// ─────────────────────────────────────────────────────────────────────
//! Per-turn state machine:
//!
//! ```text
//! IDLE → PRECHECK → GENERATING → SCORING → GATING → ACCEPTED → IDLE
//!            │            ▲                    │
//!            │            └──── REGENERATE ────┘  (≤ max_regenerations)
//!            └→ EMPATHY_PAUSE
//! ```
//!
//! # Invariants
//!
//! 1. **All-or-nothing commit**: gate and drift state are advanced on
//!    scratch copies and written back only when the turn completes. A
//!    provider error or timeout leaves the session exactly as it was.
//!
//! 2. **Bounded regeneration**: after `max_regenerations` rejected
//!    candidates the last one is accepted flagged low-confidence. The
//!    rejection streak is not reset by a forced acceptance.
//!
//! 3. **Pauses are not turns**: an empathy pause appends nothing and
//!    leaves the metrics untouched. The pause counter moves, and a pause
//!    caused by an exhausted gate consumes that signal: the rejection
//!    streak drops to zero while the tightened threshold stays.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use tactik_types::{
    AvatarDna, AvdaMetrics, ConversationSession, PauseReason, TactikConfig, TactikError,
    TactikResult, Turn, TurnPhase, TurnResult,
};

use crate::drift::DriftDetector;
use crate::empathy::{pause_result, EmpathyPauseTrigger};
use crate::gate::{GateDecision, QualityGate};
use crate::generator::{GenerationError, GenerationRequest, Generator};
use crate::metrics::MetricsTracker;
use crate::prompt::{build_prior_turns, build_system_prompt};
use crate::scoring::{ScoringContext, TurnScorer};

pub struct ConversationOrchestrator {
    config: TactikConfig,
    generator: Arc<dyn Generator>,
    scorer: TurnScorer,
    gate: QualityGate,
    drift: DriftDetector,
    empathy: EmpathyPauseTrigger,
    metrics: MetricsTracker,
}

impl ConversationOrchestrator {
    pub fn new(config: TactikConfig, generator: Arc<dyn Generator>) -> TactikResult<Self> {
        config.validate()?;
        Ok(Self {
            scorer: TurnScorer::from_config(&config)?,
            gate: QualityGate::from_config(&config),
            drift: DriftDetector::from_config(&config)?,
            empathy: EmpathyPauseTrigger::from_config(&config)?,
            metrics: MetricsTracker::from_config(&config),
            generator,
            config,
        })
    }

    pub fn config(&self) -> &TactikConfig {
        &self.config
    }

    pub fn gate(&self) -> &QualityGate {
        &self.gate
    }

    /// Fresh session with baseline gate state and the goal anchor
    /// extracted.
    pub fn new_session(
        &self,
        session_id: impl Into<String>,
        user_goal: &str,
        avatar_ids: Vec<String>,
    ) -> ConversationSession {
        ConversationSession::new(
            session_id,
            user_goal,
            avatar_ids,
            self.gate.initial_state(),
            self.drift.initial_state(user_goal),
        )
    }

    /// Operator reset of the session's gate and drift counters.
    pub fn recalibrate(&self, session: &mut ConversationSession) {
        DriftDetector::recalibrate(&mut session.drift_state);
        session.gate_state = self.gate.initial_state();
    }

    /// Run one turn for `speaker` against the user's `message`.
    ///
    /// `avda` must be the speaker's metrics. Transient generation
    /// failures are returned as `Err` after the automatic retry.
    pub async fn orchestrate_turn(
        &self,
        session: &mut ConversationSession,
        speaker: &AvatarDna,
        avda: &AvdaMetrics,
        message: &str,
    ) -> TactikResult<TurnResult> {
        if !session.has_avatar(&speaker.avatar_id) {
            return Err(TactikError::Validation(format!(
                "avatar '{}' is not part of session '{}'",
                speaker.avatar_id, session.session_id
            )));
        }
        let mut phases = vec![TurnPhase::Idle, TurnPhase::Precheck];

        let reasons = self.empathy.check(
            avda.source_coverage,
            message,
            &session.drift_state,
            &session.gate_state,
        );
        if !reasons.is_empty() {
            session.empathy_pauses = session.empathy_pauses.saturating_add(1);
            if reasons
                .iter()
                .any(|r| matches!(r, PauseReason::GateExhausted { .. }))
            {
                session.gate_state.consecutive_low_count = 0;
            }
            let result = pause_result(reasons);
            if let TurnResult::EmpathyPause { reason, .. } = &result {
                log::info!(
                    "session {}: empathy pause before {} answers ({reason})",
                    session.session_id,
                    speaker.avatar_id
                );
            }
            return Ok(result);
        }

        let mut gate_state = session.gate_state.clone();
        let mut drift_state = session.drift_state.clone();
        let correction = DriftDetector::take_correction(&mut drift_state);

        let mut request = GenerationRequest {
            avatar_id: speaker.avatar_id.clone(),
            system_prompt: build_system_prompt(
                speaker,
                avda,
                &session.user_goal,
                correction.as_deref(),
            ),
            prior_turns: build_prior_turns(&session.transcript, self.config.prompt_history_turns),
            user_message: message.to_string(),
            deadline: self.config.generation_deadline(),
            attempt: 0,
        };
        let ctx = ScoringContext {
            dna: speaker,
            user_message: message,
            goal_terms: &session.drift_state.goal_anchor_terms,
        };

        let mut regenerations = 0u32;
        let (text, scores, composite, low_confidence) = loop {
            phases.push(TurnPhase::Generating);
            request.attempt += 1;
            let text = match self.generate_with_retry(&request).await {
                Ok(text) => text,
                Err(err) => {
                    log::error!(
                        "session {}: turn failed in generation ({err}), state unchanged",
                        session.session_id
                    );
                    return Err(err);
                }
            };

            phases.push(TurnPhase::Scoring);
            let scores = self.scorer.score(&text, &ctx);
            let composite = scores.composite(&self.config);

            phases.push(TurnPhase::Gating);
            match self.gate.evaluate(&mut gate_state, composite) {
                GateDecision::Accept => break (text, scores, composite, false),
                GateDecision::AcceptLowConfidence => break (text, scores, composite, true),
                GateDecision::Reject if regenerations < self.config.max_regenerations => {
                    regenerations += 1;
                    phases.push(TurnPhase::Regenerate);
                    log::info!(
                        "session {}: regenerating ({regenerations}/{})",
                        session.session_id,
                        self.config.max_regenerations
                    );
                }
                GateDecision::Reject => {
                    log::warn!(
                        "session {}: regeneration cap reached, accepting candidate \
                         {composite:.4} as low-confidence",
                        session.session_id
                    );
                    break (text, scores, composite, true);
                }
            }
        };
        phases.push(TurnPhase::Accepted);

        let turn = Turn {
            turn_number: session.transcript.len() as u32 + 1,
            speaker_id: speaker.avatar_id.clone(),
            speaker_name: speaker.name.clone(),
            user_message: message.to_string(),
            message: text,
            eis_score: scores.eis,
            hca_score: scores.hca,
            dna_score: scores.dna,
            low_confidence,
            timestamp: Utc::now(),
        };
        let backflow_issue =
            self.drift
                .observe_turn(&mut drift_state, &session.transcript, &turn, composite);

        session.gate_state = gate_state;
        session.drift_state = drift_state;
        self.metrics.record(&mut session.metrics_state, scores);
        session.transcript.push(turn.clone());
        phases.push(TurnPhase::Idle);

        Ok(TurnResult::TurnCompleted {
            turn,
            session_metrics: session.metrics(),
            backflow_triggered: backflow_issue.is_some(),
            backflow_issue,
            candidates_evaluated: regenerations + 1,
            phases,
        })
    }

    /// One generation call under the deadline, retried on provider error
    /// or timeout with doubling backoff.
    async fn generate_with_retry(&self, request: &GenerationRequest) -> TactikResult<String> {
        let deadline = self.config.generation_deadline();
        let mut backoff = Duration::from_millis(self.config.retry_backoff_ms);
        let mut failures = 0u32;
        loop {
            let outcome = match tokio::time::timeout(deadline, self.generator.generate(request.clone()))
                .await
            {
                Ok(outcome) => outcome,
                Err(_elapsed) => Err(GenerationError::Timeout {
                    deadline_ms: self.config.generation_deadline_ms,
                }),
            };
            match outcome {
                Ok(text) => return Ok(text),
                Err(err) if failures < self.config.provider_retries => {
                    failures += 1;
                    log::warn!(
                        "generation attempt failed ({err}), retry {failures}/{} in {backoff:?}",
                        self.config.provider_retries
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
