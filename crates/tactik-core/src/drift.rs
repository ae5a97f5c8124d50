// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Drift Detector (Backflow)
// ─────────────────────────────────────────────────────────────────────
//! Watches accepted turns for drift away from the session goal.
//!
//! Four signals, checked in priority order; at most one backflow event
//! fires per turn:
//!
//! 1. `topic_drift`: goal-term overlap below threshold on two accepted
//!    turns in a row (the first is only logged).
//! 2. `uncertainty_accumulation`: composite below the drift bound for
//!    `drift_low_score_turns` turns in a row, whatever the gate decided.
//! 3. `coverage_gap`: DNA alignment below `coverage_gap_floor`.
//! 4. `contradiction`: the speaker takes the opposite side of a stance
//!    phrase it used in an earlier turn.
//!
//! The event counter only goes up; [`DriftDetector::recalibrate`] is the
//! single way back to zero.

use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

use tactik_types::{
    BackflowEvent, BackflowIssue, DriftState, TactikConfig, TactikError, TactikResult, Turn,
};

use crate::scoring::content_terms;

/// Extract the goal anchor once, at session creation.
pub fn extract_anchor_terms(user_goal: &str) -> BTreeSet<String> {
    content_terms(user_goal)
}

/// Instruction queued into the next prompt after an event.
pub fn corrective_instruction(issue: BackflowIssue) -> &'static str {
    match issue {
        BackflowIssue::TopicDrift => {
            "The conversation is drifting away from the stated goal. \
             Bring the discussion back to it."
        }
        BackflowIssue::UncertaintyAccumulation => {
            "Recent answers were weak. Answer concretely and stay within \
             documented positions."
        }
        BackflowIssue::CoverageGap => {
            "The last answer strayed from the documented profile. Rely only on \
             verified behaviour, priorities and constraints."
        }
        BackflowIssue::Contradiction => {
            "The last answer contradicted an earlier position. Acknowledge the \
             earlier stance and stay consistent."
        }
    }
}

#[derive(Debug, Clone)]
struct StancePair {
    left: Regex,
    right: Regex,
}

fn phrase_regex(phrase: &str) -> TactikResult<Regex> {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    RegexBuilder::new(&format!(r"\b{}\b", words.join(r"\s+")))
        .case_insensitive(true)
        .build()
        .map_err(|e| TactikError::Config(format!("contradiction phrase '{phrase}': {e}")))
}

/// Per-turn drift observer; the state lives in the session.
#[derive(Debug, Clone)]
pub struct DriftDetector {
    overlap_threshold: f64,
    low_score_bound: f64,
    low_score_turns: u32,
    coverage_gap_floor: f64,
    stances: Vec<StancePair>,
}

impl DriftDetector {
    pub fn from_config(config: &TactikConfig) -> TactikResult<Self> {
        let stances = config
            .contradiction_pairs
            .iter()
            .map(|(left, right)| {
                Ok(StancePair {
                    left: phrase_regex(left)?,
                    right: phrase_regex(right)?,
                })
            })
            .collect::<TactikResult<Vec<_>>>()?;
        Ok(Self {
            overlap_threshold: config.drift_overlap_threshold,
            low_score_bound: config.drift_low_score_bound,
            low_score_turns: config.drift_low_score_turns,
            coverage_gap_floor: config.coverage_gap_floor,
            stances,
        })
    }

    pub fn initial_state(&self, user_goal: &str) -> DriftState {
        DriftState::new(extract_anchor_terms(user_goal))
    }

    /// Share of anchor terms present in `text`. No anchor means no drift.
    pub fn goal_overlap(&self, state: &DriftState, text: &str) -> f64 {
        if state.goal_anchor_terms.is_empty() {
            return 1.0;
        }
        let terms = content_terms(text);
        let shared = state.goal_anchor_terms.intersection(&terms).count();
        shared as f64 / state.goal_anchor_terms.len() as f64
    }

    /// True when `message` takes the opposite side of a stance the
    /// same speaker expressed in any of `prior`.
    pub fn contradicts(&self, message: &str, speaker_id: &str, prior: &[Turn]) -> bool {
        let earlier: Vec<&str> = prior
            .iter()
            .filter(|t| t.speaker_id == speaker_id)
            .map(|t| t.message.as_str())
            .collect();
        if earlier.is_empty() {
            return false;
        }
        self.stances.iter().any(|pair| {
            let flips_to_right = pair.right.is_match(message)
                && earlier.iter().any(|m| pair.left.is_match(m));
            let flips_to_left = pair.left.is_match(message)
                && earlier.iter().any(|m| pair.right.is_match(m));
            flips_to_right || flips_to_left
        })
    }

    /// Update the drift state with one accepted turn.
    ///
    /// `prior` is the transcript before `turn`. Returns the issue of the
    /// fired backflow event, if any.
    pub fn observe_turn(
        &self,
        state: &mut DriftState,
        prior: &[Turn],
        turn: &Turn,
        composite: f64,
    ) -> Option<BackflowIssue> {
        let overlap = self.goal_overlap(state, &turn.message);
        if overlap < self.overlap_threshold {
            state.off_topic_streak += 1;
            if state.off_topic_streak == 1 {
                log::debug!(
                    "turn {} off-topic (overlap {overlap:.2}), watching",
                    turn.turn_number
                );
            }
        } else {
            state.off_topic_streak = 0;
        }

        if composite < self.low_score_bound {
            state.consecutive_low_score_turns += 1;
        } else {
            state.consecutive_low_score_turns = 0;
        }

        let issue = if state.off_topic_streak >= 2 {
            state.off_topic_streak = 0;
            BackflowIssue::TopicDrift
        } else if state.consecutive_low_score_turns >= self.low_score_turns {
            state.consecutive_low_score_turns = 0;
            BackflowIssue::UncertaintyAccumulation
        } else if turn.dna_score < self.coverage_gap_floor {
            BackflowIssue::CoverageGap
        } else if self.contradicts(&turn.message, &turn.speaker_id, prior) {
            BackflowIssue::Contradiction
        } else {
            return None;
        };

        state.backflow_event_count = state.backflow_event_count.saturating_add(1);
        state.events.push(BackflowEvent {
            turn_number: turn.turn_number,
            issue,
        });
        state.pending_correction = Some(corrective_instruction(issue).to_string());
        log::warn!(
            "backflow {issue} at turn {} (event #{})",
            turn.turn_number,
            state.backflow_event_count
        );
        Some(issue)
    }

    /// Consume the queued corrective instruction.
    pub fn take_correction(state: &mut DriftState) -> Option<String> {
        state.pending_correction.take()
    }

    /// Operator reset: counters and streaks to zero, anchor and event
    /// history kept.
    pub fn recalibrate(state: &mut DriftState) {
        state.off_topic_streak = 0;
        state.consecutive_low_score_turns = 0;
        state.backflow_event_count = 0;
        state.pending_correction = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::GOAL;

    const ON_TOPIC: &str = "A supplier partnership on sustainable packaging needs fair pricing.";
    const OFF_TOPIC: &str = "Our canteen menu changes every Thursday afternoon.";

    fn detector() -> DriftDetector {
        DriftDetector::from_config(&TactikConfig::default()).unwrap()
    }

    fn turn(n: u32, message: &str, dna: f64) -> Turn {
        Turn {
            turn_number: n,
            speaker_id: "ceo".into(),
            speaker_name: "CEO".into(),
            user_message: "q".into(),
            message: message.into(),
            eis_score: 0.7,
            hca_score: 0.7,
            dna_score: dna,
            low_confidence: false,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_single_off_topic_turn_only_logs() {
        let d = detector();
        let mut s = d.initial_state(GOAL);
        assert_eq!(d.observe_turn(&mut s, &[], &turn(1, OFF_TOPIC, 0.8), 0.8), None);
        assert_eq!(s.off_topic_streak, 1);
        assert_eq!(s.backflow_event_count, 0);
        // Back on topic clears the streak.
        assert_eq!(d.observe_turn(&mut s, &[], &turn(2, ON_TOPIC, 0.8), 0.8), None);
        assert_eq!(s.off_topic_streak, 0);
    }

    #[test]
    fn test_recurring_off_topic_fires_topic_drift() {
        let d = detector();
        let mut s = d.initial_state(GOAL);
        d.observe_turn(&mut s, &[], &turn(1, OFF_TOPIC, 0.8), 0.8);
        let issue = d.observe_turn(&mut s, &[], &turn(2, OFF_TOPIC, 0.8), 0.8);
        assert_eq!(issue, Some(BackflowIssue::TopicDrift));
        assert_eq!(s.backflow_event_count, 1);
        assert_eq!(s.off_topic_streak, 0);
        assert!(s.pending_correction.is_some());
        assert_eq!(DriftDetector::take_correction(&mut s).as_deref(), Some(corrective_instruction(BackflowIssue::TopicDrift)));
        assert!(s.pending_correction.is_none());
    }

    #[test]
    fn test_uncertainty_accumulation_after_three_low_turns() {
        let d = detector();
        let mut s = d.initial_state(GOAL);
        assert_eq!(d.observe_turn(&mut s, &[], &turn(1, ON_TOPIC, 0.8), 0.45), None);
        assert_eq!(d.observe_turn(&mut s, &[], &turn(2, ON_TOPIC, 0.8), 0.40), None);
        let issue = d.observe_turn(&mut s, &[], &turn(3, ON_TOPIC, 0.8), 0.49);
        assert_eq!(issue, Some(BackflowIssue::UncertaintyAccumulation));
        assert_eq!(s.consecutive_low_score_turns, 0);
    }

    #[test]
    fn test_low_streak_broken_by_good_turn() {
        let d = detector();
        let mut s = d.initial_state(GOAL);
        d.observe_turn(&mut s, &[], &turn(1, ON_TOPIC, 0.8), 0.4);
        d.observe_turn(&mut s, &[], &turn(2, ON_TOPIC, 0.8), 0.4);
        d.observe_turn(&mut s, &[], &turn(3, ON_TOPIC, 0.8), 0.9);
        assert_eq!(d.observe_turn(&mut s, &[], &turn(4, ON_TOPIC, 0.8), 0.4), None);
        assert_eq!(s.backflow_event_count, 0);
    }

    #[test]
    fn test_coverage_gap() {
        let d = detector();
        let mut s = d.initial_state(GOAL);
        let issue = d.observe_turn(&mut s, &[], &turn(1, ON_TOPIC, 0.2), 0.7);
        assert_eq!(issue, Some(BackflowIssue::CoverageGap));
    }

    #[test]
    fn test_contradiction_against_prior_turn() {
        let d = detector();
        let mut s = d.initial_state(GOAL);
        let first = turn(1, &format!("{ON_TOPIC} We will accept a pilot."), 0.8);
        assert_eq!(d.observe_turn(&mut s, &[], &first, 0.8), None);
        let second = turn(2, &format!("{ON_TOPIC} We will NOT accept a pilot."), 0.8);
        let issue = d.observe_turn(&mut s, std::slice::from_ref(&first), &second, 0.8);
        assert_eq!(issue, Some(BackflowIssue::Contradiction));
    }

    #[test]
    fn test_contradiction_needs_same_speaker_and_whole_words() {
        let d = detector();
        let mut other = turn(1, "I agree with the proposal.", 0.8);
        other.speaker_id = "cfo".into();
        assert!(!d.contradicts("I disagree entirely.", "ceo", &[other.clone()]));
        other.speaker_id = "ceo".into();
        assert!(d.contradicts("I disagree entirely.", "ceo", &[other.clone()]));
        // "i disagree" must not be read as "i agree".
        let own = turn(1, "I disagree with that.", 0.8);
        assert!(!d.contradicts("Still, I disagree.", "ceo", &[own]));
    }

    #[test]
    fn test_priority_topic_drift_first() {
        let d = detector();
        let mut s = d.initial_state(GOAL);
        d.observe_turn(&mut s, &[], &turn(1, OFF_TOPIC, 0.9), 0.8);
        let issue = d.observe_turn(&mut s, &[], &turn(2, OFF_TOPIC, 0.1), 0.3);
        assert_eq!(issue, Some(BackflowIssue::TopicDrift));
        assert_eq!(s.events.len(), 1);
    }

    #[test]
    fn test_count_monotonic_until_recalibration() {
        let d = detector();
        let mut s = d.initial_state(GOAL);
        let mut last = 0;
        for n in 1..=12 {
            let msg = if n % 3 == 0 { ON_TOPIC } else { OFF_TOPIC };
            d.observe_turn(&mut s, &[], &turn(n, msg, 0.1 * (n % 5) as f64), 0.3);
            assert!(s.backflow_event_count >= last);
            last = s.backflow_event_count;
        }
        assert!(last > 0);
        DriftDetector::recalibrate(&mut s);
        assert_eq!(s.backflow_event_count, 0);
        assert_eq!(s.events.len() as u32, last);
        assert_eq!(s.goal_anchor_terms, extract_anchor_terms(GOAL));
    }

    #[test]
    fn test_empty_goal_never_drifts() {
        let d = detector();
        let mut s = d.initial_state("");
        assert_eq!(d.goal_overlap(&s, OFF_TOPIC), 1.0);
        d.observe_turn(&mut s, &[], &turn(1, OFF_TOPIC, 0.8), 0.8);
        assert_eq!(s.off_topic_streak, 0);
    }
}
