// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Empathy Pause Trigger
// ─────────────────────────────────────────────────────────────────────
//! Pre-turn check that suspends generation under high uncertainty.
//!
//! Fires when any of the four conditions holds:
//! (a) the speaker's source coverage is below the floor,
//! (b) the user message matches a sensitive-topic pattern,
//! (c) the session accumulated `backflow_pause_limit` backflow events,
//! (d) the gate's rejection streak is at its limit.

use regex::{Regex, RegexBuilder};

use tactik_types::{DriftState, GateState, PauseReason, TactikConfig, TactikError, TactikResult, TurnResult};

/// Message shown to the user in place of a response.
pub const PAUSE_MESSAGE: &str = "Let's pause here. This part of the conversation carries more \
    uncertainty than the simulation can responsibly handle; consider consulting a human \
    expert before continuing.";

#[derive(Debug, Clone)]
pub struct EmpathyPauseTrigger {
    coverage_floor: f64,
    backflow_limit: u32,
    gate_low_limit: u32,
    sensitive: Vec<(String, Regex)>,
}

impl EmpathyPauseTrigger {
    pub fn from_config(config: &TactikConfig) -> TactikResult<Self> {
        let sensitive = config
            .sensitive_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (pattern.clone(), re))
                    .map_err(|e| TactikError::Config(format!("sensitive pattern '{pattern}': {e}")))
            })
            .collect::<TactikResult<Vec<_>>>()?;
        Ok(Self {
            coverage_floor: config.empathy_coverage_floor,
            backflow_limit: config.backflow_pause_limit,
            gate_low_limit: config.gate_low_limit,
            sensitive,
        })
    }

    /// First sensitive pattern the message matches.
    pub fn sensitive_match(&self, message: &str) -> Option<&str> {
        self.sensitive
            .iter()
            .find(|(_, re)| re.is_match(message))
            .map(|(pattern, _)| pattern.as_str())
    }

    /// Every condition that currently holds; empty means proceed.
    pub fn check(
        &self,
        coverage: f64,
        message: &str,
        drift: &DriftState,
        gate: &GateState,
    ) -> Vec<PauseReason> {
        let mut reasons = Vec::new();
        if coverage < self.coverage_floor {
            reasons.push(PauseReason::LowCoverage { coverage });
        }
        if let Some(pattern) = self.sensitive_match(message) {
            reasons.push(PauseReason::SensitiveTopic {
                pattern: pattern.to_string(),
            });
        }
        if drift.backflow_event_count >= self.backflow_limit {
            reasons.push(PauseReason::RepeatedBackflow {
                events: drift.backflow_event_count,
            });
        }
        if gate.consecutive_low_count >= self.gate_low_limit {
            reasons.push(PauseReason::GateExhausted {
                consecutive_low: gate.consecutive_low_count,
            });
        }
        reasons
    }
}

/// Build the caller-facing pause result.
pub fn pause_result(reasons: Vec<PauseReason>) -> TurnResult {
    let reason = reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    TurnResult::EmpathyPause {
        message: PAUSE_MESSAGE.to_string(),
        reason,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn trigger() -> EmpathyPauseTrigger {
        EmpathyPauseTrigger::from_config(&TactikConfig::default()).unwrap()
    }

    #[test]
    fn test_truth_table_matches_or_of_conditions() {
        let t = trigger();
        for mask in 0u8..16 {
            let low_coverage = mask & 1 != 0;
            let sensitive = mask & 2 != 0;
            let backflow = mask & 4 != 0;
            let gate_exhausted = mask & 8 != 0;

            let coverage = if low_coverage { 0.59 } else { 0.60 };
            let message = if sensitive {
                "How do we handle the Lawsuit?"
            } else {
                "How do we handle the pricing?"
            };
            let mut drift = DriftState::new(BTreeSet::new());
            drift.backflow_event_count = if backflow { 2 } else { 1 };
            let mut gate = GateState::new(0.52);
            gate.consecutive_low_count = if gate_exhausted { 2 } else { 1 };

            let reasons = t.check(coverage, message, &drift, &gate);
            let expected = low_coverage || sensitive || backflow || gate_exhausted;
            assert_eq!(!reasons.is_empty(), expected, "mask {mask:04b}");
            assert_eq!(reasons.len(), mask.count_ones() as usize, "mask {mask:04b}");
        }
    }

    #[test]
    fn test_sensitive_whole_word() {
        let t = trigger();
        assert_eq!(t.sensitive_match("a legal issue"), Some(r"\blegal\b"));
        assert_eq!(t.sensitive_match("FRAUDULENT invoices"), Some(r"\bfraud\w*\b"));
        assert_eq!(t.sensitive_match("an illegality"), None);
        assert_eq!(t.sensitive_match("paralegal staff"), None);
    }

    #[test]
    fn test_pause_result_shape() {
        let result = pause_result(vec![
            PauseReason::LowCoverage { coverage: 0.42 },
            PauseReason::RepeatedBackflow { events: 2 },
        ]);
        match result {
            TurnResult::EmpathyPause { message, reason, reasons } => {
                assert_eq!(message, PAUSE_MESSAGE);
                assert!(reason.contains("42.0%"));
                assert!(reason.contains("; "));
                assert_eq!(reasons.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
