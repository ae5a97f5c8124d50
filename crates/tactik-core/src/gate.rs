// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Quality Gate (hysteresis)
// ─────────────────────────────────────────────────────────────────────
//! Accept/reject decision over the composite turn score.
//!
//! The gate keeps an adaptive midpoint `threshold` in the session's
//! [`GateState`] and a dead band of `± margin` around it:
//!
//! - `composite ≥ threshold + margin` → ACCEPT; threshold relaxes toward
//!   the baseline and the rejection streak resets.
//! - `composite ≤ threshold − margin` → REJECT; the streak grows and the
//!   threshold tightens, bounded by `gate_max_threshold`.
//! - otherwise → ACCEPT flagged low-confidence; nothing changes.
//!
//! Non-finite composites are treated as 0.0 (always a rejection).

use tactik_types::{GateState, TactikConfig};

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accept,
    AcceptLowConfidence,
    Reject,
}

impl GateDecision {
    pub fn is_accept(self) -> bool {
        !matches!(self, GateDecision::Reject)
    }
}

/// Stateless policy; the state lives in the session.
#[derive(Debug, Clone)]
pub struct QualityGate {
    baseline: f64,
    margin: f64,
    tighten_step: f64,
    max_threshold: f64,
    relax_rate: f64,
    low_limit: u32,
}

impl QualityGate {
    pub fn from_config(config: &TactikConfig) -> Self {
        Self {
            baseline: config.gate_baseline,
            margin: config.gate_margin,
            tighten_step: config.gate_tighten_step,
            max_threshold: config.gate_max_threshold,
            relax_rate: config.gate_relax_rate,
            low_limit: config.gate_low_limit,
        }
    }

    /// Fresh state at the baseline threshold.
    pub fn initial_state(&self) -> GateState {
        GateState::new(self.baseline)
    }

    /// `(reject_lo, accept_hi)` for the current state.
    pub fn bounds(&self, state: &GateState) -> (f64, f64) {
        (state.threshold - self.margin, state.threshold + self.margin)
    }

    pub fn evaluate(&self, state: &mut GateState, composite: f64) -> GateDecision {
        let composite = if composite.is_finite() {
            composite
        } else {
            log::warn!("gate received non-finite composite, treating as 0.0");
            0.0
        };
        let (reject_lo, accept_hi) = self.bounds(state);

        if composite >= accept_hi {
            let relaxed = state.threshold + self.relax_rate * (self.baseline - state.threshold);
            state.threshold = relaxed.max(self.baseline);
            state.consecutive_low_count = 0;
            GateDecision::Accept
        } else if composite <= reject_lo {
            state.consecutive_low_count = state.consecutive_low_count.saturating_add(1);
            state.threshold = (state.threshold + self.tighten_step).min(self.max_threshold);
            log::warn!(
                "gate REJECT: composite {composite:.4} <= {reject_lo:.4} \
                 (streak {}, threshold now {:.4})",
                state.consecutive_low_count,
                state.threshold
            );
            GateDecision::Reject
        } else {
            log::debug!(
                "gate dead band: composite {composite:.4} in ({reject_lo:.4}, {accept_hi:.4})"
            );
            GateDecision::AcceptLowConfidence
        }
    }

    /// Rejection streak at or above the limit.
    pub fn limit_reached(&self, state: &GateState) -> bool {
        state.consecutive_low_count >= self.low_limit
    }

    pub fn low_limit(&self) -> u32 {
        self.low_limit
    }
}
