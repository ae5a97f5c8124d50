// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Per-Turn Score Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::config::TactikConfig;

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// The three heuristic scores of one candidate response, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnScores {
    /// Emotional intelligence.
    pub eis: f64,
    /// Human-centeredness / actionability.
    pub hca: f64,
    /// Alignment with the avatar's verified DNA.
    pub dna: f64,
}

impl TurnScores {
    pub fn new(eis: f64, hca: f64, dna: f64) -> Self {
        Self {
            eis: clamp_score(eis, 0.0, 1.0),
            hca: clamp_score(hca, 0.0, 1.0),
            dna: clamp_score(dna, 0.0, 1.0),
        }
    }

    /// The floor every scorer failure collapses to.
    pub fn minimum() -> Self {
        Self::default()
    }

    /// Fixed-weight blend used by the quality gate and the drift detector.
    pub fn composite(&self, config: &TactikConfig) -> f64 {
        clamp_score(
            config.w_eis * self.eis + config.w_hca * self.hca + config.w_dna * self.dna,
            0.0,
            1.0,
        )
    }
}
