// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Session Metrics Tracker
// ─────────────────────────────────────────────────────────────────────

use tactik_types::{clamp_score, MetricsState, TactikConfig, TurnScores};

/// EMA smoothing of per-turn scores into session metrics.
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    alpha: f64,
    weights: [f64; 3],
}

impl MetricsTracker {
    pub fn from_config(config: &TactikConfig) -> Self {
        Self {
            alpha: config.ema_alpha,
            weights: [config.w_eis, config.w_hca, config.w_dna],
        }
    }

    /// Fold one accepted turn in. The first turn seeds the averages.
    pub fn record(&self, state: &mut MetricsState, scores: TurnScores) {
        if state.total_turns == 0 {
            state.ema_eis = scores.eis;
            state.ema_hca = scores.hca;
            state.ema_dna = scores.dna;
        } else {
            state.ema_eis = self.ema(state.ema_eis, scores.eis);
            state.ema_hca = self.ema(state.ema_hca, scores.hca);
            state.ema_dna = self.ema(state.ema_dna, scores.dna);
        }
        state.total_turns = state.total_turns.saturating_add(1);
        state.tactik_score = self.tactik_score(state);
    }

    fn ema(&self, previous: f64, new: f64) -> f64 {
        self.alpha * new + (1.0 - self.alpha) * previous
    }

    /// Weighted blend of the three EMAs on a 0–10 scale.
    pub fn tactik_score(&self, state: &MetricsState) -> f64 {
        let [w_eis, w_hca, w_dna] = self.weights;
        let blend = w_eis * state.ema_eis + w_hca * state.ema_hca + w_dna * state.ema_dna;
        clamp_score(10.0 * blend, 0.0, 10.0)
    }
}
