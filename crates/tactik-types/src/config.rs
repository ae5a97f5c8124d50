// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{TactikError, TactikResult};

/// Runtime configuration for the validation and orchestration engine.
///
/// One flat record; every per-turn threshold the gate, drift detector
/// and empathy trigger consult lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TactikConfig {
    /// Weight of the emotional-intelligence score in the composite.
    /// Default: 0.3.
    pub w_eis: f64,

    /// Weight of the human-centered/actionability score in the composite.
    /// Default: 0.3.
    pub w_hca: f64,

    /// Weight of the DNA-alignment score in the composite.
    /// Default: 0.4.
    pub w_dna: f64,

    /// Resting midpoint of the quality gate. The adaptive threshold
    /// never drops below this.
    /// Default: 0.52.
    pub gate_baseline: f64,

    /// Half-width of the hysteresis dead band around the threshold.
    /// Default: 0.05.
    pub gate_margin: f64,

    /// Threshold increase applied on every rejection.
    /// Default: 0.04.
    pub gate_tighten_step: f64,

    /// Upper bound for the tightened threshold.
    /// Default: 0.70.
    pub gate_max_threshold: f64,

    /// EMA pull of the threshold back toward baseline on a clean accept.
    /// Default: 0.2.
    pub gate_relax_rate: f64,

    /// Consecutive rejections after which the gate signals a pause.
    /// Default: 2.
    pub gate_low_limit: u32,

    /// Regenerations allowed per turn before the last candidate is
    /// force-accepted as low-confidence.
    /// Default: 2.
    pub max_regenerations: u32,

    /// Deadline for a single generation call, in milliseconds.
    /// Default: 30000.
    pub generation_deadline_ms: u64,

    /// Automatic retries after a provider error or timeout.
    /// Default: 1.
    pub provider_retries: u32,

    /// Backoff before the first automatic retry, doubled per retry.
    /// Default: 250.
    pub retry_backoff_ms: u64,

    /// Prior transcript turns passed to the generator.
    /// Default: 10.
    pub prompt_history_turns: usize,

    /// Maximum avatars in one session.
    /// Default: 4.
    pub max_avatars: usize,

    /// Empathy pause fires when the speaker's source coverage is below this.
    /// Default: 0.60.
    pub empathy_coverage_floor: f64,

    /// Empathy pause fires once this many backflow events accumulated.
    /// Default: 2.
    pub backflow_pause_limit: u32,

    /// Case-insensitive regular expressions marking sensitive topics.
    pub sensitive_patterns: Vec<String>,

    /// Case-insensitive regular expressions marking emotionally charged
    /// user messages. They never pause a turn; the EIS scorer expects an
    /// acknowledging tone when one matches.
    pub emotional_cue_patterns: Vec<String>,

    /// Goal-term overlap below which a turn counts as off-topic.
    /// Default: 0.2.
    pub drift_overlap_threshold: f64,

    /// Composite score below which a turn counts toward
    /// uncertainty accumulation.
    /// Default: 0.5.
    pub drift_low_score_bound: f64,

    /// Low-score turns in a row that fire an uncertainty backflow.
    /// Default: 3.
    pub drift_low_score_turns: u32,

    /// DNA-alignment score below which a turn is a coverage gap.
    /// Default: 0.35.
    pub coverage_gap_floor: f64,

    /// Opposing stance phrases; saying one after having said the other
    /// is a contradiction.
    pub contradiction_pairs: Vec<(String, String)>,

    /// EMA smoothing factor for session metrics.
    /// Default: 0.3.
    pub ema_alpha: f64,
}

impl Default for TactikConfig {
    fn default() -> Self {
        Self {
            w_eis: 0.3,
            w_hca: 0.3,
            w_dna: 0.4,
            gate_baseline: 0.52,
            gate_margin: 0.05,
            gate_tighten_step: 0.04,
            gate_max_threshold: 0.70,
            gate_relax_rate: 0.2,
            gate_low_limit: 2,
            max_regenerations: 2,
            generation_deadline_ms: 30_000,
            provider_retries: 1,
            retry_backoff_ms: 250,
            prompt_history_turns: 10,
            max_avatars: 4,
            empathy_coverage_floor: 0.60,
            backflow_pause_limit: 2,
            sensitive_patterns: default_sensitive_patterns(),
            emotional_cue_patterns: default_emotional_cue_patterns(),
            drift_overlap_threshold: 0.2,
            drift_low_score_bound: 0.5,
            drift_low_score_turns: 3,
            coverage_gap_floor: 0.35,
            contradiction_pairs: default_contradiction_pairs(),
            ema_alpha: 0.3,
        }
    }
}

fn default_sensitive_patterns() -> Vec<String> {
    [
        r"\bcrisis\b",
        r"\bconflicts?\b",
        r"\blegal\b",
        r"\blawsuits?\b",
        r"\bdenuncias?\b",
        r"\bscandals?\b",
        r"\bfraud\w*\b",
        r"\bviolations?\b",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_emotional_cue_patterns() -> Vec<String> {
    [
        r"\bworr(?:y|ied|ies|ying)\b",
        r"\bfrustrat\w*",
        r"\bupset\b",
        r"\bstress\w*",
        r"\bdisappoint\w*",
        r"\bangry\b",
        r"\banxious\b",
        r"\bafraid\b",
        r"\bnervous\b",
        r"\bpressure[ds]?\b",
        r"\bunfair\b",
        r"\bconcerned\b",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn check_patterns(field: &str, patterns: &[String]) -> TactikResult<()> {
    for pattern in patterns {
        regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| TactikError::Config(format!("{field} '{pattern}': {e}")))?;
    }
    Ok(())
}

fn default_contradiction_pairs() -> Vec<(String, String)> {
    [
        ("we will accept", "we will not accept"),
        ("i agree", "i disagree"),
        ("we support", "we oppose"),
        ("is possible", "is not possible"),
        ("we can commit", "we cannot commit"),
        ("we are interested", "we are not interested"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
}

fn check_unit(name: &str, value: f64) -> TactikResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(TactikError::Config(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

impl TactikConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> TactikResult<()> {
        check_unit("w_eis", self.w_eis)?;
        check_unit("w_hca", self.w_hca)?;
        check_unit("w_dna", self.w_dna)?;
        let weight_sum = self.w_eis + self.w_hca + self.w_dna;
        if (weight_sum - 1.0).abs() > 1e-9 {
            return Err(TactikError::Config(format!(
                "w_eis + w_hca + w_dna must equal 1.0, got {weight_sum}"
            )));
        }

        check_unit("gate_baseline", self.gate_baseline)?;
        check_unit("gate_max_threshold", self.gate_max_threshold)?;
        if self.gate_max_threshold < self.gate_baseline {
            return Err(TactikError::Config(format!(
                "gate_max_threshold ({}) must be >= gate_baseline ({})",
                self.gate_max_threshold, self.gate_baseline
            )));
        }
        // Both bands must stay inside (0, 1) at every reachable threshold.
        let margin_limit = self.gate_baseline.min(1.0 - self.gate_max_threshold);
        if self.gate_margin <= 0.0 || self.gate_margin >= margin_limit {
            return Err(TactikError::Config(format!(
                "gate_margin must be in (0, {margin_limit}), got {}",
                self.gate_margin
            )));
        }
        if self.gate_tighten_step <= 0.0 {
            return Err(TactikError::Config(format!(
                "gate_tighten_step must be > 0, got {}",
                self.gate_tighten_step
            )));
        }
        if !(0.0..=1.0).contains(&self.gate_relax_rate) {
            return Err(TactikError::Config(format!(
                "gate_relax_rate must be in [0, 1], got {}",
                self.gate_relax_rate
            )));
        }
        if self.gate_low_limit == 0 {
            return Err(TactikError::Config("gate_low_limit must be >= 1".to_string()));
        }

        if self.generation_deadline_ms == 0 {
            return Err(TactikError::Config(
                "generation_deadline_ms must be > 0".to_string(),
            ));
        }
        if self.max_avatars == 0 {
            return Err(TactikError::Config("max_avatars must be >= 1".to_string()));
        }

        check_unit("empathy_coverage_floor", self.empathy_coverage_floor)?;
        if self.backflow_pause_limit == 0 {
            return Err(TactikError::Config(
                "backflow_pause_limit must be >= 1".to_string(),
            ));
        }
        check_patterns("sensitive pattern", &self.sensitive_patterns)?;
        check_patterns("emotional cue pattern", &self.emotional_cue_patterns)?;

        check_unit("drift_overlap_threshold", self.drift_overlap_threshold)?;
        check_unit("drift_low_score_bound", self.drift_low_score_bound)?;
        check_unit("coverage_gap_floor", self.coverage_gap_floor)?;
        if self.drift_low_score_turns == 0 {
            return Err(TactikError::Config(
                "drift_low_score_turns must be >= 1".to_string(),
            ));
        }
        for (a, b) in &self.contradiction_pairs {
            if a.trim().is_empty() || b.trim().is_empty() {
                return Err(TactikError::Config(
                    "contradiction pairs must not contain empty phrases".to_string(),
                ));
            }
        }

        if self.ema_alpha <= 0.0 || self.ema_alpha > 1.0 {
            return Err(TactikError::Config(format!(
                "ema_alpha must be in (0, 1], got {}",
                self.ema_alpha
            )));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> TactikResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TactikError::Config(format!("JSON parse error: {e}")))
    }

    pub fn generation_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.generation_deadline_ms)
    }
}
