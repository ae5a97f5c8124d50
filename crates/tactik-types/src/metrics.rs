// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — AVDA Metric Types
// ─────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dna::ClaimCategory;

/// Fidelity classification of an AVDA score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Fidelity {
    Unreliable,
    LowFidelity,
    MediumFidelity,
    HighFidelity,
    VeryHighFidelity,
}

impl Fidelity {
    /// Lower bound (inclusive, percent) of each bucket, highest first.
    pub const THRESHOLDS: [(f64, Fidelity); 4] = [
        (90.0, Fidelity::VeryHighFidelity),
        (75.0, Fidelity::HighFidelity),
        (60.0, Fidelity::MediumFidelity),
        (45.0, Fidelity::LowFidelity),
    ];

    /// Map a percentage score to its bucket. Boundaries belong to the
    /// higher bucket.
    pub fn classify(avda_score: f64) -> Fidelity {
        Self::THRESHOLDS
            .iter()
            .find(|(floor, _)| avda_score >= *floor)
            .map(|(_, fidelity)| *fidelity)
            .unwrap_or(Fidelity::Unreliable)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Fidelity::VeryHighFidelity => "VERY HIGH FIDELITY",
            Fidelity::HighFidelity => "HIGH FIDELITY",
            Fidelity::MediumFidelity => "MEDIUM FIDELITY",
            Fidelity::LowFidelity => "LOW FIDELITY",
            Fidelity::Unreliable => "UNRELIABLE",
        }
    }

    /// Fixed usage guidance for the bucket.
    pub const fn recommendation(self) -> &'static str {
        match self {
            Fidelity::VeryHighFidelity => {
                "RECOMMENDED for critical decisions and real negotiations"
            }
            Fidelity::HighFidelity => {
                "SUITABLE for strategic preparation and executive training"
            }
            Fidelity::MediumFidelity => "USE ONLY for scenario exploration and brainstorming",
            Fidelity::LowFidelity => "LIMIT to hypothetical exercises only",
            Fidelity::Unreliable => "DO NOT USE for strategic preparation",
        }
    }

    pub fn is_low(self) -> bool {
        matches!(self, Fidelity::LowFidelity | Fidelity::Unreliable)
    }
}

impl fmt::Display for Fidelity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Avatar Validation: Deviation & Accuracy metrics.
///
/// Fractions in [0, 1] except `avda_score`, `ci_low`, `ci_high`, which
/// are percentages in [0, 100]. Derived from an `AvatarDna`, never the
/// source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvdaMetrics {
    pub accuracy: f64,
    pub source_coverage: f64,
    pub drift_risk: f64,
    pub gt_quality: f64,
    pub avda_score: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub classification: Fidelity,
    /// Per-category content factor in [0, 1].
    pub coverage_breakdown: BTreeMap<ClaimCategory, f64>,
    pub limitations: Vec<String>,
}

/// Display form: every value as a one-decimal percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvdaPercentages {
    pub accuracy: f64,
    pub source_coverage: f64,
    pub drift_risk: f64,
    pub gt_quality: f64,
    pub avda_score: f64,
    pub confidence_interval: [f64; 2],
    pub classification: String,
    pub limitations: Vec<String>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl AvdaMetrics {
    pub fn recommendation(&self) -> &'static str {
        self.classification.recommendation()
    }

    pub fn to_percentages(&self) -> AvdaPercentages {
        AvdaPercentages {
            accuracy: round1(self.accuracy * 100.0),
            source_coverage: round1(self.source_coverage * 100.0),
            drift_risk: round1(self.drift_risk * 100.0),
            gt_quality: round1(self.gt_quality * 100.0),
            avda_score: round1(self.avda_score),
            confidence_interval: [round1(self.ci_low), round1(self.ci_high)],
            classification: self.classification.label().to_string(),
            limitations: self.limitations.clone(),
        }
    }
}
