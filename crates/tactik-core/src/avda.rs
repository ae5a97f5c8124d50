// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — AVDA Validator
// ─────────────────────────────────────────────────────────────────────
//! Avatar Validation: Deviation & Accuracy.
//!
//! Pure functions of an [`AvatarDna`]. Four sub-scores feed the final
//! fidelity percentage:
//!
//! - **gt_quality**: mean source tier weight plus a cross-verification
//!   bonus of `0.2 × cross_verified_fraction`, capped at 1.0.
//! - **source_coverage**: weighted presence of content in the six claim
//!   categories. A category with a verified claim counts fully; one with
//!   only inferred claims counts at the inferred-tier weight.
//! - **accuracy**: tier-weighted evidence of verified claims against the
//!   fixed 0.4 weight of each inferred claim.
//! - **drift_risk**: inferred share of all claims, inflated past 50%.
//!
//! `avda = 100 × (0.40·accuracy·gt + 0.30·coverage + 0.20·(1 − drift) + 0.10·gt)`

use std::collections::BTreeMap;

use tactik_types::{
    clamp_score, AvatarDna, AvdaMetrics, ClaimCategory, ConversationSession, Fidelity,
    SourceTier,
};

/// Fixed weights of accuracy×quality, coverage, stability, quality.
pub const AVDA_WEIGHTS: [f64; 4] = [0.40, 0.30, 0.20, 0.10];

/// Coverage weight per claim category. Priorities takes half of the
/// decision-style share.
pub const CATEGORY_WEIGHTS: [(ClaimCategory, f64); 6] = [
    (ClaimCategory::Influences, 0.15),
    (ClaimCategory::Thoughts, 0.20),
    (ClaimCategory::Communication, 0.15),
    (ClaimCategory::BehavioralPattern, 0.30),
    (ClaimCategory::DecisionStyle, 0.10),
    (ClaimCategory::Priorities, 0.10),
];

/// Maximum gt_quality bonus when every source is cross-verified.
pub const CROSS_VERIFIED_BONUS: f64 = 0.2;

/// Inferred share above which drift risk grows superlinearly.
pub const DRIFT_INFLATION_POINT: f64 = 0.5;

/// Base standard error (percentage points) for a single source.
const CI_BASE_STDERR: f64 = 15.0;
/// Fraction of the standard error removed at full coverage.
const CI_COVERAGE_NARROWING: f64 = 0.4;
const Z_95: f64 = 1.96;

const EXTENDED_SESSION_TURNS: usize = 40;

/// Weighted mean of source tier weights with the cross-verification bonus.
pub fn gt_quality(dna: &AvatarDna) -> f64 {
    if dna.sources.is_empty() {
        return 0.0;
    }
    let n = dna.sources.len() as f64;
    let mean_weight = dna.sources.iter().map(|s| s.weight()).sum::<f64>() / n;
    let cross_fraction = dna.sources.iter().filter(|s| s.cross_verified).count() as f64 / n;
    clamp_score(mean_weight + CROSS_VERIFIED_BONUS * cross_fraction, 0.0, 1.0)
}

/// Content factor of one category: 1.0 with any verified claim, the
/// inferred-tier weight when only inferred claims exist, else 0.
pub fn category_coverage(dna: &AvatarDna, category: ClaimCategory) -> f64 {
    let set = dna.claims(category);
    if !set.verified.is_empty() {
        1.0
    } else if !set.inferred.is_empty() {
        SourceTier::Inferred.weight()
    } else {
        0.0
    }
}

pub fn coverage_breakdown(dna: &AvatarDna) -> BTreeMap<ClaimCategory, f64> {
    ClaimCategory::ALL
        .iter()
        .map(|&cat| (cat, category_coverage(dna, cat)))
        .collect()
}

pub fn source_coverage(dna: &AvatarDna) -> f64 {
    let total: f64 = CATEGORY_WEIGHTS
        .iter()
        .map(|&(cat, w)| w * category_coverage(dna, cat))
        .sum();
    clamp_score(total, 0.0, 1.0)
}

/// Tier-weighted share of evidence held by verified claims.
pub fn accuracy(dna: &AvatarDna) -> f64 {
    let mut verified_weight = 0.0;
    let mut inferred_count = 0usize;
    for cat in ClaimCategory::ALL {
        let set = dna.claims(cat);
        for claim in &set.verified {
            // Resolution is guaranteed by validate(); an unresolved id
            // degrades to inferred weight rather than panicking.
            verified_weight += dna
                .source(&claim.source_id)
                .map(|s| s.weight())
                .unwrap_or(SourceTier::Inferred.weight());
        }
        inferred_count += set.inferred.len();
    }
    let inferred_weight = SourceTier::Inferred.weight() * inferred_count as f64;
    let total = verified_weight + inferred_weight;
    if total <= 0.0 {
        return 0.0;
    }
    clamp_score(verified_weight / total, 0.0, 1.0)
}

pub fn drift_risk(dna: &AvatarDna) -> f64 {
    let (verified, inferred) = dna.claim_counts();
    let total = verified + inferred;
    if total == 0 {
        return 1.0;
    }
    let inferred_fraction = inferred as f64 / total as f64;
    let risk = if inferred_fraction > DRIFT_INFLATION_POINT {
        inferred_fraction + (inferred_fraction - DRIFT_INFLATION_POINT) * 0.5
    } else {
        inferred_fraction
    };
    clamp_score(risk, 0.0, 1.0)
}

/// 95% interval around `score`. Width shrinks with source count and
/// coverage; drift skews it toward the upside.
pub fn confidence_interval(
    score: f64,
    source_count: usize,
    coverage: f64,
    drift: f64,
) -> (f64, f64) {
    let stderr = CI_BASE_STDERR / (source_count.max(1) as f64).sqrt()
        * (1.0 - CI_COVERAGE_NARROWING * coverage);
    let margin = Z_95 * stderr;
    let low = clamp_score(score - margin * (1.0 - drift), 0.0, 100.0);
    let high = clamp_score(score + margin * (1.0 + drift), 0.0, 100.0);
    (low, high)
}

/// Combine the four sub-scores into a percentage.
pub fn avda_score(accuracy: f64, coverage: f64, drift: f64, gt_quality: f64) -> f64 {
    let [w_acc, w_cov, w_stab, w_gt] = AVDA_WEIGHTS;
    let raw = w_acc * (accuracy * gt_quality)
        + w_cov * coverage
        + w_stab * (1.0 - drift)
        + w_gt * gt_quality;
    clamp_score(100.0 * raw, 0.0, 100.0)
}

/// Compute the full metric set for an avatar.
pub fn compute_avda(dna: &AvatarDna) -> AvdaMetrics {
    compute(dna, None)
}

/// As [`compute_avda`], with session-dependent limitations added.
pub fn compute_avda_for_session(dna: &AvatarDna, session: &ConversationSession) -> AvdaMetrics {
    compute(dna, Some(session))
}

fn compute(dna: &AvatarDna, session: Option<&ConversationSession>) -> AvdaMetrics {
    let gt = gt_quality(dna);
    let breakdown = coverage_breakdown(dna);
    let coverage = source_coverage(dna);
    let acc = accuracy(dna);
    let drift = drift_risk(dna);
    let score = avda_score(acc, coverage, drift, gt);
    let (ci_low, ci_high) = confidence_interval(score, dna.sources.len(), coverage, drift);
    let classification = Fidelity::classify(score);
    let limitations = limitations(dna, &breakdown, session);

    log::debug!(
        "AVDA {}: {score:.2} [{ci_low:.2}, {ci_high:.2}] {classification} \
         (acc={acc:.3} cov={coverage:.3} drift={drift:.3} gt={gt:.3})",
        dna.avatar_id
    );

    AvdaMetrics {
        accuracy: acc,
        source_coverage: coverage,
        drift_risk: drift,
        gt_quality: gt,
        avda_score: score,
        ci_low,
        ci_high,
        classification,
        coverage_breakdown: breakdown,
        limitations,
    }
}

fn limitations(
    dna: &AvatarDna,
    breakdown: &BTreeMap<ClaimCategory, f64>,
    session: Option<&ConversationSession>,
) -> Vec<String> {
    let mut out = Vec::new();
    let factor = |cat| breakdown.get(&cat).copied().unwrap_or(0.0);

    if factor(ClaimCategory::Communication) < 0.5 {
        out.push(
            "Limited primary sources for communication style - \
             responses may not reflect authentic tone"
                .to_string(),
        );
    }
    if factor(ClaimCategory::DecisionStyle) < 0.6 {
        out.push(
            "Moderate uncertainty in decision-making patterns - \
             use with caution for critical negotiations"
                .to_string(),
        );
    }
    if dna.sources.len() < 5 {
        out.push(format!(
            "Only {} ground truth sources - recommend minimum 8 for high-stakes preparation",
            dna.sources.len()
        ));
    }
    if dna.sources.iter().filter(|s| s.cross_verified).count() < 3 {
        out.push(
            "Limited cross-verification of sources - independently verify critical insights"
                .to_string(),
        );
    }
    if session.is_some_and(|s| s.transcript.len() > EXTENDED_SESSION_TURNS) {
        out.push(
            "Extended conversation (>40 turns) - drift risk increases, validate key takeaways"
                .to_string(),
        );
    }
    out
}

/// Fixed guidance string for the metrics' classification.
pub fn recommendation(metrics: &AvdaMetrics) -> &'static str {
    metrics.classification.recommendation()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AvatarDnaBuilder;
    use crate::fixtures;
    use tactik_types::{GroundTruthSource, InferredClaim, VerifiedClaim};

    #[test]
    fn test_avda_weights_sum_to_one() {
        assert!((AVDA_WEIGHTS.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_category_weights_sum_to_one() {
        let sum: f64 = CATEGORY_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        // Every category weighted exactly once.
        for cat in ClaimCategory::ALL {
            assert_eq!(CATEGORY_WEIGHTS.iter().filter(|(c, _)| *c == cat).count(), 1);
        }
    }

    #[test]
    fn test_canonical_scenario() {
        let m = compute_avda(&fixtures::canonical_dna());
        assert!((m.gt_quality - 0.825).abs() < 1e-9);
        assert!((m.source_coverage - 1.0).abs() < 1e-9);
        assert!((m.drift_risk - 0.2).abs() < 1e-9);
        assert!((m.accuracy - 14.65 / 16.25).abs() < 1e-9);
        assert!((m.avda_score - 84.0).abs() < 0.05, "avda={}", m.avda_score);
        assert_eq!(m.classification, Fidelity::HighFidelity);
        assert!((m.ci_low - 79.0).abs() <= 1.0, "ci_low={}", m.ci_low);
        assert!((m.ci_high - 92.0).abs() <= 1.0, "ci_high={}", m.ci_high);
        assert!(m.limitations.is_empty(), "{:?}", m.limitations);
        assert_eq!(
            recommendation(&m),
            "SUITABLE for strategic preparation and executive training"
        );
    }

    #[test]
    fn test_canonical_percentages() {
        let p = compute_avda(&fixtures::canonical_dna()).to_percentages();
        assert_eq!(p.avda_score, 84.0);
        assert_eq!(p.source_coverage, 100.0);
        assert_eq!(p.drift_risk, 20.0);
        assert_eq!(p.classification, "HIGH FIDELITY");
    }

    #[test]
    fn test_sparse_avatar_is_unreliable() {
        let m = compute_avda(&fixtures::sparse_dna());
        assert!((m.source_coverage - 0.42).abs() < 1e-9);
        assert!((m.drift_risk - 0.95).abs() < 1e-9);
        assert_eq!(m.classification, Fidelity::Unreliable);
        assert_eq!(m.limitations.len(), 4);
        assert!(m.limitations[2].starts_with("Only 2 ground truth sources"));
    }

    #[test]
    fn test_empty_avatar_bounds() {
        let dna = AvatarDnaBuilder::new("empty", "Nobody", "None").build().unwrap();
        let m = compute_avda(&dna);
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.drift_risk, 1.0);
        assert_eq!(m.gt_quality, 0.0);
        assert_eq!(m.avda_score, 0.0);
        assert!(m.ci_low <= m.avda_score && m.avda_score <= m.ci_high);
    }

    #[test]
    fn test_inferred_only_category_scaled() {
        let dna = AvatarDnaBuilder::new("a", "A", "R")
            .inferred(
                ClaimCategory::BehavioralPattern,
                InferredClaim::new("Haggles", "habit"),
            )
            .build()
            .unwrap();
        assert!((source_coverage(&dna) - 0.30 * 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_drift_inflation_above_half() {
        let dna = AvatarDnaBuilder::new("a", "A", "R")
            .source(GroundTruthSource::new("s", SourceTier::Primary, "Doc"))
            .verified(ClaimCategory::Thoughts, VerifiedClaim::new("x", "s"))
            .inferred(ClaimCategory::Thoughts, InferredClaim::new("y", "r"))
            .inferred(ClaimCategory::Thoughts, InferredClaim::new("z", "r"))
            .inferred(ClaimCategory::Thoughts, InferredClaim::new("w", "r"))
            .build()
            .unwrap();
        // 3/4 inferred -> 0.75 + 0.125
        assert!((drift_risk(&dna) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_session_limitation_after_forty_turns() {
        use tactik_types::{ConversationSession, DriftState, GateState, Turn};
        let dna = fixtures::canonical_dna();
        let mut session = ConversationSession::new(
            "s",
            "goal",
            vec![dna.avatar_id.clone()],
            GateState::new(0.52),
            DriftState::new(Default::default()),
        );
        for n in 1..=41 {
            session.transcript.push(Turn {
                turn_number: n,
                speaker_id: dna.avatar_id.clone(),
                speaker_name: dna.name.clone(),
                user_message: "q".into(),
                message: "a".into(),
                eis_score: 0.5,
                hca_score: 0.5,
                dna_score: 0.5,
                low_confidence: false,
                timestamp: chrono::Utc::now(),
            });
        }
        let m = compute_avda_for_session(&dna, &session);
        assert_eq!(m.limitations.len(), 1);
        assert!(m.limitations[0].starts_with("Extended conversation"));
    }

    #[test]
    fn test_score_within_interval_across_profiles() {
        // Grow the canonical avatar one inferred claim at a time.
        let mut builder = fixtures::canonical_builder();
        for n in 0..30 {
            let dna = builder.clone().build().unwrap();
            let m = compute_avda(&dna);
            assert!((0.0..=100.0).contains(&m.avda_score));
            assert!(m.ci_low <= m.avda_score, "step {n}");
            assert!(m.avda_score <= m.ci_high, "step {n}");
            assert_eq!(m.classification, Fidelity::classify(m.avda_score));
            builder = builder.inferred(
                ClaimCategory::ALL[n % 6],
                InferredClaim::new(format!("guess {n}"), "speculation"),
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let dna = fixtures::canonical_dna();
        assert_eq!(compute_avda(&dna), compute_avda(&dna));
    }
}
