// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Advisor Report
// ─────────────────────────────────────────────────────────────────────
//! Read-only post-session report handed to the rendering layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tactik_types::{AvatarDna, AvdaMetrics, AvdaPercentages, ConversationSession, Fidelity};

pub const CERTIFICATION: &str = "TACTIK 5.3 Premium - Scientific Validation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub goal: String,
    pub total_turns: u32,
    /// 0–10.
    pub tactik_score: f64,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub timeframe: String,
    pub action: String,
    pub priority: ActionPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedAvatar {
    pub avatar_id: String,
    pub name: String,
    pub avda_score: f64,
    pub classification: Fidelity,
    pub sources_count: usize,
    pub limitations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssurance {
    pub empathy_pauses: u32,
    pub backflow_corrections: usize,
    pub low_confidence_turns: usize,
    pub tactik_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageGuidelines {
    pub recommended_use: String,
    pub validation_required: String,
    pub update_frequency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransparencyCard {
    pub certification: String,
    pub session_id: String,
    pub generated_at: DateTime<Utc>,
    pub avatars_validated: Vec<ValidatedAvatar>,
    pub quality_assurance: QualityAssurance,
    pub usage_guidelines: UsageGuidelines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorReport {
    pub session_summary: SessionSummary,
    pub avatar_scores: BTreeMap<String, AvdaPercentages>,
    pub key_insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub action_plan_72h: Vec<ActionItem>,
    pub transparency_card: TransparencyCard,
}

/// Usage verdict for the average AVDA percentage across avatars.
pub fn overall_recommendation(average_avda: f64) -> &'static str {
    if average_avda >= 90.0 {
        "APPROVED for critical decision-making"
    } else if average_avda >= 75.0 {
        "SUITABLE for strategic preparation"
    } else if average_avda >= 60.0 {
        "USE for scenario exploration only"
    } else {
        "NOT RECOMMENDED for strategic use - gather more sources"
    }
}

fn action_plan() -> Vec<ActionItem> {
    [
        (
            "24 hours",
            "Review transparency card and validate high-priority insights",
            ActionPriority::High,
        ),
        (
            "48 hours",
            "Gather additional primary sources for low-coverage areas",
            ActionPriority::Medium,
        ),
        (
            "72 hours",
            "Prepare initial outreach strategy based on simulation outcomes",
            ActionPriority::Medium,
        ),
    ]
    .into_iter()
    .map(|(timeframe, action, priority)| ActionItem {
        timeframe: timeframe.to_string(),
        action: action.to_string(),
        priority,
    })
    .collect()
}

/// Assemble the report. `avatars` holds each session avatar with its
/// session-aware metrics.
pub fn build_advisor_report(
    session: &ConversationSession,
    avatars: &[(&AvatarDna, AvdaMetrics)],
    now: DateTime<Utc>,
) -> AdvisorReport {
    let metrics = session.metrics();
    let average_avda = if avatars.is_empty() {
        0.0
    } else {
        avatars.iter().map(|(_, m)| m.avda_score).sum::<f64>() / avatars.len() as f64
    };
    let low_confidence_turns = session.transcript.iter().filter(|t| t.low_confidence).count();
    let backflow_corrections = session.drift_state.events.len();

    let key_insights = vec![
        format!("Simulated {} conversation turns", session.transcript.len()),
        format!("Engaged {} strategic stakeholders", session.avatar_ids.len()),
        format!(
            "Quality assurance: {} empathy pauses, {backflow_corrections} backflow corrections, \
             {low_confidence_turns} low-confidence turns",
            session.empathy_pauses
        ),
    ];

    let mut recommendations = vec![if average_avda >= 75.0 {
        "Simulation quality sufficient for strategic decision-making".to_string()
    } else {
        "Recommend gathering additional sources before critical decisions".to_string()
    }];
    for (dna, m) in avatars {
        if m.classification.is_low() {
            recommendations.push(format!(
                "{}: Low fidelity - validate insights independently",
                dna.name
            ));
        }
    }

    AdvisorReport {
        session_summary: SessionSummary {
            session_id: session.session_id.clone(),
            goal: session.user_goal.clone(),
            total_turns: metrics.total_turns,
            tactik_score: metrics.tactik_score,
            duration_minutes: (now - session.started_at).num_minutes().max(0),
        },
        avatar_scores: avatars
            .iter()
            .map(|(dna, m)| (dna.avatar_id.clone(), m.to_percentages()))
            .collect(),
        key_insights,
        recommendations,
        action_plan_72h: action_plan(),
        transparency_card: TransparencyCard {
            certification: CERTIFICATION.to_string(),
            session_id: session.session_id.clone(),
            generated_at: now,
            avatars_validated: avatars
                .iter()
                .map(|(dna, m)| ValidatedAvatar {
                    avatar_id: dna.avatar_id.clone(),
                    name: dna.name.clone(),
                    avda_score: m.avda_score,
                    classification: m.classification,
                    sources_count: dna.sources.len(),
                    limitations: m.limitations.clone(),
                })
                .collect(),
            quality_assurance: QualityAssurance {
                empathy_pauses: session.empathy_pauses,
                backflow_corrections,
                low_confidence_turns,
                tactik_score: metrics.tactik_score,
            },
            usage_guidelines: UsageGuidelines {
                recommended_use: overall_recommendation(average_avda).to_string(),
                validation_required: "Cross-verify critical insights with primary sources"
                    .to_string(),
                update_frequency:
                    "Re-validate DNA quarterly or when stakeholder context changes".to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avda::compute_avda;
    use crate::fixtures;
    use tactik_types::{DriftState, GateState};

    #[test]
    fn test_overall_recommendation_buckets() {
        assert_eq!(overall_recommendation(95.0), "APPROVED for critical decision-making");
        assert_eq!(overall_recommendation(84.0), "SUITABLE for strategic preparation");
        assert_eq!(overall_recommendation(60.0), "USE for scenario exploration only");
        assert!(overall_recommendation(10.0).starts_with("NOT RECOMMENDED"));
    }

    #[test]
    fn test_report_structure() {
        let canonical = fixtures::canonical_dna();
        let sparse = fixtures::sparse_dna();
        let session = ConversationSession::new(
            "s1",
            fixtures::GOAL,
            vec![canonical.avatar_id.clone(), sparse.avatar_id.clone()],
            GateState::new(0.52),
            DriftState::new(Default::default()),
        );
        let avatars = vec![
            (&canonical, compute_avda(&canonical)),
            (&sparse, compute_avda(&sparse)),
        ];
        let report = build_advisor_report(&session, &avatars, session.started_at);

        assert_eq!(report.session_summary.session_id, "s1");
        assert_eq!(report.session_summary.goal, fixtures::GOAL);
        assert_eq!(report.session_summary.duration_minutes, 0);
        assert_eq!(report.avatar_scores["ceo_retail"].avda_score, 84.0);
        assert_eq!(report.action_plan_72h.len(), 3);
        assert_eq!(report.action_plan_72h[0].priority, ActionPriority::High);
        assert_eq!(report.transparency_card.certification, CERTIFICATION);
        assert_eq!(report.transparency_card.avatars_validated.len(), 2);
        // Average of a high and an unreliable avatar.
        assert!(report.recommendations[0].starts_with("Recommend gathering"));
        assert_eq!(
            report.recommendations[1],
            "Category Buyer: Low fidelity - validate insights independently"
        );
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["transparency_card"]["usage_guidelines"]["recommended_use"].is_string());
        assert!(json["session_summary"]["tactik_score"].is_number());
    }
}
