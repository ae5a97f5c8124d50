// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Prompt Builder
// ─────────────────────────────────────────────────────────────────────
//! Pure, deterministic construction of the generation context.

use serde::{Deserialize, Serialize};

use tactik_types::{AvatarDna, AvdaMetrics, ClaimCategory, Turn};

const MAX_VERIFIED_PER_SECTION: usize = 5;
const MAX_INFERRED_PER_SECTION: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    User,
    Avatar,
}

/// One prior exchange message passed to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

fn section_title(category: ClaimCategory) -> &'static str {
    match category {
        ClaimCategory::Influences => "INFLUENCES",
        ClaimCategory::Thoughts => "THOUGHT PATTERNS",
        ClaimCategory::BehavioralPattern => "BEHAVIORAL PATTERNS",
        ClaimCategory::DecisionStyle => "DECISION STYLE",
        ClaimCategory::Communication => "COMMUNICATION STYLE",
        ClaimCategory::Priorities => "PRIORITIES",
    }
}

fn push_claims(prompt: &mut String, dna: &AvatarDna, category: ClaimCategory) {
    let set = dna.claims(category);
    if set.is_empty() {
        return;
    }
    prompt.push_str(&format!("\n{} (documented):\n", section_title(category)));
    for claim in set.verified.iter().take(MAX_VERIFIED_PER_SECTION) {
        match &claim.context {
            Some(context) => prompt.push_str(&format!(
                "- {} [{}] - {context}\n",
                claim.statement, claim.source_id
            )),
            None => prompt.push_str(&format!("- {} [{}]\n", claim.statement, claim.source_id)),
        }
    }
    let inferred: Vec<_> = set.inferred.iter().take(MAX_INFERRED_PER_SECTION).collect();
    if !inferred.is_empty() {
        prompt.push_str("Inferred (speculative):\n");
        for claim in inferred {
            prompt.push_str(&format!("- {} - {}\n", claim.statement, claim.rationale));
        }
    }
}

/// System prompt for one avatar turn.
///
/// `correction` is the drift detector's queued instruction, if any.
pub fn build_system_prompt(
    dna: &AvatarDna,
    metrics: &AvdaMetrics,
    user_goal: &str,
    correction: Option<&str>,
) -> String {
    let mut prompt = String::with_capacity(2048);
    prompt.push_str(&format!(
        "You are simulating {}, {}.\nEnvironment: {}\n",
        dna.name, dna.role, dna.environment
    ));
    prompt.push_str(&format!("Conversation goal of the user: {user_goal}\n"));

    for category in ClaimCategory::ALL {
        push_claims(&mut prompt, dna, category);
    }

    if !dna.constraints.is_empty() {
        prompt.push_str("\nCONSTRAINTS:\n");
        for (key, description) in &dna.constraints {
            prompt.push_str(&format!("- {key}: {description}\n"));
        }
    }

    let summary = dna.source_summary();
    prompt.push_str("\nVALIDATION:\n");
    prompt.push_str(&format!(
        "Source coverage: {:.1}%\nGround truth sources: {} ({} cross-verified)\n\
         Fidelity: {} ({:.1}%)\n",
        metrics.source_coverage * 100.0,
        summary.total_sources,
        summary.cross_verified,
        metrics.classification,
        metrics.avda_score
    ));

    prompt.push_str(
        "\nGUIDELINES:\n\
         1. Stay true to documented patterns; never fabricate positions.\n\
         2. When a point rests only on inferred material, say so.\n\
         3. Match the documented communication style.\n\
         4. Show care on sensitive topics and acknowledge uncertainty.\n",
    );

    if let Some(correction) = correction {
        prompt.push_str(&format!("\nCORRECTION: {correction}\n"));
    }

    prompt.push_str(&format!(
        "\nLanguage: {}. Respond as {} would, in their own voice.\n",
        dna.language, dna.name
    ));
    prompt
}

/// Last `limit` transcript turns as alternating user/avatar messages.
pub fn build_prior_turns(transcript: &[Turn], limit: usize) -> Vec<PromptMessage> {
    let start = transcript.len().saturating_sub(limit);
    transcript[start..]
        .iter()
        .flat_map(|turn| {
            [
                PromptMessage {
                    role: PromptRole::User,
                    content: turn.user_message.clone(),
                },
                PromptMessage {
                    role: PromptRole::Avatar,
                    content: format!("{}: {}", turn.speaker_name, turn.message),
                },
            ]
        })
        .collect()
}
