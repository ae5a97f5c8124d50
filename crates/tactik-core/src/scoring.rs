// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Turn Scorers (EIS / HCA / DNA alignment)
// ─────────────────────────────────────────────────────────────────────
//! Keyword heuristics scoring one candidate response.
//!
//! Every scorer is a pure function of its inputs and never fails:
//! a blank response, or one without a single letter, scores 0 on all
//! three axes so the gate rejects it.

use std::collections::{BTreeMap, BTreeSet};

use regex::{Regex, RegexSet, RegexSetBuilder};

use tactik_types::{
    clamp_score, AvatarDna, ClaimCategory, TactikConfig, TactikError, TactikResult, TurnScores,
};

const EMPATHY_MARKERS: &[&str] = &[
    "understand",
    "appreciate",
    "recognize",
    "acknowledge",
    "perspective",
    "concern",
    "consider",
    "feel",
];

const DISMISSIVE_MARKERS: &[&str] = &[
    "whatever",
    "not my problem",
    "irrelevant",
    "doesn't matter",
    "does not matter",
    "obviously",
];

const ACTION_MARKERS: &[&str] = &[
    "propose",
    "suggest",
    "option",
    "approach",
    "strategy",
    "solution",
    "plan",
    "next step",
    "timeline",
    "pilot",
    "deadline",
    "could",
    "might",
];

const FILLER_MARKERS: &[&str] = &[
    "it depends",
    "in general",
    "generally speaking",
    "various factors",
    "many things",
    "as an ai",
    "hard to say",
];

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "among", "been", "before", "being", "both", "does",
    "each", "every", "from", "have", "having", "here", "into", "just", "more", "most", "must",
    "only", "other", "over", "same", "should", "some", "such", "than", "that", "their", "them",
    "then", "there", "these", "they", "this", "those", "through", "under", "very", "want",
    "were", "what", "when", "where", "which", "while", "will", "with", "would", "your",
    "para", "como", "pero", "esta", "este",
];

/// Weighted profile-term hits at which DNA alignment saturates.
const DNA_SATURATION: f64 = 4.0;
/// Weight of terms taken from inferred claims.
const INFERRED_TERM_WEIGHT: f64 = 0.5;

const PROFILE_CATEGORIES: [ClaimCategory; 4] = [
    ClaimCategory::BehavioralPattern,
    ClaimCategory::Communication,
    ClaimCategory::DecisionStyle,
    ClaimCategory::Priorities,
];

/// Lowercased content words of `text`: at least four characters, not a
/// stopword, trailing plural `s` stripped.
pub fn content_terms(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4 && w.chars().any(char::is_alphabetic))
        .filter(|w| !STOPWORDS.contains(w))
        .map(normalize_term)
        .collect()
}

fn normalize_term(word: &str) -> String {
    match word.strip_suffix('s') {
        Some(stem) if stem.chars().count() >= 4 && !stem.ends_with('s') => stem.to_string(),
        _ => word.to_string(),
    }
}

/// True when the text has nothing a scorer can read.
pub fn is_degenerate(text: &str) -> bool {
    !text.chars().any(char::is_alphabetic)
}

fn count_markers(lower: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| lower.contains(*m)).count()
}

/// Inputs a turn is scored against, besides the response itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub dna: &'a AvatarDna,
    pub user_message: &'a str,
    pub goal_terms: &'a BTreeSet<String>,
}

/// Holds the compiled patterns the heuristics need.
#[derive(Debug, Clone)]
pub struct TurnScorer {
    emotional_cues: RegexSet,
    list_item: Regex,
}

impl TurnScorer {
    pub fn from_config(config: &TactikConfig) -> TactikResult<Self> {
        let emotional_cues = RegexSetBuilder::new(&config.emotional_cue_patterns)
            .case_insensitive(true)
            .build()
            .map_err(|e| TactikError::Config(format!("emotional cue patterns: {e}")))?;
        let list_item = Regex::new(r"(?m)^\s*(?:[-•*]|\d+[.)])\s+\S")
            .map_err(|e| TactikError::Config(format!("list pattern: {e}")))?;
        Ok(Self {
            emotional_cues,
            list_item,
        })
    }

    /// Score all three axes.
    pub fn score(&self, response: &str, ctx: &ScoringContext<'_>) -> TurnScores {
        if response.trim().is_empty() || is_degenerate(response) {
            return TurnScores::minimum();
        }
        TurnScores::new(
            self.eis(response, ctx.user_message),
            self.hca(response, ctx.goal_terms),
            dna_alignment(response, ctx.dna),
        )
    }

    /// Emotional intelligence: empathy markers, engagement, and tone
    /// relative to emotional cues in the user's message.
    pub fn eis(&self, response: &str, user_message: &str) -> f64 {
        if is_degenerate(response) {
            return 0.0;
        }
        let lower = response.to_lowercase();
        let empathy = count_markers(&lower, EMPATHY_MARKERS);
        let mut score = 0.5 + (0.05 * empathy as f64).min(0.25);
        if response.contains('?') {
            score += 0.10;
        }
        if response.chars().count() < 100 {
            score -= 0.15;
        }
        if self.emotional_cues.is_match(user_message) {
            score += if empathy > 0 { 0.10 } else { -0.10 };
        }
        score -= (0.10 * count_markers(&lower, DISMISSIVE_MARKERS) as f64).min(0.30);
        clamp_score(score, 0.0, 1.0)
    }

    /// Human-centeredness: concrete, actionable content against filler.
    pub fn hca(&self, response: &str, goal_terms: &BTreeSet<String>) -> f64 {
        if is_degenerate(response) {
            return 0.0;
        }
        let lower = response.to_lowercase();
        let mut score = 0.45 + (0.04 * count_markers(&lower, ACTION_MARKERS) as f64).min(0.25);
        if response.chars().any(|c| c.is_ascii_digit()) {
            score += 0.10;
        }
        if self.list_item.is_match(response) {
            score += 0.10;
        }
        if !goal_terms.is_empty() && !content_terms(response).is_disjoint(goal_terms) {
            score += 0.10;
        }
        if response.chars().count() < 60 {
            score -= 0.10;
        }
        score -= (0.10 * count_markers(&lower, FILLER_MARKERS) as f64).min(0.30);
        clamp_score(score, 0.0, 1.0)
    }
}

/// Profile vocabulary with per-term weight: verified claims and
/// constraints at 1.0, inferred claims at half weight.
pub fn profile_terms(dna: &AvatarDna) -> BTreeMap<String, f64> {
    let mut terms: BTreeMap<String, f64> = BTreeMap::new();
    let mut add = |text: &str, weight: f64| {
        for term in content_terms(text) {
            let entry = terms.entry(term).or_insert(0.0);
            *entry = entry.max(weight);
        }
    };
    for cat in PROFILE_CATEGORIES {
        let set = dna.claims(cat);
        for claim in &set.verified {
            add(&claim.statement, 1.0);
        }
        for claim in &set.inferred {
            add(&claim.statement, INFERRED_TERM_WEIGHT);
        }
    }
    for description in dna.constraints.values() {
        add(description, 1.0);
    }
    terms
}

/// Keyword overlap between the response and the avatar's documented
/// behaviour, communication, decision style, priorities and constraints.
pub fn dna_alignment(response: &str, dna: &AvatarDna) -> f64 {
    if is_degenerate(response) {
        return 0.0;
    }
    let profile = profile_terms(dna);
    if profile.is_empty() {
        return 0.0;
    }
    let total: f64 = profile.values().sum();
    let hits: f64 = content_terms(response)
        .iter()
        .filter_map(|t| profile.get(t))
        .sum();
    clamp_score(hits / DNA_SATURATION.min(total), 0.0, 1.0)
}
