// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Avatar DNA
// ─────────────────────────────────────────────────────────────────────
//! Structured avatar profile: six claim categories, each split into
//! source-backed (verified) and reasoned (inferred) claims.
//!
//! A verified claim can only be built with a `source_id`; whether that
//! id resolves against the avatar's sources is checked by
//! [`AvatarDna::validate`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TactikError, TactikResult};
use crate::source::{GroundTruthSource, SourceSummary};

/// The six claim categories of an avatar profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimCategory {
    Influences,
    Thoughts,
    BehavioralPattern,
    DecisionStyle,
    Communication,
    Priorities,
}

impl ClaimCategory {
    pub const ALL: [ClaimCategory; 6] = [
        ClaimCategory::Influences,
        ClaimCategory::Thoughts,
        ClaimCategory::BehavioralPattern,
        ClaimCategory::DecisionStyle,
        ClaimCategory::Communication,
        ClaimCategory::Priorities,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ClaimCategory::Influences => "influences",
            ClaimCategory::Thoughts => "thoughts",
            ClaimCategory::BehavioralPattern => "behavioral_pattern",
            ClaimCategory::DecisionStyle => "decision_style",
            ClaimCategory::Communication => "communication",
            ClaimCategory::Priorities => "priorities",
        }
    }
}

impl fmt::Display for ClaimCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A claim traceable to one of the avatar's sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedClaim {
    pub statement: String,
    pub source_id: String,
    /// Optional qualifier: impact level, situational context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl VerifiedClaim {
    pub fn new(statement: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            source_id: source_id.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// A claim reasoned without a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredClaim {
    pub statement: String,
    pub rationale: String,
}

impl InferredClaim {
    pub fn new(statement: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            rationale: rationale.into(),
        }
    }
}

/// Verified and inferred claims of one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    #[serde(default)]
    pub verified: Vec<VerifiedClaim>,
    #[serde(default)]
    pub inferred: Vec<InferredClaim>,
}

impl ClaimSet {
    pub fn new(verified: Vec<VerifiedClaim>, inferred: Vec<InferredClaim>) -> Self {
        Self { verified, inferred }
    }

    pub fn total(&self) -> usize {
        self.verified.len() + self.inferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Avatar profile. Immutable after build; a change is a new `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarDna {
    pub avatar_id: String,
    pub name: String,
    pub role: String,
    pub environment: String,
    pub language: String,
    #[serde(default = "first_version")]
    pub version: u32,
    pub sources: Vec<GroundTruthSource>,
    #[serde(default)]
    pub influences: ClaimSet,
    #[serde(default)]
    pub thoughts: ClaimSet,
    #[serde(default)]
    pub behavioral_pattern: ClaimSet,
    #[serde(default)]
    pub decision_style: ClaimSet,
    #[serde(default)]
    pub communication: ClaimSet,
    #[serde(default)]
    pub priorities: ClaimSet,
    /// Named situational constraints (legal, commercial, reputational…).
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

fn first_version() -> u32 {
    1
}

impl AvatarDna {
    pub fn claims(&self, category: ClaimCategory) -> &ClaimSet {
        match category {
            ClaimCategory::Influences => &self.influences,
            ClaimCategory::Thoughts => &self.thoughts,
            ClaimCategory::BehavioralPattern => &self.behavioral_pattern,
            ClaimCategory::DecisionStyle => &self.decision_style,
            ClaimCategory::Communication => &self.communication,
            ClaimCategory::Priorities => &self.priorities,
        }
    }

    pub fn claims_mut(&mut self, category: ClaimCategory) -> &mut ClaimSet {
        match category {
            ClaimCategory::Influences => &mut self.influences,
            ClaimCategory::Thoughts => &mut self.thoughts,
            ClaimCategory::BehavioralPattern => &mut self.behavioral_pattern,
            ClaimCategory::DecisionStyle => &mut self.decision_style,
            ClaimCategory::Communication => &mut self.communication,
            ClaimCategory::Priorities => &mut self.priorities,
        }
    }

    pub fn source(&self, source_id: &str) -> Option<&GroundTruthSource> {
        self.sources.iter().find(|s| s.source_id == source_id)
    }

    pub fn source_summary(&self) -> SourceSummary {
        SourceSummary::from_sources(&self.sources)
    }

    /// `(verified, inferred)` claim counts across all categories.
    pub fn claim_counts(&self) -> (usize, usize) {
        ClaimCategory::ALL.iter().fold((0, 0), |(v, i), &cat| {
            let set = self.claims(cat);
            (v + set.verified.len(), i + set.inferred.len())
        })
    }

    /// Structural invariants: identity fields present, unique source ids,
    /// sources well-formed, every verified claim resolves to a source.
    pub fn validate(&self) -> TactikResult<()> {
        if self.avatar_id.trim().is_empty() {
            return Err(TactikError::Validation("avatar_id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(TactikError::Validation(format!(
                "avatar '{}' has an empty name",
                self.avatar_id
            )));
        }
        if self.version == 0 {
            return Err(TactikError::Validation(format!(
                "avatar '{}' version must be >= 1",
                self.avatar_id
            )));
        }

        let mut seen = HashSet::with_capacity(self.sources.len());
        for source in &self.sources {
            source.validate()?;
            if !seen.insert(source.source_id.as_str()) {
                return Err(TactikError::Validation(format!(
                    "duplicate source_id '{}'",
                    source.source_id
                )));
            }
        }

        for category in ClaimCategory::ALL {
            let set = self.claims(category);
            for claim in &set.verified {
                if !seen.contains(claim.source_id.as_str()) {
                    return Err(TactikError::DanglingSource {
                        category: category.to_string(),
                        source_id: claim.source_id.clone(),
                    });
                }
                if claim.statement.trim().is_empty() {
                    return Err(TactikError::Validation(format!(
                        "empty verified {category} claim"
                    )));
                }
            }
            if set.inferred.iter().any(|c| c.statement.trim().is_empty()) {
                return Err(TactikError::Validation(format!(
                    "empty inferred {category} claim"
                )));
            }
        }
        Ok(())
    }
}
