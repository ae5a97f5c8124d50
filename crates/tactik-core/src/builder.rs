// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Avatar DNA Builder
// ─────────────────────────────────────────────────────────────────────
//! Assembles an `AvatarDna` and enforces its reference invariant.

use std::collections::BTreeMap;

use tactik_types::{
    AvatarDna, ClaimCategory, ClaimSet, GroundTruthSource, InferredClaim, TactikResult,
    VerifiedClaim,
};

use crate::catalog::SourceCatalog;

/// Claims for all six categories, as handed to [`build_avatar_dna`].
#[derive(Debug, Clone, Default)]
pub struct CategoryClaims {
    pub influences: ClaimSet,
    pub thoughts: ClaimSet,
    pub behavioral_pattern: ClaimSet,
    pub decision_style: ClaimSet,
    pub communication: ClaimSet,
    pub priorities: ClaimSet,
}

/// Build an avatar in one call. Fails with `DanglingSource` when a
/// verified claim cites an id absent from `sources`.
pub fn build_avatar_dna(
    avatar_id: &str,
    name: &str,
    role: &str,
    sources: Vec<GroundTruthSource>,
    claims: CategoryClaims,
    environment: &str,
    language: &str,
) -> TactikResult<AvatarDna> {
    AvatarDnaBuilder::new(avatar_id, name, role)
        .environment(environment)
        .language(language)
        .sources(sources)
        .claims(ClaimCategory::Influences, claims.influences)
        .claims(ClaimCategory::Thoughts, claims.thoughts)
        .claims(ClaimCategory::BehavioralPattern, claims.behavioral_pattern)
        .claims(ClaimCategory::DecisionStyle, claims.decision_style)
        .claims(ClaimCategory::Communication, claims.communication)
        .claims(ClaimCategory::Priorities, claims.priorities)
        .build()
}

/// Incremental builder; nothing is checked until [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct AvatarDnaBuilder {
    dna: AvatarDna,
}

impl AvatarDnaBuilder {
    pub fn new(avatar_id: &str, name: &str, role: &str) -> Self {
        Self {
            dna: AvatarDna {
                avatar_id: avatar_id.to_string(),
                name: name.to_string(),
                role: role.to_string(),
                environment: String::new(),
                language: "en".to_string(),
                version: 1,
                sources: Vec::new(),
                influences: ClaimSet::default(),
                thoughts: ClaimSet::default(),
                behavioral_pattern: ClaimSet::default(),
                decision_style: ClaimSet::default(),
                communication: ClaimSet::default(),
                priorities: ClaimSet::default(),
                constraints: BTreeMap::new(),
            },
        }
    }

    /// Start a new version from an existing avatar.
    pub fn revise(dna: &AvatarDna) -> Self {
        let mut next = dna.clone();
        next.version = dna.version.saturating_add(1);
        Self { dna: next }
    }

    pub fn environment(mut self, environment: &str) -> Self {
        self.dna.environment = environment.to_string();
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.dna.language = language.to_string();
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.dna.version = version;
        self
    }

    pub fn source(mut self, source: GroundTruthSource) -> Self {
        self.dna.sources.push(source);
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = GroundTruthSource>) -> Self {
        self.dna.sources.extend(sources);
        self
    }

    pub fn catalog(self, catalog: SourceCatalog) -> Self {
        self.sources(catalog.into_sources())
    }

    /// Replace the claims of one category.
    pub fn claims(mut self, category: ClaimCategory, set: ClaimSet) -> Self {
        *self.dna.claims_mut(category) = set;
        self
    }

    pub fn verified(mut self, category: ClaimCategory, claim: VerifiedClaim) -> Self {
        self.dna.claims_mut(category).verified.push(claim);
        self
    }

    pub fn inferred(mut self, category: ClaimCategory, claim: InferredClaim) -> Self {
        self.dna.claims_mut(category).inferred.push(claim);
        self
    }

    pub fn constraint(mut self, key: &str, description: &str) -> Self {
        self.dna
            .constraints
            .insert(key.to_string(), description.to_string());
        self
    }

    pub fn build(self) -> TactikResult<AvatarDna> {
        self.dna.validate()?;
        let (verified, inferred) = self.dna.claim_counts();
        log::info!(
            "built avatar {} v{}: {} sources, {verified} verified / {inferred} inferred claims",
            self.dna.avatar_id,
            self.dna.version,
            self.dna.sources.len()
        );
        Ok(self.dna)
    }
}
