// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Test Fixtures
// ─────────────────────────────────────────────────────────────────────
//! Canonical retail-negotiation avatar: 8 sources (1 primary, 4
//! secondary, 2 tertiary, 1 inferred; 3 cross-verified), 16 verified
//! and 4 inferred claims.

use tactik_types::{AvatarDna, ClaimCategory, GroundTruthSource, InferredClaim, SourceTier, VerifiedClaim};

use crate::builder::AvatarDnaBuilder;

pub(crate) const GOAL: &str =
    "Negotiate a supplier partnership on sustainable packaging and fair pricing";

/// On-goal, on-profile reply that clears the gate.
pub(crate) const GOOD_REPLY: &str = "I understand your perspective and appreciate the offer. \
    Supplier compliance and documented audit evidence come first for us. \
    Could we agree a phased pilot on sustainable packaging with fair pricing?\n\
    1. Share the audit documentation\n\
    2. Propose a pilot timeline of 3 months";

/// Unrelated small talk that fails every scorer.
pub(crate) const OFF_PROFILE_REPLY: &str = "The weather was lovely at the seaside yesterday and \
    the football match ended in a draw, which nobody really expected at all.";

pub(crate) fn canonical_sources() -> Vec<GroundTruthSource> {
    vec![
        GroundTruthSource::new("src_001", SourceTier::Primary, "Supply chain due diligence act")
            .cross_verified(),
        GroundTruthSource::new("src_002", SourceTier::Secondary, "Corporate sustainability report")
            .cross_verified(),
        GroundTruthSource::new("src_003", SourceTier::Secondary, "Supplier code of conduct")
            .cross_verified(),
        GroundTruthSource::new("src_004", SourceTier::Secondary, "Executive public profile"),
        GroundTruthSource::new("src_005", SourceTier::Secondary, "NGO supply chain assessment"),
        GroundTruthSource::new("src_006", SourceTier::Tertiary, "Trade press interview"),
        GroundTruthSource::new("src_007", SourceTier::Tertiary, "Industry analyst note"),
        GroundTruthSource::new("src_008", SourceTier::Inferred, "Sector negotiation practice"),
    ]
}

fn v(statement: &str, source_id: &str) -> VerifiedClaim {
    VerifiedClaim::new(statement, source_id)
}

fn i(statement: &str) -> InferredClaim {
    InferredClaim::new(statement, "industry pattern")
}

pub(crate) fn canonical_builder() -> AvatarDnaBuilder {
    use ClaimCategory::*;
    AvatarDnaBuilder::new("ceo_retail", "Retail CEO", "Chief Executive Officer")
        .environment("German food retail")
        .language("en")
        .sources(canonical_sources())
        .verified(Influences, v("Legal duty to audit supplier practices", "src_001"))
        .verified(Influences, v("Regulators can fine non-compliant buyers", "src_001"))
        .verified(Influences, v("Sustainability commitments are public", "src_002"))
        .inferred(Influences, i("Peer retailers shape pricing expectations"))
        .verified(Thoughts, v("Compliance risk outweighs short-term margin", "src_001"))
        .verified(Thoughts, v("Supplier audits must be documented", "src_001"))
        .verified(Thoughts, v("Packaging waste is a reputational risk", "src_005"))
        .inferred(Thoughts, i("Sceptical of unverified green claims"))
        .verified(BehavioralPattern, v("Demands documented evidence before commitment", "src_001"))
        .verified(BehavioralPattern, v("Pushes suppliers for sustainable packaging", "src_002"))
        .verified(BehavioralPattern, v("Escalates violations to the compliance board", "src_003"))
        .verified(BehavioralPattern, v("Reviews pricing against audit findings", "src_001"))
        .inferred(BehavioralPattern, i("Tests counterparts with tough opening offers"))
        .verified(DecisionStyle, v("Decides after legal review", "src_001"))
        .verified(DecisionStyle, v("Prefers phased pilot agreements", "src_001"))
        .verified(Communication, v("Direct and formal in negotiations", "src_004"))
        .verified(Communication, v("Frames requests around shared partnership", "src_008"))
        .verified(Priorities, v("Supply chain compliance", "src_001"))
        .verified(Priorities, v("Fair pricing for sustainable packaging", "src_001"))
        .inferred(Priorities, i("Long-term supplier stability"))
        .constraint("legal", "Must document supplier due diligence")
        .constraint("commercial", "Price parity with discount competitors")
}

pub(crate) fn canonical_dna() -> AvatarDna {
    canonical_builder().build().unwrap()
}

/// Sparse avatar: two tertiary sources, mostly inferred claims.
pub(crate) fn sparse_dna() -> AvatarDna {
    use ClaimCategory::*;
    AvatarDnaBuilder::new("buyer_sparse", "Category Buyer", "Purchasing Lead")
        .sources(vec![
            GroundTruthSource::new("t1", SourceTier::Tertiary, "Trade fair remark"),
            GroundTruthSource::new("t2", SourceTier::Tertiary, "Blog mention"),
        ])
        .verified(Thoughts, v("Likes volume discounts", "t1"))
        .inferred(Thoughts, i("Worries about shelf space"))
        .inferred(BehavioralPattern, i("Haggles on every line item"))
        .inferred(Communication, i("Informal tone"))
        .inferred(DecisionStyle, i("Decides quickly"))
        .build()
        .unwrap()
}
