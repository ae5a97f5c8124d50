// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Ground Truth Sources
// ─────────────────────────────────────────────────────────────────────
//! Tier-weighted evidentiary records backing claims about an avatar.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{TactikError, TactikResult};

/// Source reliability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    /// Official documents, laws, contracts.
    Primary,
    /// NGO and corporate reports, public profiles.
    Secondary,
    /// Industry analysis, press interviews.
    Tertiary,
    /// Reasoned inference without a document behind it.
    Inferred,
}

impl SourceTier {
    pub const ALL: [SourceTier; 4] = [
        SourceTier::Primary,
        SourceTier::Secondary,
        SourceTier::Tertiary,
        SourceTier::Inferred,
    ];

    /// Fixed tier weight used by every AVDA sub-score.
    pub const fn weight(self) -> f64 {
        match self {
            SourceTier::Primary => 1.00,
            SourceTier::Secondary => 0.85,
            SourceTier::Tertiary => 0.60,
            SourceTier::Inferred => 0.40,
        }
    }

    /// Expected reliability band `(low, high)` for material of this tier.
    pub const fn reliability_range(self) -> (f64, f64) {
        match self {
            SourceTier::Primary => (0.95, 1.00),
            SourceTier::Secondary => (0.75, 0.90),
            SourceTier::Tertiary => (0.50, 0.70),
            SourceTier::Inferred => (0.30, 0.50),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SourceTier::Primary => "primary",
            SourceTier::Secondary => "secondary",
            SourceTier::Tertiary => "tertiary",
            SourceTier::Inferred => "inferred",
        }
    }
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTier {
    type Err = TactikError;

    /// Accepts the short names and the `tier_N_name` long forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "tier_1_primary" => Ok(SourceTier::Primary),
            "secondary" | "tier_2_secondary" => Ok(SourceTier::Secondary),
            "tertiary" | "tier_3_tertiary" => Ok(SourceTier::Tertiary),
            "inferred" | "tier_4_inferred" => Ok(SourceTier::Inferred),
            other => Err(TactikError::Validation(format!(
                "unrecognized source tier '{other}'"
            ))),
        }
    }
}

/// Unvalidated source as it arrives from a caller, tier still a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source_id: String,
    pub tier: String,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub cross_verified: bool,
}

/// Ground truth source. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthSource {
    pub source_id: String,
    pub tier: SourceTier,
    pub description: String,
    pub url: Option<String>,
    pub date: Option<NaiveDate>,
    pub cross_verified: bool,
}

impl GroundTruthSource {
    pub fn new(
        source_id: impl Into<String>,
        tier: SourceTier,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            tier,
            description: description.into(),
            url: None,
            date: None,
            cross_verified: false,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn cross_verified(mut self) -> Self {
        self.cross_verified = true;
        self
    }

    pub fn weight(&self) -> f64 {
        self.tier.weight()
    }

    /// Required fields present and non-blank.
    pub fn validate(&self) -> TactikResult<()> {
        if self.source_id.trim().is_empty() {
            return Err(TactikError::Validation("source_id must not be empty".into()));
        }
        if self.description.trim().is_empty() {
            return Err(TactikError::Validation(format!(
                "source '{}' has an empty description",
                self.source_id
            )));
        }
        Ok(())
    }
}

impl TryFrom<SourceRecord> for GroundTruthSource {
    type Error = TactikError;

    fn try_from(record: SourceRecord) -> Result<Self, Self::Error> {
        let tier = record.tier.parse::<SourceTier>()?;
        let date = match record.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                TactikError::Validation(format!(
                    "source '{}' has malformed date '{raw}': {e}",
                    record.source_id
                ))
            })?),
        };
        let source = GroundTruthSource {
            source_id: record.source_id,
            tier,
            description: record.description,
            url: record.url.filter(|u| !u.trim().is_empty()),
            date,
            cross_verified: record.cross_verified,
        };
        source.validate()?;
        Ok(source)
    }
}

/// Aggregate view of an avatar's sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub total_sources: usize,
    pub tier_breakdown: BTreeMap<SourceTier, usize>,
    pub cross_verified: usize,
    /// Percentage in [0, 100].
    pub cross_verified_percentage: f64,
}

impl SourceSummary {
    pub fn from_sources(sources: &[GroundTruthSource]) -> Self {
        let mut tier_breakdown = BTreeMap::new();
        let mut cross_verified = 0;
        for source in sources {
            *tier_breakdown.entry(source.tier).or_insert(0) += 1;
            if source.cross_verified {
                cross_verified += 1;
            }
        }
        let cross_verified_percentage = if sources.is_empty() {
            0.0
        } else {
            cross_verified as f64 / sources.len() as f64 * 100.0
        };
        Self {
            total_sources: sources.len(),
            tier_breakdown,
            cross_verified,
            cross_verified_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_weights() {
        assert_eq!(SourceTier::Primary.weight(), 1.00);
        assert_eq!(SourceTier::Secondary.weight(), 0.85);
        assert_eq!(SourceTier::Tertiary.weight(), 0.60);
        assert_eq!(SourceTier::Inferred.weight(), 0.40);
    }

    #[test]
    fn test_reliability_ranges_ordered() {
        for pair in SourceTier::ALL.windows(2) {
            let (hi_tier, lo_tier) = (pair[0].reliability_range(), pair[1].reliability_range());
            assert!(hi_tier.0 > lo_tier.0);
            assert!(hi_tier.1 > lo_tier.1);
        }
    }

    #[test]
    fn test_tier_parse_forms() {
        assert_eq!("primary".parse::<SourceTier>().unwrap(), SourceTier::Primary);
        assert_eq!("tier_2_secondary".parse::<SourceTier>().unwrap(), SourceTier::Secondary);
        assert_eq!(" Tertiary ".parse::<SourceTier>().unwrap(), SourceTier::Tertiary);
        assert!("tier_5_rumour".parse::<SourceTier>().is_err());
    }

    #[test]
    fn test_record_conversion() {
        let record = SourceRecord {
            source_id: "src_001".into(),
            tier: "tier_1_primary".into(),
            description: "Supply chain act".into(),
            url: Some("".into()),
            date: Some("2023-01-01".into()),
            cross_verified: true,
        };
        let source = GroundTruthSource::try_from(record).unwrap();
        assert_eq!(source.tier, SourceTier::Primary);
        assert_eq!(source.url, None);
        assert_eq!(source.date, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert!(source.cross_verified);
    }

    #[test]
    fn test_record_rejects_empty_description() {
        let record = SourceRecord {
            source_id: "src_001".into(),
            tier: "primary".into(),
            description: "  ".into(),
            ..Default::default()
        };
        let err = GroundTruthSource::try_from(record).unwrap_err();
        assert!(matches!(err, TactikError::Validation(_)));
    }

    #[test]
    fn test_record_rejects_bad_date() {
        let record = SourceRecord {
            source_id: "src_001".into(),
            tier: "primary".into(),
            description: "doc".into(),
            date: Some("last spring".into()),
            ..Default::default()
        };
        assert!(GroundTruthSource::try_from(record).is_err());
    }

    #[test]
    fn test_summary() {
        let sources = vec![
            GroundTruthSource::new("a", SourceTier::Primary, "a").cross_verified(),
            GroundTruthSource::new("b", SourceTier::Secondary, "b"),
            GroundTruthSource::new("c", SourceTier::Secondary, "c"),
            GroundTruthSource::new("d", SourceTier::Inferred, "d"),
        ];
        let summary = SourceSummary::from_sources(&sources);
        assert_eq!(summary.total_sources, 4);
        assert_eq!(summary.tier_breakdown[&SourceTier::Secondary], 2);
        assert_eq!(summary.cross_verified, 1);
        assert!((summary.cross_verified_percentage - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_summary_empty() {
        let summary = SourceSummary::from_sources(&[]);
        assert_eq!(summary.total_sources, 0);
        assert_eq!(summary.cross_verified_percentage, 0.0);
    }
}
