// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Source Catalog
// ─────────────────────────────────────────────────────────────────────
//! Collects an avatar's ground truth sources before the DNA is built.

use std::collections::HashMap;

use tactik_types::{
    GroundTruthSource, SourceRecord, SourceSummary, TactikError, TactikResult,
};

/// Ordered, id-unique set of ground truth sources.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: Vec<GroundTruthSource>,
    index: HashMap<String, usize>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed source. Rejects blank fields and duplicate ids.
    pub fn register_source(&mut self, source: GroundTruthSource) -> TactikResult<()> {
        source.validate()?;
        if self.index.contains_key(&source.source_id) {
            return Err(TactikError::Validation(format!(
                "source '{}' already registered",
                source.source_id
            )));
        }
        log::debug!(
            "registered source {} ({}, cross_verified={})",
            source.source_id,
            source.tier,
            source.cross_verified
        );
        self.index.insert(source.source_id.clone(), self.sources.len());
        self.sources.push(source);
        Ok(())
    }

    /// Register a raw record; the tier string must name one of the
    /// four recognized tiers.
    pub fn register_record(&mut self, record: SourceRecord) -> TactikResult<()> {
        self.register_source(GroundTruthSource::try_from(record)?)
    }

    pub fn get(&self, source_id: &str) -> Option<&GroundTruthSource> {
        self.index.get(source_id).map(|&i| &self.sources[i])
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.index.contains_key(source_id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[GroundTruthSource] {
        &self.sources
    }

    pub fn summary(&self) -> SourceSummary {
        SourceSummary::from_sources(&self.sources)
    }

    pub fn into_sources(self) -> Vec<GroundTruthSource> {
        self.sources
    }
}

impl TryFrom<Vec<GroundTruthSource>> for SourceCatalog {
    type Error = TactikError;

    fn try_from(sources: Vec<GroundTruthSource>) -> Result<Self, Self::Error> {
        let mut catalog = SourceCatalog::new();
        for source in sources {
            catalog.register_source(source)?;
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactik_types::SourceTier;

    #[test]
    fn test_register_and_lookup() {
        let mut catalog = SourceCatalog::new();
        catalog
            .register_source(GroundTruthSource::new("s1", SourceTier::Primary, "Law"))
            .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("s1").unwrap().tier, SourceTier::Primary);
        assert!(catalog.get("s2").is_none());
    }

    #[test]
    fn test_rejects_unknown_tier() {
        let mut catalog = SourceCatalog::new();
        let err = catalog
            .register_record(SourceRecord {
                source_id: "s1".into(),
                tier: "gossip".into(),
                description: "Hallway talk".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, TactikError::Validation(_)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_rejects_empty_description() {
        let mut catalog = SourceCatalog::new();
        let err = catalog
            .register_source(GroundTruthSource::new("s1", SourceTier::Secondary, ""))
            .unwrap_err();
        assert!(err.to_string().contains("empty description"));
    }

    #[test]
    fn test_rejects_duplicate() {
        let mut catalog = SourceCatalog::new();
        catalog
            .register_source(GroundTruthSource::new("s1", SourceTier::Primary, "Law"))
            .unwrap();
        assert!(catalog
            .register_source(GroundTruthSource::new("s1", SourceTier::Tertiary, "Press"))
            .is_err());
        assert_eq!(catalog.get("s1").unwrap().tier, SourceTier::Primary);
    }

    #[test]
    fn test_try_from_vec_preserves_order() {
        let catalog = SourceCatalog::try_from(vec![
            GroundTruthSource::new("b", SourceTier::Tertiary, "B"),
            GroundTruthSource::new("a", SourceTier::Primary, "A").cross_verified(),
        ])
        .unwrap();
        let ids: Vec<_> = catalog.sources().iter().map(|s| s.source_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(catalog.summary().cross_verified, 1);
    }
}
