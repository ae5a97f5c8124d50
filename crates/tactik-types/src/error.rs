// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all TACTIK kernel failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TactikError {
    /// Malformed input: unknown tier, empty required field, bad session shape.
    #[error("validation error: {0}")]
    Validation(String),

    /// A verified claim cites a source the avatar does not carry.
    #[error("reference error: {category} claim cites unknown source '{source_id}'")]
    DanglingSource { category: String, source_id: String },

    /// Unknown avatar or session id on lookup.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Generation provider failed (after the automatic retry).
    #[error("provider error: {0}")]
    Provider(String),

    /// Generation exceeded its deadline (after the automatic retry).
    #[error("timeout: generation exceeded {deadline_ms}ms deadline")]
    Timeout { deadline_ms: u64 },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Persistence collaborator failed to load or save a snapshot.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl TactikError {
    pub fn avatar_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "avatar",
            id: id.into(),
        }
    }

    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "session",
            id: id.into(),
        }
    }

    /// Transient failures leave session state untouched and may be
    /// re-sent verbatim.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::Timeout { .. })
    }
}

pub type TactikResult<T> = Result<T, TactikError>;
