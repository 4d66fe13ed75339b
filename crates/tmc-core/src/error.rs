use thiserror::Error;

/// Planning fails fast: the first error aborts the whole expansion and the
/// caller never sees a partial plan.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// An axis combination no builder supports (e.g. 64-bit windows).
    #[error("unsupported configuration: {reason}")]
    Configuration { reason: String },

    /// Two steps resolved to the same description string. Reporting keys
    /// off descriptions, so they must be unique within a plan.
    #[error("duplicate step description: {description:?}")]
    DuplicateDescription { description: String },
}

impl PlanError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        PlanError::Configuration { reason: reason.into() }
    }
}
