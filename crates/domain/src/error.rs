use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("catalog must contain at least one variant")]
    EmptyCatalog,
    #[error("variant id must not be empty")]
    EmptyVariantId,
    #[error("duplicate variant id in catalog: {0}")]
    DuplicateVariantId(String),
    #[error("invalid accent color {0:?}, expected #rrggbb")]
    InvalidAccentColor(String),
    #[error("image reference for variant {0} must not be empty")]
    EmptyImageRef(String),
}
