use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid repository '{0}': expected owner/repo")]
    InvalidRepository(String),

    #[error("invalid subject value '{0}': must be non-empty and contain no whitespace")]
    InvalidSubjectValue(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
