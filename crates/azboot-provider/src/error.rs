use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("{0} not found on PATH")]
    CliNotFound(String),

    #[error("`{command}` failed with exit code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("could not parse output of `{command}`: {message}")]
    Parse { command: String, message: String },

    #[error("deployment validation failed: {0}")]
    ValidationFailed(String),

    #[error("internal provider error: {0}")]
    Internal(String),
}
