use azboot_provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("not signed in to Azure: {0}")]
    NotAuthenticated(String),

    #[error("active subscription is '{actual}' but '{expected}' was requested")]
    SubscriptionMismatch { expected: String, actual: String },

    #[error("resource group '{resource_group}' does not exist and no location was given")]
    MissingLocation { resource_group: String },

    #[error("invalid input: {0}")]
    Domain(#[from] azboot_domain::DomainError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl WorkflowError {
    /// What the operator should do before re-running.
    pub fn remediation(&self) -> Vec<String> {
        match self {
            WorkflowError::NotAuthenticated(_) => vec![
                "Run `az login` (add `--tenant <tenant-id>` for a specific tenant).".into(),
                "Then re-run this command.".into(),
            ],
            WorkflowError::SubscriptionMismatch { expected, .. } => vec![
                format!("Run `az account set --subscription {}`.", expected),
                "Or pass the subscription that is currently active.".into(),
            ],
            WorkflowError::MissingLocation { resource_group } => vec![
                format!("Pass --location <region> so '{}' can be created.", resource_group),
                "List regions with `az account list-locations --output table`.".into(),
            ],
            WorkflowError::Domain(_) => vec!["Check the command-line parameters.".into()],
            WorkflowError::Provider(ProviderError::CliNotFound(program)) => vec![
                format!("Install the Azure CLI or point AZBOOT_AZ_PATH at it (looked for '{}').", program),
            ],
            WorkflowError::Provider(ProviderError::NotAuthenticated(_)) => vec![
                "Your Azure session expired; run `az login` and re-run.".into(),
            ],
            WorkflowError::Provider(_) => vec![
                "Fix the error above and re-run; steps that already completed are skipped.".into(),
            ],
        }
    }
}
