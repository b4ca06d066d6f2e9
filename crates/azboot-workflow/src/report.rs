use serde::{Deserialize, Serialize};

// ── Setup ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ResourceGroup,
    Application,
    ServicePrincipal,
    FederatedCredential,
    RoleAssignment,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceKind::ResourceGroup => "resource group",
            ResourceKind::Application => "application",
            ResourceKind::ServicePrincipal => "service principal",
            ResourceKind::FederatedCredential => "federated credential",
            ResourceKind::RoleAssignment => "role assignment",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Found by natural key; nothing was changed.
    Existing,
    Created,
    /// Dry run: would have been created.
    Planned,
}

/// Outcome of one ensure step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub kind: ResourceKind,
    /// Natural key the resource was looked up by.
    pub key: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Machine-readable result of a setup run. Ids are `None` only in a dry run
/// for resources that do not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupSummary {
    pub client_id: Option<String>,
    pub service_principal_id: Option<String>,
    pub tenant_id: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub location: Option<String>,
    pub scope: String,
    pub subject: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupReport {
    pub dry_run: bool,
    pub steps: Vec<Step>,
    pub summary: SetupSummary,
}

impl SetupReport {
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    pub fn all_existing(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Existing)
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    ResourceGroup,
    Application,
    ServicePrincipal,
    FederatedCredentials,
    RoleAssignments,
    ResourceListing,
    DeploymentValidation,
}

impl CheckKind {
    /// Advisory checks report a problem as [`CheckStatus::Warn`].
    pub fn is_advisory(&self) -> bool {
        matches!(self, CheckKind::ResourceListing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::ResourceGroup => "Resource group exists",
            CheckKind::Application => "Application registration exists",
            CheckKind::ServicePrincipal => "Service principal exists",
            CheckKind::FederatedCredentials => "GitHub federated credential configured",
            CheckKind::RoleAssignments => "Role assignment present",
            CheckKind::ResourceListing => "Can list resources in group",
            CheckKind::DeploymentValidation => "Deployment dry-run validates",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    /// An advisory check did not pass; reported, never counted as a failure.
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub app_id: String,
    pub tenant_id: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub checks: Vec<CheckResult>,
    pub remediation: Vec<String>,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.checks.len()
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn failed(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    pub fn warned(&self) -> usize {
        self.count(CheckStatus::Warn)
    }

    pub fn passed(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

// ── Progress ──────────────────────────────────────────────────────────────────

/// Receives each step/check as soon as it finishes, so an operator sees
/// progress even when a later step aborts the run.
pub trait Progress {
    fn step(&mut self, _step: &Step) {}
    fn check(&mut self, _check: &CheckResult) {}
}

/// Discards progress; the final report still carries everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {}
