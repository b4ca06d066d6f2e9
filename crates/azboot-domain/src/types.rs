use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::DomainError;
use crate::naming::federated_credential_name;

// ── Constants ────────────────────────────────────────────────────────────────

/// Token issuer for GitHub Actions OIDC tokens.
pub const GITHUB_OIDC_ISSUER: &str = "https://token.actions.githubusercontent.com";

/// Audience Azure AD expects on federated token exchange.
pub const AZURE_AD_AUDIENCE: &str = "api://AzureADTokenExchange";

// ── GitHub repository ────────────────────────────────────────────────────────

/// A GitHub repository in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GitHubRepo {
    owner: String,
    name: String,
}

impl GitHubRepo {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidRepository(s.to_string());
        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty()
            || name.is_empty()
            || name.contains('/')
            || s.chars().any(char::is_whitespace)
        {
            return Err(invalid());
        }
        Ok(Self { owner: owner.to_string(), name: name.to_string() })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for GitHubRepo {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for GitHubRepo {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<GitHubRepo> for String {
    fn from(r: GitHubRepo) -> Self {
        r.to_string()
    }
}

// ── Subject derivation ───────────────────────────────────────────────────────

/// Which kind of GitHub workflow context a federated credential trusts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectMode {
    #[default]
    Branch,
    Environment,
    Tags,
}

impl SubjectMode {
    /// Build the `sub` claim GitHub presents for this mode.
    ///
    /// ```text
    /// branch      → repo:{repo}:ref:refs/heads/{value}
    /// environment → repo:{repo}:environment:{value}
    /// tags        → repo:{repo}:ref:refs/tags/{value}
    /// ```
    pub fn subject(&self, repo: &GitHubRepo, value: &str) -> Result<String, DomainError> {
        if value.trim().is_empty() || value.trim() != value {
            return Err(DomainError::InvalidSubjectValue(value.to_string()));
        }
        Ok(match self {
            SubjectMode::Branch => format!("repo:{}:ref:refs/heads/{}", repo, value),
            SubjectMode::Environment => format!("repo:{}:environment:{}", repo, value),
            SubjectMode::Tags => format!("repo:{}:ref:refs/tags/{}", repo, value),
        })
    }
}

impl std::fmt::Display for SubjectMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectMode::Branch => write!(f, "branch"),
            SubjectMode::Environment => write!(f, "environment"),
            SubjectMode::Tags => write!(f, "tags"),
        }
    }
}

impl FromStr for SubjectMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "branch" => Ok(SubjectMode::Branch),
            "environment" => Ok(SubjectMode::Environment),
            "tags" => Ok(SubjectMode::Tags),
            other => Err(DomainError::InvalidConfig(format!(
                "unknown subject mode '{}': expected branch, environment or tags",
                other
            ))),
        }
    }
}

// ── Scopes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeLevel {
    #[default]
    ResourceGroup,
    Subscription,
}

impl ScopeLevel {
    pub fn scope(&self, subscription_id: &str, resource_group: &str) -> String {
        match self {
            ScopeLevel::ResourceGroup => resource_group_scope(subscription_id, resource_group),
            ScopeLevel::Subscription => subscription_scope(subscription_id),
        }
    }
}

impl std::fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeLevel::ResourceGroup => write!(f, "resource-group"),
            ScopeLevel::Subscription => write!(f, "subscription"),
        }
    }
}

impl FromStr for ScopeLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resource-group" => Ok(ScopeLevel::ResourceGroup),
            "subscription" => Ok(ScopeLevel::Subscription),
            other => Err(DomainError::InvalidConfig(format!(
                "unknown scope '{}': expected resource-group or subscription",
                other
            ))),
        }
    }
}

pub fn subscription_scope(subscription_id: &str) -> String {
    format!("/subscriptions/{}", subscription_id)
}

pub fn resource_group_scope(subscription_id: &str, resource_group: &str) -> String {
    format!("/subscriptions/{}/resourceGroups/{}", subscription_id, resource_group)
}

// ── Remote resources ─────────────────────────────────────────────────────────

/// The signed-in session the provider operates under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub tenant_id: String,
    pub subscription_id: String,
    pub subscription_name: String,
    pub user_name: String,
}

impl CallerContext {
    /// Subscription ids are GUIDs; compare without regard to case.
    pub fn is_subscription(&self, subscription_id: &str) -> bool {
        self.subscription_id.eq_ignore_ascii_case(subscription_id.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub location: String,
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub display_name: String,
    /// Client id, the value GitHub workflows log in with.
    pub app_id: String,
    pub object_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePrincipal {
    pub object_id: String,
    pub app_id: String,
    pub principal_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedCredential {
    pub name: String,
    pub issuer: String,
    pub subject: String,
    pub audiences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FederatedCredential {
    /// Credential trusting GitHub Actions tokens for `repo` in the given mode.
    pub fn github(repo: &GitHubRepo, mode: SubjectMode, value: &str) -> Result<Self, DomainError> {
        let subject = mode.subject(repo, value)?;
        let audiences = vec![AZURE_AD_AUDIENCE.to_string()];
        let prefix = format!("gh-{}-{}-{}-{}", repo.owner(), repo.name(), mode, value);
        Ok(Self {
            name: federated_credential_name(&prefix, GITHUB_OIDC_ISSUER, &subject, &audiences),
            issuer: GITHUB_OIDC_ISSUER.to_string(),
            description: Some(format!("GitHub Actions OIDC for {} ({} {})", repo, mode, value)),
            subject,
            audiences,
        })
    }

    pub fn audience_set(&self) -> BTreeSet<&str> {
        self.audiences.iter().map(String::as_str).collect()
    }

    /// Two credentials are equivalent only when issuer, subject and the
    /// audience set all match exactly. Names and descriptions are ignored.
    pub fn matches(&self, other: &FederatedCredential) -> bool {
        self.issuer == other.issuer
            && self.subject == other.subject
            && self.audience_set() == other.audience_set()
    }

    pub fn is_github_actions(&self) -> bool {
        self.issuer == GITHUB_OIDC_ISSUER && self.audiences.iter().any(|a| a == AZURE_AD_AUDIENCE)
    }

    /// Body accepted by `az ad app federated-credential create --parameters`.
    pub fn to_parameters(&self) -> Value {
        let mut params = json!({
            "name": self.name,
            "issuer": self.issuer,
            "subject": self.subject,
            "audiences": self.audiences,
        });
        if let Some(desc) = &self.description {
            params["description"] = json!(desc);
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Principal object id of the assignee.
    pub assignee: String,
    pub role: String,
    pub scope: String,
}

impl RoleAssignment {
    /// ARM ids and built-in role names compare case-insensitively.
    pub fn same_binding(&self, other: &RoleAssignment) -> bool {
        self.assignee.eq_ignore_ascii_case(&other.assignee)
            && self.role.eq_ignore_ascii_case(&other.role)
            && self.scope.trim_end_matches('/').eq_ignore_ascii_case(other.scope.trim_end_matches('/'))
    }
}
