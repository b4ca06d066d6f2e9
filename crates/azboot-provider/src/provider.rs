use async_trait::async_trait;
use azboot_domain::{
    Application, CallerContext, FederatedCredential, ResourceGroup, RoleAssignment,
    ServicePrincipal,
};
use serde_json::{json, Value};

use crate::error::ProviderError;

pub const EMPTY_DEPLOYMENT_TEMPLATE_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#";

/// Minimal schema-valid ARM template that declares no resources.
pub fn empty_deployment_template() -> Value {
    json!({
        "$schema": EMPTY_DEPLOYMENT_TEMPLATE_SCHEMA,
        "contentVersion": "1.0.0.0",
        "resources": [],
    })
}

/// Identity and resource operations the workflows need from Azure.
///
/// Queries return every match for the natural key (empty when nothing
/// matches); "not found" is never an error. Create methods are called only
/// after a query came back empty.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    // ── Session ───────────────────────────────────────────────────────────────

    /// The signed-in account and active subscription.
    /// Returns `NotAuthenticated` when there is no usable session.
    async fn caller_context(&self) -> Result<CallerContext, ProviderError>;

    // ── Resource groups ───────────────────────────────────────────────────────

    async fn find_resource_groups(&self, name: &str) -> Result<Vec<ResourceGroup>, ProviderError>;

    async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> Result<ResourceGroup, ProviderError>;

    // ── Applications & service principals ─────────────────────────────────────

    async fn find_applications_by_name(
        &self,
        display_name: &str,
    ) -> Result<Vec<Application>, ProviderError>;

    async fn find_applications_by_app_id(
        &self,
        app_id: &str,
    ) -> Result<Vec<Application>, ProviderError>;

    async fn create_application(&self, display_name: &str) -> Result<Application, ProviderError>;

    async fn find_service_principals(
        &self,
        app_id: &str,
    ) -> Result<Vec<ServicePrincipal>, ProviderError>;

    async fn create_service_principal(&self, app_id: &str)
        -> Result<ServicePrincipal, ProviderError>;

    // ── Federated credentials ─────────────────────────────────────────────────

    async fn list_federated_credentials(
        &self,
        app_object_id: &str,
    ) -> Result<Vec<FederatedCredential>, ProviderError>;

    async fn create_federated_credential(
        &self,
        app_object_id: &str,
        credential: &FederatedCredential,
    ) -> Result<FederatedCredential, ProviderError>;

    // ── Role assignments ──────────────────────────────────────────────────────

    /// Assignments held by `assignee` at exactly `scope`, optionally filtered
    /// to one role.
    async fn list_role_assignments(
        &self,
        assignee: &str,
        scope: &str,
        role: Option<&str>,
    ) -> Result<Vec<RoleAssignment>, ProviderError>;

    async fn create_role_assignment(
        &self,
        assignment: &RoleAssignment,
    ) -> Result<RoleAssignment, ProviderError>;

    // ── Capability probes ─────────────────────────────────────────────────────

    /// Names of resources in the group.
    async fn list_resources(&self, resource_group: &str) -> Result<Vec<String>, ProviderError>;

    /// Validate-only deployment of `template` against the group. Never
    /// creates anything.
    async fn validate_deployment(
        &self,
        resource_group: &str,
        template: &Value,
    ) -> Result<(), ProviderError>;
}
