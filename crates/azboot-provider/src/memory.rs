use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use azboot_domain::{
    Application, CallerContext, FederatedCredential, ResourceGroup, RoleAssignment,
    ServicePrincipal,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::provider::{Provider, EMPTY_DEPLOYMENT_TEMPLATE_SCHEMA};

#[derive(Debug, Default)]
struct Inner {
    context: Option<CallerContext>,
    resource_groups: Vec<ResourceGroup>,
    applications: Vec<Application>,
    service_principals: Vec<ServicePrincipal>,
    /// Keyed by application object id.
    federated_credentials: HashMap<String, Vec<FederatedCredential>>,
    role_assignments: Vec<RoleAssignment>,
    /// Keyed by lower-cased resource group name.
    resources: HashMap<String, Vec<String>>,
    /// Operation name → error message returned instead of running it.
    failures: HashMap<String, String>,
    calls: Vec<String>,
}

/// In-memory implementation of [`Provider`].
///
/// Mirrors Azure's behaviour where it matters to the workflows: display names
/// may repeat, credential names and role bindings may not. Every call is
/// recorded so tests can assert on what was (and was not) attempted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryProvider {
    /// A provider with no signed-in session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider signed in to `subscription_id` under `tenant_id`.
    pub fn signed_in(tenant_id: &str, subscription_id: &str) -> Self {
        let inner = Inner {
            context: Some(CallerContext {
                tenant_id: tenant_id.to_string(),
                subscription_id: subscription_id.to_string(),
                subscription_name: "in-memory".into(),
                user_name: "tester@example.com".into(),
            }),
            ..Inner::default()
        };
        Self { inner: Arc::new(RwLock::new(inner)) }
    }

    // ── Seeding ───────────────────────────────────────────────────────────────

    pub async fn add_resource_group(&self, name: &str, location: &str) {
        let mut guard = self.inner.write().await;
        guard.resource_groups.push(ResourceGroup {
            name: name.to_string(),
            location: location.to_string(),
            provisioning_state: Some("Succeeded".into()),
        });
    }

    pub async fn add_application(&self, display_name: &str) -> Application {
        let mut guard = self.inner.write().await;
        let app = new_application(display_name);
        guard.applications.push(app.clone());
        app
    }

    pub async fn add_service_principal(&self, app_id: &str) -> ServicePrincipal {
        let mut guard = self.inner.write().await;
        let sp = new_service_principal(app_id);
        guard.service_principals.push(sp.clone());
        sp
    }

    pub async fn add_federated_credential(&self, app_object_id: &str, credential: FederatedCredential) {
        let mut guard = self.inner.write().await;
        guard
            .federated_credentials
            .entry(app_object_id.to_string())
            .or_default()
            .push(credential);
    }

    pub async fn add_role_assignment(&self, assignment: RoleAssignment) {
        let mut guard = self.inner.write().await;
        guard.role_assignments.push(assignment);
    }

    pub async fn add_resource(&self, resource_group: &str, name: &str) {
        let mut guard = self.inner.write().await;
        guard
            .resources
            .entry(resource_group.to_ascii_lowercase())
            .or_default()
            .push(name.to_string());
    }

    /// Make every later call to `operation` (a [`Provider`] method name)
    /// fail with `message`.
    pub async fn fail_on(&self, operation: &str, message: &str) {
        let mut guard = self.inner.write().await;
        guard.failures.insert(operation.to_string(), message.to_string());
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub async fn calls(&self) -> Vec<String> {
        self.inner.read().await.calls.clone()
    }

    /// Recorded calls that would have mutated Azure.
    pub async fn create_calls(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter(|c| c.starts_with("create_"))
            .collect()
    }

    pub async fn resource_groups(&self) -> Vec<ResourceGroup> {
        self.inner.read().await.resource_groups.clone()
    }

    pub async fn applications(&self) -> Vec<Application> {
        self.inner.read().await.applications.clone()
    }

    pub async fn service_principals(&self) -> Vec<ServicePrincipal> {
        self.inner.read().await.service_principals.clone()
    }

    pub async fn federated_credentials(&self, app_object_id: &str) -> Vec<FederatedCredential> {
        self.inner
            .read()
            .await
            .federated_credentials
            .get(app_object_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn role_assignments(&self) -> Vec<RoleAssignment> {
        self.inner.read().await.role_assignments.clone()
    }

    /// Log the call, then fail it if a failure was injected for `operation`.
    async fn record(&self, operation: &str) -> Result<(), ProviderError> {
        let mut guard = self.inner.write().await;
        guard.calls.push(operation.to_string());
        debug!(operation, "InMemoryProvider call");
        match guard.failures.get(operation) {
            Some(message) => Err(ProviderError::CommandFailed {
                command: format!("in-memory {}", operation),
                code: 1,
                stderr: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn new_application(display_name: &str) -> Application {
    Application {
        display_name: display_name.to_string(),
        app_id: Uuid::new_v4().to_string(),
        object_id: Uuid::new_v4().to_string(),
    }
}

fn new_service_principal(app_id: &str) -> ServicePrincipal {
    ServicePrincipal {
        object_id: Uuid::new_v4().to_string(),
        app_id: app_id.to_string(),
        principal_type: "Application".into(),
    }
}

fn conflict(operation: &str, message: String) -> ProviderError {
    ProviderError::CommandFailed {
        command: format!("in-memory {}", operation),
        code: 1,
        stderr: message,
    }
}

#[async_trait]
impl Provider for InMemoryProvider {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn caller_context(&self) -> Result<CallerContext, ProviderError> {
        self.record("caller_context").await?;
        self.inner
            .read()
            .await
            .context
            .clone()
            .ok_or_else(|| ProviderError::NotAuthenticated("Please run 'az login' to setup account.".into()))
    }

    async fn find_resource_groups(&self, name: &str) -> Result<Vec<ResourceGroup>, ProviderError> {
        self.record("find_resource_groups").await?;
        let guard = self.inner.read().await;
        Ok(guard
            .resource_groups
            .iter()
            .filter(|g| g.name.eq_ignore_ascii_case(name))
            .cloned()
            .collect())
    }

    async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> Result<ResourceGroup, ProviderError> {
        self.record("create_resource_group").await?;
        let mut guard = self.inner.write().await;
        let group = ResourceGroup {
            name: name.to_string(),
            location: location.to_string(),
            provisioning_state: Some("Succeeded".into()),
        };
        guard.resource_groups.retain(|g| !g.name.eq_ignore_ascii_case(name));
        guard.resource_groups.push(group.clone());
        Ok(group)
    }

    async fn find_applications_by_name(
        &self,
        display_name: &str,
    ) -> Result<Vec<Application>, ProviderError> {
        self.record("find_applications_by_name").await?;
        let guard = self.inner.read().await;
        Ok(guard
            .applications
            .iter()
            .filter(|a| a.display_name == display_name)
            .cloned()
            .collect())
    }

    async fn find_applications_by_app_id(
        &self,
        app_id: &str,
    ) -> Result<Vec<Application>, ProviderError> {
        self.record("find_applications_by_app_id").await?;
        let guard = self.inner.read().await;
        Ok(guard
            .applications
            .iter()
            .filter(|a| a.app_id.eq_ignore_ascii_case(app_id))
            .cloned()
            .collect())
    }

    async fn create_application(&self, display_name: &str) -> Result<Application, ProviderError> {
        self.record("create_application").await?;
        let mut guard = self.inner.write().await;
        let app = new_application(display_name);
        guard.applications.push(app.clone());
        Ok(app)
    }

    async fn find_service_principals(
        &self,
        app_id: &str,
    ) -> Result<Vec<ServicePrincipal>, ProviderError> {
        self.record("find_service_principals").await?;
        let guard = self.inner.read().await;
        Ok(guard
            .service_principals
            .iter()
            .filter(|sp| sp.app_id.eq_ignore_ascii_case(app_id))
            .cloned()
            .collect())
    }

    async fn create_service_principal(
        &self,
        app_id: &str,
    ) -> Result<ServicePrincipal, ProviderError> {
        self.record("create_service_principal").await?;
        let mut guard = self.inner.write().await;
        if guard.service_principals.iter().any(|sp| sp.app_id.eq_ignore_ascii_case(app_id)) {
            return Err(conflict(
                "create_service_principal",
                format!("service principal for {} already exists", app_id),
            ));
        }
        let sp = new_service_principal(app_id);
        guard.service_principals.push(sp.clone());
        Ok(sp)
    }

    async fn list_federated_credentials(
        &self,
        app_object_id: &str,
    ) -> Result<Vec<FederatedCredential>, ProviderError> {
        self.record("list_federated_credentials").await?;
        let guard = self.inner.read().await;
        if !guard.applications.iter().any(|a| a.object_id == app_object_id) {
            return Err(conflict(
                "list_federated_credentials",
                format!("Resource '{}' does not exist", app_object_id),
            ));
        }
        Ok(guard
            .federated_credentials
            .get(app_object_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_federated_credential(
        &self,
        app_object_id: &str,
        credential: &FederatedCredential,
    ) -> Result<FederatedCredential, ProviderError> {
        self.record("create_federated_credential").await?;
        let mut guard = self.inner.write().await;
        let existing = guard
            .federated_credentials
            .entry(app_object_id.to_string())
            .or_default();
        if existing.iter().any(|c| c.name == credential.name) {
            return Err(conflict(
                "create_federated_credential",
                format!("FederatedIdentityCredential with name {} already exists", credential.name),
            ));
        }
        existing.push(credential.clone());
        Ok(credential.clone())
    }

    async fn list_role_assignments(
        &self,
        assignee: &str,
        scope: &str,
        role: Option<&str>,
    ) -> Result<Vec<RoleAssignment>, ProviderError> {
        self.record("list_role_assignments").await?;
        let guard = self.inner.read().await;
        let scope = scope.trim_end_matches('/');
        Ok(guard
            .role_assignments
            .iter()
            .filter(|ra| ra.assignee.eq_ignore_ascii_case(assignee))
            .filter(|ra| ra.scope.trim_end_matches('/').eq_ignore_ascii_case(scope))
            .filter(|ra| role.map_or(true, |r| ra.role.eq_ignore_ascii_case(r)))
            .cloned()
            .collect())
    }

    async fn create_role_assignment(
        &self,
        assignment: &RoleAssignment,
    ) -> Result<RoleAssignment, ProviderError> {
        self.record("create_role_assignment").await?;
        let mut guard = self.inner.write().await;
        if guard.role_assignments.iter().any(|ra| ra.same_binding(assignment)) {
            return Err(conflict(
                "create_role_assignment",
                "RoleAssignmentExists: The role assignment already exists.".into(),
            ));
        }
        guard.role_assignments.push(assignment.clone());
        Ok(assignment.clone())
    }

    async fn list_resources(&self, resource_group: &str) -> Result<Vec<String>, ProviderError> {
        self.record("list_resources").await?;
        let guard = self.inner.read().await;
        if !guard.resource_groups.iter().any(|g| g.name.eq_ignore_ascii_case(resource_group)) {
            return Err(conflict(
                "list_resources",
                format!("ResourceGroupNotFound: Resource group '{}' could not be found.", resource_group),
            ));
        }
        Ok(guard
            .resources
            .get(&resource_group.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn validate_deployment(
        &self,
        resource_group: &str,
        template: &Value,
    ) -> Result<(), ProviderError> {
        self.record("validate_deployment").await?;
        let guard = self.inner.read().await;
        if !guard.resource_groups.iter().any(|g| g.name.eq_ignore_ascii_case(resource_group)) {
            return Err(ProviderError::ValidationFailed(format!(
                "ResourceGroupNotFound: Resource group '{}' could not be found.",
                resource_group
            )));
        }
        if template["$schema"].as_str() != Some(EMPTY_DEPLOYMENT_TEMPLATE_SCHEMA)
            || !template["resources"].is_array()
        {
            return Err(ProviderError::ValidationFailed("InvalidTemplate".into()));
        }
        Ok(())
    }
}
