use std::io::Write;

use async_trait::async_trait;
use azboot_domain::{
    Application, CallerContext, FederatedCredential, ResourceGroup, RoleAssignment,
    ServicePrincipal,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::runner::{render_command, CommandRunner, ProcessRunner};

// ── az JSON shapes ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountDto {
    id: String,
    name: String,
    tenant_id: String,
    #[serde(default)]
    user: Option<UserDto>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GroupDto {
    name: String,
    location: String,
    #[serde(default)]
    properties: Option<GroupPropertiesDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupPropertiesDto {
    provisioning_state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppDto {
    app_id: String,
    id: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServicePrincipalDto {
    id: String,
    app_id: String,
    #[serde(default)]
    service_principal_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FederatedCredentialDto {
    name: String,
    issuer: String,
    subject: String,
    #[serde(default)]
    audiences: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleAssignmentDto {
    principal_id: String,
    /// Only `role assignment list` includes the name; `create` returns the id.
    #[serde(default)]
    role_definition_name: Option<String>,
    #[serde(default)]
    role_definition_id: Option<String>,
    scope: String,
}

#[derive(Debug, Deserialize)]
struct ResourceDto {
    name: String,
}

impl From<GroupDto> for ResourceGroup {
    fn from(g: GroupDto) -> Self {
        ResourceGroup {
            name: g.name,
            location: g.location,
            provisioning_state: g.properties.and_then(|p| p.provisioning_state),
        }
    }
}

impl From<AppDto> for Application {
    fn from(a: AppDto) -> Self {
        Application {
            display_name: a.display_name.unwrap_or_default(),
            app_id: a.app_id,
            object_id: a.id,
        }
    }
}

impl From<ServicePrincipalDto> for ServicePrincipal {
    fn from(sp: ServicePrincipalDto) -> Self {
        ServicePrincipal {
            object_id: sp.id,
            app_id: sp.app_id,
            principal_type: sp.service_principal_type.unwrap_or_else(|| "Application".into()),
        }
    }
}

impl From<FederatedCredentialDto> for FederatedCredential {
    fn from(fc: FederatedCredentialDto) -> Self {
        FederatedCredential {
            name: fc.name,
            issuer: fc.issuer,
            subject: fc.subject,
            audiences: fc.audiences,
            description: fc.description,
        }
    }
}

impl From<RoleAssignmentDto> for RoleAssignment {
    fn from(ra: RoleAssignmentDto) -> Self {
        RoleAssignment {
            assignee: ra.principal_id,
            role: ra.role_definition_name.or(ra.role_definition_id).unwrap_or_default(),
            scope: ra.scope,
        }
    }
}

// ── AzCliProvider ─────────────────────────────────────────────────────────────

/// [`Provider`] backed by the Azure CLI. Every call is one `az` invocation
/// with `--output json`; the signed-in `az` session supplies credentials.
pub struct AzCliProvider<R: CommandRunner = ProcessRunner> {
    runner: R,
}

impl AzCliProvider<ProcessRunner> {
    pub fn new() -> Self {
        Self { runner: ProcessRunner::default() }
    }
}

impl Default for AzCliProvider<ProcessRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> AzCliProvider<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    async fn az<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, ProviderError> {
        let mut argv: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        argv.push("--output".into());
        argv.push("json".into());

        let stdout = self.runner.run(&argv).await.map_err(classify)?;
        let command = render_command("az", &argv);
        let trimmed = stdout.trim();
        // Some commands print nothing on success; treat that as JSON null.
        let text = if trimmed.is_empty() { "null" } else { trimmed };
        serde_json::from_str(text).map_err(|e| ProviderError::Parse {
            command,
            message: e.to_string(),
        })
    }
}

/// Promote `az` failures that ask for a login to `NotAuthenticated`.
fn classify(err: ProviderError) -> ProviderError {
    match err {
        ProviderError::CommandFailed { stderr, .. }
            if stderr.contains("az login") || stderr.contains("AADSTS700082") =>
        {
            ProviderError::NotAuthenticated(stderr)
        }
        other => other,
    }
}

/// Quote a value for an OData `$filter` string literal.
fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[async_trait]
impl<R: CommandRunner> Provider for AzCliProvider<R> {
    fn name(&self) -> &'static str {
        "az-cli"
    }

    async fn caller_context(&self) -> Result<CallerContext, ProviderError> {
        let account: Option<AccountDto> = self.az(&["account", "show"]).await?;
        let account = account.ok_or_else(|| {
            ProviderError::NotAuthenticated("az account show returned no account".into())
        })?;
        Ok(CallerContext {
            tenant_id: account.tenant_id,
            subscription_id: account.id,
            subscription_name: account.name,
            user_name: account.user.map(|u| u.name).unwrap_or_default(),
        })
    }

    async fn find_resource_groups(&self, name: &str) -> Result<Vec<ResourceGroup>, ProviderError> {
        // Group names are case-insensitive; filter here rather than in a JMESPath query.
        let groups: Vec<GroupDto> = self.az(&["group", "list"]).await?;
        Ok(groups
            .into_iter()
            .filter(|g| g.name.eq_ignore_ascii_case(name))
            .map(ResourceGroup::from)
            .collect())
    }

    async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> Result<ResourceGroup, ProviderError> {
        info!(name, location, "creating resource group");
        let group: GroupDto = self
            .az(&["group", "create", "--name", name, "--location", location])
            .await?;
        Ok(group.into())
    }

    async fn find_applications_by_name(
        &self,
        display_name: &str,
    ) -> Result<Vec<Application>, ProviderError> {
        // `--display-name` is a prefix match in Graph; keep exact matches only.
        let apps: Vec<AppDto> = self
            .az(&["ad", "app", "list", "--display-name", display_name])
            .await?;
        Ok(apps
            .into_iter()
            .filter(|a| a.display_name.as_deref() == Some(display_name))
            .map(Application::from)
            .collect())
    }

    async fn find_applications_by_app_id(
        &self,
        app_id: &str,
    ) -> Result<Vec<Application>, ProviderError> {
        let apps: Vec<AppDto> = self.az(&["ad", "app", "list", "--app-id", app_id]).await?;
        Ok(apps.into_iter().map(Application::from).collect())
    }

    async fn create_application(&self, display_name: &str) -> Result<Application, ProviderError> {
        info!(display_name, "creating application registration");
        let app: AppDto = self
            .az(&["ad", "app", "create", "--display-name", display_name])
            .await?;
        Ok(app.into())
    }

    async fn find_service_principals(
        &self,
        app_id: &str,
    ) -> Result<Vec<ServicePrincipal>, ProviderError> {
        let filter = format!("appId eq {}", odata_literal(app_id));
        let sps: Vec<ServicePrincipalDto> =
            self.az(&["ad", "sp", "list", "--filter", &filter]).await?;
        Ok(sps.into_iter().map(ServicePrincipal::from).collect())
    }

    async fn create_service_principal(
        &self,
        app_id: &str,
    ) -> Result<ServicePrincipal, ProviderError> {
        info!(app_id, "creating service principal");
        let sp: ServicePrincipalDto = self.az(&["ad", "sp", "create", "--id", app_id]).await?;
        Ok(sp.into())
    }

    async fn list_federated_credentials(
        &self,
        app_object_id: &str,
    ) -> Result<Vec<FederatedCredential>, ProviderError> {
        let creds: Vec<FederatedCredentialDto> = self
            .az(&["ad", "app", "federated-credential", "list", "--id", app_object_id])
            .await?;
        Ok(creds.into_iter().map(FederatedCredential::from).collect())
    }

    async fn create_federated_credential(
        &self,
        app_object_id: &str,
        credential: &FederatedCredential,
    ) -> Result<FederatedCredential, ProviderError> {
        info!(name = %credential.name, subject = %credential.subject, "creating federated credential");
        let params = credential.to_parameters().to_string();
        let created: FederatedCredentialDto = self
            .az(&[
                "ad",
                "app",
                "federated-credential",
                "create",
                "--id",
                app_object_id,
                "--parameters",
                &params,
            ])
            .await?;
        Ok(created.into())
    }

    async fn list_role_assignments(
        &self,
        assignee: &str,
        scope: &str,
        role: Option<&str>,
    ) -> Result<Vec<RoleAssignment>, ProviderError> {
        let mut args = vec!["role", "assignment", "list", "--assignee", assignee, "--scope", scope];
        if let Some(r) = role {
            args.push("--role");
            args.push(r);
        }
        let assignments: Vec<RoleAssignmentDto> = self.az(&args).await?;
        let wanted = scope.trim_end_matches('/');
        Ok(assignments
            .into_iter()
            .filter(|a| a.scope.trim_end_matches('/').eq_ignore_ascii_case(wanted))
            .map(RoleAssignment::from)
            .collect())
    }

    async fn create_role_assignment(
        &self,
        assignment: &RoleAssignment,
    ) -> Result<RoleAssignment, ProviderError> {
        info!(role = %assignment.role, scope = %assignment.scope, "creating role assignment");
        let created: RoleAssignmentDto = self
            .az(&[
                "role",
                "assignment",
                "create",
                "--assignee-object-id",
                &assignment.assignee,
                "--assignee-principal-type",
                "ServicePrincipal",
                "--role",
                &assignment.role,
                "--scope",
                &assignment.scope,
            ])
            .await?;
        Ok(RoleAssignment {
            assignee: created.principal_id,
            role: assignment.role.clone(),
            scope: assignment.scope.clone(),
        })
    }

    async fn list_resources(&self, resource_group: &str) -> Result<Vec<String>, ProviderError> {
        let resources: Vec<ResourceDto> = self
            .az(&["resource", "list", "--resource-group", resource_group])
            .await?;
        Ok(resources.into_iter().map(|r| r.name).collect())
    }

    async fn validate_deployment(
        &self,
        resource_group: &str,
        template: &Value,
    ) -> Result<(), ProviderError> {
        let mut file = tempfile::Builder::new()
            .prefix("azboot-validate-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| ProviderError::Internal(format!("create template file: {}", e)))?;
        file.write_all(template.to_string().as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| ProviderError::Internal(format!("write template file: {}", e)))?;
        let path = file.path().display().to_string();
        debug!(%path, resource_group, "validating empty deployment");

        let result: Option<Value> = match self
            .az(&[
                "deployment",
                "group",
                "validate",
                "--resource-group",
                resource_group,
                "--template-file",
                &path,
            ])
            .await
        {
            Ok(v) => v,
            Err(ProviderError::CommandFailed { stderr, .. }) => {
                return Err(ProviderError::ValidationFailed(stderr))
            }
            Err(e) => return Err(e),
        };

        // Older az versions exit 0 and put the failure in the body.
        if let Some(err) = result.as_ref().and_then(|v| v.get("error")).filter(|e| !e.is_null()) {
            let code = err["code"].as_str().unwrap_or("Unknown");
            let message = err["message"].as_str().unwrap_or("unknown error");
            return Err(ProviderError::ValidationFailed(format!("{}: {}", code, message)));
        }
        Ok(())
    }
}
