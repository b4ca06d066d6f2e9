use azboot_domain::{
    Application, FederatedCredential, GitHubRepo, RoleAssignment, ScopeLevel, ServicePrincipal,
    SubjectMode, AZURE_AD_AUDIENCE,
};
use azboot_provider::{Provider, ProviderError};
use tracing::info;

use crate::ensure::{ensure, Ensured};
use crate::error::WorkflowError;
use crate::preflight::preflight;
use crate::report::{Progress, ResourceKind, SetupReport, SetupSummary, Step, StepStatus};

pub const DEFAULT_ROLE: &str = "Contributor";
pub const DEFAULT_SUBJECT_VALUE: &str = "main";

#[derive(Debug, Clone)]
pub struct SetupParams {
    pub subscription_id: String,
    pub display_name: String,
    pub resource_group: String,
    /// Only needed when the resource group does not exist yet.
    pub location: Option<String>,
    pub repository: GitHubRepo,
    pub subject_mode: SubjectMode,
    pub subject_value: String,
    pub role: String,
    pub scope_level: ScopeLevel,
    pub dry_run: bool,
}

impl SetupParams {
    /// Required parameters; everything else takes its default.
    pub fn new(
        subscription_id: impl Into<String>,
        display_name: impl Into<String>,
        resource_group: impl Into<String>,
        repository: GitHubRepo,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            display_name: display_name.into(),
            resource_group: resource_group.into(),
            location: None,
            repository,
            subject_mode: SubjectMode::default(),
            subject_value: DEFAULT_SUBJECT_VALUE.into(),
            role: DEFAULT_ROLE.into(),
            scope_level: ScopeLevel::default(),
            dry_run: false,
        }
    }
}

/// Bootstrap a GitHub Actions deployment identity.
///
/// Steps run strictly in order; the first failure aborts the run and leaves
/// whatever earlier steps created in place. Re-running is always safe.
pub async fn run_setup(
    params: &SetupParams,
    provider: &dyn Provider,
    progress: &mut dyn Progress,
) -> Result<SetupReport, WorkflowError> {
    // Input errors surface before any provider call.
    let desired_credential =
        FederatedCredential::github(&params.repository, params.subject_mode, &params.subject_value)?;

    let ctx = preflight(provider, &params.subscription_id).await?;
    let scope = params.scope_level.scope(&ctx.subscription_id, &params.resource_group);
    let plan = params.dry_run;
    let mut steps = Vec::new();

    // 1. Resource group
    let group = ensure(
        ResourceKind::ResourceGroup,
        &params.resource_group,
        plan,
        provider.find_resource_groups(&params.resource_group),
        move || async move {
            let location = params.location.as_deref().ok_or_else(|| WorkflowError::MissingLocation {
                resource_group: params.resource_group.clone(),
            })?;
            Ok::<_, WorkflowError>(provider.create_resource_group(&params.resource_group, location).await?)
        },
    )
    .await?;
    if matches!(group, Ensured::Planned) && params.location.is_none() {
        return Err(WorkflowError::MissingLocation { resource_group: params.resource_group.clone() });
    }
    let location = group
        .resource()
        .map(|g| g.location.clone())
        .or_else(|| params.location.clone());
    record(
        &mut steps,
        progress,
        ResourceKind::ResourceGroup,
        &params.resource_group,
        group.status(),
        location.clone(),
    );

    // 2. Application registration, by display name
    let app: Ensured<Application> = ensure(
        ResourceKind::Application,
        &params.display_name,
        plan,
        provider.find_applications_by_name(&params.display_name),
        move || async move {
            Ok::<_, WorkflowError>(provider.create_application(&params.display_name).await?)
        },
    )
    .await?;
    record(
        &mut steps,
        progress,
        ResourceKind::Application,
        &params.display_name,
        app.status(),
        app.resource().map(|a| format!("appId {}", a.app_id)),
    );

    // 3. Service principal, bound to the application id
    let sp: Ensured<ServicePrincipal> = match app.resource() {
        Some(a) => {
            let app_id = a.app_id.as_str();
            ensure(
                ResourceKind::ServicePrincipal,
                app_id,
                plan,
                provider.find_service_principals(app_id),
                move || async move {
                    Ok::<_, WorkflowError>(provider.create_service_principal(app_id).await?)
                },
            )
            .await?
        }
        None => Ensured::Planned,
    };
    let sp_key = app.resource().map(|a| a.app_id.clone()).unwrap_or_else(|| params.display_name.clone());
    record(
        &mut steps,
        progress,
        ResourceKind::ServicePrincipal,
        &sp_key,
        sp.status(),
        sp.resource().map(|s| format!("objectId {}", s.object_id)),
    );

    // 4. Federated credential, matched on (issuer, subject, audience set)
    let credential: Ensured<FederatedCredential> = match app.resource() {
        Some(a) => {
            let object_id = a.object_id.as_str();
            let desired = &desired_credential;
            ensure(
                ResourceKind::FederatedCredential,
                &desired.subject,
                plan,
                async {
                    let existing = provider.list_federated_credentials(object_id).await?;
                    Ok::<_, ProviderError>(existing.into_iter().filter(|c| c.matches(desired)).collect::<Vec<_>>())
                },
                move || async move {
                    Ok::<_, WorkflowError>(provider.create_federated_credential(object_id, desired).await?)
                },
            )
            .await?
        }
        None => Ensured::Planned,
    };
    record(
        &mut steps,
        progress,
        ResourceKind::FederatedCredential,
        &desired_credential.subject,
        credential.status(),
        credential.resource().map(|c| format!("name {}", c.name)),
    );

    // 5. Role assignment, keyed on (assignee, role, scope)
    let role_key = format!("{} on {}", params.role, scope);
    let assignment: Ensured<RoleAssignment> = match sp.resource() {
        Some(s) => {
            let wanted = RoleAssignment {
                assignee: s.object_id.clone(),
                role: params.role.clone(),
                scope: scope.clone(),
            };
            let wanted = &wanted;
            ensure(
                ResourceKind::RoleAssignment,
                &role_key,
                plan,
                async {
                    let existing = provider
                        .list_role_assignments(&wanted.assignee, &wanted.scope, Some(&wanted.role))
                        .await?;
                    Ok::<_, ProviderError>(
                        existing.into_iter().filter(|ra| ra.same_binding(wanted)).collect::<Vec<_>>(),
                    )
                },
                move || async move {
                    Ok::<_, WorkflowError>(provider.create_role_assignment(wanted).await?)
                },
            )
            .await?
        }
        None => Ensured::Planned,
    };
    record(&mut steps, progress, ResourceKind::RoleAssignment, &role_key, assignment.status(), None);

    let summary = SetupSummary {
        client_id: app.resource().map(|a| a.app_id.clone()),
        service_principal_id: sp.resource().map(|s| s.object_id.clone()),
        tenant_id: ctx.tenant_id.clone(),
        subscription_id: ctx.subscription_id.clone(),
        resource_group: params.resource_group.clone(),
        location,
        scope,
        subject: desired_credential.subject.clone(),
        issuer: desired_credential.issuer.clone(),
        audience: AZURE_AD_AUDIENCE.to_string(),
    };

    let report = SetupReport { dry_run: plan, steps, summary };
    info!(
        created = report.count(StepStatus::Created),
        existing = report.count(StepStatus::Existing),
        planned = report.count(StepStatus::Planned),
        "setup finished"
    );
    Ok(report)
}

fn record(
    steps: &mut Vec<Step>,
    progress: &mut dyn Progress,
    kind: ResourceKind,
    key: &str,
    status: StepStatus,
    detail: Option<String>,
) {
    let step = Step { kind, key: key.to_string(), status, detail };
    progress.step(&step);
    steps.push(step);
}
