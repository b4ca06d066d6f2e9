use azboot_domain::{resource_group_scope, subscription_scope, Application, ServicePrincipal};
use azboot_provider::{empty_deployment_template, Provider, ProviderError};
use tracing::{info, warn};

use crate::error::WorkflowError;
use crate::preflight::preflight;
use crate::report::{CheckKind, CheckResult, CheckStatus, Progress, ValidationReport};
use crate::setup::DEFAULT_ROLE;

#[derive(Debug, Clone)]
pub struct ValidateParams {
    pub app_id: String,
    pub subscription_id: String,
    pub resource_group: String,
    /// Taken from the signed-in session when absent.
    pub tenant_id: Option<String>,
}

struct Checks<'a> {
    results: Vec<CheckResult>,
    progress: &'a mut dyn Progress,
}

impl Checks<'_> {
    fn record(&mut self, kind: CheckKind, outcome: Result<String, String>) {
        let (status, detail) = match outcome {
            Ok(d) => (CheckStatus::Pass, d),
            Err(d) if kind.is_advisory() => (CheckStatus::Warn, d),
            Err(d) => (CheckStatus::Fail, d),
        };
        let result = CheckResult { kind, status, detail };
        self.progress.check(&result);
        self.results.push(result);
    }
}

/// Re-query everything setup creates and probe what the identity can do.
///
/// Only context errors are fatal. Every other failure is recorded against its
/// check and the remaining checks still run. The resource-listing probe is
/// advisory: a problem there is a warning and does not fail the run.
pub async fn run_validation(
    params: &ValidateParams,
    provider: &dyn Provider,
    progress: &mut dyn Progress,
) -> Result<ValidationReport, WorkflowError> {
    let ctx = preflight(provider, &params.subscription_id).await?;
    let tenant_id = match &params.tenant_id {
        Some(t) => {
            if !t.eq_ignore_ascii_case(&ctx.tenant_id) {
                warn!(given = %t, session = %ctx.tenant_id, "tenant differs from the signed-in session");
            }
            t.clone()
        }
        None => ctx.tenant_id.clone(),
    };

    let rg = params.resource_group.as_str();
    let mut checks = Checks { results: Vec::with_capacity(7), progress };

    // 1. Resource group
    let outcome = match provider.find_resource_groups(rg).await {
        Ok(groups) => match groups.first() {
            Some(g) => Ok(format!("{} ({})", g.name, g.location)),
            None => Err(format!("resource group '{}' not found", rg)),
        },
        Err(e) => Err(e.to_string()),
    };
    checks.record(CheckKind::ResourceGroup, outcome);

    // 2. Application
    let app: Option<Application> = match provider.find_applications_by_app_id(&params.app_id).await {
        Ok(apps) => {
            let app = apps.into_iter().next();
            let outcome = match &app {
                Some(a) => Ok(format!("{} (objectId {})", a.display_name, a.object_id)),
                None => Err(format!("no application with appId {}", params.app_id)),
            };
            checks.record(CheckKind::Application, outcome);
            app
        }
        Err(e) => {
            checks.record(CheckKind::Application, Err(e.to_string()));
            None
        }
    };

    // 3. Service principal
    let sp: Option<ServicePrincipal> = match provider.find_service_principals(&params.app_id).await {
        Ok(sps) => {
            let sp = sps.into_iter().next();
            let outcome = match &sp {
                Some(s) => Ok(format!("objectId {}", s.object_id)),
                None => Err(format!("no service principal for appId {}", params.app_id)),
            };
            checks.record(CheckKind::ServicePrincipal, outcome);
            sp
        }
        Err(e) => {
            checks.record(CheckKind::ServicePrincipal, Err(e.to_string()));
            None
        }
    };

    // 4. Federated credentials
    let outcome = match &app {
        Some(a) => match provider.list_federated_credentials(&a.object_id).await {
            Ok(creds) => {
                let subjects: Vec<String> = creds
                    .into_iter()
                    .filter(|c| c.is_github_actions())
                    .map(|c| c.subject)
                    .collect();
                if subjects.is_empty() {
                    Err("no GitHub Actions federated credential on the application".to_string())
                } else {
                    Ok(subjects.join(", "))
                }
            }
            Err(e) => Err(e.to_string()),
        },
        None => Err("skipped: application not found".to_string()),
    };
    checks.record(CheckKind::FederatedCredentials, outcome);

    // 5. Role assignments, at the group or inherited from the subscription
    let outcome = match &sp {
        Some(s) => role_assignment_check(provider, &s.object_id, &ctx.subscription_id, rg).await,
        None => Err("skipped: service principal not found".to_string()),
    };
    checks.record(CheckKind::RoleAssignments, outcome);

    // 6. Resource listing probe (runs under the operator's session)
    let outcome = match provider.list_resources(rg).await {
        Ok(names) => Ok(format!("{} resource(s) visible", names.len())),
        Err(e) => Err(e.to_string()),
    };
    checks.record(CheckKind::ResourceListing, outcome);

    // 7. Deployment dry-run probe
    let outcome = match provider.validate_deployment(rg, &empty_deployment_template()).await {
        Ok(()) => Ok("empty deployment validated".to_string()),
        Err(e) => Err(e.to_string()),
    };
    checks.record(CheckKind::DeploymentValidation, outcome);

    let results = checks.results;
    let remediation = results
        .iter()
        .filter(|c| !c.passed())
        .map(|c| remediation_for(c.kind, params, &ctx.subscription_id))
        .collect();

    let report = ValidationReport {
        app_id: params.app_id.clone(),
        tenant_id,
        subscription_id: ctx.subscription_id.clone(),
        resource_group: params.resource_group.clone(),
        checks: results,
        remediation,
    };
    info!(
        passed = report.passed(),
        failed = report.failed(),
        warned = report.warned(),
        total = report.total(),
        "validation finished"
    );
    Ok(report)
}

async fn role_assignment_check(
    provider: &dyn Provider,
    principal_id: &str,
    subscription_id: &str,
    resource_group: &str,
) -> Result<String, String> {
    let scopes = [
        resource_group_scope(subscription_id, resource_group),
        subscription_scope(subscription_id),
    ];
    let mut last_error: Option<ProviderError> = None;
    for scope in &scopes {
        match provider.list_role_assignments(principal_id, scope, None).await {
            Ok(found) if !found.is_empty() => {
                let roles: Vec<String> = found.iter().map(|ra| format!("{} on {}", ra.role, ra.scope)).collect();
                return Ok(roles.join(", "));
            }
            Ok(_) => {}
            Err(e) => last_error = Some(e),
        }
    }
    Err(match last_error {
        Some(e) => e.to_string(),
        None => format!("no role assignment at {} or {}", scopes[0], scopes[1]),
    })
}

fn remediation_for(kind: CheckKind, params: &ValidateParams, subscription_id: &str) -> String {
    let rg = &params.resource_group;
    let app_id = &params.app_id;
    match kind {
        CheckKind::ResourceGroup => {
            format!("Create the resource group: `az group create --name {} --location <region>`.", rg)
        }
        CheckKind::Application => format!(
            "No application with appId {}; check --app-id or run `azboot setup` to create one.",
            app_id
        ),
        CheckKind::ServicePrincipal => {
            format!("Create the service principal: `az ad sp create --id {}`.", app_id)
        }
        CheckKind::FederatedCredentials => {
            "Add a GitHub federated credential: run `azboot setup` with --repository and --subject-mode."
                .to_string()
        }
        CheckKind::RoleAssignments => format!(
            "Grant a role: `az role assignment create --assignee {} --role {} --scope {}`.",
            app_id,
            DEFAULT_ROLE,
            resource_group_scope(subscription_id, rg)
        ),
        CheckKind::ResourceListing => {
            format!("Grant at least Reader on resource group '{}' to the identity.", rg)
        }
        CheckKind::DeploymentValidation => format!(
            "Grant a role allowing deployments (e.g. {}) on resource group '{}'.",
            DEFAULT_ROLE, rg
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NoProgress;
    use crate::setup::{run_setup, SetupParams};
    use azboot_domain::{GitHubRepo, RoleAssignment};
    use azboot_provider::InMemoryProvider;

    const TENANT: &str = "tenant-1";
    const SUB: &str = "sub-1";

    async fn provisioned() -> (InMemoryProvider, String) {
        let provider = InMemoryProvider::signed_in(TENANT, SUB);
        let mut p = SetupParams::new(SUB, "gh-deployer", "rg-app", GitHubRepo::parse("o/r").unwrap());
        p.location = Some("westeurope".into());
        let report = run_setup(&p, &provider, &mut NoProgress).await.unwrap();
        let app_id = report.summary.client_id.unwrap();
        (provider, app_id)
    }

    fn params(app_id: &str) -> ValidateParams {
        ValidateParams {
            app_id: app_id.to_string(),
            subscription_id: SUB.into(),
            resource_group: "rg-app".into(),
            tenant_id: None,
        }
    }

    #[tokio::test]
    async fn everything_passes_after_setup() {
        let (provider, app_id) = provisioned().await;
        let report = run_validation(&params(&app_id), &provider, &mut NoProgress).await.unwrap();
        assert_eq!(report.total(), 7);
        assert!(report.is_success(), "checks: {:?}", report.checks);
        assert!(report.remediation.is_empty());
        assert_eq!(report.tenant_id, TENANT);
    }

    #[tokio::test]
    async fn two_failures_out_of_seven() {
        let (provider, app_id) = provisioned().await;
        provider.fail_on("find_resource_groups", "ResourceGroupNotFound").await;
        provider.fail_on("validate_deployment", "AuthorizationFailed").await;

        let report = run_validation(&params(&app_id), &provider, &mut NoProgress).await.unwrap();
        assert_eq!(report.failed(), 2);
        assert_eq!(report.total(), 7);
        assert!(!report.is_success());
        assert_eq!(report.remediation.len(), 2);
    }

    #[tokio::test]
    async fn listing_failure_alone_is_a_warning() {
        let (provider, app_id) = provisioned().await;
        provider.fail_on("list_resources", "AuthorizationFailed").await;

        let report = run_validation(&params(&app_id), &provider, &mut NoProgress).await.unwrap();
        assert_eq!(report.failed(), 0);
        assert_eq!(report.warned(), 1);
        assert!(report.is_success());
        let listing = report.checks.iter().find(|c| c.kind == CheckKind::ResourceListing).unwrap();
        assert_eq!(listing.status, CheckStatus::Warn);
        assert_eq!(report.remediation.len(), 1);
    }

    #[tokio::test]
    async fn query_failures_do_not_stop_later_checks() {
        let (provider, app_id) = provisioned().await;
        provider.fail_on("find_resource_groups", "network unreachable").await;

        let report = run_validation(&params(&app_id), &provider, &mut NoProgress).await.unwrap();
        assert_eq!(report.total(), 7);
        assert_eq!(report.failed(), 1);
        assert!(report.checks[0].detail.contains("network unreachable"));
    }

    #[tokio::test]
    async fn unknown_application_fails_dependent_checks() {
        let provider = InMemoryProvider::signed_in(TENANT, SUB);
        provider.add_resource_group("rg-app", "westeurope").await;

        let report = run_validation(&params("missing"), &provider, &mut NoProgress).await.unwrap();
        let failed: Vec<CheckKind> = report.checks.iter().filter(|c| !c.passed()).map(|c| c.kind).collect();
        assert_eq!(
            failed,
            vec![
                CheckKind::Application,
                CheckKind::ServicePrincipal,
                CheckKind::FederatedCredentials,
                CheckKind::RoleAssignments,
            ]
        );
    }

    #[tokio::test]
    async fn subscription_level_assignment_counts() {
        let provider = InMemoryProvider::signed_in(TENANT, SUB);
        provider.add_resource_group("rg-app", "westeurope").await;
        let app = provider.add_application("gh-deployer").await;
        let sp = provider.add_service_principal(&app.app_id).await;
        provider
            .add_role_assignment(RoleAssignment {
                assignee: sp.object_id.clone(),
                role: "Contributor".into(),
                scope: subscription_scope(SUB),
            })
            .await;

        let report = run_validation(&params(&app.app_id), &provider, &mut NoProgress).await.unwrap();
        let roles = report.checks.iter().find(|c| c.kind == CheckKind::RoleAssignments).unwrap();
        assert!(roles.passed(), "detail: {}", roles.detail);
        assert!(roles.detail.contains("/subscriptions/sub-1"));
    }

    #[tokio::test]
    async fn context_errors_are_fatal() {
        let provider = InMemoryProvider::signed_in(TENANT, "other");
        let err = run_validation(&params("x"), &provider, &mut NoProgress).await.unwrap_err();
        assert!(matches!(err, WorkflowError::SubscriptionMismatch { .. }));
    }

    #[tokio::test]
    async fn explicit_tenant_is_reported() {
        let (provider, app_id) = provisioned().await;
        let mut p = params(&app_id);
        p.tenant_id = Some("given-tenant".into());
        let report = run_validation(&p, &provider, &mut NoProgress).await.unwrap();
        assert_eq!(report.tenant_id, "given-tenant");
    }
}
